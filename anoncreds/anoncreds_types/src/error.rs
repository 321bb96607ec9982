use std::{error::Error as StdError, fmt};

use crate::cl::{Error as CryptoError, ErrorKind as CryptoErrorKind};
pub use crate::utils::error::{ConversionError, ValidationError};

pub type Result<T> = std::result::Result<T, Error>;

type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    IOError,
    InvalidState,
    Unexpected,
    InvalidUserRevocId,
    ProofRejected,
    ConversionError,
    ValidationError,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "Input error",
            Self::IOError => "IO error",
            Self::InvalidState => "Invalid state",
            Self::Unexpected => "Unexpected error",
            Self::InvalidUserRevocId => "Invalid revocation accumulator index",
            Self::ProofRejected => "Proof rejected",
            Self::ConversionError => "Conversion error",
            Self::ValidationError => "Validation error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error of the domain object layer: a kind, an optional message and an optional cause.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    pub cause: Option<BoxedCause>,
    pub message: Option<String>,
}

impl Error {
    pub fn from_msg(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            cause: None,
            message: Some(msg.into()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn with_cause(mut self, err: impl Into<BoxedCause>) -> Self {
        self.cause = Some(err.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, self.kind) {
            (Some(msg), ErrorKind::Input) => f.write_str(msg)?,
            (Some(msg), kind) => write!(f, "{kind}: {msg}")?,
            (None, kind) => write!(f, "{kind}")?,
        }
        match &self.cause {
            Some(cause) => write!(f, " [{cause}]"),
            None => Ok(()),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            cause: None,
            message: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::from(ErrorKind::IOError).with_cause(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::from(ErrorKind::ConversionError).with_cause(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        let kind = match err.kind() {
            CryptoErrorKind::InvalidState => ErrorKind::InvalidState,
            CryptoErrorKind::ProofRejected => ErrorKind::ProofRejected,
        };
        Self::from_msg(kind, err.to_string())
    }
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Self {
            kind: ErrorKind::ConversionError,
            message: err.context,
            cause: err.source,
        }
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self {
            kind: ErrorKind::ValidationError,
            message: err.context,
            cause: err.source,
        }
    }
}

/// `err_msg!(Kind, "fmt", args..)`, or `err_msg!("fmt", args..)` for input errors.
macro_rules! err_msg {
    ($kind:ident) => {
        $crate::error::Error::from($crate::error::ErrorKind::$kind)
    };
    ($kind:ident, $($args:tt)+) => {
        $crate::error::Error::from_msg($crate::error::ErrorKind::$kind, format!($($args)+))
    };
    ($($args:tt)+) => {
        $crate::error::Error::from_msg($crate::error::ErrorKind::Input, format!($($args)+))
    };
}
