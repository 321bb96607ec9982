use std::fmt;

use thiserror::Error as ThisError;

pub type RevocationResult<T> = Result<T, RevocationError>;

/// Failure categories reported by the crypto engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    InvalidState,
    ProofRejected,
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState => f.write_str("invalid state"),
            Self::ProofRejected => f.write_str("proof rejected"),
        }
    }
}

#[derive(Debug, ThisError)]
pub enum RevocationError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Registry index {index} is out of range 1..={max_cred_num}")]
    IndexOutOfRange { index: u32, max_cred_num: u32 },
    #[error("Incompatible delta: {0}")]
    IncompatibleDelta(String),
    #[error("Tails access error: {0}")]
    TailsAccess(String),
    #[error("Crypto engine failure ({kind}): {message}")]
    EngineFailure {
        kind: EngineErrorKind,
        message: String,
    },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl RevocationError {
    pub(crate) fn index_out_of_range(index: u32, max_cred_num: u32) -> Self {
        Self::IndexOutOfRange {
            index,
            max_cred_num,
        }
    }
}
