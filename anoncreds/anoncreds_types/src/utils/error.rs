use std::{error::Error as StdError, fmt};

use thiserror::Error;

type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Declares an error carrying an optional context message and an optional cause.
macro_rules! message_error {
    ($(#[$meta:meta])* $name:ident => $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Error)]
        pub struct $name {
            pub context: Option<String>,
            pub source: Option<BoxedCause>,
        }

        impl $name {
            pub fn from_msg(msg: impl Into<String>) -> Self {
                Self {
                    context: Some(msg.into()),
                    source: None,
                }
            }

            #[must_use]
            pub fn with_source(mut self, err: impl Into<BoxedCause>) -> Self {
                self.source = Some(err.into());
                self
            }
        }

        impl From<&str> for $name {
            fn from(context: &str) -> Self {
                Self::from_msg(context)
            }
        }

        impl From<String> for $name {
            fn from(context: String) -> Self {
                Self::from_msg(context)
            }
        }

        impl From<Option<String>> for $name {
            fn from(context: Option<String>) -> Self {
                Self {
                    context,
                    source: None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.context {
                    Some(context) => write!(f, "{}: {context}", $label),
                    None => f.write_str($label),
                }
            }
        }
    };
}

message_error!(
    /// A value could not be converted to or from its serialized or cryptographic form.
    ConversionError => "Conversion error"
);

message_error!(
    /// Returned by `Validatable::validate`.
    ValidationError => "Validation error"
);

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        Self::from_msg(err.to_string()).with_source(err)
    }
}

impl From<crate::cl::Error> for ConversionError {
    fn from(err: crate::cl::Error) -> Self {
        Self::from_msg(err.to_string())
    }
}

impl From<ValidationError> for ConversionError {
    fn from(err: ValidationError) -> Self {
        Self {
            context: err.context,
            source: err.source,
        }
    }
}

impl From<ConversionError> for ValidationError {
    fn from(err: ConversionError) -> Self {
        Self {
            context: err.context,
            source: err.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_the_label() {
        assert_eq!(
            ValidationError::from_msg("empty tag").to_string(),
            "Validation error: empty tag"
        );
        assert_eq!(ConversionError::from(None).to_string(), "Conversion error");
    }

    #[test]
    fn json_errors_keep_their_source() {
        let err: ConversionError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(err.source().is_some());
        assert!(err.context.is_some());
    }
}
