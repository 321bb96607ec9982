use std::sync::PoisonError;

use anoncreds_types::{ConversionError, Error as TypesError, ErrorKind as TypesErrorKind, ValidationError};

use crate::errors::error::{EngineErrorKind, RevocationError};

impl From<serde_json::Error> for RevocationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for RevocationError {
    fn from(err: std::io::Error) -> Self {
        Self::TailsAccess(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for RevocationError {
    fn from(err: PoisonError<T>) -> Self {
        Self::InvalidState(err.to_string())
    }
}

impl From<ValidationError> for RevocationError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<ConversionError> for RevocationError {
    fn from(err: ConversionError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<TypesError> for RevocationError {
    fn from(err: TypesError) -> Self {
        match err.kind() {
            TypesErrorKind::Input | TypesErrorKind::ValidationError => {
                Self::InvalidArgument(err.to_string())
            }
            TypesErrorKind::IOError => Self::TailsAccess(err.to_string()),
            TypesErrorKind::ConversionError => Self::Serialization(err.to_string()),
            TypesErrorKind::InvalidUserRevocId => Self::InvalidArgument(err.to_string()),
            TypesErrorKind::ProofRejected => Self::EngineFailure {
                kind: EngineErrorKind::ProofRejected,
                message: err.to_string(),
            },
            TypesErrorKind::InvalidState | TypesErrorKind::Unexpected => {
                Self::InvalidState(err.to_string())
            }
        }
    }
}
