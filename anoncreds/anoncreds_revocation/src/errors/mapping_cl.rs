use anoncreds_types::cl::{Error as ClError, ErrorKind as ClErrorKind};

use crate::errors::error::{EngineErrorKind, RevocationError};

impl From<ClErrorKind> for EngineErrorKind {
    fn from(kind: ClErrorKind) -> Self {
        match kind {
            ClErrorKind::InvalidState => Self::InvalidState,
            ClErrorKind::ProofRejected => Self::ProofRejected,
        }
    }
}

impl From<ClError> for RevocationError {
    fn from(err: ClError) -> Self {
        Self::EngineFailure {
            kind: err.kind().into(),
            message: err.to_string(),
        }
    }
}
