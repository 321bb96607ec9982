use super::issuer_id::IssuerId;
use crate::{
    anoncreds_identifier, error::ValidationError, utils::validation::LEGACY_SCHEMA_IDENTIFIER,
};

anoncreds_identifier!(SchemaId, LEGACY_SCHEMA_IDENTIFIER);

impl SchemaId {
    /// Legacy indy schema identifier, `{did}:2:{name}:{version}`.
    pub fn from_parts(issuer_id: &IssuerId, name: &str, version: &str) -> Result<Self, ValidationError> {
        if issuer_id.is_uri() {
            Self::new(format!("{issuer_id}/anoncreds/v0/SCHEMA/{name}/{version}"))
        } else {
            Self::new(format!("{issuer_id}:2:{name}:{version}"))
        }
    }
}
