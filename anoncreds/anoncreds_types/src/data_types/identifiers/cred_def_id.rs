use super::{issuer_id::IssuerId, schema_id::SchemaId};
use crate::{
    anoncreds_identifier, data_types::ledger::cred_def::CL_SIGNATURE_TYPE, error::ValidationError,
    utils::validation::LEGACY_CRED_DEF_IDENTIFIER,
};

anoncreds_identifier!(CredentialDefinitionId, LEGACY_CRED_DEF_IDENTIFIER);

impl CredentialDefinitionId {
    /// Legacy indy credential definition identifier, `{did}:3:CL:{schemaId}:{tag}`.
    pub fn from_parts(
        issuer_id: &IssuerId,
        schema_id: &SchemaId,
        tag: &str,
    ) -> Result<Self, ValidationError> {
        if issuer_id.is_uri() {
            Self::new(format!("{issuer_id}/anoncreds/v0/CLAIM_DEF/{schema_id}/{tag}"))
        } else {
            Self::new(format!("{issuer_id}:3:{CL_SIGNATURE_TYPE}:{schema_id}:{tag}"))
        }
    }
}
