use super::{cred_def_id::CredentialDefinitionId, issuer_id::IssuerId};
use crate::{
    anoncreds_identifier, data_types::ledger::rev_reg_def::RegistryType, error::ValidationError,
    utils::validation::LEGACY_REV_REG_DEF_IDENTIFIER,
};

anoncreds_identifier!(RevocationRegistryDefinitionId, LEGACY_REV_REG_DEF_IDENTIFIER);

impl RevocationRegistryDefinitionId {
    /// Legacy indy registry identifier, `{did}:4:{credDefId}:CL_ACCUM:{tag}`.
    pub fn from_parts(
        issuer_id: &IssuerId,
        cred_def_id: &CredentialDefinitionId,
        registry_type: RegistryType,
        tag: &str,
    ) -> Result<Self, ValidationError> {
        if issuer_id.is_uri() {
            Self::new(format!(
                "{issuer_id}/anoncreds/v0/REV_REG_DEF/{cred_def_id}/{tag}"
            ))
        } else {
            Self::new(format!(
                "{issuer_id}:4:{cred_def_id}:{}:{tag}",
                registry_type.as_str()
            ))
        }
    }
}
