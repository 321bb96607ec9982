use crate::{
    data_types::ledger::cred_def::SignatureType, error::ValidationError,
    utils::validation::Validatable,
};

/// Issuer choices for a new credential definition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialDefinitionConfig {
    pub support_revocation: bool,
    pub tag: String,
    pub signature_type: SignatureType,
}

impl Validatable for CredentialDefinitionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.tag.is_empty() {
            return Err(invalid!("Credential definition tag must not be empty"));
        }
        Ok(())
    }
}
