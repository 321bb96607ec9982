use crate::{
    cl::{RevocationRegistry, Witness},
    error::ValidationError,
    utils::validation::Validatable,
};

/// Holder-side witness for one registry index, valid against one accumulator snapshot.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialRevocationState {
    pub witness: Witness,
    pub rev_reg: RevocationRegistry,
    pub timestamp: u64,
}

impl Validatable for CredentialRevocationState {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp == 0 {
            return Err(invalid!(
                "Credential Revocation State validation failed: `timestamp` must be greater than 0",
            ));
        }
        Ok(())
    }
}
