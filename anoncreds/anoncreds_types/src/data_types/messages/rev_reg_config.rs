use std::path::PathBuf;

use typed_builder::TypedBuilder;

use crate::{
    data_types::ledger::rev_reg_def::{IssuanceType, RegistryType},
    error::ValidationError,
    utils::validation::Validatable,
};

/// Parameters of a new revocation registry.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct RevocationRegistryConfig {
    #[builder(setter(into))]
    pub tag: String,
    #[builder(default)]
    #[serde(default)]
    pub registry_type: RegistryType,
    #[builder(default)]
    #[serde(default)]
    pub issuance_type: IssuanceType,
    pub max_cred_num: u32,
    #[builder(setter(into))]
    pub tails_dir: PathBuf,
}

impl Validatable for RevocationRegistryConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.tag.is_empty() {
            return Err(invalid!("Revocation registry tag must not be empty"));
        }
        if self.max_cred_num == 0 {
            return Err(invalid!("max_cred_num must be greater than zero"));
        }
        if self.tails_dir.as_os_str().is_empty() {
            return Err(invalid!("Tails directory must be set"));
        }
        Ok(())
    }
}
