use super::nonce::Nonce;
use crate::{
    cl::CredentialKeyCorrectnessProof,
    data_types::identifiers::{cred_def_id::CredentialDefinitionId, schema_id::SchemaId},
    error::ValidationError,
    utils::validation::Validatable,
};

/// First issuance message: what the issuer is willing to sign, and the nonce the holder's
/// request must answer.
#[derive(Debug, Deserialize, Serialize)]
pub struct CredentialOffer {
    pub schema_id: SchemaId,
    pub cred_def_id: CredentialDefinitionId,
    pub key_correctness_proof: CredentialKeyCorrectnessProof,
    pub nonce: Nonce,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

impl Validatable for CredentialOffer {
    fn validate(&self) -> Result<(), ValidationError> {
        self.schema_id
            .validate()
            .and_then(|()| self.cred_def_id.validate())
    }
}
