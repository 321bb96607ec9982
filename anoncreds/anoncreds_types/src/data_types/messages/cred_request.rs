use super::nonce::Nonce;
use crate::{
    cl::{
        BlindedCredentialSecrets, BlindedCredentialSecretsCorrectnessProof,
        CredentialSecretsBlindingFactors,
    },
    data_types::identifiers::cred_def_id::CredentialDefinitionId,
    error::ValidationError,
    utils::validation::{Validatable, LEGACY_DID_IDENTIFIER},
};

#[derive(Debug, Deserialize, Serialize)]
pub struct CredentialRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prover_did: Option<String>,
    pub cred_def_id: CredentialDefinitionId,
    pub blinded_ms: BlindedCredentialSecrets,
    pub blinded_ms_correctness_proof: BlindedCredentialSecretsCorrectnessProof,
    pub nonce: Nonce,
}

impl CredentialRequest {
    /// Value the issuer mixes into the credential context. Legacy requests carry the
    /// holder DID, newer ones a random entropy string.
    pub fn entropy(&self) -> Result<String, ValidationError> {
        self.entropy
            .clone()
            .or_else(|| self.prover_did.clone())
            .ok_or_else(|| invalid!("Entropy or prover_did must be supplied"))
    }
}

impl Validatable for CredentialRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        self.cred_def_id.validate()?;

        match (&self.entropy, &self.prover_did) {
            (Some(_), Some(_)) => {
                return Err(invalid!(
                    "Only one of prover_did or entropy must be supplied"
                ))
            }
            (None, None) => return Err(invalid!("Entropy or prover_did must be supplied")),
            (None, Some(prover_did)) if !LEGACY_DID_IDENTIFIER.is_match(prover_did) => {
                return Err(invalid!("Prover did was supplied, not valid: {}", prover_did))
            }
            _ => {}
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CredentialRequestMetadata {
    pub link_secret_blinding_data: CredentialSecretsBlindingFactors,
    pub nonce: Nonce,
    pub link_secret_name: String,
}

impl Validatable for CredentialRequestMetadata {}
