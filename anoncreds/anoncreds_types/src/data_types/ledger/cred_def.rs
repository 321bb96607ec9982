use crate::{
    cl::{
        CredentialKeyCorrectnessProof as ClKeyCorrectnessProof, CredentialPrimaryPublicKey,
        CredentialPrivateKey, CredentialPublicKey, CredentialRevocationPublicKey,
    },
    data_types::identifiers::{
        cred_def_id::CredentialDefinitionId, issuer_id::IssuerId, schema_id::SchemaId,
    },
    error::{ConversionError, ValidationError},
    utils::validation::Validatable,
};

pub const CL_SIGNATURE_TYPE: &str = "CL";

/// Camenisch-Lysyanskaya is the only signature scheme on the ledger.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SignatureType {
    #[default]
    CL,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialDefinitionData {
    pub primary: CredentialPrimaryPublicKey,
    /// Present only for definitions whose credentials can be revoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation: Option<CredentialRevocationPublicKey>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinition {
    pub id: CredentialDefinitionId,
    pub schema_id: SchemaId,
    #[serde(rename = "type")]
    pub signature_type: SignatureType,
    pub tag: String,
    pub value: CredentialDefinitionData,
    pub issuer_id: IssuerId,
}

impl CredentialDefinition {
    /// Rebuilds the engine's public key from the primary and revocation halves.
    pub fn get_public_key(&self) -> Result<CredentialPublicKey, ConversionError> {
        let value = &self.value;
        Ok(CredentialPublicKey::build_from_parts(
            &value.primary,
            value.revocation.as_ref(),
        )?)
    }

    pub fn supports_revocation(&self) -> bool {
        self.value.revocation.is_some()
    }

    pub fn try_clone(&self) -> Result<Self, ConversionError> {
        Ok(Self {
            value: CredentialDefinitionData {
                primary: self.value.primary.try_clone()?,
                revocation: self.value.revocation.clone(),
            },
            id: self.id.clone(),
            schema_id: self.schema_id.clone(),
            issuer_id: self.issuer_id.clone(),
            tag: self.tag.clone(),
            ..*self
        })
    }
}

impl Validatable for CredentialDefinition {
    fn validate(&self) -> Result<(), ValidationError> {
        self.id.validate()?;
        self.schema_id.validate()?;
        self.issuer_id.validate()
    }
}

/// Issuer-only half of a credential definition.
#[derive(Debug, Deserialize, Serialize)]
pub struct CredentialDefinitionPrivate {
    pub value: CredentialPrivateKey,
}

/// Proves the public key was generated correctly. Sent along with every offer.
#[derive(Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CredentialKeyCorrectnessProof {
    pub value: ClKeyCorrectnessProof,
}

impl CredentialKeyCorrectnessProof {
    pub fn try_clone(&self) -> Result<Self, ConversionError> {
        self.value
            .try_clone()
            .map(|value| Self { value })
            .map_err(Into::into)
    }
}
