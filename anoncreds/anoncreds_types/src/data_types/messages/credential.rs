use std::collections::HashMap;

use crate::{
    cl::{CredentialSignature, RevocationRegistry, SignatureCorrectnessProof, Witness},
    data_types::identifiers::{
        cred_def_id::CredentialDefinitionId, rev_reg_def_id::RevocationRegistryDefinitionId,
        schema_id::SchemaId,
    },
    error::{ConversionError, ValidationError},
    invalid,
    utils::{encoding::encode_credential_attribute, validation::Validatable},
};

#[derive(Debug, Deserialize, Serialize)]
pub struct Credential {
    pub schema_id: SchemaId,
    pub cred_def_id: CredentialDefinitionId,
    pub rev_reg_id: Option<RevocationRegistryDefinitionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_index: Option<u32>,
    pub values: CredentialValues,
    pub signature: CredentialSignature,
    pub signature_correctness_proof: SignatureCorrectnessProof,
    pub rev_reg: Option<RevocationRegistry>,
    pub witness: Option<Witness>,
}

impl Credential {
    pub fn try_clone(&self) -> Result<Self, ConversionError> {
        Ok(Self {
            schema_id: self.schema_id.clone(),
            cred_def_id: self.cred_def_id.clone(),
            rev_reg_id: self.rev_reg_id.clone(),
            rev_reg_index: self.rev_reg_index,
            values: self.values.clone(),
            signature: self.signature.try_clone()?,
            signature_correctness_proof: self.signature_correctness_proof.try_clone()?,
            rev_reg: self.rev_reg.clone(),
            witness: self.witness.clone(),
        })
    }

    pub fn is_revocable(&self) -> bool {
        self.rev_reg_id.is_some()
    }
}

impl Validatable for Credential {
    fn validate(&self) -> Result<(), ValidationError> {
        self.values.validate()?;
        self.schema_id.validate()?;
        self.cred_def_id.validate()?;
        let Some(rev_reg_id) = &self.rev_reg_id else {
            return Ok(());
        };
        rev_reg_id.validate()?;
        // A revocable credential is useless to the holder without its slot and witness.
        match (&self.rev_reg_index, &self.rev_reg, &self.witness) {
            (Some(_), Some(_), Some(_)) => Ok(()),
            _ => Err(invalid!(
                "Revocable credential in {rev_reg_id} lacks its index, registry or witness"
            )),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialValues(pub HashMap<String, AttributeValues>);

impl CredentialValues {
    /// Builds values from raw attribute values, encoding each one.
    pub fn from_raw<'a, I>(raw: I) -> Result<Self, ConversionError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        raw.into_iter()
            .map(|(name, raw)| {
                let encoded = encode_credential_attribute(raw)?;
                let value = AttributeValues {
                    raw: raw.to_owned(),
                    encoded,
                };
                Ok((name.to_owned(), value))
            })
            .collect::<Result<_, ConversionError>>()
            .map(Self)
    }
}

impl Validatable for CredentialValues {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            return Err(invalid!("Credential carries no attribute values"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttributeValues {
    pub raw: String,
    pub encoded: String,
}
