use std::collections::HashMap;

use crate::{
    cl::Proof,
    data_types::identifiers::{
        cred_def_id::CredentialDefinitionId, rev_reg_def_id::RevocationRegistryDefinitionId,
        schema_id::SchemaId,
    },
    error::ValidationError,
    utils::validation::Validatable,
};

#[derive(Debug, Deserialize, Serialize)]
pub struct Presentation {
    pub proof: Proof,
    pub requested_proof: RequestedProof,
    pub identifiers: Vec<Identifier>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestedProof {
    pub revealed_attrs: HashMap<String, RevealedAttributeInfo>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(default)]
    pub revealed_attr_groups: HashMap<String, RevealedAttributeGroupInfo>,
    #[serde(default)]
    pub self_attested_attrs: HashMap<String, String>,
    #[serde(default)]
    pub unrevealed_attrs: HashMap<String, SubProofReferent>,
    #[serde(default)]
    pub predicates: HashMap<String, SubProofReferent>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubProofReferent {
    pub sub_proof_index: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RevealedAttributeInfo {
    pub sub_proof_index: u32,
    pub raw: String,
    pub encoded: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RevealedAttributeGroupInfo {
    pub sub_proof_index: u32,
    pub values: HashMap<String, AttributeValue>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AttributeValue {
    pub raw: String,
    pub encoded: String,
}

/// Public objects a sub-proof was built against. The timestamp names the accumulator
/// snapshot the holder proved non-revocation for.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Identifier {
    pub schema_id: SchemaId,
    pub cred_def_id: CredentialDefinitionId,
    pub rev_reg_id: Option<RevocationRegistryDefinitionId>,
    pub timestamp: Option<u64>,
}

impl Validatable for Presentation {
    fn validate(&self) -> Result<(), ValidationError> {
        for identifier in &self.identifiers {
            identifier.schema_id.validate()?;
            identifier.cred_def_id.validate()?;
            identifier
                .rev_reg_id
                .as_ref()
                .map(Validatable::validate)
                .transpose()?;
            if identifier.rev_reg_id.is_some() != identifier.timestamp.is_some() {
                return Err(invalid!(
                    "Presentation identifier must carry both rev_reg_id and timestamp or neither"
                ));
            }
        }
        Ok(())
    }
}
