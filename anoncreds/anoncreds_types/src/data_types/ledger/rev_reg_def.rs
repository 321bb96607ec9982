use std::str::FromStr;

use crate::{
    cl::{RevocationKeyPrivate, RevocationKeyPublic},
    data_types::identifiers::{
        cred_def_id::CredentialDefinitionId, issuer_id::IssuerId,
        rev_reg_def_id::RevocationRegistryDefinitionId,
    },
    error::ValidationError,
    utils::validation::Validatable,
};

pub const CL_ACCUM: &str = "CL_ACCUM";

pub const ISSUANCE_BY_DEFAULT: &str = "ISSUANCE_BY_DEFAULT";
pub const ISSUANCE_ON_DEMAND: &str = "ISSUANCE_ON_DEMAND";

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum RegistryType {
    #[default]
    CL_ACCUM,
}

impl RegistryType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CL_ACCUM => CL_ACCUM,
        }
    }
}

impl FromStr for RegistryType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CL_ACCUM => Ok(Self::CL_ACCUM),
            _ => Err(err_msg!(ConversionError, "Invalid registry type: {s}")),
        }
    }
}

/// Decides which indices the accumulator holds at genesis. By default every index is
/// issued up front; on demand the accumulator starts empty and grows with each issuance.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum IssuanceType {
    #[default]
    ISSUANCE_BY_DEFAULT,
    ISSUANCE_ON_DEMAND,
}

impl IssuanceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ISSUANCE_BY_DEFAULT => ISSUANCE_BY_DEFAULT,
            Self::ISSUANCE_ON_DEMAND => ISSUANCE_ON_DEMAND,
        }
    }

    pub const fn to_bool(&self) -> bool {
        matches!(self, Self::ISSUANCE_BY_DEFAULT)
    }
}

impl FromStr for IssuanceType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ISSUANCE_BY_DEFAULT => Ok(Self::ISSUANCE_BY_DEFAULT),
            ISSUANCE_ON_DEMAND => Ok(Self::ISSUANCE_ON_DEMAND),
            _ => Err(err_msg!(ConversionError, "Invalid issuance type: {s}")),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValue {
    #[serde(default)]
    pub issuance_type: IssuanceType,
    pub max_cred_num: u32,
    pub public_keys: RevocationRegistryDefinitionValuePublicKeys,
    pub tails_hash: String,
    pub tails_location: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValuePublicKeys {
    pub accum_key: RevocationKeyPublic,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinition {
    pub id: RevocationRegistryDefinitionId,
    pub issuer_id: IssuerId,
    pub revoc_def_type: RegistryType,
    pub tag: String,
    pub cred_def_id: CredentialDefinitionId,
    pub value: RevocationRegistryDefinitionValue,
}

impl RevocationRegistryDefinition {
    pub fn max_cred_num(&self) -> u32 {
        self.value.max_cred_num
    }

    pub fn issuance_type(&self) -> IssuanceType {
        self.value.issuance_type
    }

    /// Registry indices run from 1 to `max_cred_num` inclusive.
    pub fn contains_index(&self, index: u32) -> bool {
        (1..=self.value.max_cred_num).contains(&index)
    }
}

impl Validatable for RevocationRegistryDefinition {
    fn validate(&self) -> Result<(), ValidationError> {
        self.id.validate()?;
        self.cred_def_id.validate()?;
        self.issuer_id.validate()?;

        if self.value.max_cred_num == 0 {
            return Err(invalid!("max_cred_num must be greater than zero"));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RevocationRegistryDefinitionPrivate {
    pub value: RevocationKeyPrivate,
}
