use crate::{
    cl::RevocationRegistry as CryptoRevocationRegistry,
    data_types::ledger::rev_reg_delta::RevocationRegistryDelta, error::ConversionError,
};

/// Accumulator value of a registry at one point in time.
///
/// Equality compares the accumulator points, not their serialized coordinates: the same
/// value reached along two different paths may serialize differently.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RevocationRegistry {
    pub value: CryptoRevocationRegistry,
}

impl RevocationRegistry {
    /// Reads a registry from a bare serialized accumulator, as found in a delta.
    pub(crate) fn from_accum(accum: serde_json::Value) -> Result<Self, ConversionError> {
        let value = serde_json::from_value(serde_json::json!({ "accum": accum }))?;
        Ok(Self { value })
    }
}

impl From<CryptoRevocationRegistry> for RevocationRegistry {
    fn from(value: CryptoRevocationRegistry) -> Self {
        Self { value }
    }
}

impl From<&RevocationRegistryDelta> for RevocationRegistry {
    fn from(delta: &RevocationRegistryDelta) -> Self {
        Self {
            value: CryptoRevocationRegistry::from(delta.value.clone()),
        }
    }
}
