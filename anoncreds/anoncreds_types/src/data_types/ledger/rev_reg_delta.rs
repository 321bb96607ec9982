use std::collections::{BTreeSet, HashSet};

use serde_json::Value;

use crate::{
    cl::RevocationRegistryDelta as CryptoRevocationRegistryDelta,
    data_types::ledger::rev_reg::RevocationRegistry, error::ConversionError,
};

/// Transition between two accumulator values, with the indices issued and revoked on the way.
#[derive(Clone, Deserialize, Debug, Serialize)]
pub struct RevocationRegistryDelta {
    pub value: CryptoRevocationRegistryDelta,
}

/// Plain view of a delta. The engine keeps these fields private, so they are read back
/// through the serialized form; the accumulators are decoded into comparable values.
#[derive(Clone, Debug, PartialEq)]
pub struct RevocationRegistryDeltaValue {
    pub prev_accum: Option<RevocationRegistry>,
    pub accum: RevocationRegistry,
    pub issued: BTreeSet<u32>,
    pub revoked: BTreeSet<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeltaFields {
    #[serde(default)]
    prev_accum: Option<Value>,
    accum: Value,
    #[serde(default)]
    issued: BTreeSet<u32>,
    #[serde(default)]
    revoked: BTreeSet<u32>,
}

impl RevocationRegistryDelta {
    pub fn from_parts(
        prev: Option<&RevocationRegistry>,
        current: &RevocationRegistry,
        issued: &HashSet<u32>,
        revoked: &HashSet<u32>,
    ) -> Self {
        Self {
            value: CryptoRevocationRegistryDelta::from_parts(
                prev.map(|reg| &reg.value),
                &current.value,
                issued,
                revoked,
            ),
        }
    }

    pub fn view(&self) -> Result<RevocationRegistryDeltaValue, ConversionError> {
        let fields: DeltaFields = serde_json::from_value(serde_json::to_value(&self.value)?)?;
        Ok(RevocationRegistryDeltaValue {
            prev_accum: fields
                .prev_accum
                .map(RevocationRegistry::from_accum)
                .transpose()?,
            accum: RevocationRegistry::from_accum(fields.accum)?,
            issued: fields.issued,
            revoked: fields.revoked,
        })
    }

    /// A delta without a starting accumulator describes the registry since its creation.
    pub fn is_genesis(&self) -> Result<bool, ConversionError> {
        let value = serde_json::to_value(&self.value)?;
        Ok(value.get("prevAccum").map_or(true, Value::is_null))
    }

    pub fn target_registry(&self) -> RevocationRegistry {
        RevocationRegistry::from(self)
    }
}

impl From<CryptoRevocationRegistryDelta> for RevocationRegistryDelta {
    fn from(value: CryptoRevocationRegistryDelta) -> Self {
        Self { value }
    }
}
