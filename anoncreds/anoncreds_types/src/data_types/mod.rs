#[macro_use]
pub mod macros;

pub mod identifiers;
pub mod ledger;
pub mod messages;

use serde::{de::DeserializeOwned, Serialize};

/// Lossless JSON form shared by every domain object.
///
/// `from_json(to_json(x))` re-serializes to the same document (modulo key ordering).
pub trait JsonCodec: Serialize + DeserializeOwned {
    fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    fn to_json_value(&self) -> crate::Result<serde_json::Value> {
        serde_json::to_value(self).map_err(Into::into)
    }

    fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }
}

impl<T: Serialize + DeserializeOwned> JsonCodec for T {}
