use std::fmt;

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

use crate::{cl::bn::BigNumber, error::ConversionError};

/// Size in bits of a freshly generated link secret.
pub const LINK_SECRET_SIZE: usize = 256;

/// Name the link secret is blinded under inside every credential.
pub const LINK_SECRET_ATTRIBUTE: &str = "master_secret";

/// Holder secret binding every credential issued to that holder.
pub struct LinkSecret(BigNumber);

impl LinkSecret {
    pub fn new() -> Result<Self, ConversionError> {
        let value = BigNumber::rand(LINK_SECRET_SIZE)
            .map_err(|err| ConversionError::from_msg(format!("Error creating link secret: {err}")))?;
        Ok(Self(value))
    }

    pub fn from_dec(value: &str) -> Result<Self, ConversionError> {
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err("Invalid link secret: expected a decimal value".into());
        }
        Ok(Self(BigNumber::from_dec(value)?))
    }

    pub fn to_dec(&self) -> Result<String, ConversionError> {
        Ok(self.0.to_dec()?)
    }

    pub const fn as_native(&self) -> &BigNumber {
        &self.0
    }

    pub fn try_clone(&self) -> Result<Self, ConversionError> {
        Self::from_dec(&self.to_dec()?)
    }
}

impl fmt::Debug for LinkSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = if cfg!(test) {
            self.0.to_dec().unwrap_or_default()
        } else {
            "<hidden>".to_owned()
        };
        f.debug_tuple("LinkSecret").field(&value).finish()
    }
}

impl Serialize for LinkSecret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.to_dec().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&value)
    }
}

impl<'de> Deserialize<'de> for LinkSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_dec(&value).map_err(D::Error::custom)
    }
}
