use std::fmt;

use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    cl::{new_nonce, Nonce as CryptoNonce},
    error::ConversionError,
};

/// Decimal nonce binding offers, requests and presentations to one exchange.
///
/// The decimal text is kept next to the engine value so that equality and the wire form never
/// depend on re-encoding the big number.
pub struct Nonce {
    decimal: String,
    native: CryptoNonce,
}

impl Nonce {
    pub fn new() -> Result<Self, ConversionError> {
        let native = new_nonce()
            .map_err(|err| ConversionError::from_msg(format!("Error creating nonce: {err}")))?;
        let decimal = native.to_dec()?;
        Ok(Self { decimal, native })
    }

    fn parse(decimal: String) -> Result<Self, ConversionError> {
        if decimal.is_empty() || !decimal.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(ConversionError::from_msg(format!(
                "Nonce must be a non-negative decimal number, got {decimal:?}"
            )));
        }
        let native = CryptoNonce::from_dec(&decimal)?;
        Ok(Self { decimal, native })
    }

    #[must_use]
    pub const fn as_native(&self) -> &CryptoNonce {
        &self.native
    }

    /// The engine nonce is not `Clone`; the copy is rebuilt from the decimal text.
    pub fn try_clone(&self) -> Result<Self, ConversionError> {
        Self::parse(self.decimal.clone())
    }
}

impl PartialEq for Nonce {
    fn eq(&self, other: &Self) -> bool {
        self.decimal == other.decimal
    }
}

impl Eq for Nonce {}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Nonce").field(&self.decimal).finish()
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.decimal)
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.decimal)
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DecimalVisitor;

        impl<'de> Visitor<'de> for DecimalVisitor {
            type Value = Nonce;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a decimal nonce as string or unsigned integer")
            }

            fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Nonce, E> {
                Nonce::parse(value.to_string()).map_err(E::custom)
            }

            fn visit_u128<E: serde::de::Error>(self, value: u128) -> Result<Nonce, E> {
                Nonce::parse(value.to_string()).map_err(E::custom)
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Nonce, E> {
                Nonce::parse(value.to_owned()).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DecimalVisitor)
    }
}
