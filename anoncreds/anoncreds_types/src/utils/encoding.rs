use sha2::{Digest, Sha256};

use crate::{cl::bn::BigNumber, error::ConversionError};

/// Encodes a raw attribute value the way the CL signature scheme expects it.
///
/// Values that parse as an `i32` are kept as is so that predicates can be proven over them,
/// anything else is replaced by the decimal form of its SHA-256 digest.
pub fn encode_credential_attribute(raw_value: &str) -> Result<String, ConversionError> {
    if let Ok(val) = raw_value.parse::<i32>() {
        Ok(val.to_string())
    } else {
        let digest = Sha256::digest(raw_value.as_bytes());
        #[cfg(target_endian = "big")]
        let digest = {
            let mut d = digest;
            d.reverse();
            d
        };
        Ok(BigNumber::from_bytes(&digest)?.to_dec()?)
    }
}

/// Attribute names are compared without spaces and case-insensitively.
pub fn attr_common_view(attr: &str) -> String {
    attr.replace(' ', "").to_lowercase()
}
