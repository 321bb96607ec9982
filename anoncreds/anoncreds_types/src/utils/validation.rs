use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

// TODO: stricten the URI regex, everything after the first colon is accepted today
pub static URI_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\+\-\.]+:.+$").expect("valid regex"));

/// base58 alphabet as defined in
/// <https://datatracker.ietf.org/doc/html/draft-msporny-base58#section-2>
/// used by legacy indy identifiers.
pub static LEGACY_DID_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[1-9A-HJ-NP-Za-km-z]{21,22}$").expect("valid regex"));

pub static LEGACY_SCHEMA_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^[1-9A-HJ-NP-Za-km-z]{21,22}:2:.+:[0-9.]+$").expect("valid regex")
});

pub static LEGACY_CRED_DEF_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "^[1-9A-HJ-NP-Za-km-z]{21,22}:3:CL:(([1-9][0-9]*)|([1-9A-HJ-NP-Za-km-z]{21,22}:2:.+:[0-9.]+)):(.+)?$",
    )
    .expect("valid regex")
});

pub static LEGACY_REV_REG_DEF_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^[1-9A-HJ-NP-Za-km-z]{21,22}:4:[1-9A-HJ-NP-Za-km-z]{21,22}:3:CL:.+:CL_ACCUM:.+$")
        .expect("valid regex")
});

pub fn is_uri_identifier(id: &str) -> bool {
    URI_IDENTIFIER.captures(id).is_some()
}

/// Macro to return a new `ValidationError` with an optional message
#[macro_export]
macro_rules! invalid {
    () => { $crate::error::ValidationError::from(None) };
    ($($arg:tt)+) => {
        $crate::error::ValidationError::from(format!($($arg)+))
    };
}

/// Trait for data types which need validation after being loaded from external sources
pub trait Validatable {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
