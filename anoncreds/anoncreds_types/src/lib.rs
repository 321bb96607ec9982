#[macro_use]
extern crate serde;

#[cfg(test)]
#[macro_use]
extern crate serde_json;

#[doc(hidden)]
pub use anoncreds_clsignatures as cl;

#[macro_use]
mod error;
#[doc(hidden)]
pub use self::error::Result;
pub use self::error::{ConversionError, Error, ErrorKind, ValidationError};

#[macro_use]
pub mod utils;

pub mod data_types;
