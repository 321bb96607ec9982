pub mod encoding;
pub mod error;
pub mod query;
#[macro_use]
pub mod validation;
