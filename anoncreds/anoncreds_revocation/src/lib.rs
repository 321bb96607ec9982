#[macro_use]
extern crate log;

#[macro_use]
mod macros;

pub mod anoncreds;
pub mod engine;
pub mod errors;
pub mod issuer;
pub mod prover;
pub mod revocation;
pub mod tails;
#[cfg(test)]
mod test_fixtures;
pub mod verifier;

pub use anoncreds::AnonCreds;
