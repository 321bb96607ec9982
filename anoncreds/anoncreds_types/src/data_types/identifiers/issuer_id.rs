use crate::{anoncreds_identifier, utils::validation::LEGACY_DID_IDENTIFIER};

anoncreds_identifier!(
    /// DID of an issuer.
    IssuerId,
    LEGACY_DID_IDENTIFIER
);
