use anoncreds_types::data_types::{
    ledger::schema::AttributeNames,
    messages::{
        credential::CredentialValues,
        pres_request::{NonRevokedInterval, PresentationRequest},
    },
};
use serde_json::json;
use tempfile::TempDir;

use crate::{
    constants::{AGE, HEIGHT, NAME, SCHEMA_ATTRS, SEX},
    errors::error::{TestUtilsError, TestUtilsResult},
};

pub fn schema_attrs() -> AttributeNames {
    SCHEMA_ATTRS.as_slice().into()
}

pub fn credential_values() -> TestUtilsResult<CredentialValues> {
    Ok(CredentialValues::from_raw([
        ("name", NAME),
        ("sex", SEX),
        ("age", AGE),
        ("height", HEIGHT),
    ])?)
}

/// Directory tails files of one test are written to. Removed when dropped.
pub fn tails_dir() -> TestUtilsResult<TempDir> {
    Ok(tempfile::Builder::new().prefix("tails").tempdir()?)
}

/// Request revealing `name`, proving `age >= 18` and asking for `sex` without revealing it.
pub fn presentation_request(
    nonce: &str,
    non_revoked: Option<NonRevokedInterval>,
) -> TestUtilsResult<PresentationRequest> {
    let mut request = json!({
        "nonce": nonce,
        "name": "pres_req_1",
        "version": "0.1",
        "requested_attributes": {
            "attr1_referent": { "name": "name" },
            "attr2_referent": { "name": "sex" }
        },
        "requested_predicates": {
            "predicate1_referent": { "name": "age", "p_type": ">=", "p_value": 18 }
        }
    });
    if let Some(interval) = non_revoked {
        request["non_revoked"] = serde_json::to_value(interval)
            .map_err(|err| TestUtilsError::FixtureError(err.to_string()))?;
    }
    serde_json::from_value(request).map_err(|err| TestUtilsError::FixtureError(err.to_string()))
}
