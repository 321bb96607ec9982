mod restrictions;

use std::collections::{HashMap, HashSet};

use anoncreds_types::{
    data_types::{
        identifiers::rev_reg_def_id::RevocationRegistryDefinitionId,
        ledger::{
            cred_def::CredentialDefinition, rev_reg::RevocationRegistry,
            rev_reg_def::RevocationRegistryDefinition, schema::Schema,
        },
        messages::{
            nonce::Nonce,
            pres_request::{
                NonRevokedInterval, PredicateInfo, PresentationRequest, PresentationRequestPayload,
            },
            presentation::{Identifier, Presentation},
        },
    },
    utils::{
        encoding::{attr_common_view, encode_credential_attribute},
        validation::Validatable,
    },
};
use serde::{Deserialize, Serialize};

use crate::{
    anoncreds::AnonCreds,
    engine::SubProofCheck,
    errors::error::{RevocationError, RevocationResult},
};

/// Accumulator snapshot the verifier trusts for one registry at one point in time.
///
/// `def_entry_idx` points into the registry definitions handed to
/// [`AnonCreds::verify_presentation`] alongside the entries.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RevocationEntry {
    pub def_entry_idx: usize,
    pub registry: RevocationRegistry,
    pub timestamp: u64,
}

/// Referents answered by one sub-proof, with the tightest non-revocation interval asked of
/// them.
#[derive(Debug, Default)]
struct SubProofReferents {
    revealed: Vec<String>,
    predicates: Vec<PredicateInfo>,
    interval: NonRevokedInterval,
}

fn covered_referents(presentation: &Presentation) -> (HashSet<&str>, HashSet<&str>) {
    let proof = &presentation.requested_proof;
    let attributes = proof
        .revealed_attrs
        .keys()
        .chain(proof.revealed_attr_groups.keys())
        .chain(proof.unrevealed_attrs.keys())
        .chain(proof.self_attested_attrs.keys())
        .map(String::as_str)
        .collect();
    let predicates = proof.predicates.keys().map(String::as_str).collect();
    (attributes, predicates)
}

fn sub_proof_indices(presentation: &Presentation) -> impl Iterator<Item = u32> + '_ {
    let proof = &presentation.requested_proof;
    proof
        .revealed_attrs
        .values()
        .map(|info| info.sub_proof_index)
        .chain(proof.revealed_attr_groups.values().map(|info| info.sub_proof_index))
        .chain(proof.unrevealed_attrs.values().map(|info| info.sub_proof_index))
        .chain(proof.predicates.values().map(|info| info.sub_proof_index))
}

/// Problems that make the presentation answer a different question than the one asked.
fn structural_mismatch(
    request: &PresentationRequestPayload,
    presentation: &Presentation,
) -> Option<String> {
    let (attributes, predicates) = covered_referents(presentation);
    let requested_attributes: HashSet<&str> =
        request.requested_attributes.keys().map(String::as_str).collect();
    let requested_predicates: HashSet<&str> =
        request.requested_predicates.keys().map(String::as_str).collect();

    if attributes != requested_attributes {
        return Some(format!(
            "requested attributes {requested_attributes:?} do not correspond to received \
             {attributes:?}"
        ));
    }
    if predicates != requested_predicates {
        return Some(format!(
            "requested predicates {requested_predicates:?} do not correspond to received \
             {predicates:?}"
        ));
    }
    if presentation.proof.proofs.len() != presentation.identifiers.len() {
        return Some(format!(
            "{} sub-proofs but {} identifiers",
            presentation.proof.proofs.len(),
            presentation.identifiers.len()
        ));
    }
    let identifiers = presentation.identifiers.len();
    if let Some(index) = sub_proof_indices(presentation).find(|index| *index as usize >= identifiers)
    {
        return Some(format!("sub-proof index {index} has no identifier"));
    }
    None
}

fn collect_referents(
    payload: &PresentationRequestPayload,
    presentation: &Presentation,
    referents: &mut [SubProofReferents],
) {
    let proof = &presentation.requested_proof;
    let mut note_interval = |index: u32, interval: Option<&NonRevokedInterval>| {
        if let Some(interval) = interval {
            referents[index as usize].interval.compare_and_set(interval);
        }
    };

    for (referent, info) in &proof.revealed_attrs {
        note_interval(
            info.sub_proof_index,
            payload.requested_attributes[referent].non_revoked.as_ref(),
        );
    }
    for (referent, info) in &proof.revealed_attr_groups {
        note_interval(
            info.sub_proof_index,
            payload.requested_attributes[referent].non_revoked.as_ref(),
        );
    }
    for (referent, info) in &proof.unrevealed_attrs {
        note_interval(
            info.sub_proof_index,
            payload.requested_attributes[referent].non_revoked.as_ref(),
        );
    }
    for (referent, info) in &proof.predicates {
        note_interval(
            info.sub_proof_index,
            payload.requested_predicates[referent].non_revoked.as_ref(),
        );
    }

    for (referent, info) in &proof.revealed_attrs {
        let names = payload.requested_attributes[referent].attribute_names();
        referents[info.sub_proof_index as usize]
            .revealed
            .extend(names.into_iter().map(ToOwned::to_owned));
    }
    for (referent, info) in &proof.revealed_attr_groups {
        let names = payload.requested_attributes[referent].attribute_names();
        referents[info.sub_proof_index as usize]
            .revealed
            .extend(names.into_iter().map(ToOwned::to_owned));
    }
    for (referent, info) in &proof.predicates {
        referents[info.sub_proof_index as usize]
            .predicates
            .push(payload.requested_predicates[referent].clone());
    }
}

impl AnonCreds {
    pub fn generate_nonce(&self) -> RevocationResult<Nonce> {
        self.engine().new_nonce()
    }

    /// Checks `presentation` against `request`.
    ///
    /// Returns `Ok(false)` for presentations that legitimately fail: a revoked credential, a
    /// proof the engine rejects, revealed values that do not match the proof, a credential
    /// outside the request's restrictions, or a snapshot timestamp the verifier holds no
    /// revocation entry for. Public objects missing from the inputs are reported as errors.
    pub fn verify_presentation(
        &self,
        presentation: &Presentation,
        request: &PresentationRequest,
        schemas: &[&Schema],
        cred_defs: &[&CredentialDefinition],
        rev_reg_defs: &[&RevocationRegistryDefinition],
        rev_entries: &[RevocationEntry],
    ) -> RevocationResult<bool> {
        self.verify_presentation_with_override(
            presentation,
            request,
            schemas,
            cred_defs,
            rev_reg_defs,
            rev_entries,
            None,
        )
    }

    /// [`Self::verify_presentation`] for a verifier that accepts earlier snapshots than some
    /// intervals ask for. Per registry, `nonrevoke_interval_override` maps a requested `from`
    /// to the earliest timestamp accepted in its place.
    #[allow(clippy::too_many_arguments)]
    pub fn verify_presentation_with_override(
        &self,
        presentation: &Presentation,
        request: &PresentationRequest,
        schemas: &[&Schema],
        cred_defs: &[&CredentialDefinition],
        rev_reg_defs: &[&RevocationRegistryDefinition],
        rev_entries: &[RevocationEntry],
        nonrevoke_interval_override: Option<
            &HashMap<RevocationRegistryDefinitionId, HashMap<u64, u64>>,
        >,
    ) -> RevocationResult<bool> {
        trace!(
            "verify_presentation >>> request: {request:?}, identifiers: {:?}, \
             rev_entries: {}",
            presentation.identifiers,
            rev_entries.len()
        );

        request.validate()?;
        presentation.validate()?;
        if let Some(entry) = rev_entries
            .iter()
            .find(|entry| entry.def_entry_idx >= rev_reg_defs.len())
        {
            return Err(RevocationError::InvalidArgument(format!(
                "Revocation entry points at registry definition {} but only {} were given",
                entry.def_entry_idx,
                rev_reg_defs.len()
            )));
        }

        let payload = request.value();
        if let Some(reason) = structural_mismatch(payload, presentation) {
            warn!("verify_presentation: {reason}");
            return Ok(false);
        }
        if let Some(reason) = self.revealed_value_mismatch(payload, presentation)? {
            warn!("verify_presentation: {reason}");
            return Ok(false);
        }
        if let Some(reason) =
            restrictions::restriction_mismatch(payload, presentation, schemas, cred_defs)?
        {
            warn!("verify_presentation: {reason}");
            return Ok(false);
        }

        let mut referents: Vec<SubProofReferents> = presentation
            .identifiers
            .iter()
            .map(|_| SubProofReferents::default())
            .collect();
        collect_referents(payload, presentation, &mut referents);

        let mut checks = Vec::with_capacity(referents.len());
        for (identifier, mut referents) in presentation.identifiers.iter().zip(referents) {
            let schema = schemas
                .iter()
                .find(|schema| schema.id == identifier.schema_id)
                .ok_or_else(|| {
                    RevocationError::InvalidArgument(format!(
                        "Schema not provided for ID: {}",
                        identifier.schema_id
                    ))
                })?;
            let cred_def = cred_defs
                .iter()
                .find(|cred_def| cred_def.id == identifier.cred_def_id)
                .ok_or_else(|| {
                    RevocationError::InvalidArgument(format!(
                        "Credential definition not provided for ID: {}",
                        identifier.cred_def_id
                    ))
                })?;

            // The global interval applies only where no referent carries its own.
            if let (Some(global), None, None) = (
                payload.non_revoked.as_ref(),
                referents.interval.from,
                referents.interval.to,
            ) {
                referents.interval.compare_and_set(global);
            }
            let needs_revocation = cred_def.supports_revocation()
                && (referents.interval.from.is_some() || referents.interval.to.is_some());
            if let Some(accepted) = nonrevoke_interval_override
                .zip(identifier.rev_reg_id.as_ref())
                .and_then(|(overrides, rev_reg_id)| overrides.get(rev_reg_id))
            {
                referents.interval.update_with_override(accepted);
            }

            let revocation = if needs_revocation {
                match Self::revocation_snapshot(
                    identifier,
                    &referents.interval,
                    rev_reg_defs,
                    rev_entries,
                )? {
                    Some(snapshot) => Some(snapshot),
                    None => return Ok(false),
                }
            } else {
                None
            };

            checks.push(SubProofCheck {
                revealed: referents.revealed,
                predicates: referents.predicates,
                schema,
                cred_def,
                revocation,
            });
        }

        let valid = self
            .engine()
            .verify_proof(&presentation.proof, &payload.nonce, &checks)?;

        trace!("verify_presentation <<< valid: {valid}");
        Ok(valid)
    }

    /// Compares every revealed value with what the proof actually reveals, and checks that
    /// each raw value encodes to the claimed encoding.
    fn revealed_value_mismatch(
        &self,
        payload: &PresentationRequestPayload,
        presentation: &Presentation,
    ) -> RevocationResult<Option<String>> {
        let proof = &presentation.requested_proof;
        let mut claims: Vec<(u32, &str, &str, &str)> = Vec::new();

        for (referent, info) in &proof.revealed_attrs {
            match &payload.requested_attributes[referent].name {
                Some(name) => claims.push((
                    info.sub_proof_index,
                    name.as_str(),
                    info.raw.as_str(),
                    info.encoded.as_str(),
                )),
                None => return Ok(Some(format!("referent {referent} asks for a group"))),
            }
        }
        for (referent, group) in &proof.revealed_attr_groups {
            let Some(names) = &payload.requested_attributes[referent].names else {
                return Ok(Some(format!("referent {referent} asks for a single attribute")));
            };
            if names.len() != group.values.len() {
                return Ok(Some(format!(
                    "revealed group {referent} does not match the requested names"
                )));
            }
            for name in names {
                let Some(value) = group.values.get(name) else {
                    return Ok(Some(format!("revealed group {referent} misses {name}")));
                };
                claims.push((
                    group.sub_proof_index,
                    name.as_str(),
                    value.raw.as_str(),
                    value.encoded.as_str(),
                ));
            }
        }

        let mut revealed_by_proof: HashMap<u32, HashMap<String, String>> = HashMap::new();
        for (sub_proof_index, name, raw, encoded) in claims {
            if !revealed_by_proof.contains_key(&sub_proof_index) {
                let revealed = self
                    .engine()
                    .revealed_attrs(&presentation.proof, sub_proof_index as usize)?
                    .into_iter()
                    .map(|(key, value)| (attr_common_view(&key), value))
                    .collect();
                revealed_by_proof.insert(sub_proof_index, revealed);
            }
            let in_proof = revealed_by_proof
                .get(&sub_proof_index)
                .and_then(|revealed| revealed.get(&attr_common_view(name)));

            let encoded = encoded.trim_start_matches('0');
            let encoded = if encoded.is_empty() { "0" } else { encoded };
            match in_proof {
                None => return Ok(Some(format!("attribute {name} is not revealed by the proof"))),
                Some(in_proof) if in_proof != encoded => {
                    return Ok(Some(format!(
                        "encoded value of {name} differs from the one in the proof"
                    )))
                }
                Some(_) => {}
            }
            if encode_credential_attribute(raw)? != encoded {
                return Ok(Some(format!("raw value of {name} does not match its encoding")));
            }
        }
        Ok(None)
    }

    /// Finds the accumulator snapshot a sub-proof has to be checked against. `None` means the
    /// presentation cannot pass: no snapshot claimed, one outside the interval, or one the
    /// verifier holds no entry for.
    fn revocation_snapshot<'a>(
        identifier: &Identifier,
        interval: &NonRevokedInterval,
        rev_reg_defs: &[&'a RevocationRegistryDefinition],
        rev_entries: &'a [RevocationEntry],
    ) -> RevocationResult<Option<(&'a RevocationRegistryDefinition, &'a RevocationRegistry)>> {
        let (Some(rev_reg_id), Some(timestamp)) = (&identifier.rev_reg_id, identifier.timestamp)
        else {
            warn!(
                "verify_presentation: no non-revocation proof for credential of {}",
                identifier.cred_def_id
            );
            return Ok(None);
        };
        if interval.is_valid(timestamp).is_err() {
            warn!(
                "verify_presentation: timestamp {timestamp} outside of interval {interval:?}"
            );
            return Ok(None);
        }

        let def = rev_reg_defs
            .iter()
            .copied()
            .find(|def| &def.id == rev_reg_id)
            .ok_or_else(|| {
                RevocationError::InvalidArgument(format!(
                    "Revocation registry definition not provided for ID: {rev_reg_id}"
                ))
            })?;
        if def.cred_def_id != identifier.cred_def_id {
            warn!(
                "verify_presentation: registry {rev_reg_id} does not belong to {}",
                identifier.cred_def_id
            );
            return Ok(None);
        }

        let entry = rev_entries.iter().find(|entry| {
            entry.timestamp == timestamp && &rev_reg_defs[entry.def_entry_idx].id == rev_reg_id
        });
        match entry {
            Some(entry) => Ok(Some((def, &entry.registry))),
            None => {
                warn!(
                    "verify_presentation: no revocation entry for {rev_reg_id} at {timestamp}"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        prover::{CredentialEntry, CredentialProve},
        test_fixtures::{IssuerFixture, ISSUER_DID},
    };

    fn request(nonce: &Nonce) -> PresentationRequest {
        restricted_request(nonce, Value::Null, Value::Null)
    }

    /// `attr1_referent` and `predicate1_referent` carry the given restrictions; `null` means
    /// none.
    fn restricted_request(
        nonce: &Nonce,
        attr_restrictions: Value,
        predicate_restrictions: Value,
    ) -> PresentationRequest {
        serde_json::from_value(json!({
            "nonce": nonce.to_string(),
            "name": "proof",
            "version": "1.0",
            "requested_attributes": {
                "attr1_referent": { "name": "name", "restrictions": attr_restrictions },
                "attr2_referent": { "names": ["sex", "height"] }
            },
            "requested_predicates": {
                "predicate1_referent": {
                    "name": "age", "p_type": ">=", "p_value": 18,
                    "restrictions": predicate_restrictions
                }
            }
        }))
        .unwrap()
    }

    fn verify_plain(
        fixture: &IssuerFixture,
        presentation: &Presentation,
        request: &PresentationRequest,
    ) -> bool {
        fixture
            .anoncreds
            .verify_presentation(
                presentation,
                request,
                &[&fixture.schema],
                &[&fixture.cred_def],
                &[],
                &[],
            )
            .unwrap()
    }

    fn presentation(fixture: &IssuerFixture, request: &PresentationRequest) -> Presentation {
        let (credential, _, _) = fixture.issue(None).unwrap();
        fixture
            .anoncreds
            .create_presentation(
                request,
                &[CredentialEntry {
                    credential: &credential,
                    timestamp: None,
                    rev_state: None,
                }],
                &[
                    CredentialProve::attribute(0, "attr1_referent", true),
                    CredentialProve::attribute(0, "attr2_referent", true),
                    CredentialProve::predicate(0, "predicate1_referent"),
                ],
                HashMap::new(),
                &fixture.link_secret,
                &[&fixture.schema],
                &[&fixture.cred_def],
            )
            .unwrap()
    }

    #[test]
    fn verifies_presentation_without_revocation() {
        let fixture = IssuerFixture::new(false);
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let request = request(&nonce);
        let presentation = presentation(&fixture, &request);

        assert!(fixture
            .anoncreds
            .verify_presentation(
                &presentation,
                &request,
                &[&fixture.schema],
                &[&fixture.cred_def],
                &[],
                &[],
            )
            .unwrap());
    }

    #[test]
    fn tampered_revealed_value_fails() {
        let fixture = IssuerFixture::new(false);
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let request = request(&nonce);
        let mut presentation = presentation(&fixture, &request);

        let revealed = presentation
            .requested_proof
            .revealed_attrs
            .get_mut("attr1_referent")
            .unwrap();
        revealed.raw = "Mallory".to_owned();
        revealed.encoded = encode_credential_attribute("Mallory").unwrap();

        assert!(!fixture
            .anoncreds
            .verify_presentation(
                &presentation,
                &request,
                &[&fixture.schema],
                &[&fixture.cred_def],
                &[],
                &[],
            )
            .unwrap());
    }

    #[test]
    fn different_nonce_fails() {
        let fixture = IssuerFixture::new(false);
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let presentation = presentation(&fixture, &request(&nonce));
        let other = request(&fixture.anoncreds.generate_nonce().unwrap());

        assert!(!fixture
            .anoncreds
            .verify_presentation(
                &presentation,
                &other,
                &[&fixture.schema],
                &[&fixture.cred_def],
                &[],
                &[],
            )
            .unwrap());
    }

    #[test]
    fn missing_referent_fails() {
        let fixture = IssuerFixture::new(false);
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let request = request(&nonce);
        let mut presentation = presentation(&fixture, &request);
        presentation.requested_proof.predicates.clear();

        assert!(!fixture
            .anoncreds
            .verify_presentation(
                &presentation,
                &request,
                &[&fixture.schema],
                &[&fixture.cred_def],
                &[],
                &[],
            )
            .unwrap());
    }

    #[test]
    fn missing_public_objects_are_errors() {
        let fixture = IssuerFixture::new(false);
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let request = request(&nonce);
        let presentation = presentation(&fixture, &request);

        assert!(matches!(
            fixture.anoncreds.verify_presentation(
                &presentation,
                &request,
                &[],
                &[&fixture.cred_def],
                &[],
                &[],
            ),
            Err(RevocationError::InvalidArgument(_))
        ));
        assert!(matches!(
            fixture.anoncreds.verify_presentation(
                &presentation,
                &request,
                &[&fixture.schema],
                &[],
                &[],
                &[],
            ),
            Err(RevocationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn restrictions_select_the_credential() {
        let fixture = IssuerFixture::new(false);
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let cred_def_id = fixture.cred_def.id.to_string();

        let satisfied = [
            (json!({ "schema_name": fixture.schema.name }), Value::Null),
            (json!([{ "issuer_did": ISSUER_DID }, { "schema_name": "other" }]), Value::Null),
            (json!({ "attr::name::value": "Alex" }), json!({ "cred_def_id": cred_def_id })),
            (
                json!({ "schema_version": { "$in": ["0.1", fixture.schema.version] } }),
                json!({ "attr::sex::value": "male", "attr::age::marker": "1" }),
            ),
        ];
        for (attr, predicate) in satisfied {
            let request = restricted_request(&nonce, attr.clone(), predicate.clone());
            let presentation = presentation(&fixture, &request);
            assert!(
                verify_plain(&fixture, &presentation, &request),
                "restrictions {attr} / {predicate} should hold"
            );
        }

        let violated = [
            (json!({ "schema_name": "other" }), Value::Null),
            (json!({ "attr::name::value": "Bob" }), Value::Null),
            (json!({ "$not": { "issuer_did": ISSUER_DID } }), Value::Null),
            (Value::Null, json!({ "cred_def_id": { "$neq": cred_def_id } })),
            (Value::Null, json!({ "attr::name::value": "Bob" })),
        ];
        for (attr, predicate) in violated {
            let request = restricted_request(&nonce, attr.clone(), predicate.clone());
            let presentation = presentation(&fixture, &request);
            assert!(
                !verify_plain(&fixture, &presentation, &request),
                "restrictions {attr} / {predicate} should fail"
            );
        }
    }

    #[test]
    fn restricted_attribute_cannot_be_self_attested() {
        let fixture = IssuerFixture::new(false);
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let request: PresentationRequest = serde_json::from_value(json!({
            "nonce": nonce.to_string(),
            "name": "proof",
            "version": "1.0",
            "requested_attributes": {
                "attr1_referent": { "name": "name" },
                "phone_referent": { "name": "phone", "restrictions": { "schema_name": "gvt" } }
            }
        }))
        .unwrap();
        let (credential, _, _) = fixture.issue(None).unwrap();
        let presentation = fixture
            .anoncreds
            .create_presentation(
                &request,
                &[CredentialEntry {
                    credential: &credential,
                    timestamp: None,
                    rev_state: None,
                }],
                &[CredentialProve::attribute(0, "attr1_referent", true)],
                HashMap::from([("phone_referent".to_owned(), "8-800-300".to_owned())]),
                &fixture.link_secret,
                &[&fixture.schema],
                &[&fixture.cred_def],
            )
            .unwrap();

        assert!(!verify_plain(&fixture, &presentation, &request));
    }

    #[test]
    fn revocation_entry_serializes() {
        let fixture = IssuerFixture::new(true);
        let (_, _, registry, _) = fixture.registry(
            anoncreds_types::data_types::ledger::rev_reg_def::IssuanceType::ISSUANCE_BY_DEFAULT,
            5,
        );
        let entry = RevocationEntry {
            def_entry_idx: 0,
            registry,
            timestamp: 42,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: RevocationEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
