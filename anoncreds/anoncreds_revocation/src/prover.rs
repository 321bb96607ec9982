use std::collections::{BTreeMap, HashMap, HashSet};

use anoncreds_types::{
    data_types::{
        ledger::{
            cred_def::CredentialDefinition, rev_reg_def::RevocationRegistryDefinition,
            schema::Schema,
        },
        messages::{
            cred_offer::CredentialOffer,
            cred_request::{CredentialRequest, CredentialRequestMetadata},
            credential::{AttributeValues, Credential},
            link_secret::LinkSecret,
            pres_request::{PredicateInfo, PresentationRequest, PresentationRequestPayload},
            presentation::{
                AttributeValue, Identifier, Presentation, RequestedProof,
                RevealedAttributeGroupInfo, RevealedAttributeInfo, SubProofReferent,
            },
            revocation_state::CredentialRevocationState,
        },
    },
    utils::{encoding::attr_common_view, validation::Validatable},
};

use crate::{
    anoncreds::AnonCreds,
    engine::SubProofInput,
    errors::error::{RevocationError, RevocationResult},
};

/// A processed credential offered for a presentation, with the revocation state the holder
/// proves non-revocation with.
#[derive(Debug, Clone, Copy)]
pub struct CredentialEntry<'a> {
    pub credential: &'a Credential,
    /// Snapshot time claimed for the revocation state. Defaults to the state's own timestamp.
    pub timestamp: Option<u64>,
    pub rev_state: Option<&'a CredentialRevocationState>,
}

/// Which entry answers which referent of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialProve {
    pub entry_idx: usize,
    pub referent: String,
    pub is_predicate: bool,
    /// Ignored for predicates.
    pub reveal: bool,
}

impl CredentialProve {
    pub fn attribute(entry_idx: usize, referent: impl Into<String>, reveal: bool) -> Self {
        Self {
            entry_idx,
            referent: referent.into(),
            is_predicate: false,
            reveal,
        }
    }

    pub fn predicate(entry_idx: usize, referent: impl Into<String>) -> Self {
        Self {
            entry_idx,
            referent: referent.into(),
            is_predicate: true,
            reveal: false,
        }
    }
}

#[derive(Debug, Default)]
struct EntryReferents<'a> {
    attributes: Vec<(&'a str, bool)>,
    predicates: Vec<&'a str>,
}

fn credential_value<'a>(credential: &'a Credential, name: &str) -> RevocationResult<&'a AttributeValues> {
    credential
        .values
        .0
        .iter()
        .find(|(key, _)| attr_common_view(key) == attr_common_view(name))
        .map(|(_, value)| value)
        .ok_or_else(|| {
            RevocationError::InvalidArgument(format!(
                "Credential {} carries no value for attribute {name}",
                credential.cred_def_id
            ))
        })
}

fn check_proves(
    request: &PresentationRequestPayload,
    entries: usize,
    proves: &[CredentialProve],
    self_attested: &HashMap<String, String>,
) -> RevocationResult<()> {
    let mut covered_attrs = HashSet::new();
    let mut covered_preds = HashSet::new();

    for prove in proves {
        if prove.entry_idx >= entries {
            return Err(RevocationError::InvalidArgument(format!(
                "Referent {} points at credential entry {} but only {entries} were given",
                prove.referent, prove.entry_idx
            )));
        }
        let (known, covered) = if prove.is_predicate {
            (
                request.requested_predicates.contains_key(&prove.referent),
                &mut covered_preds,
            )
        } else {
            (
                request.requested_attributes.contains_key(&prove.referent),
                &mut covered_attrs,
            )
        };
        if !known {
            return Err(RevocationError::InvalidArgument(format!(
                "Referent {} is not part of the presentation request",
                prove.referent
            )));
        }
        if !covered.insert(prove.referent.as_str()) {
            return Err(RevocationError::InvalidArgument(format!(
                "Referent {} is proven more than once",
                prove.referent
            )));
        }
    }

    for referent in self_attested.keys() {
        if !request.requested_attributes.contains_key(referent) {
            return Err(RevocationError::InvalidArgument(format!(
                "Self-attested referent {referent} is not part of the presentation request"
            )));
        }
        if !covered_attrs.insert(referent.as_str()) {
            return Err(RevocationError::InvalidArgument(format!(
                "Referent {referent} is both self-attested and proven by a credential"
            )));
        }
    }

    if let Some(referent) = request
        .requested_attributes
        .keys()
        .find(|referent| !covered_attrs.contains(referent.as_str()))
    {
        return Err(RevocationError::InvalidArgument(format!(
            "Requested attribute {referent} is not covered"
        )));
    }
    if let Some(referent) = request
        .requested_predicates
        .keys()
        .find(|referent| !covered_preds.contains(referent.as_str()))
    {
        return Err(RevocationError::InvalidArgument(format!(
            "Requested predicate {referent} is not covered"
        )));
    }

    // A sub-proof cannot reveal an attribute it also proves a predicate over.
    let revealed: HashSet<(usize, String)> = proves
        .iter()
        .filter(|prove| !prove.is_predicate && prove.reveal)
        .flat_map(|prove| {
            request.requested_attributes[&prove.referent]
                .attribute_names()
                .into_iter()
                .map(move |name| (prove.entry_idx, attr_common_view(name)))
        })
        .collect();
    for prove in proves.iter().filter(|prove| prove.is_predicate) {
        let name = &request.requested_predicates[&prove.referent].name;
        if revealed.contains(&(prove.entry_idx, attr_common_view(name))) {
            return Err(RevocationError::InvalidArgument(format!(
                "Attribute {name} of credential entry {} is revealed and used in predicate {}",
                prove.entry_idx, prove.referent
            )));
        }
    }
    Ok(())
}

impl AnonCreds {
    pub fn create_link_secret(&self) -> RevocationResult<LinkSecret> {
        Ok(LinkSecret::new()?)
    }

    /// Blinds the link secret for the issuer of `offer`.
    ///
    /// Legacy identifiers accept the holder DID as request entropy; with any other
    /// identifiers a DID must not be given and random entropy is used instead.
    pub fn create_credential_request(
        &self,
        prover_did: Option<&str>,
        cred_def: &CredentialDefinition,
        link_secret: &LinkSecret,
        link_secret_name: &str,
        offer: &CredentialOffer,
    ) -> RevocationResult<(CredentialRequest, CredentialRequestMetadata)> {
        trace!(
            "create_credential_request >>> prover_did: {prover_did:?}, cred_def_id: {}, \
             link_secret: {:?}, link_secret_name: {link_secret_name}, offer: {offer:?}",
            cred_def.id,
            secret!(link_secret)
        );

        offer.validate()?;
        if offer.cred_def_id != cred_def.id {
            return Err(RevocationError::InvalidArgument(format!(
                "Offer targets credential definition {}, not {}",
                offer.cred_def_id, cred_def.id
            )));
        }
        if prover_did.is_some() && !(cred_def.schema_id.is_legacy() || cred_def.issuer_id.is_legacy())
        {
            return Err(RevocationError::InvalidArgument(
                "Prover did must not be supplied when using new identifiers".into(),
            ));
        }

        let blinded = self.engine().blind_link_secret(
            cred_def,
            &offer.key_correctness_proof,
            link_secret,
            &offer.nonce,
        )?;
        let nonce = self.engine().new_nonce()?;
        let entropy = match prover_did {
            Some(_) => None,
            None => Some(self.engine().new_nonce()?.to_string()),
        };

        let request = CredentialRequest {
            entropy,
            prover_did: prover_did.map(ToOwned::to_owned),
            cred_def_id: offer.cred_def_id.clone(),
            blinded_ms: blinded.blinded,
            blinded_ms_correctness_proof: blinded.correctness_proof,
            nonce: nonce.try_clone()?,
        };
        request.validate()?;
        let metadata = CredentialRequestMetadata {
            link_secret_blinding_data: blinded.blinding_factors,
            nonce,
            link_secret_name: link_secret_name.to_owned(),
        };

        trace!(
            "create_credential_request <<< request: {request:?}, metadata: {:?}",
            secret!(&metadata)
        );
        Ok((request, metadata))
    }

    /// Unblinds a received credential in place and checks it against the issuer's keys. A
    /// revocable credential needs the definition of its registry to check its witness.
    pub fn process_credential(
        &self,
        credential: &mut Credential,
        metadata: &CredentialRequestMetadata,
        link_secret: &LinkSecret,
        cred_def: &CredentialDefinition,
        rev_reg_def: Option<&RevocationRegistryDefinition>,
    ) -> RevocationResult<()> {
        trace!(
            "process_credential >>> credential: {:?}, cred_def_id: {}, rev_reg_def_id: {:?}",
            secret!(&credential),
            cred_def.id,
            rev_reg_def.map(|def| &def.id)
        );

        credential.validate()?;
        if credential.cred_def_id != cred_def.id {
            return Err(RevocationError::InvalidArgument(format!(
                "Credential was issued under {}, not {}",
                credential.cred_def_id, cred_def.id
            )));
        }
        let accum_key = match (&credential.rev_reg_id, rev_reg_def) {
            (Some(rev_reg_id), Some(def)) if rev_reg_id == &def.id => {
                Some(&def.value.public_keys.accum_key)
            }
            (Some(rev_reg_id), _) => {
                return Err(RevocationError::InvalidArgument(format!(
                    "Revocable credential needs the definition of registry {rev_reg_id}"
                )))
            }
            (None, _) => None,
        };

        self.engine()
            .process(credential, metadata, link_secret, cred_def, accum_key)?;

        trace!("process_credential <<<");
        Ok(())
    }

    /// Builds a presentation answering `request`.
    ///
    /// Every requested referent is answered by exactly one prove or self-attested value.
    /// Entries that no prove points at are left out. The revocation state of an entry is only
    /// used when one of its referents falls under a non-revocation interval.
    #[allow(clippy::too_many_arguments)]
    pub fn create_presentation(
        &self,
        request: &PresentationRequest,
        entries: &[CredentialEntry<'_>],
        proves: &[CredentialProve],
        self_attested: HashMap<String, String>,
        link_secret: &LinkSecret,
        schemas: &[&Schema],
        cred_defs: &[&CredentialDefinition],
    ) -> RevocationResult<Presentation> {
        trace!(
            "create_presentation >>> request: {request:?}, entries: {}, proves: {proves:?}, \
             self_attested: {:?}, link_secret: {:?}",
            entries.len(),
            secret!(&self_attested),
            secret!(link_secret)
        );

        request.validate()?;
        let payload = request.value();
        if proves.is_empty() && self_attested.is_empty() {
            return Err(RevocationError::InvalidArgument(
                "No credential mapping or self-attested attributes presented".into(),
            ));
        }
        check_proves(payload, entries.len(), proves, &self_attested)?;

        let mut by_entry: BTreeMap<usize, EntryReferents<'_>> = BTreeMap::new();
        for prove in proves {
            let referents = by_entry.entry(prove.entry_idx).or_default();
            if prove.is_predicate {
                referents.predicates.push(prove.referent.as_str());
            } else {
                referents.attributes.push((prove.referent.as_str(), prove.reveal));
            }
        }

        let mut requested_proof = RequestedProof {
            self_attested_attrs: self_attested,
            ..RequestedProof::default()
        };
        let mut identifiers = Vec::with_capacity(by_entry.len());
        let mut sub_proofs = Vec::with_capacity(by_entry.len());

        for (sub_proof_index, (entry_idx, referents)) in by_entry.into_iter().enumerate() {
            let entry = &entries[entry_idx];
            let credential = entry.credential;
            let sub_proof_index = u32::try_from(sub_proof_index).map_err(|_| {
                RevocationError::InvalidArgument("Too many credentials in one presentation".into())
            })?;

            let schema = schemas
                .iter()
                .find(|schema| schema.id == credential.schema_id)
                .ok_or_else(|| {
                    RevocationError::InvalidArgument(format!(
                        "Schema not provided for ID: {}",
                        credential.schema_id
                    ))
                })?;
            let cred_def = cred_defs
                .iter()
                .find(|cred_def| cred_def.id == credential.cred_def_id)
                .ok_or_else(|| {
                    RevocationError::InvalidArgument(format!(
                        "Credential definition not provided for ID: {}",
                        credential.cred_def_id
                    ))
                })?;

            let mut revealed = Vec::new();
            let mut needs_revocation = false;
            for (referent, reveal) in &referents.attributes {
                let info = &payload.requested_attributes[*referent];
                needs_revocation |= payload.non_revoked_for_attribute(referent).is_some();
                if !reveal {
                    requested_proof.unrevealed_attrs.insert(
                        (*referent).to_owned(),
                        SubProofReferent { sub_proof_index },
                    );
                    continue;
                }
                match (&info.name, &info.names) {
                    (Some(name), _) => {
                        let value = credential_value(credential, name)?;
                        requested_proof.revealed_attrs.insert(
                            (*referent).to_owned(),
                            RevealedAttributeInfo {
                                sub_proof_index,
                                raw: value.raw.clone(),
                                encoded: value.encoded.clone(),
                            },
                        );
                        revealed.push(name.clone());
                    }
                    (None, Some(names)) => {
                        let mut values = HashMap::with_capacity(names.len());
                        for name in names {
                            let value = credential_value(credential, name)?;
                            values.insert(
                                name.clone(),
                                AttributeValue {
                                    raw: value.raw.clone(),
                                    encoded: value.encoded.clone(),
                                },
                            );
                            revealed.push(name.clone());
                        }
                        requested_proof.revealed_attr_groups.insert(
                            (*referent).to_owned(),
                            RevealedAttributeGroupInfo {
                                sub_proof_index,
                                values,
                            },
                        );
                    }
                    (None, None) => {}
                }
            }

            let mut predicates: Vec<PredicateInfo> = Vec::with_capacity(referents.predicates.len());
            for referent in &referents.predicates {
                needs_revocation |= payload.non_revoked_for_predicate(referent).is_some();
                predicates.push(payload.requested_predicates[*referent].clone());
                requested_proof
                    .predicates
                    .insert((*referent).to_owned(), SubProofReferent { sub_proof_index });
            }

            let rev_state = match (needs_revocation, &credential.rev_reg_id, entry.rev_state) {
                (true, Some(_), Some(state)) => Some(state),
                (true, Some(rev_reg_id), None) => {
                    return Err(RevocationError::InvalidArgument(format!(
                        "A revocation state for registry {rev_reg_id} is needed to prove \
                         non-revocation"
                    )))
                }
                _ => None,
            };
            identifiers.push(Identifier {
                schema_id: credential.schema_id.clone(),
                cred_def_id: credential.cred_def_id.clone(),
                rev_reg_id: rev_state.and(credential.rev_reg_id.clone()),
                timestamp: rev_state.map(|state| entry.timestamp.unwrap_or(state.timestamp)),
            });
            sub_proofs.push(SubProofInput {
                revealed,
                predicates,
                schema,
                cred_def,
                credential,
                rev_state,
            });
        }

        let proof = self
            .engine()
            .build_proof(&payload.nonce, link_secret, &sub_proofs)?;
        let presentation = Presentation {
            proof,
            requested_proof,
            identifiers,
        };

        trace!(
            "create_presentation <<< requested_proof: {:?}, identifiers: {:?}",
            secret!(&presentation.requested_proof),
            presentation.identifiers
        );
        Ok(presentation)
    }
}

#[cfg(test)]
mod tests {
    use anoncreds_types::data_types::messages::nonce::Nonce;

    use super::*;
    use crate::test_fixtures::{self, IssuerFixture};

    fn request(payload: serde_json::Value) -> PresentationRequest {
        serde_json::from_value(payload).unwrap()
    }

    fn simple_request(nonce: &Nonce) -> PresentationRequest {
        request(serde_json::json!({
            "nonce": nonce.to_string(),
            "name": "proof",
            "version": "1.0",
            "requested_attributes": {
                "attr1_referent": { "name": "name" },
                "attr2_referent": { "name": "sex" },
                "self_referent": { "name": "phone" }
            },
            "requested_predicates": {
                "predicate1_referent": { "name": "age", "p_type": ">=", "p_value": 18 }
            }
        }))
    }

    #[test]
    fn credential_request_uses_random_entropy_without_did() {
        let fixture = IssuerFixture::new(false);
        let offer = fixture
            .anoncreds
            .create_credential_offer(&fixture.cred_def, &fixture.kcp)
            .unwrap();
        let (request, metadata) = fixture
            .anoncreds
            .create_credential_request(
                None,
                &fixture.cred_def,
                &fixture.link_secret,
                "default",
                &offer,
            )
            .unwrap();
        assert!(request.entropy.is_some());
        assert!(request.prover_did.is_none());
        assert_eq!(metadata.nonce, request.nonce);
        assert_eq!(metadata.link_secret_name, "default");

        let (request, _) = fixture
            .anoncreds
            .create_credential_request(
                Some(test_fixtures::PROVER_DID),
                &fixture.cred_def,
                &fixture.link_secret,
                "default",
                &offer,
            )
            .unwrap();
        assert_eq!(request.prover_did.as_deref(), Some(test_fixtures::PROVER_DID));
        assert!(request.entropy.is_none());
    }

    #[test]
    fn process_requires_registry_definition_for_revocable_credential() {
        let fixture = IssuerFixture::new(true);
        let (credential, metadata) = fixture.issue_unprocessed_revocable(3);
        let mut credential = credential;
        let err = fixture
            .anoncreds
            .process_credential(
                &mut credential,
                &metadata,
                &fixture.link_secret,
                &fixture.cred_def,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, RevocationError::InvalidArgument(_)));
    }

    #[test]
    fn presentation_maps_referents_to_sub_proofs() {
        let fixture = IssuerFixture::new(false);
        let (credential, _, _) = fixture.issue(None).unwrap();
        let nonce = fixture.anoncreds.generate_nonce().unwrap();

        let presentation = fixture
            .anoncreds
            .create_presentation(
                &simple_request(&nonce),
                &[CredentialEntry {
                    credential: &credential,
                    timestamp: None,
                    rev_state: None,
                }],
                &[
                    CredentialProve::attribute(0, "attr1_referent", true),
                    CredentialProve::attribute(0, "attr2_referent", false),
                    CredentialProve::predicate(0, "predicate1_referent"),
                ],
                HashMap::from([("self_referent".to_owned(), "8-800-300".to_owned())]),
                &fixture.link_secret,
                &[&fixture.schema],
                &[&fixture.cred_def],
            )
            .unwrap();

        let proof = &presentation.requested_proof;
        assert_eq!(proof.revealed_attrs["attr1_referent"].raw, "Alex");
        assert_eq!(proof.unrevealed_attrs["attr2_referent"].sub_proof_index, 0);
        assert_eq!(proof.predicates["predicate1_referent"].sub_proof_index, 0);
        assert_eq!(proof.self_attested_attrs["self_referent"], "8-800-300");
        assert_eq!(presentation.identifiers.len(), 1);
        assert!(presentation.identifiers[0].rev_reg_id.is_none());
        assert!(presentation.identifiers[0].timestamp.is_none());
    }

    #[test]
    fn presentation_rejects_bad_prove_mappings() {
        let fixture = IssuerFixture::new(false);
        let (credential, _, _) = fixture.issue(None).unwrap();
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let request = simple_request(&nonce);
        let entries = [CredentialEntry {
            credential: &credential,
            timestamp: None,
            rev_state: None,
        }];
        let self_attested =
            || HashMap::from([("self_referent".to_owned(), "8-800-300".to_owned())]);

        let build = |proves: &[CredentialProve], self_attested: HashMap<String, String>| {
            fixture.anoncreds.create_presentation(
                &request,
                &entries,
                proves,
                self_attested,
                &fixture.link_secret,
                &[&fixture.schema],
                &[&fixture.cred_def],
            )
        };

        let missing_entry = [
            CredentialProve::attribute(1, "attr1_referent", true),
            CredentialProve::attribute(0, "attr2_referent", true),
            CredentialProve::predicate(0, "predicate1_referent"),
        ];
        assert!(matches!(
            build(&missing_entry, self_attested()),
            Err(RevocationError::InvalidArgument(_))
        ));

        let uncovered = [
            CredentialProve::attribute(0, "attr1_referent", true),
            CredentialProve::predicate(0, "predicate1_referent"),
        ];
        assert!(matches!(
            build(&uncovered, self_attested()),
            Err(RevocationError::InvalidArgument(_))
        ));

        let duplicated = [
            CredentialProve::attribute(0, "attr1_referent", true),
            CredentialProve::attribute(0, "attr1_referent", false),
            CredentialProve::attribute(0, "attr2_referent", true),
            CredentialProve::predicate(0, "predicate1_referent"),
        ];
        assert!(matches!(
            build(&duplicated, self_attested()),
            Err(RevocationError::InvalidArgument(_))
        ));

        let unknown = [
            CredentialProve::attribute(0, "attr1_referent", true),
            CredentialProve::attribute(0, "attr2_referent", true),
            CredentialProve::predicate(0, "predicate1_referent"),
            CredentialProve::predicate(0, "predicate9_referent"),
        ];
        assert!(matches!(
            build(&unknown, self_attested()),
            Err(RevocationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn presentation_rejects_revealing_a_predicate_attribute() {
        let fixture = IssuerFixture::new(false);
        let (credential, _, _) = fixture.issue(None).unwrap();
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let request = request(serde_json::json!({
            "nonce": nonce.to_string(),
            "name": "proof",
            "version": "1.0",
            "requested_attributes": {
                "attr1_referent": { "name": "name" },
                "attr2_referent": { "names": ["sex", "Age"] }
            },
            "requested_predicates": {
                "predicate1_referent": { "name": "age", "p_type": ">=", "p_value": 18 }
            }
        }));
        let entries = [CredentialEntry {
            credential: &credential,
            timestamp: None,
            rev_state: None,
        }];
        let build = |reveal_group: bool| {
            fixture.anoncreds.create_presentation(
                &request,
                &entries,
                &[
                    CredentialProve::attribute(0, "attr1_referent", true),
                    CredentialProve::attribute(0, "attr2_referent", reveal_group),
                    CredentialProve::predicate(0, "predicate1_referent"),
                ],
                HashMap::new(),
                &fixture.link_secret,
                &[&fixture.schema],
                &[&fixture.cred_def],
            )
        };

        assert!(matches!(build(true), Err(RevocationError::InvalidArgument(_))));
        assert!(build(false).is_ok());
    }

    #[test]
    fn presentation_requires_state_under_interval() {
        let fixture = IssuerFixture::new(true);
        let (credential, _) = fixture.issue_revocable(4);
        let nonce = fixture.anoncreds.generate_nonce().unwrap();
        let request = request(serde_json::json!({
            "nonce": nonce.to_string(),
            "name": "proof",
            "version": "1.0",
            "requested_attributes": {
                "attr1_referent": { "name": "name" }
            },
            "non_revoked": { "to": 100 }
        }));

        let err = fixture
            .anoncreds
            .create_presentation(
                &request,
                &[CredentialEntry {
                    credential: &credential,
                    timestamp: Some(100),
                    rev_state: None,
                }],
                &[CredentialProve::attribute(0, "attr1_referent", true)],
                HashMap::new(),
                &fixture.link_secret,
                &[&fixture.schema],
                &[&fixture.cred_def],
            )
            .unwrap_err();
        assert!(matches!(err, RevocationError::InvalidArgument(_)));
    }
}
