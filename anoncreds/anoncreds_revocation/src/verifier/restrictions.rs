use std::collections::HashMap;

use anoncreds_types::{
    data_types::{
        ledger::{cred_def::CredentialDefinition, schema::Schema},
        messages::{
            pres_request::PresentationRequestPayload,
            presentation::{Identifier, Presentation},
        },
    },
    utils::{encoding::attr_common_view, query::Query},
};

use crate::errors::error::{RevocationError, RevocationResult};

/// Public objects behind one sub-proof, plus the attributes a referent covers mapped to their
/// raw value where revealed.
struct Subject<'a> {
    identifier: &'a Identifier,
    schema: &'a Schema,
    cred_def: &'a CredentialDefinition,
    attributes: HashMap<String, Option<&'a str>>,
}

impl Subject<'_> {
    fn satisfies(&self, query: &Query) -> bool {
        match query {
            Query::Eq(tag, value) => self.matches(tag, value),
            Query::Neq(tag, value) => !self.matches(tag, value),
            Query::In(tag, values) => values.iter().any(|value| self.matches(tag, value)),
            Query::And(queries) => queries.iter().all(|query| self.satisfies(query)),
            Query::Or(queries) => {
                queries.is_empty() || queries.iter().any(|query| self.satisfies(query))
            }
            Query::Not(query) => !self.satisfies(query),
        }
    }

    fn matches(&self, tag: &str, value: &str) -> bool {
        let schema = self.schema;
        let cred_def = self.cred_def;
        match tag {
            "schema_id" => self.identifier.schema_id.0 == value,
            "schema_issuer_id" => schema.issuer_id.0 == value,
            "schema_issuer_did" => schema.issuer_id.is_legacy() && schema.issuer_id.0 == value,
            "schema_name" => schema.name == value,
            "schema_version" => schema.version == value,
            "cred_def_id" => self.identifier.cred_def_id.0 == value,
            "issuer_id" => cred_def.issuer_id.0 == value,
            "issuer_did" => cred_def.issuer_id.is_legacy() && cred_def.issuer_id.0 == value,
            _ => self.matches_attribute(tag, value),
        }
    }

    /// `attr::<name>::marker` asks that the referent covers `name`; `attr::<name>::value`
    /// additionally pins its revealed value. Unrevealed values cannot be checked here.
    fn matches_attribute(&self, tag: &str, value: &str) -> bool {
        let Some(rest) = tag.strip_prefix("attr::") else {
            return false;
        };
        let (name, pins_value) = if let Some(name) = rest.strip_suffix("::value") {
            (name, true)
        } else if let Some(name) = rest.strip_suffix("::marker") {
            (name, false)
        } else {
            return false;
        };
        match self.attributes.get(&attr_common_view(name)) {
            None => false,
            Some(Some(raw)) if pins_value => *raw == value,
            Some(_) => true,
        }
    }
}

struct Lookup<'a> {
    presentation: &'a Presentation,
    schemas: &'a [&'a Schema],
    cred_defs: &'a [&'a CredentialDefinition],
}

impl<'a> Lookup<'a> {
    fn subject(&self, sub_proof_index: u32) -> RevocationResult<Subject<'a>> {
        let identifier = self
            .presentation
            .identifiers
            .get(sub_proof_index as usize)
            .ok_or_else(|| {
                RevocationError::InvalidState(format!(
                    "No identifier for sub-proof {sub_proof_index}"
                ))
            })?;
        let schema = self
            .schemas
            .iter()
            .copied()
            .find(|schema| schema.id == identifier.schema_id)
            .ok_or_else(|| {
                RevocationError::InvalidArgument(format!(
                    "Schema not provided for ID: {}",
                    identifier.schema_id
                ))
            })?;
        let cred_def = self
            .cred_defs
            .iter()
            .copied()
            .find(|cred_def| cred_def.id == identifier.cred_def_id)
            .ok_or_else(|| {
                RevocationError::InvalidArgument(format!(
                    "Credential definition not provided for ID: {}",
                    identifier.cred_def_id
                ))
            })?;
        Ok(Subject {
            identifier,
            schema,
            cred_def,
            attributes: HashMap::new(),
        })
    }

    /// Values revealed by one sub-proof across every revealed referent.
    fn revealed_by(
        &self,
        payload: &PresentationRequestPayload,
        sub_proof_index: u32,
    ) -> HashMap<String, Option<&'a str>> {
        let proof = &self.presentation.requested_proof;
        let mut revealed = HashMap::new();
        for (referent, info) in &proof.revealed_attrs {
            if info.sub_proof_index != sub_proof_index {
                continue;
            }
            if let Some(name) = payload
                .requested_attributes
                .get(referent)
                .and_then(|requested| requested.name.as_ref())
            {
                revealed.insert(attr_common_view(name), Some(info.raw.as_str()));
            }
        }
        for group in proof
            .revealed_attr_groups
            .values()
            .filter(|group| group.sub_proof_index == sub_proof_index)
        {
            for (name, value) in &group.values {
                revealed.insert(attr_common_view(name), Some(value.raw.as_str()));
            }
        }
        revealed
    }
}

/// Returns why the presentation fails a restriction of the request, if it does.
///
/// Self-attested referents pass only when unrestricted. Missing public objects are errors, as
/// everywhere else in verification.
pub(super) fn restriction_mismatch(
    payload: &PresentationRequestPayload,
    presentation: &Presentation,
    schemas: &[&Schema],
    cred_defs: &[&CredentialDefinition],
) -> RevocationResult<Option<String>> {
    let lookup = Lookup {
        presentation,
        schemas,
        cred_defs,
    };
    let proof = &presentation.requested_proof;

    for (referent, info) in &payload.requested_attributes {
        let Some(query) = info.restrictions.as_ref().filter(|query| !query.is_empty()) else {
            continue;
        };
        if proof.self_attested_attrs.contains_key(referent) {
            return Ok(Some(format!(
                "restricted attribute {referent} is self-attested"
            )));
        }

        let mut subject = if let Some(revealed) = proof.revealed_attrs.get(referent) {
            let mut subject = lookup.subject(revealed.sub_proof_index)?;
            for name in info.attribute_names() {
                subject
                    .attributes
                    .insert(attr_common_view(name), Some(revealed.raw.as_str()));
            }
            subject
        } else if let Some(group) = proof.revealed_attr_groups.get(referent) {
            let mut subject = lookup.subject(group.sub_proof_index)?;
            for (name, value) in &group.values {
                subject
                    .attributes
                    .insert(attr_common_view(name), Some(value.raw.as_str()));
            }
            subject
        } else if let Some(unrevealed) = proof.unrevealed_attrs.get(referent) {
            lookup.subject(unrevealed.sub_proof_index)?
        } else {
            return Ok(Some(format!("restricted attribute {referent} is not proven")));
        };
        for name in info.attribute_names() {
            subject
                .attributes
                .entry(attr_common_view(name))
                .or_insert(None);
        }

        if !subject.satisfies(query) {
            return Ok(Some(format!(
                "attribute {referent} does not satisfy its restrictions"
            )));
        }
    }

    for (referent, info) in &payload.requested_predicates {
        let Some(query) = info.restrictions.as_ref().filter(|query| !query.is_empty()) else {
            continue;
        };
        let Some(predicate) = proof.predicates.get(referent) else {
            return Ok(Some(format!("restricted predicate {referent} is not proven")));
        };
        let index = predicate.sub_proof_index;
        let mut subject = lookup.subject(index)?;

        // Everything the same credential reveals can be pinned by the predicate's restriction.
        subject.attributes = lookup.revealed_by(payload, index);
        subject
            .attributes
            .entry(attr_common_view(&info.name))
            .or_insert(None);

        if !subject.satisfies(query) {
            return Ok(Some(format!(
                "predicate {referent} does not satisfy its restrictions"
            )));
        }
    }

    Ok(None)
}
