use std::{collections::HashMap, fmt};

use serde::{Serialize, Serializer};

use super::nonce::Nonce;
use crate::{
    error::{ConversionError, ValidationError},
    invalid,
    utils::{
        query::Query,
        validation::{is_uri_identifier, Validatable},
    },
};

/// Restriction tags holding identifiers, which version 1 requests only accept in legacy form.
const QUALIFIABLE_TAGS: [&str; 6] = [
    "issuer_did",
    "issuer_id",
    "cred_def_id",
    "schema_id",
    "schema_issuer_did",
    "schema_issuer_id",
];

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PresentationRequestPayload {
    pub nonce: Nonce,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requested_attributes: HashMap<String, AttributeInfo>,
    #[serde(default)]
    pub requested_predicates: HashMap<String, PredicateInfo>,
    pub non_revoked: Option<NonRevokedInterval>,
}

/// Presentation request with its `ver` tag. Requests without a tag are read as version 1.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "VersionedRequest")]
pub struct PresentationRequest {
    version: PresentationRequestVersion,
    payload: PresentationRequestPayload,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PresentationRequestVersion {
    #[default]
    V1,
    V2,
}

impl PresentationRequestVersion {
    const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1.0",
            Self::V2 => "2.0",
        }
    }
}

impl PresentationRequest {
    pub const fn new(
        version: PresentationRequestVersion,
        payload: PresentationRequestPayload,
    ) -> Self {
        Self { version, payload }
    }

    #[must_use]
    pub const fn value(&self) -> &PresentationRequestPayload {
        &self.payload
    }

    #[must_use]
    pub const fn version(&self) -> PresentationRequestVersion {
        self.version
    }
}

#[derive(Deserialize)]
struct VersionedRequest {
    #[serde(default)]
    ver: Option<String>,
    #[serde(flatten)]
    payload: PresentationRequestPayload,
}

impl TryFrom<VersionedRequest> for PresentationRequest {
    type Error = ConversionError;

    fn try_from(wire: VersionedRequest) -> Result<Self, Self::Error> {
        let version = match wire.ver.as_deref() {
            None | Some("1.0") => PresentationRequestVersion::V1,
            Some("2.0") => PresentationRequestVersion::V2,
            Some(other) => {
                return Err(ConversionError::from_msg(format!(
                    "Unsupported presentation request version {other}"
                )))
            }
        };
        Ok(Self::new(version, wire.payload))
    }
}

impl Serialize for PresentationRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a> {
            ver: &'static str,
            #[serde(flatten)]
            payload: &'a PresentationRequestPayload,
        }

        Tagged {
            ver: self.version.as_str(),
            payload: &self.payload,
        }
        .serialize(serializer)
    }
}

impl PresentationRequestPayload {
    /// Interval a referent must be proven within: its own when set, else the global one.
    pub fn non_revoked_for_attribute(&self, referent: &str) -> Option<&NonRevokedInterval> {
        self.requested_attributes
            .get(referent)
            .and_then(|info| info.non_revoked.as_ref())
            .or(self.non_revoked.as_ref())
    }

    pub fn non_revoked_for_predicate(&self, referent: &str) -> Option<&NonRevokedInterval> {
        self.requested_predicates
            .get(referent)
            .and_then(|info| info.non_revoked.as_ref())
            .or(self.non_revoked.as_ref())
    }
}

#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct NonRevokedInterval {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl NonRevokedInterval {
    #[must_use]
    pub const fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }

    /// Narrows `self` to the intersection with `other`: the later `from` and the earlier `to`.
    pub fn compare_and_set(&mut self, other: &Self) {
        self.from = match (self.from, other.from) {
            (Some(from), Some(other_from)) => Some(from.max(other_from)),
            (from, other_from) => from.or(other_from),
        };
        self.to = match (self.to, other.to) {
            (Some(to), Some(other_to)) => Some(to.min(other_to)),
            (to, other_to) => to.or(other_to),
        };
    }

    /// Moves `from` to the earlier timestamp the verifier accepts in its place, if any.
    pub fn update_with_override(&mut self, override_map: &HashMap<u64, u64>) {
        if let Some(accepted) = self.from.and_then(|from| override_map.get(&from)) {
            self.from = Some(*accepted);
        }
    }

    pub fn is_valid(&self, timestamp: u64) -> Result<(), ValidationError> {
        if self.from.is_some_and(|from| timestamp < from)
            || self.to.is_some_and(|to| timestamp > to)
        {
            return Err(invalid!("Timestamp {} is outside of {:?}", timestamp, self));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct AttributeInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl AttributeInfo {
    /// Requested attribute names, whether asked for singly or as a group.
    pub fn attribute_names(&self) -> Vec<&str> {
        match (&self.name, &self.names) {
            (Some(name), _) => vec![name.as_str()],
            (None, Some(names)) => names.iter().map(String::as_str).collect(),
            (None, None) => Vec::new(),
        }
    }
}

pub type PredicateValue = i32;

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct PredicateInfo {
    pub name: String,
    pub p_type: PredicateTypes,
    pub p_value: PredicateValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Query>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum PredicateTypes {
    #[serde(rename = ">=")]
    GE,
    #[serde(rename = "<=")]
    LE,
    #[serde(rename = ">")]
    GT,
    #[serde(rename = "<")]
    LT,
}

impl fmt::Display for PredicateTypes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::GE => write!(f, "GE"),
            Self::GT => write!(f, "GT"),
            Self::LE => write!(f, "LE"),
            Self::LT => write!(f, "LT"),
        }
    }
}

impl Validatable for PresentationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let payload = self.value();
        if payload.requested_attributes.is_empty() && payload.requested_predicates.is_empty() {
            return Err(invalid!("Presentation request asks for no attributes and no predicates"));
        }

        for (referent, info) in &payload.requested_attributes {
            let single = info.name.as_deref().is_some_and(|name| !name.is_empty());
            let group = info.names.as_ref().is_some_and(|names| !names.is_empty());
            match (single, group) {
                (false, false) => {
                    return Err(invalid!("Requested attribute {referent} names no attribute"))
                }
                (true, true) => {
                    return Err(invalid!(
                        "Requested attribute {referent} sets both `name` and `names`"
                    ))
                }
                _ => {}
            }
        }

        if let Some((referent, _)) = payload
            .requested_predicates
            .iter()
            .find(|(_, info)| info.name.is_empty())
        {
            return Err(invalid!("Requested predicate {referent} names no attribute"));
        }

        let restrictions = payload
            .requested_attributes
            .values()
            .filter_map(|info| info.restrictions.as_ref())
            .chain(
                payload
                    .requested_predicates
                    .values()
                    .filter_map(|info| info.restrictions.as_ref()),
            );
        let mut tags = Vec::new();
        for restriction in restrictions {
            if self.version == PresentationRequestVersion::V1 {
                check_legacy_identifiers(restriction)?;
            }
            tags.extend(restriction.tag_names());
        }
        for (current, legacy) in [("issuer_id", "issuer_did"), ("schema_issuer_id", "schema_issuer_did")]
        {
            if tags.contains(&current) && tags.contains(&legacy) {
                return Err(invalid!(
                    "Presentation request restricts both `{current}` and its legacy form `{legacy}`"
                ));
            }
        }
        Ok(())
    }
}

fn check_legacy_identifiers(restriction: &Query) -> Result<(), ValidationError> {
    fn qualified(tag: &str, value: &str) -> Result<(), ValidationError> {
        if QUALIFIABLE_TAGS.contains(&tag) && is_uri_identifier(value) {
            return Err(invalid!(
                "Restriction {tag} = {value} is fully qualified, which needs a version 2.0 request"
            ));
        }
        Ok(())
    }

    match restriction {
        Query::Eq(tag, value) | Query::Neq(tag, value) => qualified(tag, value),
        Query::In(tag, values) => values.iter().try_for_each(|value| qualified(tag, value)),
        Query::And(queries) | Query::Or(queries) => {
            queries.iter().try_for_each(check_legacy_identifiers)
        }
        Query::Not(query) => check_legacy_identifiers(query),
    }
}
