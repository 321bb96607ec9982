use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value as JsonValue};

/// Restriction a presentation request places on the credential answering a referent,
/// written in the wallet query language (`{"$or": [{"schema_name": "gvt"}, ...]}`).
///
/// Only the operators a verifier can decide from public objects and revealed values are
/// accepted; range and existence operators are refused when parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Eq(String, String),
    Neq(String, String),
    In(String, Vec<String>),
}

impl Default for Query {
    fn default() -> Self {
        Self::And(Vec::new())
    }
}

impl Query {
    /// Every tag name the query mentions.
    pub fn tag_names(&self) -> Vec<&str> {
        match self {
            Self::And(queries) | Self::Or(queries) => {
                queries.iter().flat_map(Self::tag_names).collect()
            }
            Self::Not(query) => query.tag_names(),
            Self::Eq(tag, _) | Self::Neq(tag, _) | Self::In(tag, _) => vec![tag.as_str()],
        }
    }

    /// An empty conjunction or disjunction restricts nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::And(queries) | Self::Or(queries) if queries.is_empty())
    }

    fn to_value(&self) -> JsonValue {
        match self {
            Self::Eq(tag, value) => json!({ tag: value }),
            Self::Neq(tag, value) => json!({ tag: { "$neq": value } }),
            Self::In(tag, values) => json!({ tag: { "$in": values } }),
            Self::Not(query) => json!({ "$not": query.to_value() }),
            Self::And(queries) if queries.is_empty() => json!({}),
            Self::And(queries) => {
                json!({ "$and": queries.iter().map(Self::to_value).collect::<Vec<_>>() })
            }
            Self::Or(queries) if queries.is_empty() => json!({}),
            Self::Or(queries) => {
                json!({ "$or": queries.iter().map(Self::to_value).collect::<Vec<_>>() })
            }
        }
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Object(map) => parse_object(map).map_err(de::Error::custom),
            // Legacy form: a list of alternatives whose null fields are ignored.
            JsonValue::Array(alternatives) => {
                let mut queries = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    let JsonValue::Object(map) = alternative else {
                        return Err(de::Error::custom("restriction list must hold objects"));
                    };
                    let map: Map<String, JsonValue> =
                        map.into_iter().filter(|(_, value)| !value.is_null()).collect();
                    if !map.is_empty() {
                        queries.push(parse_object(map).map_err(de::Error::custom)?);
                    }
                }
                Ok(Self::Or(queries))
            }
            _ => Err(de::Error::custom("restriction must be an object or a list")),
        }
    }
}

fn parse_object(map: Map<String, JsonValue>) -> Result<Query, String> {
    let mut clauses = map
        .into_iter()
        .map(|(key, value)| parse_clause(key, value))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        Query::And(clauses)
    })
}

fn parse_list(values: Vec<JsonValue>, operator: &str) -> Result<Vec<Query>, String> {
    values
        .into_iter()
        .map(|value| match value {
            JsonValue::Object(map) => parse_object(map),
            _ => Err(format!("{operator} must be a list of objects")),
        })
        .collect()
}

fn parse_clause(key: String, value: JsonValue) -> Result<Query, String> {
    match (key.as_str(), value) {
        ("$and", JsonValue::Array(values)) => Ok(Query::And(parse_list(values, "$and")?)),
        ("$or", JsonValue::Array(values)) => Ok(Query::Or(parse_list(values, "$or")?)),
        ("$not", JsonValue::Object(map)) => Ok(Query::Not(Box::new(parse_object(map)?))),
        ("$and" | "$or" | "$not", _) => Err(format!("malformed {key} clause")),
        (operator, _) if operator.starts_with('$') => {
            Err(format!("unsupported restriction operator {operator}"))
        }
        (_, JsonValue::String(value)) => Ok(Query::Eq(key, value)),
        (_, JsonValue::Object(map)) if map.len() == 1 => {
            let Some((operator, value)) = map.into_iter().next() else {
                return Err(format!("empty condition for {key}"));
            };
            match (operator.as_str(), value) {
                ("$neq", JsonValue::String(value)) => Ok(Query::Neq(key, value)),
                ("$in", JsonValue::Array(values)) => {
                    let values = values
                        .into_iter()
                        .map(|value| match value {
                            JsonValue::String(value) => Ok(value),
                            _ => Err(format!("$in on {key} must list strings")),
                        })
                        .collect::<Result<_, _>>()?;
                    Ok(Query::In(key, values))
                }
                _ => Err(format!("unsupported condition {operator} on {key}")),
            }
        }
        _ => Err(format!("condition on {key} must be a string or a single operator")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_operators() {
        let query: Query = serde_json::from_value(json!({
            "$or": [
                { "schema_name": "gvt", "issuer_id": { "$neq": "did:sov:mallory" } },
                { "$not": { "cred_def_id": { "$in": ["a", "b"] } } }
            ]
        }))
        .unwrap();

        let Query::Or(alternatives) = &query else {
            panic!("expected a disjunction, got {query:?}");
        };
        assert_eq!(alternatives.len(), 2);
        assert!(matches!(&alternatives[0], Query::And(clauses) if clauses.len() == 2));
        assert_eq!(
            alternatives[1],
            Query::Not(Box::new(Query::In(
                "cred_def_id".into(),
                vec!["a".into(), "b".into()]
            )))
        );
        let mut tags = query.tag_names();
        tags.sort_unstable();
        assert_eq!(tags, ["cred_def_id", "issuer_id", "schema_name"]);
    }

    #[test]
    fn legacy_list_becomes_disjunction() {
        let query: Query = serde_json::from_value(json!([
            { "schema_name": "gvt", "issuer_did": null },
            { "issuer_did": null },
            { "cred_def_id": "c" }
        ]))
        .unwrap();
        assert_eq!(
            query,
            Query::Or(vec![
                Query::Eq("schema_name".into(), "gvt".into()),
                Query::Eq("cred_def_id".into(), "c".into()),
            ])
        );
        assert!(serde_json::from_value::<Query>(json!([])).unwrap().is_empty());
    }

    #[test]
    fn rejects_undecidable_operators() {
        for query in [
            json!({ "age": { "$gt": "18" } }),
            json!({ "$exist": ["name"] }),
            json!({ "name": 5 }),
            json!({ "$or": { "name": "x" } }),
            json!("schema_name"),
        ] {
            assert!(serde_json::from_value::<Query>(query).is_err());
        }
    }

    #[test]
    fn serializes_to_wql() {
        let query = Query::And(vec![
            Query::Eq("schema_name".into(), "gvt".into()),
            Query::Neq("issuer_id".into(), "x".into()),
        ]);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({ "$and": [{ "schema_name": "gvt" }, { "issuer_id": { "$neq": "x" } }] })
        );
        assert_eq!(serde_json::from_value::<Query>(value).unwrap(), query);
        assert_eq!(serde_json::to_value(Query::default()).unwrap(), json!({}));
    }
}
