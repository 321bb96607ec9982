use std::collections::HashSet;

use crate::{
    data_types::identifiers::{issuer_id::IssuerId, schema_id::SchemaId},
    error::ValidationError,
    utils::validation::Validatable,
};

/// Upper bound on the attributes of one schema.
pub const MAX_ATTRIBUTES_COUNT: usize = 125;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: SchemaId,
    pub name: String,
    pub version: String,
    pub attr_names: AttributeNames,
    pub issuer_id: IssuerId,
}

/// Attribute names in declaration order. Order is kept for the wire form; uniqueness is
/// checked by `validate`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AttributeNames(pub Vec<String>);

impl<S: AsRef<str>> FromIterator<S> for AttributeNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|name| name.as_ref().to_owned()).collect())
    }
}

impl From<Vec<String>> for AttributeNames {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<&[&str]> for AttributeNames {
    fn from(names: &[&str]) -> Self {
        names.iter().collect()
    }
}

impl Validatable for Schema {
    fn validate(&self) -> Result<(), ValidationError> {
        self.id.validate()?;
        self.issuer_id.validate()?;
        self.attr_names.validate()
    }
}

impl Validatable for AttributeNames {
    fn validate(&self) -> Result<(), ValidationError> {
        let names = &self.0;
        if names.is_empty() {
            return Err(invalid!("A schema needs at least one attribute"));
        }
        if names.len() > MAX_ATTRIBUTES_COUNT {
            return Err(invalid!(
                "A schema holds at most {MAX_ATTRIBUTES_COUNT} attributes, got {}",
                names.len()
            ));
        }
        if names.iter().any(String::is_empty) {
            return Err(invalid!("Schema attribute names must not be empty"));
        }
        let mut seen = HashSet::with_capacity(names.len());
        if let Some(duplicate) = names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(invalid!("Schema attribute {duplicate} is declared twice"));
        }
        Ok(())
    }
}
