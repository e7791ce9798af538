//! Attribute catalog: maps human-readable EAV attribute names to their ids.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// The declared type of an attribute. Stored values are always raw text;
/// the type is informational and is not used when comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Text,
    Number,
    Boolean,
    Date,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
}

/// Lookup of an attribute definition by name.
///
/// `Ok(None)` means the attribute does not exist, which is not an error:
/// the condition naming it filters out nothing.
pub trait AttributeResolver {
    fn resolve(&self, name: &str) -> Result<Option<AttributeDef>, FilterError>;
}

impl<R: AttributeResolver + ?Sized> AttributeResolver for &R {
    fn resolve(&self, name: &str) -> Result<Option<AttributeDef>, FilterError> {
        (**self).resolve(name)
    }
}

/// In-memory catalog keyed by exact attribute name.
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalog {
    by_name: HashMap<String, AttributeDef>,
}

impl AttributeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: AttributeDef) {
        self.by_name.insert(def.name.clone(), def);
    }

    pub fn with(mut self, id: i64, name: &str, kind: AttributeType) -> Self {
        self.insert(AttributeDef {
            id,
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl FromIterator<AttributeDef> for AttributeCatalog {
    fn from_iter<I: IntoIterator<Item = AttributeDef>>(iter: I) -> Self {
        let mut catalog = AttributeCatalog::new();
        for def in iter {
            catalog.insert(def);
        }
        catalog
    }
}

impl AttributeResolver for AttributeCatalog {
    fn resolve(&self, name: &str) -> Result<Option<AttributeDef>, FilterError> {
        Ok(self.by_name.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_exact_name() {
        let catalog = AttributeCatalog::new()
            .with(1, "years_experience", AttributeType::Number)
            .with(2, "visa_sponsorship", AttributeType::Boolean);

        let def = catalog.resolve("years_experience").unwrap().unwrap();
        assert_eq!(def.id, 1);
        assert_eq!(def.kind, AttributeType::Number);

        assert_eq!(catalog.resolve("Years_Experience").unwrap(), None);
        assert_eq!(catalog.resolve("missing").unwrap(), None);
    }

    #[test]
    fn test_deserialize_definitions() {
        let defs: Vec<AttributeDef> = serde_json::from_str(
            r#"[
                {"id": 3, "name": "seniority", "type": "select"},
                {"id": 4, "name": "start_date", "type": "date"}
            ]"#,
        )
        .unwrap();

        let catalog: AttributeCatalog = defs.into_iter().collect();
        assert_eq!(catalog.len(), 2);
        let seniority = catalog.resolve("seniority").unwrap().unwrap();
        assert_eq!(seniority.kind, AttributeType::Select);
    }
}
