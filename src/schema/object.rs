//! Object schemas, used for nested bodies and for the params/search channels.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{kind_of, Issue, Schema, ValidationError};

/// An ordered set of named field schemas.
///
/// Unknown keys are stripped from the result; every field is checked and all
/// issues are reported together.
#[derive(Clone, Default)]
pub struct Fields {
    fields: Vec<(String, Arc<dyn Schema>)>,
}

pub fn fields() -> Fields {
    Fields::default()
}

impl Fields {
    /// Add (or replace) a field.
    pub fn field(mut self, name: impl Into<String>, schema: impl Schema) -> Self {
        let name = name.into();
        let schema: Arc<dyn Schema> = Arc::new(schema);
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = schema,
            None => self.fields.push((name, schema)),
        }
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a string map such as captured path params or a query string.
    pub fn parse_map(&self, raw: &BTreeMap<String, String>) -> Result<Value, ValidationError> {
        self.parse_with(|name| raw.get(name).map(|v| Value::String(v.clone())))
    }

    fn parse_with<F>(&self, lookup: F) -> Result<Value, ValidationError>
    where
        F: Fn(&str) -> Option<Value>,
    {
        let mut out = Map::new();
        let mut issues: Vec<Issue> = Vec::new();

        for (name, schema) in &self.fields {
            let parsed = match lookup(name) {
                Some(value) => schema.parse(&value).map(Some),
                None => schema.parse_missing(),
            };
            match parsed {
                Ok(Some(value)) => {
                    out.insert(name.clone(), value);
                }
                Ok(None) => {}
                Err(err) => issues.extend(err.prefixed(name).issues().iter().cloned()),
            }
        }

        if issues.is_empty() {
            Ok(Value::Object(out))
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

impl Schema for Fields {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let object = value.as_object().ok_or_else(|| {
            ValidationError::message(format!("Expected object, received {}", kind_of(value)))
        })?;
        self.parse_with(|name| object.get(name).cloned())
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{number, string, SchemaExt};
    use serde_json::json;

    #[test]
    fn test_object_strips_unknown_keys() {
        let schema = fields().field("name", string());
        let parsed = schema.parse(&json!({"name": "ok", "extra": 1})).unwrap();
        assert_eq!(parsed, json!({"name": "ok"}));
    }

    #[test]
    fn test_object_collects_all_issues() {
        let schema = fields().field("name", string()).field("age", number());
        let err = schema.parse(&json!({"age": "x"})).unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "age"]);
    }

    #[test]
    fn test_parse_map_applies_defaults() {
        let schema = fields()
            .field("limit", number().coerce().min(1.0).max(100.0).default(10))
            .field("q", string().optional());

        let empty = BTreeMap::new();
        assert_eq!(schema.parse_map(&empty).unwrap(), json!({"limit": 10}));

        let mut raw = BTreeMap::new();
        raw.insert("limit".to_string(), "20".to_string());
        raw.insert("q".to_string(), "abc".to_string());
        assert_eq!(schema.parse_map(&raw).unwrap(), json!({"limit": 20, "q": "abc"}));

        raw.insert("limit".to_string(), "0".to_string());
        assert!(schema.parse_map(&raw).is_err());
    }

    #[test]
    fn test_not_an_object() {
        assert!(fields().parse(&json!("text")).is_err());
    }
}
