//! Entity access
//!
//! The query layer is generic over the stored entity type. Anything that
//! can answer "what is the value of field X" can be filtered, grouped,
//! aggregated, and ordered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FieldValue;

/// A queryable entity
pub trait Entity: Clone + Send + Sync {
    /// Returns the value at `path`, or `None` if the field is absent.
    ///
    /// A present field holding null returns `Some(FieldValue::Null)`.
    fn field(&self, path: &str) -> Option<FieldValue>;

    /// Returns a copy restricted to `fields`.
    ///
    /// Entities that cannot be narrowed return themselves unchanged.
    fn project(&self, fields: &[String]) -> Self {
        let _ = fields;
        self.clone()
    }
}

impl<E: Entity> Entity for &E {
    fn field(&self, path: &str) -> Option<FieldValue> {
        (**self).field(path)
    }
}

impl Entity for Value {
    fn field(&self, path: &str) -> Option<FieldValue> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(FieldValue::from(current))
    }

    fn project(&self, fields: &[String]) -> Self {
        let Some(source) = self.as_object() else {
            return self.clone();
        };

        let mut projected = serde_json::Map::new();
        for field in fields {
            let top = field.split('.').next().unwrap_or(field);
            if let Some(v) = source.get(top) {
                projected.insert(top.to_string(), v.clone());
            }
        }
        Value::Object(projected)
    }
}

/// A flat result row produced by grouping and aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Merges all fields of `other` into this row
    pub fn extend(&mut self, other: Record) {
        self.fields.extend(other.fields);
    }

    /// Renders the row as a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect(),
        )
    }
}

impl Entity for Record {
    fn field(&self, path: &str) -> Option<FieldValue> {
        if let Some(v) = self.fields.get(path) {
            return Some(v.clone());
        }

        // Fall back to descending into object-valued columns
        let (head, rest) = path.split_once('.')?;
        let mut current = self.fields.get(head)?;
        for segment in rest.split('.') {
            match current {
                FieldValue::Object(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current.clone())
    }

    fn project(&self, fields: &[String]) -> Self {
        Record {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| fields.iter().any(|f| f == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_field_access() {
        let doc = json!({"name": "Alice", "address": {"city": "Oslo"}, "nick": null});
        assert_eq!(doc.field("name"), Some(FieldValue::from("Alice")));
        assert_eq!(doc.field("address.city"), Some(FieldValue::from("Oslo")));
        assert_eq!(doc.field("nick"), Some(FieldValue::Null));
        assert_eq!(doc.field("missing"), None);
        assert_eq!(doc.field("name.first"), None);
    }

    #[test]
    fn test_json_projection() {
        let doc = json!({"a": 1, "b": 2, "c": {"d": 3}});
        let projected = doc.project(&["a".to_string(), "c.d".to_string()]);
        assert_eq!(projected, json!({"a": 1, "c": {"d": 3}}));
    }

    #[test]
    fn test_record_access_and_projection() {
        let row = Record::new().with("type", "a").with("n", 2);
        assert_eq!(row.field("n"), Some(FieldValue::from(2)));
        assert_eq!(row.project(&["type".to_string()]).len(), 1);
        assert_eq!(row.to_json(), json!({"type": "a", "n": 2}));
    }

    #[test]
    fn test_reference_entities() {
        let doc = json!({"x": 1});
        let by_ref = &doc;
        assert_eq!(Entity::field(&by_ref, "x"), Some(FieldValue::from(1)));
    }
}
