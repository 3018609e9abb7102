//! The generic record flowing through the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single data record pulled from an external source.
///
/// Fields are stored in a `BTreeMap` so iteration order (and serialized
/// form) is stable, which keeps transformation output byte-comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Source timestamp of the record
    pub timestamp: DateTime<Utc>,

    /// Field values keyed by name
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record with the given source timestamp
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Get a field value by name
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set a field value, replacing any existing value
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Remove a field, returning its value if present
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Check whether a field is present and non-null
    pub fn has(&self, field: &str) -> bool {
        matches!(self.fields.get(field), Some(v) if !v.is_null())
    }

    /// Get a field as an f64, coercing numeric strings
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get a field as a string slice
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Field names in key order
    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Consume the record, returning its field map
    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts() -> DateTime<Utc> {
        "2024-03-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let mut record = Record::new(ts());
        record.set("amount", json!(125.5));
        record.set("status", json!("open"));

        assert_eq!(record.get("amount"), Some(&json!(125.5)));
        assert_eq!(record.text("status"), Some("open"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_has_treats_null_as_absent() {
        let mut record = Record::new(ts());
        record.set("a", json!(null));
        record.set("b", json!(0));

        assert!(!record.has("a"));
        assert!(record.has("b"));
        assert!(!record.has("missing"));
    }

    #[test]
    fn test_number_coerces_strings() {
        let mut record = Record::new(ts());
        record.set("n", json!(42));
        record.set("s", json!(" 3.5 "));
        record.set("bad", json!("abc"));

        assert_eq!(record.number("n"), Some(42.0));
        assert_eq!(record.number("s"), Some(3.5));
        assert_eq!(record.number("bad"), None);
    }

    #[test]
    fn test_serialized_form_is_stable() {
        let mut a = Record::new(ts());
        a.set("z", json!(1));
        a.set("a", json!(2));

        let mut b = Record::new(ts());
        b.set("a", json!(2));
        b.set("z", json!(1));

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
