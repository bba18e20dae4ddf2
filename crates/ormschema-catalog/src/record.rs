//! Persisted record snapshots.

use std::collections::BTreeMap;

use crate::value::Value;

/// A snapshot of one persisted record.
///
/// Values are keyed by public field name (without the column prefix).
/// Equality is structural: two snapshots of the same row compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    model: String,
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record of the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set a field value, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Registry name of the model this record belongs to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get a field value by public name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All field values.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Plain JSON rendition of the record's values.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}
