//! Error types for schema synthesis and validation.

use std::collections::BTreeMap;
use std::fmt;

use ormschema_catalog::CatalogError;
use serde::Serialize;
use thiserror::Error;

/// Message generated when a required field is absent from the input.
pub const MISSING_REQUIRED: &str = "Missing data for required field.";

/// Message generated when a field receives null without allowing it.
pub const NULL_NOT_ALLOWED: &str = "Field may not be null.";

/// Message generated when the input of a schema is not an object.
pub const INVALID_INPUT_TYPE: &str = "Invalid input type.";

/// Key under which schema-level errors are reported.
pub const SCHEMA_ERROR_KEY: &str = "_schema";

/// Errors raised by schema operations.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No registry could be resolved for the call.
    #[error("no registry found for schema {schema}")]
    RegistryNotFound {
        /// Name of the schema declaration.
        schema: String,
    },

    /// No model could be resolved for the call.
    #[error("no model configured for schema {schema}")]
    ModelNotConfigured {
        /// Name of the schema declaration.
        schema: String,
    },

    /// Registry failure.
    #[error("registry error: {0}")]
    Catalog(#[from] CatalogError),

    /// A field was declared with an unusable configuration.
    #[error("invalid field declaration: {0}")]
    Construction(String),

    /// Dump received a value its field cannot represent.
    #[error("cannot serialize field '{field}': {message}")]
    Serialization {
        /// Public field name.
        field: String,
        /// What went wrong.
        message: String,
    },

    /// Field-keyed validation failures.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl SchemaError {
    /// The validation messages, if this is a validation error.
    pub fn messages(&self) -> Option<&ErrorMap> {
        match self {
            SchemaError::Validation(e) => Some(&e.messages),
            _ => None,
        }
    }
}

/// Validation failure carrying every message collected during one pass.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed: {messages}")]
pub struct ValidationError {
    /// Messages keyed by field name.
    pub messages: ErrorMap,
}

impl ValidationError {
    /// Wrap an error map.
    pub fn new(messages: ErrorMap) -> Self {
        Self { messages }
    }
}

/// Messages for one key: a flat list, or nested messages for sub-fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Messages {
    /// Messages for a leaf field.
    List(Vec<String>),
    /// Messages for the fields (or indexes) of a nested value.
    Map(BTreeMap<String, Messages>),
}

impl Messages {
    /// A single message.
    pub fn one(message: impl Into<String>) -> Self {
        Messages::List(vec![message.into()])
    }

    /// A single message under one key.
    pub fn keyed(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(key.into(), Messages::one(message));
        Messages::Map(map)
    }

    /// Check if no message is held.
    pub fn is_empty(&self) -> bool {
        match self {
            Messages::List(list) => list.is_empty(),
            Messages::Map(map) => map.values().all(Messages::is_empty),
        }
    }

    /// Fold `other` into `self`.
    ///
    /// Lists concatenate and maps merge key by key. Merging a list with a map
    /// files the list under [`SCHEMA_ERROR_KEY`] of the map.
    pub fn merge(&mut self, other: Messages) {
        let current = std::mem::replace(self, Messages::List(Vec::new()));
        *self = match (current, other) {
            (Messages::List(mut a), Messages::List(b)) => {
                a.extend(b);
                Messages::List(a)
            }
            (Messages::Map(mut a), Messages::Map(b)) => {
                for (key, messages) in b {
                    merge_into(&mut a, key, messages);
                }
                Messages::Map(a)
            }
            (Messages::Map(mut a), list) => {
                merge_into(&mut a, SCHEMA_ERROR_KEY.to_string(), list);
                Messages::Map(a)
            }
            (list, Messages::Map(mut b)) => {
                merge_into(&mut b, SCHEMA_ERROR_KEY.to_string(), list);
                Messages::Map(b)
            }
        };
    }

    /// Flat list of messages, if this is a leaf.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Messages::List(list) => Some(list),
            Messages::Map(_) => None,
        }
    }

    /// Nested messages under `key`, if this is a map.
    pub fn get(&self, key: &str) -> Option<&Messages> {
        match self {
            Messages::Map(map) => map.get(key),
            Messages::List(_) => None,
        }
    }
}

impl From<String> for Messages {
    fn from(message: String) -> Self {
        Messages::one(message)
    }
}

impl From<&str> for Messages {
    fn from(message: &str) -> Self {
        Messages::one(message)
    }
}

impl From<ErrorMap> for Messages {
    fn from(map: ErrorMap) -> Self {
        Messages::Map(map.0)
    }
}

fn merge_into(map: &mut BTreeMap<String, Messages>, key: String, messages: Messages) {
    match map.get_mut(&key) {
        Some(existing) => existing.merge(messages),
        None => {
            map.insert(key, messages);
        }
    }
}

/// Field-keyed validation messages.
///
/// Serializes to `{"field": ["message", ...], "nested": {"sub": [...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<String, Messages>);

impl ErrorMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one message under `key`.
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.insert(key, Messages::one(message));
    }

    /// Add messages under `key`, merging with what is already there.
    pub fn insert(&mut self, key: impl Into<String>, messages: Messages) {
        merge_into(&mut self.0, key.into(), messages);
    }

    /// Merge every entry of `other`.
    pub fn extend(&mut self, other: ErrorMap) {
        for (key, messages) in other.0 {
            merge_into(&mut self.0, key, messages);
        }
    }

    /// Check if no error was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys with errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages under `key`.
    pub fn get(&self, key: &str) -> Option<&Messages> {
        self.0.get(key)
    }

    /// Keys with errors, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// JSON rendition of the map.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Unwrap into the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, Messages> {
        self.0
    }
}

impl From<BTreeMap<String, Messages>> for ErrorMap {
    fn from(map: BTreeMap<String, Messages>) -> Self {
        Self(map)
    }
}

impl fmt::Display for ErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Failure of a single field hook.
///
/// `Invalid` is collected into the error map of the call, `Fatal` aborts the
/// call (registry and configuration failures met while loading nested data).
#[derive(Debug)]
pub enum FieldError {
    /// The value is invalid for this field.
    Invalid(Messages),
    /// The call cannot proceed.
    Fatal(SchemaError),
}

impl FieldError {
    /// A single validation message.
    pub fn message(message: impl Into<String>) -> Self {
        FieldError::Invalid(Messages::one(message))
    }
}

impl From<Messages> for FieldError {
    fn from(messages: Messages) -> Self {
        FieldError::Invalid(messages)
    }
}

impl From<SchemaError> for FieldError {
    fn from(error: SchemaError) -> Self {
        FieldError::Fatal(error)
    }
}

impl From<CatalogError> for FieldError {
    fn from(error: CatalogError) -> Self {
        FieldError::Fatal(SchemaError::Catalog(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_map_serialization() {
        let mut errors = ErrorMap::new();
        errors.add("name", MISSING_REQUIRED);
        errors.insert("city", Messages::keyed("id", "Not a valid integer."));

        assert_eq!(
            errors.to_json(),
            json!({
                "name": ["Missing data for required field."],
                "city": {"id": ["Not a valid integer."]},
            })
        );
    }

    #[test]
    fn test_messages_merge() {
        let mut errors = ErrorMap::new();
        errors.add("name", "first");
        errors.add("name", "second");
        assert_eq!(
            errors.get("name").and_then(Messages::as_list),
            Some(&["first".to_string(), "second".to_string()][..])
        );

        let mut nested = Messages::keyed("instance", "missing");
        nested.merge(Messages::keyed("fieldname", "missing too"));
        nested.merge(Messages::one("flat"));
        assert_eq!(
            serde_json::to_value(&nested).unwrap(),
            json!({
                "instance": ["missing"],
                "fieldname": ["missing too"],
                "_schema": ["flat"],
            })
        );
    }

    #[test]
    fn test_validation_error_display() {
        let mut errors = ErrorMap::new();
        errors.add("id", "Not a valid integer.");
        let err = SchemaError::from(ValidationError::new(errors));

        assert!(err.to_string().contains("Not a valid integer."));
        assert!(err.messages().is_some());
    }

    #[test]
    fn test_configuration_error_display() {
        let err = SchemaError::RegistryNotFound {
            schema: "CustomerSchema".into(),
        };
        assert_eq!(err.to_string(), "no registry found for schema CustomerSchema");
        assert!(err.messages().is_none());
    }
}
