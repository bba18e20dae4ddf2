//! Choices read from a JSON attribute of an in-context record.

use std::collections::BTreeMap;

use ormschema_catalog::Value;
use serde_json::Value as Json;

use super::scalar::value_from_json;
use super::{Field, FieldContext, FieldKind, FieldShape, OneOf};
use crate::config::DEFAULT_INSTANCE_NAME;
use crate::error::{FieldError, Messages, SchemaError};

/// Restricts a scalar (or list of scalars) to the keys or items found under
/// a key path of a JSON attribute.
///
/// The record is taken from the schema instances by name (`"default"` unless
/// set otherwise). A JSON object at the end of the path offers its keys as
/// choices and its values as labels; a JSON array offers its items.
#[derive(Debug, Clone)]
pub struct JsonCollection {
    fieldname: String,
    keys: Vec<String>,
    instance: String,
    container: Field,
}

impl JsonCollection {
    /// Create over attribute `fieldname` and the key path `keys`.
    ///
    /// The container decides the wire type and must be a scalar field or a
    /// list of scalar fields.
    pub fn new<K: Into<String>>(
        fieldname: impl Into<String>,
        keys: impl IntoIterator<Item = K>,
        container: Field,
    ) -> Result<Self, SchemaError> {
        if !container.shape().is_scalar_or_list() {
            return Err(SchemaError::Construction(format!(
                "JsonCollection container must be a scalar or a list of scalars, got {}",
                container.type_name()
            )));
        }
        Ok(Self {
            fieldname: fieldname.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            instance: DEFAULT_INSTANCE_NAME.to_string(),
            container,
        })
    }

    /// Read choices from the instance registered under `name`.
    pub fn with_instance(mut self, name: impl Into<String>) -> Self {
        self.instance = name.into();
        self
    }

    fn choices_at(document: &Json) -> Option<OneOf> {
        match document {
            Json::Object(map) => Some(OneOf::new(
                map.iter().map(|(k, v)| (k.clone(), label_of(v))),
            )),
            Json::Array(items) => Some(OneOf::from_choices(items.iter().map(label_of))),
            _ => None,
        }
    }
}

fn label_of(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl FieldKind for JsonCollection {
    fn type_name(&self) -> &'static str {
        "JsonCollection"
    }

    fn shape(&self) -> FieldShape {
        self.container.shape()
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        self.container.dump(value, ctx)
    }

    // The container's validators run once, in `validate`, next to the choices.
    fn deserialize(&self, wire: &Json, ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        self.container.kind().deserialize(wire, ctx)
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<(), FieldError> {
        self.container.kind().validate(value, ctx)?;

        let mut errors = BTreeMap::new();

        let instance = ctx.inherited.instance(&self.instance);
        if instance.is_none() {
            errors.insert(
                "instance".to_string(),
                Messages::one(format!(
                    "No instance found for wanted instance name '{}'",
                    self.instance
                )),
            );
        }

        let attribute = instance.and_then(|record| record.get(&self.fieldname));
        if attribute.is_none() {
            errors.insert(
                "fieldname".to_string(),
                Messages::one(format!(
                    "No fieldname '{}' found for wanted instance name '{}'",
                    self.fieldname, self.instance
                )),
            );
        }

        let document = attribute.map(Value::to_json).unwrap_or(Json::Null);
        let found = self
            .keys
            .iter()
            .try_fold(&document, |current, key| current.get(key.as_str()));
        let choices = found.and_then(Self::choices_at);
        if choices.is_none() {
            let shown = found.map(value_from_json).unwrap_or(Value::Null);
            errors.insert(
                "instance values".to_string(),
                Messages::one(format!("Instance values {} is not a dict or list", shown)),
            );
        }

        match choices {
            Some(one_of) if errors.is_empty() => {
                self.container.run_validators_with(value, Some(&one_of))
            }
            _ => Err(FieldError::Invalid(Messages::Map(errors))),
        }
    }
}
