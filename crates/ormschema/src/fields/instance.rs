//! Values that must match existing records.

use ormschema_catalog::{FilterEvaluator, FilterExpr, Value};
use serde_json::Value as Json;

use super::{Field, FieldContext, FieldKind, FieldShape};
use crate::error::{FieldError, SchemaError, NULL_NOT_ALLOWED};

/// Checks that the value (or every item of a list value) is the `key` of an
/// existing record of `model`.
///
/// Null and empty values are always rejected, whatever the field's
/// allow-null flag says.
#[derive(Debug, Clone)]
pub struct InstanceField {
    model: String,
    key: String,
    container: Field,
}

impl InstanceField {
    /// Create over `model` records matched by their `key` column.
    ///
    /// The container must be a scalar field or a list of scalar fields.
    pub fn new(
        model: impl Into<String>,
        key: impl Into<String>,
        container: Field,
    ) -> Result<Self, SchemaError> {
        if !container.shape().is_scalar_or_list() {
            return Err(SchemaError::Construction(format!(
                "InstanceField container must be a scalar or a list of scalars, got {}",
                container.type_name()
            )));
        }
        Ok(Self {
            model: model.into(),
            key: key.into(),
            container,
        })
    }

    fn check_list(&self, items: &[Value], ctx: &FieldContext<'_>) -> Result<(), FieldError> {
        let mut wanted: Vec<Value> = Vec::new();
        for item in items {
            if !wanted.iter().any(|w| FilterEvaluator::values_equal(w, item)) {
                wanted.push(item.clone());
            }
        }

        // Empty items never match a record.
        let lookup: Vec<Value> = wanted.iter().filter(|v| !v.is_empty()).cloned().collect();
        let found = ctx
            .inherited
            .registry
            .query(&self.model, &[FilterExpr::is_in(&self.key, lookup)])?;

        let missing: Vec<Value> = wanted
            .into_iter()
            .filter(|w| {
                w.is_empty()
                    || !found
                        .iter()
                        .filter_map(|record| record.get(&self.key))
                        .any(|v| FilterEvaluator::values_equal(v, w))
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FieldError::message(format!(
                "Records with key '{}' = {} on {} not found",
                self.key,
                Value::List(missing),
                self.model
            )))
        }
    }

    fn check_scalar(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<(), FieldError> {
        let found = ctx
            .inherited
            .registry
            .query(&self.model, &[FilterExpr::eq(&self.key, value.clone())])?;

        match found.len() {
            1 => Ok(()),
            0 => Err(FieldError::message(format!(
                "Record with key '{}' = {} on {} not found",
                self.key, value, self.model
            ))),
            count => Err(FieldError::message(format!(
                "{} records with key '{}' = {} on {} found, expected one",
                count, self.key, value, self.model
            ))),
        }
    }
}

impl FieldKind for InstanceField {
    fn type_name(&self) -> &'static str {
        "InstanceField"
    }

    fn shape(&self) -> FieldShape {
        self.container.shape()
    }

    fn accepts_null(&self) -> bool {
        false
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        self.container.dump(value, ctx)
    }

    fn deserialize(&self, wire: &Json, ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        self.container.load(wire, ctx)
    }

    fn validate(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<(), FieldError> {
        if value.is_empty() {
            return Err(FieldError::message(NULL_NOT_ALLOWED));
        }
        match value {
            Value::List(items) => self.check_list(items, ctx),
            scalar => self.check_scalar(scalar, ctx),
        }
    }
}
