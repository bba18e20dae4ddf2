//! Field adapters.
//!
//! A [`Field`] wraps a [`FieldKind`] adapter with the per-declaration flags
//! (required, allow-null, dump-only, load-only) and its validators. Adapters
//! translate wire JSON into canonical [`Value`]s and back.

mod color;
mod country;
mod file;
mod instance;
mod json_collection;
mod nested;
mod phone;
mod scalar;

use std::fmt;
use std::sync::Arc;

use ormschema_catalog::Value;
use serde_json::Value as Json;

use crate::config::InheritedContext;
use crate::error::{FieldError, Messages, SchemaError, NULL_NOT_ALLOWED};

pub use color::Color;
pub use country::{Country, CountryFormat};
pub use file::File;
pub use instance::InstanceField;
pub use json_collection::JsonCollection;
pub use nested::Nested;
pub use phone::PhoneNumber;
pub use scalar::{
    value_from_json, Boolean, Date, DateTime, Dict, Email, Float, Integer, List, Raw, Str, Time,
    Url, UuidField,
};

/// Wire shape of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// A single scalar value.
    Scalar,
    /// A list of values of the inner shape.
    List(Box<FieldShape>),
    /// A nested schema.
    Nested,
    /// A free-form mapping.
    Composite,
}

impl FieldShape {
    /// Check if this is a scalar or a list of scalars.
    pub fn is_scalar_or_list(&self) -> bool {
        match self {
            FieldShape::Scalar => true,
            FieldShape::List(item) => **item == FieldShape::Scalar,
            _ => false,
        }
    }
}

/// Capability every field adapter implements.
pub trait FieldKind: Send + Sync + fmt::Debug {
    /// Short name of the adapter, used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Wire shape of the adapter.
    fn shape(&self) -> FieldShape {
        FieldShape::Scalar
    }

    /// Whether a null wire value may reach the field when it allows null.
    fn accepts_null(&self) -> bool {
        true
    }

    /// Convert a non-null value to its wire form.
    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError>;

    /// Convert a non-null wire value to a canonical value.
    fn deserialize(&self, wire: &Json, ctx: &FieldContext<'_>) -> Result<Value, FieldError>;

    /// Structural check run on a deserialized value.
    fn validate(&self, _value: &Value, _ctx: &FieldContext<'_>) -> Result<(), FieldError> {
        Ok(())
    }
}

/// Check run against a deserialized value.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Returns the error message when the value is rejected.
    fn check(&self, value: &Value) -> Result<(), String>;
}

/// Restricts a value (or every item of a list value) to a set of choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOf {
    choices: Vec<String>,
    labels: Vec<String>,
}

impl OneOf {
    /// Create from `(choice, label)` pairs.
    pub fn new<C, L>(pairs: impl IntoIterator<Item = (C, L)>) -> Self
    where
        C: Into<String>,
        L: Into<String>,
    {
        let (choices, labels) = pairs
            .into_iter()
            .map(|(c, l)| (c.into(), l.into()))
            .unzip();
        Self { choices, labels }
    }

    /// Create from choices used as their own labels.
    pub fn from_choices<C: Into<String>>(choices: impl IntoIterator<Item = C>) -> Self {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        Self {
            labels: choices.clone(),
            choices,
        }
    }

    /// Accepted values.
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Human labels, parallel to the choices.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn contains(&self, value: &Value) -> bool {
        let key = match value {
            Value::String(s) => s.clone(),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => value.to_json().to_string(),
            Value::Json(serde_json::Value::String(s)) => s.clone(),
            Value::Json(j) if !j.is_object() && !j.is_array() => j.to_string(),
            _ => return false,
        };
        self.choices.iter().any(|c| *c == key)
    }
}

impl Validator for OneOf {
    fn check(&self, value: &Value) -> Result<(), String> {
        let choices = self.choices.join(", ");
        match value {
            Value::List(items) => {
                let rejected: Vec<Value> = items
                    .iter()
                    .filter(|item| !self.contains(item))
                    .cloned()
                    .collect();
                if rejected.is_empty() {
                    Ok(())
                } else {
                    Err(format!(
                        "Values {} must be one of: {}.",
                        Value::List(rejected),
                        choices
                    ))
                }
            }
            other if self.contains(other) => Ok(()),
            other => Err(format!("Value {} must be one of: {}.", other, choices)),
        }
    }
}

/// What a field hook knows about the call it runs in.
#[derive(Clone, Copy)]
pub struct FieldContext<'a> {
    /// Public name of the field.
    pub name: &'a str,
    /// Registry, instances and region of the call.
    pub inherited: &'a InheritedContext,
    /// Whether missing required fields are tolerated in nested data.
    pub partial: bool,
}

impl<'a> FieldContext<'a> {
    /// Create a context for the named field.
    pub fn new(name: &'a str, inherited: &'a InheritedContext) -> Self {
        Self {
            name,
            inherited,
            partial: false,
        }
    }

    /// Build a serialization error for this field.
    pub fn serialization_error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::Serialization {
            field: self.name.to_string(),
            message: message.into(),
        }
    }
}

/// A field declaration: an adapter plus its flags and validators.
#[derive(Clone)]
pub struct Field {
    kind: Arc<dyn FieldKind>,
    required: bool,
    allow_none: bool,
    dump_only: bool,
    load_only: bool,
    validators: Vec<Arc<dyn Validator>>,
}

impl Field {
    /// Wrap an adapter. The field is optional and rejects null.
    pub fn new(kind: impl FieldKind + 'static) -> Self {
        Self {
            kind: Arc::new(kind),
            required: false,
            allow_none: false,
            dump_only: false,
            load_only: false,
            validators: Vec::new(),
        }
    }

    /// Passthrough field.
    pub fn raw() -> Self {
        Self::new(Raw)
    }

    /// String field.
    pub fn string() -> Self {
        Self::new(Str::string())
    }

    /// Long text field.
    pub fn text() -> Self {
        Self::new(Str::text())
    }

    /// Integer field.
    pub fn integer() -> Self {
        Self::new(Integer)
    }

    /// Float field.
    pub fn float() -> Self {
        Self::new(Float)
    }

    /// Boolean field.
    pub fn boolean() -> Self {
        Self::new(Boolean)
    }

    /// UUID field.
    pub fn uuid() -> Self {
        Self::new(UuidField)
    }

    /// Date field.
    pub fn date() -> Self {
        Self::new(Date)
    }

    /// Datetime field.
    pub fn datetime() -> Self {
        Self::new(DateTime)
    }

    /// Time field.
    pub fn time() -> Self {
        Self::new(Time)
    }

    /// Email address field.
    pub fn email() -> Self {
        Self::new(Email)
    }

    /// URL field.
    pub fn url() -> Self {
        Self::new(Url)
    }

    /// Mapping field.
    pub fn dict() -> Self {
        Self::new(Dict)
    }

    /// List field over an item field.
    pub fn list(item: Field) -> Self {
        Self::new(List::new(item))
    }

    /// Base64 binary field.
    pub fn file() -> Self {
        Self::new(File)
    }

    /// Phone number field.
    pub fn phone_number() -> Self {
        Self::new(PhoneNumber::new())
    }

    /// Country field (alpha-3 codes).
    pub fn country() -> Self {
        Self::new(Country::new())
    }

    /// Color field.
    pub fn color() -> Self {
        Self::new(Color)
    }

    /// Nested schema field.
    pub fn nested(nested: Nested) -> Self {
        Self::new(nested)
    }

    /// Require the field on load.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set whether the field is required on load.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Accept null.
    pub fn allow_none(mut self) -> Self {
        self.allow_none = true;
        self
    }

    /// Set whether null is accepted.
    pub fn with_allow_none(mut self, allow_none: bool) -> Self {
        self.allow_none = allow_none;
        self
    }

    /// Only dump the field, never load it.
    pub fn dump_only(mut self) -> Self {
        self.dump_only = true;
        self
    }

    /// Only load the field, never dump it.
    pub fn load_only(mut self) -> Self {
        self.load_only = true;
        self
    }

    /// Add a validator.
    pub fn validate_with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Restrict values to `(choice, label)` pairs.
    pub fn one_of<C, L>(self, pairs: impl IntoIterator<Item = (C, L)>) -> Self
    where
        C: Into<String>,
        L: Into<String>,
    {
        self.validate_with(OneOf::new(pairs))
    }

    /// Whether the field must be present on load.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether null is accepted.
    pub fn allows_none(&self) -> bool {
        self.allow_none
    }

    /// Whether the field is skipped on load.
    pub fn is_dump_only(&self) -> bool {
        self.dump_only
    }

    /// Whether the field is skipped on dump.
    pub fn is_load_only(&self) -> bool {
        self.load_only
    }

    /// Adapter name.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Wire shape of the adapter.
    pub fn shape(&self) -> FieldShape {
        self.kind.shape()
    }

    /// The adapter.
    pub fn kind(&self) -> &dyn FieldKind {
        self.kind.as_ref()
    }

    /// Attached validators.
    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    /// Load one present wire value: null check, deserialization, then
    /// structural validation and validators.
    pub fn load(&self, wire: &Json, ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        if wire.is_null() {
            if self.allow_none && self.kind.accepts_null() {
                return Ok(Value::Null);
            }
            return Err(FieldError::message(NULL_NOT_ALLOWED));
        }

        let value = self.kind.deserialize(wire, ctx)?;
        // Attached validators still run when the kind rejects the value.
        let checked = self.kind.validate(&value, ctx);
        match (checked, self.run_validators(&value)) {
            (Ok(()), Ok(())) => Ok(value),
            (Err(FieldError::Fatal(err)), _) | (_, Err(FieldError::Fatal(err))) => {
                Err(FieldError::Fatal(err))
            }
            (Err(FieldError::Invalid(mut messages)), Err(FieldError::Invalid(more))) => {
                messages.merge(more);
                Err(FieldError::Invalid(messages))
            }
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
        }
    }

    /// Run the attached validators plus `extra`, collecting every message.
    pub(crate) fn run_validators_with(
        &self,
        value: &Value,
        extra: Option<&dyn Validator>,
    ) -> Result<(), FieldError> {
        let mut messages = Vec::new();
        for validator in &self.validators {
            if let Err(message) = validator.check(value) {
                messages.push(message);
            }
        }
        if let Some(Err(message)) = extra.map(|v| v.check(value)) {
            messages.push(message);
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(FieldError::Invalid(Messages::List(messages)))
        }
    }

    fn run_validators(&self, value: &Value) -> Result<(), FieldError> {
        self.run_validators_with(value, None)
    }

    /// Dump one value.
    pub fn dump(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        if value.is_null() {
            return Ok(Json::Null);
        }
        self.kind.serialize(value, ctx)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("allow_none", &self.allow_none)
            .field("dump_only", &self.dump_only)
            .field("load_only", &self.load_only)
            .field("validators", &self.validators)
            .finish()
    }
}
