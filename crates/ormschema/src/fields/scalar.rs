//! Standard scalar and collection adapters.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use ormschema_catalog::Value;
use regex::Regex;
use serde_json::Value as Json;
use uuid::Uuid;

use super::{Field, FieldContext, FieldKind, FieldShape};
use crate::error::{FieldError, Messages, SchemaError};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(https?|ftp)://[^\s/$.?#][^\s]*$").expect("valid url pattern")
});

const TRUTHY: &[&str] = &["true", "t", "yes", "y", "on", "1"];
const FALSY: &[&str] = &["false", "f", "no", "n", "off", "0"];

/// Convert arbitrary JSON into a value: objects stay JSON, arrays become lists.
pub fn value_from_json(wire: &Json) -> Value {
    match wire {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(value_from_json).collect()),
        Json::Object(_) => Value::Json(wire.clone()),
    }
}

fn text_of(value: &Value) -> String {
    match value.to_json() {
        Json::String(s) => s,
        other => other.to_string(),
    }
}

/// Passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl FieldKind for Raw {
    fn type_name(&self) -> &'static str {
        "Raw"
    }

    fn shape(&self) -> FieldShape {
        FieldShape::Composite
    }

    fn serialize(&self, value: &Value, _ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        Ok(value.to_json())
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        Ok(value_from_json(wire))
    }
}

/// String or long text.
#[derive(Debug, Clone, Copy)]
pub struct Str {
    text: bool,
}

impl Str {
    /// Short string.
    pub fn string() -> Self {
        Self { text: false }
    }

    /// Long text.
    pub fn text() -> Self {
        Self { text: true }
    }
}

impl FieldKind for Str {
    fn type_name(&self) -> &'static str {
        if self.text {
            "Text"
        } else {
            "String"
        }
    }

    fn serialize(&self, value: &Value, _ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        Ok(Json::String(text_of(value)))
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        match wire {
            Json::String(s) => Ok(Value::String(s.clone())),
            _ => Err(FieldError::message("Not a valid string.")),
        }
    }
}

/// Email address.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl FieldKind for Email {
    fn type_name(&self) -> &'static str {
        "Email"
    }

    fn serialize(&self, value: &Value, _ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        Ok(Json::String(text_of(value)))
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        match wire {
            Json::String(s) if EMAIL_RE.is_match(s) => Ok(Value::String(s.clone())),
            _ => Err(FieldError::message("Not a valid email address.")),
        }
    }
}

/// Absolute URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct Url;

impl FieldKind for Url {
    fn type_name(&self) -> &'static str {
        "Url"
    }

    fn serialize(&self, value: &Value, _ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        Ok(Json::String(text_of(value)))
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        match wire {
            Json::String(s) if URL_RE.is_match(s) => Ok(Value::String(s.clone())),
            _ => Err(FieldError::message("Not a valid URL.")),
        }
    }
}

/// Signed integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integer;

impl Integer {
    fn coerce(value: &Value) -> Option<i64> {
        match value {
            Value::Int(i) => Some(*i),
            // `i64::MAX as f64` rounds up to 2^63, which is out of range.
            Value::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FieldKind for Integer {
    fn type_name(&self) -> &'static str {
        "Integer"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        Self::coerce(value)
            .map(Json::from)
            .ok_or_else(|| ctx.serialization_error("Not a valid integer."))
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        let value = match wire {
            Json::Number(_) | Json::String(_) => Self::coerce(&value_from_json(wire)),
            _ => None,
        };
        value
            .map(Value::Int)
            .ok_or_else(|| FieldError::message("Not a valid integer."))
    }
}

/// Floating point number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Float;

impl Float {
    fn coerce(value: &Value) -> Option<f64> {
        match value {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FieldKind for Float {
    fn type_name(&self) -> &'static str {
        "Float"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        Self::coerce(value)
            .and_then(serde_json::Number::from_f64)
            .map(Json::Number)
            .ok_or_else(|| ctx.serialization_error("Not a valid number."))
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        let value = match wire {
            Json::Number(_) | Json::String(_) => Self::coerce(&value_from_json(wire)),
            _ => None,
        };
        value
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(|| FieldError::message("Not a valid number."))
    }
}

/// Boolean, accepting the usual textual and 0/1 spellings on load.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boolean;

impl FieldKind for Boolean {
    fn type_name(&self) -> &'static str {
        "Boolean"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Int(0) => Ok(Json::Bool(false)),
            Value::Int(1) => Ok(Json::Bool(true)),
            _ => Err(ctx.serialization_error("Not a valid boolean.")),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        let parsed = match wire {
            Json::Bool(b) => Some(*b),
            Json::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Json::String(s) => {
                let lowered = s.to_ascii_lowercase();
                if TRUTHY.contains(&lowered.as_str()) {
                    Some(true)
                } else if FALSY.contains(&lowered.as_str()) {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        };
        parsed
            .map(Value::Bool)
            .ok_or_else(|| FieldError::message("Not a valid boolean."))
    }
}

/// UUID in hyphenated text form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidField;

impl FieldKind for UuidField {
    fn type_name(&self) -> &'static str {
        "UUID"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Uuid(u) => Ok(Json::String(u.to_string())),
            Value::String(s) if Uuid::parse_str(s).is_ok() => Ok(Json::String(s.clone())),
            _ => Err(ctx.serialization_error("Not a valid UUID.")),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        wire.as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(Value::Uuid)
            .ok_or_else(|| FieldError::message("Not a valid UUID."))
    }
}

/// ISO 8601 calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct Date;

impl FieldKind for Date {
    fn type_name(&self) -> &'static str {
        "Date"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Date(d) => Ok(Json::String(d.to_string())),
            Value::DateTime(dt) => Ok(Json::String(dt.date_naive().to_string())),
            _ => Err(ctx.serialization_error("Not a valid date.")),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        wire.as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(Value::Date)
            .ok_or_else(|| FieldError::message("Not a valid date."))
    }
}

/// ISO 8601 timestamp, normalized to UTC. Naive timestamps are read as UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTime;

impl DateTime {
    fn parse(text: &str) -> Option<chrono::DateTime<Utc>> {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

impl FieldKind for DateTime {
    fn type_name(&self) -> &'static str {
        "DateTime"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::DateTime(dt) => Ok(Json::String(dt.to_rfc3339())),
            _ => Err(ctx.serialization_error("Not a valid datetime.")),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        wire.as_str()
            .and_then(Self::parse)
            .map(Value::DateTime)
            .ok_or_else(|| FieldError::message("Not a valid datetime."))
    }
}

/// Time of day.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time;

impl FieldKind for Time {
    fn type_name(&self) -> &'static str {
        "Time"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Time(t) => Ok(Json::String(t.to_string())),
            _ => Err(ctx.serialization_error("Not a valid time.")),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        wire.as_str()
            .and_then(|s| {
                NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                    .ok()
            })
            .map(Value::Time)
            .ok_or_else(|| FieldError::message("Not a valid time."))
    }
}

/// JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dict;

impl FieldKind for Dict {
    fn type_name(&self) -> &'static str {
        "Dict"
    }

    fn shape(&self) -> FieldShape {
        FieldShape::Composite
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Json(j) if j.is_object() => Ok(j.clone()),
            Value::Map(_) | Value::Record(_) => Ok(value.to_json()),
            _ => Err(ctx.serialization_error("Not a valid mapping type.")),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        match wire {
            Json::Object(_) => Ok(Value::Json(wire.clone())),
            _ => Err(FieldError::message("Not a valid mapping type.")),
        }
    }
}

/// Homogeneous list. Item errors are keyed by index.
#[derive(Debug, Clone)]
pub struct List {
    item: Field,
}

impl List {
    /// Create a list over an item field.
    pub fn new(item: Field) -> Self {
        Self { item }
    }

    /// The item field.
    pub fn item(&self) -> &Field {
        &self.item
    }
}

impl FieldKind for List {
    fn type_name(&self) -> &'static str {
        "List"
    }

    fn shape(&self) -> FieldShape {
        FieldShape::List(Box::new(self.item.shape()))
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|item| self.item.dump(item, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            Value::Json(j) if j.is_array() => Ok(j.clone()),
            _ => Err(ctx.serialization_error("Not a valid list.")),
        }
    }

    fn deserialize(&self, wire: &Json, ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        let items = wire
            .as_array()
            .ok_or_else(|| FieldError::message("Not a valid list."))?;

        let mut values = Vec::with_capacity(items.len());
        let mut errors = BTreeMap::new();
        for (index, item) in items.iter().enumerate() {
            match self.item.load(item, ctx) {
                Ok(value) => values.push(value),
                Err(FieldError::Invalid(messages)) => {
                    errors.insert(index.to_string(), messages);
                }
                Err(fatal) => return Err(fatal),
            }
        }

        if errors.is_empty() {
            Ok(Value::List(values))
        } else {
            Err(FieldError::Invalid(Messages::Map(errors)))
        }
    }
}
