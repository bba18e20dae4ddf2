//! Hex colors.

use ormschema_catalog::{Color as ColorValue, Value};
use serde_json::Value as Json;

use super::{FieldContext, FieldKind};
use crate::error::{FieldError, SchemaError};

const INVALID_COLOR: &str = "Not a valid color.";

/// `#rgb` or `#rrggbb` on the wire, dumped as lowercase `#rrggbb`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Color;

impl FieldKind for Color {
    fn type_name(&self) -> &'static str {
        "Color"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Color(color) => Ok(Json::String(color.to_hex())),
            Value::String(text) => Ok(Json::String(text.clone())),
            _ => Err(ctx.serialization_error(INVALID_COLOR)),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        wire.as_str()
            .and_then(ColorValue::from_hex)
            .map(Value::Color)
            .ok_or_else(|| FieldError::message(INVALID_COLOR))
    }
}
