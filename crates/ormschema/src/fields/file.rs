//! Binary content exchanged as base64 text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ormschema_catalog::Value;
use serde_json::Value as Json;

use super::{FieldContext, FieldKind};
use crate::error::{FieldError, SchemaError};

/// Bytes on the model side, standard base64 on the wire.
///
/// Empty content travels as null in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct File;

impl FieldKind for File {
    fn type_name(&self) -> &'static str {
        "File"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Bytes(bytes) if bytes.is_empty() => Ok(Json::Null),
            Value::Bytes(bytes) => Ok(Json::String(STANDARD.encode(bytes))),
            _ => Err(ctx.serialization_error("Not a valid binary value.")),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        match wire {
            Json::String(text) if text.is_empty() => Ok(Value::Null),
            Json::String(text) => STANDARD
                .decode(text.as_bytes())
                .map(Value::Bytes)
                .map_err(|_| FieldError::message("Not a valid base64 string.")),
            _ => Err(FieldError::message("Not a valid base64 string.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::tests::inherited;
    use crate::fields::Field;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let ctx = inherited();
        let fctx = FieldContext::new("file", &ctx);
        let field = Field::file().allow_none();

        let wire = field.dump(&Value::Bytes(b"hello".to_vec()), &fctx).unwrap();
        assert_eq!(wire, json!("aGVsbG8="));
        assert_eq!(field.load(&wire, &fctx).unwrap(), Value::Bytes(b"hello".to_vec()));
    }

    #[test]
    fn test_null_and_empty() {
        let ctx = inherited();
        let fctx = FieldContext::new("file", &ctx);
        let field = Field::file().allow_none();

        assert_eq!(field.dump(&Value::Null, &fctx).unwrap(), Json::Null);
        assert_eq!(field.dump(&Value::Bytes(Vec::new()), &fctx).unwrap(), Json::Null);
        assert_eq!(field.load(&Json::Null, &fctx).unwrap(), Value::Null);
        assert_eq!(field.load(&json!(""), &fctx).unwrap(), Value::Null);
    }

    #[test]
    fn test_invalid_base64() {
        let ctx = inherited();
        let fctx = FieldContext::new("file", &ctx);

        let err = Field::file().load(&json!("***"), &fctx).unwrap_err();
        assert!(matches!(err, FieldError::Invalid(_)));
    }
}
