//! Phone numbers.

use ormschema_catalog::Value;
use phonenumber::country;
use serde_json::Value as Json;

use super::{FieldContext, FieldKind};
use crate::error::{FieldError, Messages, SchemaError};

const NOT_A_PHONE_NUMBER: &str = "The string supplied did not seem to be a phone number.";

/// Phone number parsed with an optional default region.
///
/// The region of the schema context wins over the field's own. Numbers that
/// parse but are not valid for their region fail validation under `valid`.
#[derive(Debug, Clone, Default)]
pub struct PhoneNumber {
    region: Option<String>,
}

impl PhoneNumber {
    /// Parse without a default region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse national numbers as belonging to `region` (`FR`, `GB`, ...).
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

impl FieldKind for PhoneNumber {
    fn type_name(&self) -> &'static str {
        "PhoneNumber"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Phone(number) => Ok(Json::String(
                number.format().mode(phonenumber::Mode::International).to_string(),
            )),
            Value::String(text) => Ok(Json::String(text.clone())),
            _ => Err(ctx.serialization_error(NOT_A_PHONE_NUMBER)),
        }
    }

    fn deserialize(&self, wire: &Json, ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        let text = wire
            .as_str()
            .ok_or_else(|| FieldError::message(NOT_A_PHONE_NUMBER))?;

        let region = ctx
            .inherited
            .region
            .as_deref()
            .or(self.region.as_deref())
            .and_then(|r| r.to_ascii_uppercase().parse::<country::Id>().ok());

        phonenumber::parse(region, text)
            .map(Value::Phone)
            .map_err(|_| FieldError::message(NOT_A_PHONE_NUMBER))
    }

    fn validate(&self, value: &Value, _ctx: &FieldContext<'_>) -> Result<(), FieldError> {
        match value {
            Value::Phone(number) if !phonenumber::is_valid(number) => Err(FieldError::Invalid(
                Messages::keyed("valid", "Is not a valid number"),
            )),
            _ => Ok(()),
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
    fn test_international_number() {
        let ctx = inherited();
        let fctx = FieldContext::new("phone", &ctx);
        let field = Field::phone_number();

        let value = field.load(&json!("+33 1 23 45 67 89"), &fctx).unwrap();
        assert!(matches!(value, Value::Phone(_)));

        let wire = field.dump(&value, &fctx).unwrap();
        assert_eq!(field.load(&wire, &fctx).unwrap(), value);
    }

    #[test]
    fn test_region_from_field() {
        let ctx = inherited();
        let fctx = FieldContext::new("phone", &ctx);
        let field = Field::new(PhoneNumber::new().with_region("FR"));

        let national = field.load(&json!("01 23 45 67 89"), &fctx).unwrap();
        let international = field.load(&json!("+33123456789"), &fctx).unwrap();
        assert_eq!(national.to_json(), international.to_json());
        assert_eq!(national.to_json(), json!("+33123456789"));
    }

    #[test]
    fn test_region_from_context() {
        let mut ctx = inherited();
        ctx.region = Some("FR".into());
        let fctx = FieldContext::new("phone", &ctx);

        let value = Field::phone_number()
            .load(&json!("01 23 45 67 89"), &fctx)
            .unwrap();
        assert!(matches!(value, Value::Phone(_)));
    }

    #[test]
    fn test_not_a_phone_number() {
        let ctx = inherited();
        let fctx = FieldContext::new("phone", &ctx);

        let err = Field::phone_number().load(&json!("bad"), &fctx).unwrap_err();
        assert!(matches!(
            err,
            FieldError::Invalid(ref m) if m.as_list() == Some(&[NOT_A_PHONE_NUMBER.to_string()][..])
        ));
    }
}
