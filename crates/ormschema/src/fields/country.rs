//! ISO 3166 countries.

use ormschema_catalog::{Country as CountryValue, Value};
use serde_json::Value as Json;

use super::{FieldContext, FieldKind};
use crate::error::{FieldError, SchemaError};

const INVALID_COUNTRY: &str = "Not a valid country.";

/// Wire representation of a country.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountryFormat {
    /// Two-letter code (`FR`).
    Alpha2,
    /// Three-letter code (`FRA`).
    #[default]
    Alpha3,
    /// Three-digit numeric code (`250`).
    Numeric,
    /// Common English name (`Netherlands`). Loads also accept the official
    /// name and known aliases.
    Name,
    /// Official state name (`The Netherlands`).
    OfficialName,
}

impl CountryFormat {
    fn lookup(&self, text: &str) -> Option<CountryValue> {
        match self {
            CountryFormat::Alpha2 => CountryValue::from_alpha2(text),
            CountryFormat::Alpha3 => CountryValue::from_alpha3(text),
            CountryFormat::Numeric => CountryValue::from_numeric(text),
            CountryFormat::Name => CountryValue::from_name(text),
            CountryFormat::OfficialName => CountryValue::from_official_name(text),
        }
    }

    fn render(&self, country: &CountryValue) -> &'static str {
        match self {
            CountryFormat::Alpha2 => country.alpha2,
            CountryFormat::Alpha3 => country.alpha3,
            CountryFormat::Numeric => country.numeric,
            CountryFormat::Name => country.name,
            CountryFormat::OfficialName => country.official_name,
        }
    }
}

/// Country field. Load and dump formats are set independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct Country {
    load_format: CountryFormat,
    dump_format: CountryFormat,
}

impl Country {
    /// Alpha-3 in both directions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Format accepted on load.
    pub fn load_as(mut self, format: CountryFormat) -> Self {
        self.load_format = format;
        self
    }

    /// Format produced on dump.
    pub fn dump_as(mut self, format: CountryFormat) -> Self {
        self.dump_format = format;
        self
    }
}

impl FieldKind for Country {
    fn type_name(&self) -> &'static str {
        "Country"
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        match value {
            Value::Country(country) => Ok(Json::String(self.dump_format.render(country).to_string())),
            Value::String(text) => Ok(Json::String(text.clone())),
            _ => Err(ctx.serialization_error(INVALID_COUNTRY)),
        }
    }

    fn deserialize(&self, wire: &Json, _ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        let text = match wire {
            Json::String(s) => s.clone(),
            Json::Number(n) if self.load_format == CountryFormat::Numeric => {
                format!("{:03}", n.as_u64().unwrap_or(0))
            }
            _ => return Err(FieldError::message(INVALID_COUNTRY)),
        };
        self.load_format
            .lookup(text.trim())
            .map(Value::Country)
            .ok_or_else(|| FieldError::message(INVALID_COUNTRY))
    }
}
