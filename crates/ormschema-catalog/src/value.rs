//! Runtime value types held by records and produced by loads.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use celes::LookupTable;
use phonenumber::PhoneNumber;
use uuid::Uuid;

use crate::record::Record;

/// A canonical in-memory value.
///
/// Records store these, field adapters produce them on load and consume them
/// on dump. Structured adapter values (phone numbers, countries, colors) keep
/// their parsed form so they compare by meaning rather than by wire text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// UUID.
    Uuid(Uuid),
    /// Calendar date.
    Date(NaiveDate),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// Time of day.
    Time(NaiveTime),
    /// JSON document (JSON-typed attributes).
    Json(serde_json::Value),
    /// Parsed phone number.
    Phone(PhoneNumber),
    /// ISO 3166 country.
    Country(Country),
    /// RGB color.
    Color(Color),
    /// Ordered collection.
    List(Vec<Value>),
    /// Field mapping produced by loading nested data.
    Map(BTreeMap<String, Value>),
    /// A related record.
    Record(Record),
}

/// An ISO 3166 country, copied out of the `celes` tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Country {
    /// Two-letter code (`FR`).
    pub alpha2: &'static str,
    /// Three-letter code (`FRA`).
    pub alpha3: &'static str,
    /// Three-digit numeric code (`250`).
    pub numeric: &'static str,
    /// Common English name (`Netherlands`).
    pub name: &'static str,
    /// Official state name (`The Netherlands`).
    pub official_name: &'static str,
    /// Alternate names (`UnitedKingdom`, `GreatBritain`).
    pub aliases: &'static [&'static str],
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is null or an empty string, collection or blob.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get as a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Try to get as a JSON document.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(j) => Some(j),
            _ => None,
        }
    }

    /// Look up a named entry of a record or of a loaded mapping.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(r) => r.get(name),
            Value::Map(map) => map.get(name),
            _ => None,
        }
    }

    /// Plain JSON rendition of the value.
    ///
    /// Bytes become lowercase hex, phone numbers E.164, countries their
    /// alpha-3 code and colors `#rrggbb`. Schema dumps go through the field
    /// adapters instead; this is for diagnostics and filter messages.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::json!(i),
            Value::Float(f) => serde_json::json!(f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(hex::encode(b)),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Time(t) => serde_json::Value::String(t.to_string()),
            Value::Json(j) => j.clone(),
            Value::Phone(p) => serde_json::Value::String(
                p.format().mode(phonenumber::Mode::E164).to_string(),
            ),
            Value::Country(c) => serde_json::Value::String(c.alpha3.to_string()),
            Value::Color(c) => serde_json::Value::String(c.to_hex()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Record(r) => r.to_json(),
        }
    }
}

impl fmt::Display for Value {
    /// Literal rendering used in validation messages: quoted strings, `None`, `[..]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::String(s) => write!(f, "'{}'", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(r) => write!(f, "<{}>", r.model()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

static COUNTRIES: [celes::Country; 250] = celes::Country::get_countries();

impl Country {
    /// Look up by two-letter code.
    pub fn from_alpha2(code: &str) -> Option<Self> {
        celes::Country::from_alpha2(code).ok().and_then(Self::from_table)
    }

    /// Look up by three-letter code.
    pub fn from_alpha3(code: &str) -> Option<Self> {
        celes::Country::from_alpha3(code).ok().and_then(Self::from_table)
    }

    /// Look up by three-digit numeric code.
    pub fn from_numeric(code: &str) -> Option<Self> {
        celes::Country::from_code(code).ok().and_then(Self::from_table)
    }

    /// Look up by common name, official name or alias.
    ///
    /// Case, spaces and punctuation are ignored. Names win over aliases, so
    /// `Samoa` is Samoa and not American Samoa.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name_key(name);
        COUNTRIES
            .iter()
            .map(Self::from)
            .find(|c| name_key(c.name) == wanted || name_key(c.official_name) == wanted)
            .or_else(|| {
                COUNTRIES
                    .iter()
                    .map(Self::from)
                    .find(|c| c.aliases.iter().any(|alias| name_key(alias) == wanted))
            })
    }

    /// Look up by official state name only.
    pub fn from_official_name(name: &str) -> Option<Self> {
        let wanted = name_key(name);
        COUNTRIES
            .iter()
            .map(Self::from)
            .find(|c| name_key(c.official_name) == wanted)
    }

    fn from_table(found: celes::Country) -> Option<Self> {
        COUNTRIES
            .iter()
            .find(|c| c.alpha2 == found.alpha2)
            .map(Self::from)
    }
}

fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl From<&'static celes::Country> for Country {
    fn from(c: &'static celes::Country) -> Self {
        Self {
            alpha2: c.alpha2,
            alpha3: c.alpha3,
            numeric: c.code,
            name: c.long_name.strip_prefix("The ").unwrap_or(c.long_name),
            official_name: c.long_name,
            aliases: c.aliases.iter().as_slice(),
        }
    }
}

impl Color {
    /// Create a color from its channels.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return None,
        };
        let bytes = hex::decode(expanded).ok()?;
        Some(Self::new(bytes[0], bytes[1], bytes[2]))
    }

    /// Lowercase `#rrggbb` rendering.
    pub fn to_hex(&self) -> String {
        format!("#{}", hex::encode([self.r, self.g, self.b]))
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl From<Vec<Record>> for Value {
    fn from(v: Vec<Record>) -> Self {
        Value::List(v.into_iter().map(Value::Record).collect())
    }
}

impl From<Country> for Value {
    fn from(v: Country) -> Self {
        Value::Country(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Value::Color(v)
    }
}

impl From<PhoneNumber> for Value {
    fn from(v: PhoneNumber) -> Self {
        Value::Phone(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
