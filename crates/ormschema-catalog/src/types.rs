//! Column type tags exposed by model descriptors.

use serde::{Deserialize, Serialize};

/// Type tag of a model attribute.
///
/// The tag is what the schema generator maps onto a field adapter. Tags the
/// generator does not know about (`Function`, `Opaque`) fall back to a raw
/// passthrough field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Boolean column.
    Boolean,
    /// 32-bit integer column.
    Integer,
    /// 64-bit integer column.
    BigInteger,
    /// Floating point column.
    Float,
    /// Fixed-precision decimal column (exposed as a float).
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Number of digits after decimal point.
        scale: u8,
    },
    /// Short UTF-8 string.
    String,
    /// Long UTF-8 text.
    Text,
    /// String holding an email address.
    Email,
    /// String holding a URL.
    Url,
    /// String restricted to a closed set of choices.
    Selection,
    /// UUID column.
    Uuid,
    /// Calendar date.
    Date,
    /// Date and time (UTC).
    DateTime,
    /// Time of day.
    Time,
    /// Binary blob.
    Bytes,
    /// JSON document.
    Json,
    /// Phone number.
    PhoneNumber,
    /// ISO 3166 country.
    Country,
    /// RGB color.
    Color,
    /// Computed attribute with no storage.
    Function,
    /// Relationship to another model.
    Relationship,
    /// Anything the registry cannot describe further.
    Opaque(String),
}

impl FieldType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Integer
                | FieldType::BigInteger
                | FieldType::Float
                | FieldType::Decimal { .. }
        )
    }

    /// Check if this type is a string-like type.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            FieldType::String
                | FieldType::Text
                | FieldType::Email
                | FieldType::Url
                | FieldType::Selection
        )
    }

    /// Check if this type describes a relationship.
    pub fn is_relationship(&self) -> bool {
        matches!(self, FieldType::Relationship)
    }
}
