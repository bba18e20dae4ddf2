//! Field descriptors for models.

use super::relation::RelationDef;
use super::types::FieldType;
use serde::{Deserialize, Serialize};

/// Closed choice set of a selection field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Choices declared inline as `(value, label)` pairs.
    Static(Vec<(String, String)>),
    /// Choices produced by a resolver registered on the model under this name.
    Resolver(String),
}

/// Metadata about one model attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Attribute name as registered, possibly carrying the column prefix.
    pub name: String,
    /// Type tag.
    pub field_type: FieldType,
    /// Whether the column accepts null.
    pub nullable: bool,
    /// Whether the attribute is part of the primary key.
    pub primary_key: bool,
    /// Whether the storage layer provides a value when none is given.
    pub has_default: bool,
    /// Closed choice set for selection fields.
    pub selection: Option<Selection>,
    /// Target of a relationship attribute.
    pub relation: Option<RelationDef>,
}

impl FieldDef {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
            primary_key: false,
            has_default: false,
            selection: None,
            relation: None,
        }
    }

    /// Create an auto-assigned primary key column.
    pub fn primary_key(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            nullable: false,
            primary_key: true,
            has_default: true,
            ..Self::new(name, field_type)
        }
    }

    /// Create a selection column with inline choices.
    pub fn selection<V, L>(name: impl Into<String>, choices: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<String>,
        L: Into<String>,
    {
        Self {
            selection: Some(Selection::Static(
                choices
                    .into_iter()
                    .map(|(v, l)| (v.into(), l.into()))
                    .collect(),
            )),
            ..Self::new(name, FieldType::Selection)
        }
    }

    /// Create a selection column whose choices come from a named resolver.
    pub fn selection_from(name: impl Into<String>, resolver: impl Into<String>) -> Self {
        Self {
            selection: Some(Selection::Resolver(resolver.into())),
            ..Self::new(name, FieldType::Selection)
        }
    }

    /// Create a relationship attribute.
    pub fn relationship(name: impl Into<String>, relation: RelationDef) -> Self {
        Self {
            relation: Some(relation),
            ..Self::new(name, FieldType::Relationship)
        }
    }

    /// Reject null values.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the attribute as part of the primary key.
    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Mark the attribute as having a storage default.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Whether callers must supply this attribute when creating a record.
    pub fn natively_required(&self) -> bool {
        !self.nullable && !self.primary_key && !self.has_default
    }

    /// Check if this is a relationship attribute.
    pub fn is_relationship(&self) -> bool {
        self.relation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_builder() {
        let field = FieldDef::new("name", FieldType::String).not_null();

        assert_eq!(field.name, "name");
        assert!(!field.nullable);
        assert!(field.natively_required());
        assert!(!field.is_relationship());
    }

    #[test]
    fn test_primary_key_is_not_required() {
        let field = FieldDef::primary_key("id", FieldType::Integer);

        assert!(field.primary_key);
        assert!(!field.nullable);
        assert!(!field.natively_required());
    }

    #[test]
    fn test_default_is_not_required() {
        let field = FieldDef::new("state", FieldType::String)
            .not_null()
            .with_default();

        assert!(!field.natively_required());
    }

    #[test]
    fn test_selection() {
        let field = FieldDef::selection("state", [("draft", "Draft"), ("done", "Done")]);

        assert_eq!(field.field_type, FieldType::Selection);
        assert_eq!(
            field.selection,
            Some(Selection::Static(vec![
                ("draft".into(), "Draft".into()),
                ("done".into(), "Done".into()),
            ]))
        );
    }

    #[test]
    fn test_relationship() {
        let field = FieldDef::relationship("city", RelationDef::many_to_one("Model.City")).not_null();

        assert!(field.is_relationship());
        assert_eq!(field.field_type, FieldType::Relationship);
        assert!(field.natively_required());
    }
}
