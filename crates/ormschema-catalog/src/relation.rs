//! Relation descriptors between models.

use serde::{Deserialize, Serialize};

/// Kind of a relationship attribute, seen from the model that declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// Many records of this model point to one target record.
    ManyToOne,
    /// One record of this model points to one target record.
    OneToOne,
    /// One record of this model owns many target records.
    OneToMany,
    /// Many-to-many through an association table.
    ManyToMany,
}

/// A relation from one model attribute to another model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Registry name of the target model.
    pub model: String,
    /// Relation kind.
    pub kind: RelationKind,
}

impl RelationKind {
    /// Whether the attribute holds a collection of target records.
    pub fn is_many(&self) -> bool {
        matches!(self, RelationKind::OneToMany | RelationKind::ManyToMany)
    }
}

impl RelationDef {
    /// Create a many-to-one relation.
    pub fn many_to_one(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            kind: RelationKind::ManyToOne,
        }
    }

    /// Create a one-to-one relation.
    pub fn one_to_one(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            kind: RelationKind::OneToOne,
        }
    }

    /// Create a one-to-many relation.
    pub fn one_to_many(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            kind: RelationKind::OneToMany,
        }
    }

    /// Create a many-to-many relation.
    pub fn many_to_many(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            kind: RelationKind::ManyToMany,
        }
    }

    /// Whether the relation holds many target records.
    pub fn is_many(&self) -> bool {
        self.kind.is_many()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality() {
        assert!(!RelationDef::many_to_one("Model.City").is_many());
        assert!(!RelationDef::one_to_one("Model.Profile").is_many());
        assert!(RelationDef::one_to_many("Model.Address").is_many());
        assert!(RelationDef::many_to_many("Model.Tag").is_many());
    }

    #[test]
    fn test_target_model() {
        let rel = RelationDef::many_to_many("Model.Tag");
        assert_eq!(rel.model, "Model.Tag");
        assert_eq!(rel.kind, RelationKind::ManyToMany);
    }
}
