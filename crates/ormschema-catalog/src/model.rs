//! Model definitions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::field::{FieldDef, Selection};

/// Resolver producing `(value, label)` choice pairs for a selection field.
pub type ChoiceResolver = Arc<dyn Fn() -> Vec<(String, String)> + Send + Sync>;

/// A registered model: its name, its attributes and its choice resolvers.
#[derive(Clone)]
pub struct ModelDef {
    /// Registry name (e.g. `Model.Customer`).
    pub name: String,
    /// Attribute descriptors, in declaration order.
    pub fields: Vec<FieldDef>,
    resolvers: HashMap<String, ChoiceResolver>,
}

impl ModelDef {
    /// Create a new model definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            resolvers: HashMap::new(),
        }
    }

    /// Add a field to the model.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Register a named choice resolver for selection fields.
    pub fn with_choice_resolver<F>(mut self, name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn() -> Vec<(String, String)> + Send + Sync + 'static,
    {
        self.resolvers.insert(name.into(), Arc::new(resolver));
        self
    }

    /// Get a field by its registered name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Registered names of the primary key fields, in declaration order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.primary_key)
            .map(|f| f.name.as_str())
    }

    /// Choice pairs of a selection field, whether declared inline or resolved.
    ///
    /// Returns `None` when the field has no selection or names a resolver the
    /// model does not have.
    pub fn selection_choices(&self, field: &FieldDef) -> Option<Vec<(String, String)>> {
        match field.selection.as_ref()? {
            Selection::Static(choices) => Some(choices.clone()),
            Selection::Resolver(name) => self.resolvers.get(name).map(|resolve| resolve()),
        }
    }
}

impl fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDef")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}
