//! The registry interface consumed by schema synthesis.

use std::fmt;
use std::sync::Arc;

use crate::error::CatalogError;
use crate::field::FieldDef;
use crate::filter::FilterExpr;
use crate::model::ModelDef;
use crate::record::Record;
use crate::value::Value;

/// Internal prefix some registries put in front of column attribute names.
pub const COLUMN_PREFIX: &str = "orm_";

/// Source of model metadata and persisted records.
///
/// Implementations are shared read-only across calls, hence `Send + Sync`.
/// Records returned by `query` are keyed by public field names.
pub trait Registry: Send + Sync {
    /// Get a model definition by registry name.
    fn lookup(&self, model: &str) -> Result<Arc<ModelDef>, CatalogError>;

    /// All records of `model` matching every filter.
    fn query(&self, model: &str, filters: &[FilterExpr]) -> Result<Vec<Record>, CatalogError>;

    /// Fetch one record by its primary key values.
    ///
    /// An empty key never matches.
    fn fetch_by_primary_key(
        &self,
        model: &str,
        key: &[(String, Value)],
    ) -> Result<Option<Record>, CatalogError> {
        if key.is_empty() {
            return Ok(None);
        }
        let filters: Vec<FilterExpr> = key
            .iter()
            .map(|(name, value)| FilterExpr::eq(name.clone(), value.clone()))
            .collect();
        Ok(self.query(model, &filters)?.into_iter().next())
    }

    /// Prefix stripped from attribute names to get public field names.
    fn column_prefix(&self) -> &str {
        COLUMN_PREFIX
    }
}

/// Strip `prefix` from a registered attribute name.
///
/// A name equal to the prefix is kept as is.
pub fn public_name<'a>(name: &'a str, prefix: &str) -> &'a str {
    match name.strip_prefix(prefix) {
        Some(stripped) if !prefix.is_empty() && !stripped.is_empty() => stripped,
        _ => name,
    }
}

/// A resolved model paired with the registry that owns it.
#[derive(Clone)]
pub struct ModelHandle {
    registry: Arc<dyn Registry>,
    model: Arc<ModelDef>,
}

impl ModelHandle {
    /// Look up `model` in `registry`.
    pub fn resolve(registry: Arc<dyn Registry>, model: &str) -> Result<Self, CatalogError> {
        let model = registry.lookup(model)?;
        Ok(Self { registry, model })
    }

    /// Registry name of the model.
    pub fn name(&self) -> &str {
        &self.model.name
    }

    /// The owning registry.
    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// The model definition.
    pub fn definition(&self) -> &ModelDef {
        &self.model
    }

    /// Attribute descriptors in declaration order.
    pub fn field_descriptors(&self) -> &[FieldDef] {
        &self.model.fields
    }

    /// Public name of a descriptor, without the registry's column prefix.
    pub fn public_name<'a>(&self, field: &'a FieldDef) -> &'a str {
        public_name(&field.name, self.registry.column_prefix())
    }

    /// Public names of the primary key fields, in declaration order.
    pub fn primary_key_names(&self) -> Vec<String> {
        let prefix = self.registry.column_prefix();
        self.model
            .primary_keys()
            .map(|name| public_name(name, prefix).to_string())
            .collect()
    }

    /// Choice pairs of a selection descriptor.
    pub fn selection_choices(&self, field: &FieldDef) -> Option<Vec<(String, String)>> {
        self.model.selection_choices(field)
    }

    /// Fetch one record by its primary key values.
    pub fn fetch_by_primary_key(
        &self,
        key: &[(String, Value)],
    ) -> Result<Option<Record>, CatalogError> {
        self.registry.fetch_by_primary_key(self.name(), key)
    }

    /// All records matching every filter.
    pub fn fetch_all_matching(&self, filters: &[FilterExpr]) -> Result<Vec<Record>, CatalogError> {
        self.registry.query(self.name(), filters)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model.name)
            .finish()
    }
}
