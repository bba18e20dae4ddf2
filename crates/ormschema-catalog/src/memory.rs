//! In-memory registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::CatalogError;
use crate::filter::{FilterEvaluator, FilterExpr};
use crate::model::ModelDef;
use crate::record::Record;
use crate::registry::{public_name, Registry, COLUMN_PREFIX};

/// A registry holding model definitions and records in memory.
///
/// Records are kept in insertion order, which is the order queries return
/// them in.
pub struct MemoryRegistry {
    models: RwLock<HashMap<String, Arc<ModelDef>>>,
    records: RwLock<HashMap<String, Vec<Record>>>,
    column_prefix: String,
}

impl MemoryRegistry {
    /// Create an empty registry using [`COLUMN_PREFIX`].
    pub fn new() -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            records: RwLock::new(HashMap::new()),
            column_prefix: COLUMN_PREFIX.to_string(),
        }
    }

    /// Use a different column prefix.
    pub fn with_column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.column_prefix = prefix.into();
        self
    }

    /// Register (or replace) a model definition.
    pub fn register(&self, model: ModelDef) {
        debug!(model = %model.name, fields = model.fields.len(), "Registered model");
        self.models.write().insert(model.name.clone(), Arc::new(model));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_model(self, model: ModelDef) -> Self {
        self.register(model);
        self
    }

    /// Store a record. Its model must be registered.
    pub fn insert(&self, record: Record) -> Result<(), CatalogError> {
        if !self.models.read().contains_key(record.model()) {
            return Err(CatalogError::UnknownModel(record.model().to_string()));
        }
        self.records
            .write()
            .entry(record.model().to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    /// Number of stored records of a model.
    pub fn count(&self, model: &str) -> usize {
        self.records.read().get(model).map_or(0, Vec::len)
    }

    fn check_filter_fields(&self, model: &ModelDef, filters: &[FilterExpr]) -> Result<(), CatalogError> {
        for filter in filters {
            let known = model
                .fields
                .iter()
                .any(|f| public_name(&f.name, &self.column_prefix) == filter.field());
            if !known {
                return Err(CatalogError::UnknownField {
                    model: model.name.clone(),
                    field: filter.field().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for MemoryRegistry {
    fn lookup(&self, model: &str) -> Result<Arc<ModelDef>, CatalogError> {
        self.models
            .read()
            .get(model)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownModel(model.to_string()))
    }

    fn query(&self, model: &str, filters: &[FilterExpr]) -> Result<Vec<Record>, CatalogError> {
        let def = self.lookup(model)?;
        self.check_filter_fields(&def, filters)?;

        let records = self.records.read();
        let matched: Vec<Record> = records
            .get(model)
            .map(|rows| {
                rows.iter()
                    .filter(|r| FilterEvaluator::matches_all(filters, r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(model, filters = filters.len(), matched = matched.len(), "Query executed");
        Ok(matched)
    }

    fn column_prefix(&self) -> &str {
        &self.column_prefix
    }
}
