//! Catalog error types.

use thiserror::Error;

/// Errors raised by a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The model is not registered.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The model has no such field.
    #[error("unknown field '{field}' on model {model}")]
    UnknownField {
        /// Registry name of the model.
        model: String,
        /// Field that was asked for.
        field: String,
    },

    /// Query execution failed.
    #[error("query error: {0}")]
    Query(String),
}
