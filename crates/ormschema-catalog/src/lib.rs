//! Model registry collaborator for ormschema.
//!
//! This crate describes what the schema engine consumes from an ORM layer:
//! - Model and field descriptors ([`ModelDef`], [`FieldDef`], [`FieldType`])
//! - Runtime values and record snapshots ([`Value`], [`Record`])
//! - Equality and membership filters ([`FilterExpr`])
//! - The [`Registry`] trait and a [`ModelHandle`] over it
//!
//! [`MemoryRegistry`] is an in-memory implementation for tests and embedders.

pub mod error;
pub mod field;
pub mod filter;
pub mod memory;
pub mod model;
pub mod record;
pub mod registry;
pub mod relation;
pub mod types;
pub mod value;

pub use error::CatalogError;
pub use field::{FieldDef, Selection};
pub use filter::{FilterEvaluator, FilterExpr};
pub use memory::MemoryRegistry;
pub use model::{ChoiceResolver, ModelDef};
pub use record::Record;
pub use registry::{public_name, ModelHandle, Registry, COLUMN_PREFIX};
pub use relation::{RelationDef, RelationKind};
pub use types::FieldType;
pub use value::{Color, Country, Value};
