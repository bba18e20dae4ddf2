//! ormschema - schema synthesis and validation over an ORM model registry.
//!
//! This crate builds, per call, a schema for a registered model and uses it to
//! dump records to plain JSON, load JSON back into validated values (or into
//! the persisted record it designates) and validate JSON without loading it.

pub mod config;
pub mod error;
pub mod fields;
pub mod schema;

pub use config::{
    InheritedContext, PostLoad, RequiredFields, SchemaConfiguration, SchemaContext,
    SchemaSettings, DEFAULT_INSTANCE_NAME,
};
pub use error::{
    ErrorMap, FieldError, Messages, SchemaError, ValidationError, INVALID_INPUT_TYPE,
    MISSING_REQUIRED, NULL_NOT_ALLOWED, SCHEMA_ERROR_KEY,
};
pub use fields::{Field, FieldContext, FieldKind, FieldShape, Nested, OneOf, Validator};
pub use schema::{
    FieldSource, Loaded, Partial, PostLoadResolution, SchemaDeclaration, SchemaWrapper,
    SynthesizedSchema,
};

/// Re-export the registry collaborator.
pub use ormschema_catalog as catalog;
pub use ormschema_catalog::{MemoryRegistry, ModelDef, Record, Registry, Value};
