//! Schema synthesis engine.
//!
//! A [`SchemaWrapper`] resolves the configuration of each call, then builds a
//! [`SynthesizedSchema`]: generated fields from the model descriptors,
//! overridden by the declared fields, restricted by `only` / `exclude` and
//! only-primary-key mode. Loads may end with a [`PostLoadResolution`].

mod generator;
mod post_load;
mod synthesized;
mod wrapper;

pub use generator::generate_fields;
pub use post_load::{PostLoadResolution, INSTANCE_ERROR_KEY};
pub use synthesized::{FieldSource, Loaded, Partial, Restrictions, SynthesizedSchema};
pub use wrapper::{SchemaDeclaration, SchemaDeclarationBuilder, SchemaWrapper};
