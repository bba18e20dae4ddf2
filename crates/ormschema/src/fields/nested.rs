//! Nested schemas.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ormschema_catalog::Value;
use serde_json::Value as Json;

use super::{FieldContext, FieldKind, FieldShape};
use crate::config::{SchemaConfiguration, SchemaSettings};
use crate::error::{FieldError, Messages, SchemaError, INVALID_INPUT_TYPE, SCHEMA_ERROR_KEY};
use crate::schema::{Partial, Restrictions, SchemaDeclaration, SynthesizedSchema};

/// A field holding one record (or a list of records) of another schema.
///
/// The nested schema is synthesized again on every access, from the
/// registry, instances and region of the calling schema, so it can never
/// outlive the call that produced it.
#[derive(Clone)]
pub struct Nested {
    declaration: Arc<SchemaDeclaration>,
    many: bool,
    only: Option<Vec<String>>,
    exclude: Vec<String>,
}

impl Nested {
    /// Nest a declared schema.
    pub fn schema(declaration: &SchemaDeclaration) -> Self {
        Self {
            declaration: Arc::new(declaration.clone()),
            many: false,
            only: None,
            exclude: Vec::new(),
        }
    }

    /// Nest the primary key fields of a registered model.
    pub fn related(model: impl Into<String>) -> Self {
        let model = model.into();
        let declaration = SchemaDeclaration::builder(model.clone())
            .model(model)
            .only_primary_key(true)
            .build();
        Self::schema(&declaration)
    }

    /// Hold a list of records.
    pub fn many(self) -> Self {
        self.with_many(true)
    }

    /// Set whether a list of records is held.
    pub fn with_many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }

    /// Keep only these fields of the nested schema.
    pub fn only<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.only = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Drop these fields of the nested schema.
    pub fn exclude<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    /// The nested declaration.
    pub fn declaration(&self) -> &SchemaDeclaration {
        &self.declaration
    }

    /// Whether a list of records is held.
    pub fn is_many(&self) -> bool {
        self.many
    }

    fn synthesize(&self, ctx: &FieldContext<'_>) -> Result<SynthesizedSchema, SchemaError> {
        let config = SchemaConfiguration::resolve(
            &self.declaration,
            &SchemaSettings::default(),
            &ctx.inherited.as_context(),
            &SchemaSettings::default(),
        )?;
        let restrictions = Restrictions {
            only: self.only.clone(),
            exclude: self.exclude.clone(),
            partial: if ctx.partial { Partial::All } else { Partial::None },
        };
        SynthesizedSchema::build(&self.declaration, config, restrictions)
    }

    fn dump_one(
        schema: &SynthesizedSchema,
        value: &Value,
        ctx: &FieldContext<'_>,
    ) -> Result<Json, SchemaError> {
        match value {
            Value::Null => Ok(Json::Null),
            Value::Record(record) => schema.dump(record),
            Value::Map(map) => schema.dump(map),
            _ => Err(ctx.serialization_error(format!(
                "expected a {} record",
                schema.model().name()
            ))),
        }
    }
}

impl FieldKind for Nested {
    fn type_name(&self) -> &'static str {
        "Nested"
    }

    fn shape(&self) -> FieldShape {
        FieldShape::Nested
    }

    fn serialize(&self, value: &Value, ctx: &FieldContext<'_>) -> Result<Json, SchemaError> {
        let schema = self.synthesize(ctx)?;
        match (self.many, value) {
            (true, Value::List(items)) => items
                .iter()
                .map(|item| Self::dump_one(&schema, item, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            (true, _) => Err(ctx.serialization_error("expected a list of records")),
            (false, one) => Self::dump_one(&schema, one, ctx),
        }
    }

    fn deserialize(&self, wire: &Json, ctx: &FieldContext<'_>) -> Result<Value, FieldError> {
        let schema = self.synthesize(ctx)?;
        if !self.many {
            return schema.load_object(wire).map(Value::Map);
        }

        let items = wire
            .as_array()
            .ok_or_else(|| FieldError::Invalid(Messages::keyed(SCHEMA_ERROR_KEY, INVALID_INPUT_TYPE)))?;

        let mut values = Vec::with_capacity(items.len());
        let mut errors = BTreeMap::new();
        for (index, item) in items.iter().enumerate() {
            match schema.load_object(item) {
                Ok(map) => values.push(Value::Map(map)),
                Err(FieldError::Invalid(messages)) => {
                    errors.insert(index.to_string(), messages);
                }
                Err(fatal) => return Err(fatal),
            }
        }

        if errors.is_empty() {
            Ok(Value::List(values))
        } else {
            Err(FieldError::Invalid(Messages::Map(errors)))
        }
    }
}

impl fmt::Debug for Nested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nested")
            .field("schema", &self.declaration.name())
            .field("many", &self.many)
            .field("only", &self.only)
            .field("exclude", &self.exclude)
            .finish()
    }
}
