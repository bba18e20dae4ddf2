//! Schema declarations and the wrapper callers hold.

use std::collections::HashMap;
use std::sync::Arc;

use ormschema_catalog::{Record, Registry};
use serde_json::Value as Json;

use super::synthesized::{FieldSource, Loaded, Partial, Restrictions, SynthesizedSchema};
use crate::config::{PostLoad, RequiredFields, SchemaConfiguration, SchemaContext, SchemaSettings};
use crate::error::{ErrorMap, SchemaError};
use crate::fields::Field;

/// A named schema declaration: class-level defaults plus declared fields.
///
/// Declared fields override generated fields of the same name.
#[derive(Debug, Clone)]
pub struct SchemaDeclaration {
    name: String,
    defaults: SchemaSettings,
    fields: Vec<(String, Field)>,
}

impl SchemaDeclaration {
    /// Start a declaration.
    pub fn builder(name: impl Into<String>) -> SchemaDeclarationBuilder {
        SchemaDeclarationBuilder {
            declaration: SchemaDeclaration {
                name: name.into(),
                defaults: SchemaSettings::default(),
                fields: Vec::new(),
            },
        }
    }

    /// Declaration name, used in configuration errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class-level settings tier.
    pub fn defaults(&self) -> &SchemaSettings {
        &self.defaults
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }
}

/// Builder for [`SchemaDeclaration`].
#[derive(Debug)]
pub struct SchemaDeclarationBuilder {
    declaration: SchemaDeclaration,
}

impl SchemaDeclarationBuilder {
    /// Default model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.declaration.defaults.model = Some(model.into());
        self
    }

    /// Default registry.
    pub fn registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.declaration.defaults.registry = Some(registry);
        self
    }

    /// Default required-field override.
    pub fn required_fields(mut self, required: RequiredFields) -> Self {
        self.declaration.defaults.required_fields = Some(required);
        self
    }

    /// Default only-primary-key mode.
    pub fn only_primary_key(mut self, only_primary_key: bool) -> Self {
        self.declaration.defaults.only_primary_key = Some(only_primary_key);
        self
    }

    /// Default post-load policy.
    pub fn post_load(mut self, post_load: PostLoad) -> Self {
        self.declaration.defaults.post_load = Some(post_load);
        self
    }

    /// Default named records.
    pub fn instances(mut self, instances: HashMap<String, Record>) -> Self {
        self.declaration.defaults.instances = Some(instances);
        self
    }

    /// Declare a field. A later declaration of the same name replaces the
    /// earlier one.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        let name = name.into();
        let fields = &mut self.declaration.fields;
        match fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = field,
            None => fields.push((name, field)),
        }
        self
    }

    /// Finish the declaration.
    pub fn build(self) -> SchemaDeclaration {
        self.declaration
    }
}

/// The object callers hold: a declaration with instance settings, a
/// context and base-schema restrictions.
///
/// Every call resolves its own configuration and synthesizes its own
/// schema. The wrapper is never modified by a call.
#[derive(Debug, Clone)]
pub struct SchemaWrapper {
    declaration: Arc<SchemaDeclaration>,
    settings: SchemaSettings,
    context: SchemaContext,
    restrictions: Restrictions,
}

impl SchemaWrapper {
    /// Wrap a declaration with empty instance settings.
    pub fn new(declaration: &SchemaDeclaration) -> Self {
        Self {
            declaration: Arc::new(declaration.clone()),
            settings: SchemaSettings::default(),
            context: SchemaContext::default(),
            restrictions: Restrictions::default(),
        }
    }

    /// Set the instance model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = Some(model.into());
        self
    }

    /// Set the instance registry.
    pub fn with_registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.settings.registry = Some(registry);
        self
    }

    /// Set the instance required-field override.
    pub fn with_required_fields(mut self, required: RequiredFields) -> Self {
        self.settings.required_fields = Some(required);
        self
    }

    /// Set the instance only-primary-key mode.
    pub fn with_only_primary_key(mut self, only_primary_key: bool) -> Self {
        self.settings.only_primary_key = Some(only_primary_key);
        self
    }

    /// Set the instance named records.
    pub fn with_instances(mut self, instances: HashMap<String, Record>) -> Self {
        self.settings.instances = Some(instances);
        self
    }

    /// Set the instance post-load policy.
    pub fn with_post_load(mut self, post_load: PostLoad) -> Self {
        self.settings.post_load = Some(post_load);
        self
    }

    /// Set the context tier.
    pub fn with_context(mut self, context: SchemaContext) -> Self {
        self.context = context;
        self
    }

    /// Keep only these fields.
    pub fn with_only<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.restrictions.only = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Drop these fields.
    pub fn with_exclude<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.restrictions.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    /// Tolerate missing required fields.
    pub fn with_partial(mut self, partial: Partial) -> Self {
        self.restrictions.partial = partial;
        self
    }

    /// The declaration.
    pub fn declaration(&self) -> &SchemaDeclaration {
        &self.declaration
    }

    /// The instance settings tier.
    pub fn settings(&self) -> &SchemaSettings {
        &self.settings
    }

    /// The context tier.
    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    /// Synthesize the schema of a call without call-time settings.
    pub fn schema(&self) -> Result<SynthesizedSchema, SchemaError> {
        self.schema_with(&SchemaSettings::default())
    }

    /// Synthesize the schema of a call.
    pub fn schema_with(&self, call: &SchemaSettings) -> Result<SynthesizedSchema, SchemaError> {
        let config =
            SchemaConfiguration::resolve(&self.declaration, &self.settings, &self.context, call)?;
        SynthesizedSchema::build(&self.declaration, config, self.restrictions.clone())
    }

    /// Load `data`.
    pub fn load(&self, data: &Json) -> Result<Loaded, SchemaError> {
        self.load_with(data, &SchemaSettings::default())
    }

    /// Load `data` with call-time settings.
    pub fn load_with(&self, data: &Json, call: &SchemaSettings) -> Result<Loaded, SchemaError> {
        self.schema_with(call)?.load(data)
    }

    /// Dump a record or field map.
    pub fn dump<S: FieldSource + ?Sized>(&self, source: &S) -> Result<Json, SchemaError> {
        self.dump_with(source, &SchemaSettings::default())
    }

    /// Dump a record or field map with call-time settings.
    pub fn dump_with<S: FieldSource + ?Sized>(
        &self,
        source: &S,
        call: &SchemaSettings,
    ) -> Result<Json, SchemaError> {
        self.schema_with(call)?.dump(source)
    }

    /// Dump several records with one synthesized schema.
    pub fn dump_many<S: FieldSource>(&self, sources: &[S]) -> Result<Json, SchemaError> {
        let schema = self.schema()?;
        sources
            .iter()
            .map(|source| schema.dump(source))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array)
    }

    /// Validate `data` and return every message.
    pub fn validate(&self, data: &Json) -> Result<ErrorMap, SchemaError> {
        self.validate_with(data, &SchemaSettings::default())
    }

    /// Validate `data` with call-time settings.
    pub fn validate_with(&self, data: &Json, call: &SchemaSettings) -> Result<ErrorMap, SchemaError> {
        self.schema_with(call)?.validate(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormschema_catalog::{FieldDef, FieldType, MemoryRegistry, ModelDef};
    use serde_json::json;

    fn registry() -> Arc<dyn Registry> {
        Arc::new(
            MemoryRegistry::new().with_model(
                ModelDef::new("Model.Exemple")
                    .with_field(FieldDef::primary_key("id", FieldType::Integer))
                    .with_field(FieldDef::new("orm_name", FieldType::String).not_null()),
            ),
        )
    }

    #[test]
    fn test_builder_field_replaces() {
        let declaration = SchemaDeclaration::builder("ExempleSchema")
            .field("name", Field::integer())
            .field("name", Field::string())
            .build();

        assert_eq!(declaration.fields().len(), 1);
        assert_eq!(declaration.fields()[0].1.type_name(), "String");
    }

    #[test]
    fn test_call_settings_do_not_stick() {
        let declaration = SchemaDeclaration::builder("ExempleSchema")
            .model("Model.Exemple")
            .build();
        let wrapper = SchemaWrapper::new(&declaration);

        let call = SchemaSettings::new().with_registry(registry());
        assert!(wrapper.validate_with(&json!({"id": 1, "name": "a"}), &call).unwrap().is_empty());

        assert!(wrapper.settings().registry.is_none());
        assert!(matches!(
            wrapper.validate(&json!({})).unwrap_err(),
            SchemaError::RegistryNotFound { .. }
        ));
    }

    #[test]
    fn test_schema_reports_fields() {
        let declaration = SchemaDeclaration::builder("ExempleSchema")
            .model("Model.Exemple")
            .registry(registry())
            .build();
        let wrapper = SchemaWrapper::new(&declaration).with_exclude(["name"]);

        assert_eq!(wrapper.schema().unwrap().field_names(), vec!["id"]);
    }

    #[test]
    fn test_dump_many() {
        let declaration = SchemaDeclaration::builder("ExempleSchema")
            .model("Model.Exemple")
            .registry(registry())
            .build();
        let wrapper = SchemaWrapper::new(&declaration);
        let records = vec![
            Record::new("Model.Exemple").with("id", 1).with("name", "a"),
            Record::new("Model.Exemple").with("id", 2),
        ];

        assert_eq!(
            wrapper.dump_many(&records).unwrap(),
            json!([{"id": 1, "name": "a"}, {"id": 2}])
        );
    }
}
