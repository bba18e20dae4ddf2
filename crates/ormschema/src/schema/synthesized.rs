//! Concrete per-call schemas.

use std::collections::BTreeMap;
use std::sync::Arc;

use ormschema_catalog::{ModelHandle, Record, Value};
use serde_json::Value as Json;
use tracing::debug;

use super::generator::generate_fields;
use super::post_load::PostLoadResolution;
use super::SchemaDeclaration;
use crate::config::{InheritedContext, PostLoad, SchemaConfiguration};
use crate::error::{
    ErrorMap, FieldError, Messages, SchemaError, ValidationError, INVALID_INPUT_TYPE,
    MISSING_REQUIRED, SCHEMA_ERROR_KEY,
};
use crate::fields::{Field, FieldContext};

/// Fields that may be missing on load even when required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Partial {
    /// Required fields must be present.
    #[default]
    None,
    /// Every field may be missing, in nested data too.
    All,
    /// The listed fields may be missing.
    Fields(Vec<String>),
}

impl Partial {
    /// Whether a missing `name` is tolerated.
    pub fn covers(&self, name: &str) -> bool {
        match self {
            Partial::None => false,
            Partial::All => true,
            Partial::Fields(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Restrictions applied to the field table after synthesis.
#[derive(Debug, Clone, Default)]
pub struct Restrictions {
    /// Keep only these fields.
    pub only: Option<Vec<String>>,
    /// Drop these fields.
    pub exclude: Vec<String>,
    /// Missing-field tolerance.
    pub partial: Partial,
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// The validated field values.
    Data(BTreeMap<String, Value>),
    /// The persisted record the data resolved to.
    Instance(Record),
}

impl Loaded {
    /// The field values, when no post-load resolution happened.
    pub fn data(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Loaded::Data(data) => Some(data),
            Loaded::Instance(_) => None,
        }
    }

    /// The resolved record, when post-load resolution happened.
    pub fn instance(&self) -> Option<&Record> {
        match self {
            Loaded::Instance(record) => Some(record),
            Loaded::Data(_) => None,
        }
    }

    /// Take the resolved record.
    pub fn into_instance(self) -> Option<Record> {
        match self {
            Loaded::Instance(record) => Some(record),
            Loaded::Data(_) => None,
        }
    }

    /// Plain JSON rendition.
    pub fn to_json(&self) -> Json {
        match self {
            Loaded::Data(data) => {
                Json::Object(data.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            Loaded::Instance(record) => record.to_json(),
        }
    }
}

/// Anything a schema can dump: values looked up by public field name.
pub trait FieldSource {
    /// Value of the named field, `None` when absent.
    fn field(&self, name: &str) -> Option<&Value>;
}

impl FieldSource for Record {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl FieldSource for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl FieldSource for Loaded {
    fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Loaded::Data(data) => data.get(name),
            Loaded::Instance(record) => record.get(name),
        }
    }
}

/// A schema built for one call: model, field table, restrictions and the
/// context its fields run in.
#[derive(Debug)]
pub struct SynthesizedSchema {
    name: String,
    model: ModelHandle,
    fields: Vec<(String, Field)>,
    partial: Partial,
    post_load: PostLoad,
    context: InheritedContext,
}

impl SynthesizedSchema {
    /// Build the schema of `declaration` under a resolved configuration.
    ///
    /// Generated fields come first, in model order. Declared fields replace
    /// generated fields of the same name and are appended otherwise.
    pub fn build(
        declaration: &SchemaDeclaration,
        config: SchemaConfiguration,
        restrictions: Restrictions,
    ) -> Result<Self, SchemaError> {
        let model = ModelHandle::resolve(Arc::clone(&config.registry), &config.model)?;

        let mut fields = generate_fields(&model, config.required_fields.as_ref());
        for (name, declared) in declaration.fields() {
            match fields.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1 = declared.clone(),
                None => fields.push((name.clone(), declared.clone())),
            }
        }

        let requested = restrictions
            .only
            .iter()
            .flatten()
            .chain(restrictions.exclude.iter());
        let invalid: Vec<&str> = requested
            .filter(|name| !fields.iter().any(|(existing, _)| existing == *name))
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            return Err(SchemaError::Construction(format!(
                "Invalid fields for {}: {}",
                declaration.name(),
                invalid.join(", ")
            )));
        }

        if config.only_primary_key {
            let primary_keys = model.primary_key_names();
            fields.retain(|(name, _)| primary_keys.contains(name));
        }
        if let Some(only) = &restrictions.only {
            fields.retain(|(name, _)| only.contains(name));
        }
        fields.retain(|(name, _)| !restrictions.exclude.contains(name));

        debug!(
            schema = declaration.name(),
            model = model.name(),
            fields = fields.len(),
            only_primary_key = config.only_primary_key,
            "Synthesized schema"
        );

        Ok(Self {
            name: declaration.name().to_string(),
            context: config.inherited(),
            post_load: config.post_load,
            model,
            fields,
            partial: restrictions.partial,
        })
    }

    /// Name of the declaration this schema was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model the schema describes.
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Post-load policy of the call.
    pub fn post_load(&self) -> &PostLoad {
        &self.post_load
    }

    /// Context handed to field hooks.
    pub fn context(&self) -> &InheritedContext {
        &self.context
    }

    /// Get a field by public name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, field)| field)
    }

    /// Public field names, in table order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Iterate over `(name, field)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Load and validate `data`, then apply the post-load policy.
    pub fn load(&self, data: &Json) -> Result<Loaded, SchemaError> {
        let values = self.load_object(data).map_err(into_schema_error)?;

        match PostLoadResolution::resolve(&self.model, &self.post_load, &values)? {
            None => Ok(Loaded::Data(values)),
            Some(resolution) => resolution
                .into_record(self.model.name())
                .map(Loaded::Instance)
                .map_err(SchemaError::Validation),
        }
    }

    /// Run the load checks and return every message, without post-load
    /// resolution.
    pub fn validate(&self, data: &Json) -> Result<ErrorMap, SchemaError> {
        match self.load_object(data) {
            Ok(_) => Ok(ErrorMap::new()),
            Err(FieldError::Invalid(messages)) => Ok(error_map(messages)),
            Err(FieldError::Fatal(error)) => Err(error),
        }
    }

    /// Dump every non load-only field present in `source`.
    pub fn dump<S: FieldSource + ?Sized>(&self, source: &S) -> Result<Json, SchemaError> {
        let mut out = serde_json::Map::new();
        for (name, field) in &self.fields {
            if field.is_load_only() {
                continue;
            }
            if let Some(value) = source.field(name) {
                let ctx = self.field_context(name);
                out.insert(name.clone(), field.dump(value, &ctx)?);
            }
        }
        Ok(Json::Object(out))
    }

    /// Load one JSON object into field values, collecting every error.
    pub(crate) fn load_object(&self, data: &Json) -> Result<BTreeMap<String, Value>, FieldError> {
        let input = data.as_object().ok_or_else(|| {
            FieldError::Invalid(Messages::keyed(SCHEMA_ERROR_KEY, INVALID_INPUT_TYPE))
        })?;

        let mut values = BTreeMap::new();
        let mut errors = ErrorMap::new();

        for (name, field) in &self.fields {
            if field.is_dump_only() {
                continue;
            }
            match input.get(name) {
                None => {
                    if field.is_required() && !self.partial.covers(name) {
                        errors.add(name.as_str(), MISSING_REQUIRED);
                    }
                }
                Some(wire) => match field.load(wire, &self.field_context(name)) {
                    Ok(value) => {
                        values.insert(name.clone(), value);
                    }
                    Err(FieldError::Invalid(messages)) => errors.insert(name.as_str(), messages),
                    Err(fatal) => return Err(fatal),
                },
            }
        }

        let unknown: Vec<&String> = input.keys().filter(|key| !self.accepts(key)).collect();
        if !unknown.is_empty() {
            let listed: Vec<String> = unknown.iter().map(|key| format!("'{}'", key)).collect();
            let message = format!(
                "Unknown fields {{{}}} on Model {}",
                listed.join(", "),
                self.model.name()
            );
            for key in unknown {
                errors.add(key.as_str(), message.clone());
            }
        }

        if errors.is_empty() {
            Ok(values)
        } else {
            Err(FieldError::Invalid(errors.into()))
        }
    }

    fn accepts(&self, key: &str) -> bool {
        self.fields
            .iter()
            .any(|(name, field)| name == key && !field.is_dump_only())
    }

    fn field_context<'a>(&'a self, name: &'a str) -> FieldContext<'a> {
        FieldContext {
            name,
            inherited: &self.context,
            partial: self.partial == Partial::All,
        }
    }
}

fn error_map(messages: Messages) -> ErrorMap {
    match messages {
        Messages::Map(map) => ErrorMap::from(map),
        list @ Messages::List(_) => {
            let mut errors = ErrorMap::new();
            errors.insert(SCHEMA_ERROR_KEY, list);
            errors
        }
    }
}

fn into_schema_error(error: FieldError) -> SchemaError {
    match error {
        FieldError::Invalid(messages) => {
            SchemaError::Validation(ValidationError::new(error_map(messages)))
        }
        FieldError::Fatal(error) => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SchemaContext, SchemaSettings};
    use ormschema_catalog::{FieldDef, FieldType, MemoryRegistry, ModelDef, Registry};
    use serde_json::json;

    fn registry() -> Arc<dyn Registry> {
        Arc::new(
            MemoryRegistry::new().with_model(
                ModelDef::new("Model.Exemple")
                    .with_field(FieldDef::primary_key("id", FieldType::Integer))
                    .with_field(FieldDef::new("orm_name", FieldType::String).not_null())
                    .with_field(FieldDef::new("number", FieldType::Integer)),
            ),
        )
    }

    fn build(declaration: &SchemaDeclaration, restrictions: Restrictions) -> SynthesizedSchema {
        let config = SchemaConfiguration::resolve(
            declaration,
            &SchemaSettings::new().with_registry(registry()),
            &SchemaContext::new(),
            &SchemaSettings::new(),
        )
        .unwrap();
        SynthesizedSchema::build(declaration, config, restrictions).unwrap()
    }

    fn declaration() -> SchemaDeclaration {
        SchemaDeclaration::builder("ExempleSchema")
            .model("Model.Exemple")
            .build()
    }

    #[test]
    fn test_declared_field_overrides_generated() {
        let declaration = SchemaDeclaration::builder("ExempleSchema")
            .model("Model.Exemple")
            .field("number", Field::string())
            .field("extra", Field::integer().dump_only())
            .build();
        let schema = build(&declaration, Restrictions::default());

        assert_eq!(schema.field_names(), vec!["id", "name", "number", "extra"]);
        assert_eq!(schema.field("number").unwrap().type_name(), "String");
    }

    #[test]
    fn test_missing_required_only() {
        let schema = build(&declaration(), Restrictions::default());
        let errors = schema.validate(&json!({"id": 1})).unwrap();

        assert_eq!(errors.to_json(), json!({"name": ["Missing data for required field."]}));
    }

    #[test]
    fn test_unknown_fields_and_type_errors_together() {
        let schema = build(&declaration(), Restrictions::default());
        let errors = schema
            .validate(&json!({"id": "x", "name": "a", "bogus": 1, "other": 2}))
            .unwrap();

        assert_eq!(
            errors.to_json(),
            json!({
                "id": ["Not a valid integer."],
                "bogus": ["Unknown fields {'bogus', 'other'} on Model Model.Exemple"],
                "other": ["Unknown fields {'bogus', 'other'} on Model Model.Exemple"],
            })
        );
    }

    #[test]
    fn test_partial() {
        let schema = build(
            &declaration(),
            Restrictions {
                partial: Partial::Fields(vec!["name".into()]),
                ..Restrictions::default()
            },
        );
        assert!(schema.validate(&json!({"id": 1})).unwrap().is_empty());
    }

    #[test]
    fn test_only_and_exclude() {
        let schema = build(
            &declaration(),
            Restrictions {
                only: Some(vec!["id".into(), "name".into()]),
                exclude: vec!["name".into()],
                ..Restrictions::default()
            },
        );
        assert_eq!(schema.field_names(), vec!["id"]);

        let errors = schema.validate(&json!({"id": 1, "number": 2})).unwrap();
        assert!(errors.get("number").is_some());
    }

    #[test]
    fn test_invalid_restriction_names() {
        let config = SchemaConfiguration::resolve(
            &declaration(),
            &SchemaSettings::new().with_registry(registry()),
            &SchemaContext::new(),
            &SchemaSettings::new(),
        )
        .unwrap();
        let err = SynthesizedSchema::build(
            &declaration(),
            config,
            Restrictions {
                only: Some(vec!["nope".into()]),
                ..Restrictions::default()
            },
        )
        .unwrap_err();

        assert!(matches!(err, SchemaError::Construction(ref m) if m.contains("nope")));
    }

    #[test]
    fn test_invalid_input_type() {
        let schema = build(&declaration(), Restrictions::default());
        let errors = schema.validate(&json!([1, 2])).unwrap();
        assert_eq!(errors.to_json(), json!({"_schema": ["Invalid input type."]}));
    }

    #[test]
    fn test_dump_skips_absent_and_load_only() {
        let declaration = SchemaDeclaration::builder("ExempleSchema")
            .model("Model.Exemple")
            .field("number", Field::integer().load_only())
            .build();
        let schema = build(&declaration, Restrictions::default());
        let record = Record::new("Model.Exemple").with("id", 1).with("number", 4);

        assert_eq!(schema.dump(&record).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_dump_only_field_is_unknown_on_load() {
        let declaration = SchemaDeclaration::builder("ExempleSchema")
            .model("Model.Exemple")
            .field("number", Field::integer().dump_only())
            .build();
        let schema = build(&declaration, Restrictions::default());

        let errors = schema
            .validate(&json!({"id": 1, "name": "a", "number": 2}))
            .unwrap();
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["number"]);
    }
}
