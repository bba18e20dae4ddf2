//! Schema configuration tiers and their resolution.
//!
//! A call's configuration is assembled from four [`SchemaSettings`] tiers,
//! highest precedence first: the call itself, the wrapper's
//! [`SchemaContext`], the wrapper instance and the declaration defaults.
//! Every key resolves independently. Resolution never touches the wrapper,
//! so a call-time override cannot leak into later calls.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ormschema_catalog::{Record, Registry};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::SchemaDeclaration;

/// Name of the in-context record looked up when a field does not name one.
pub const DEFAULT_INSTANCE_NAME: &str = "default";

/// Which generated fields must be present on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredFields {
    /// Every generated field is required and rejects null.
    All,
    /// Exactly these fields are required and reject null.
    Only(Vec<String>),
}

/// What `load` returns once the data is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PostLoad {
    /// Return the loaded data.
    #[default]
    Disabled,
    /// Fetch the persisted record by the primary key values of the data.
    PrimaryKey,
    /// Fetch the single persisted record whose listed attributes equal the data.
    Attributes(Vec<String>),
}

impl PostLoad {
    /// Check if post-load resolution is enabled.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, PostLoad::Disabled)
    }
}

/// One tier of schema options. Unset keys defer to the next tier.
///
/// Everything but the registry and the instances can be read from JSON:
///
/// ```json
/// {"model": "Model.Customer", "required_fields": ["name"], "post_load": true}
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Registry name of the model.
    pub model: Option<String>,
    /// Registry to resolve the model from.
    #[serde(skip)]
    pub registry: Option<Arc<dyn Registry>>,
    /// Required-field override. `true`, a list of names, or `false` for unset.
    #[serde(deserialize_with = "deserialize_required_fields")]
    pub required_fields: Option<RequiredFields>,
    /// Keep only primary key fields.
    pub only_primary_key: Option<bool>,
    /// Named records available to field validators.
    #[serde(skip)]
    pub instances: Option<HashMap<String, Record>>,
    /// Post-load policy. `true`, a list of names, or `false` to disable.
    #[serde(deserialize_with = "deserialize_post_load")]
    pub post_load: Option<PostLoad>,
}

impl SchemaSettings {
    /// Create settings with every key unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the registry.
    pub fn with_registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the required-field override.
    pub fn with_required_fields(mut self, required: RequiredFields) -> Self {
        self.required_fields = Some(required);
        self
    }

    /// Set only-primary-key mode.
    pub fn with_only_primary_key(mut self, only_primary_key: bool) -> Self {
        self.only_primary_key = Some(only_primary_key);
        self
    }

    /// Set the named records.
    pub fn with_instances(mut self, instances: HashMap<String, Record>) -> Self {
        self.instances = Some(instances);
        self
    }

    /// Add one named record.
    pub fn with_instance(mut self, name: impl Into<String>, record: Record) -> Self {
        self.instances
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), record);
        self
    }

    /// Set the post-load policy.
    pub fn with_post_load(mut self, post_load: PostLoad) -> Self {
        self.post_load = Some(post_load);
        self
    }
}

impl fmt::Debug for SchemaSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSettings")
            .field("model", &self.model)
            .field("registry", &self.registry.as_ref().map(|_| "<registry>"))
            .field("required_fields", &self.required_fields)
            .field("only_primary_key", &self.only_primary_key)
            .field(
                "instances",
                &self.instances.as_ref().map(|i| i.keys().collect::<Vec<_>>()),
            )
            .field("post_load", &self.post_load)
            .finish()
    }
}

/// The context tier: schema options plus context-only values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaContext {
    /// Schema options, ranked between call and instance settings.
    #[serde(flatten)]
    pub settings: SchemaSettings,
    /// Default region for phone number parsing (`FR`, `GB`, ...).
    pub region: Option<String>,
}

impl SchemaContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = Some(model.into());
        self
    }

    /// Set the registry.
    pub fn with_registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.settings.registry = Some(registry);
        self
    }

    /// Set the named records.
    pub fn with_instances(mut self, instances: HashMap<String, Record>) -> Self {
        self.settings.instances = Some(instances);
        self
    }

    /// Set the phone number region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Replace the schema options.
    pub fn with_settings(mut self, settings: SchemaSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Call-scoped configuration resolved from every tier.
#[derive(Clone)]
pub struct SchemaConfiguration {
    /// Resolved registry.
    pub registry: Arc<dyn Registry>,
    /// Resolved model name.
    pub model: String,
    /// Resolved required-field override.
    pub required_fields: Option<RequiredFields>,
    /// Whether only primary key fields are kept.
    pub only_primary_key: bool,
    /// Named records available to field validators.
    pub instances: HashMap<String, Record>,
    /// Post-load policy.
    pub post_load: PostLoad,
    /// Phone number region from the context.
    pub region: Option<String>,
}

impl SchemaConfiguration {
    /// Resolve the configuration of one call.
    ///
    /// Fails with [`SchemaError::RegistryNotFound`] when no tier provides a
    /// registry, then with [`SchemaError::ModelNotConfigured`] when none
    /// provides a model.
    pub fn resolve(
        declaration: &SchemaDeclaration,
        instance: &SchemaSettings,
        context: &SchemaContext,
        call: &SchemaSettings,
    ) -> Result<Self, SchemaError> {
        let tiers = [call, &context.settings, instance, declaration.defaults()];

        let registry = first_set(&tiers, |s| s.registry.as_ref()).ok_or_else(|| {
            SchemaError::RegistryNotFound {
                schema: declaration.name().to_string(),
            }
        })?;
        let model = first_set(&tiers, |s| s.model.as_ref()).ok_or_else(|| {
            SchemaError::ModelNotConfigured {
                schema: declaration.name().to_string(),
            }
        })?;

        let config = Self {
            registry,
            model,
            required_fields: first_set(&tiers, |s| s.required_fields.as_ref()),
            only_primary_key: first_set(&tiers, |s| s.only_primary_key.as_ref()).unwrap_or(false),
            instances: first_set(&tiers, |s| s.instances.as_ref()).unwrap_or_default(),
            post_load: first_set(&tiers, |s| s.post_load.as_ref()).unwrap_or_default(),
            region: context.region.clone(),
        };

        debug!(
            schema = declaration.name(),
            model = %config.model,
            only_primary_key = config.only_primary_key,
            post_load = ?config.post_load,
            "Resolved schema configuration"
        );
        Ok(config)
    }

    /// The context handed to field hooks and nested schemas.
    pub fn inherited(&self) -> InheritedContext {
        InheritedContext {
            registry: Arc::clone(&self.registry),
            instances: Arc::new(self.instances.clone()),
            region: self.region.clone(),
        }
    }
}

impl fmt::Debug for SchemaConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaConfiguration")
            .field("model", &self.model)
            .field("required_fields", &self.required_fields)
            .field("only_primary_key", &self.only_primary_key)
            .field("instances", &self.instances.keys().collect::<Vec<_>>())
            .field("post_load", &self.post_load)
            .field("region", &self.region)
            .finish()
    }
}

/// What a schema passes down to its field hooks and nested schemas.
///
/// Nested schemas take their registry, instances and region from here and
/// nothing else: model, required fields and only-primary-key stay with the
/// schema that declared them.
#[derive(Clone)]
pub struct InheritedContext {
    /// Registry of the outermost call.
    pub registry: Arc<dyn Registry>,
    /// Named records available to field validators.
    pub instances: Arc<HashMap<String, Record>>,
    /// Phone number region.
    pub region: Option<String>,
}

impl InheritedContext {
    /// Create a context over a registry with no instances.
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            instances: Arc::new(HashMap::new()),
            region: None,
        }
    }

    /// Look up a named record.
    pub fn instance(&self, name: &str) -> Option<&Record> {
        self.instances.get(name)
    }

    /// Context tier for a nested schema resolved under this context.
    pub(crate) fn as_context(&self) -> SchemaContext {
        SchemaContext {
            settings: SchemaSettings {
                registry: Some(Arc::clone(&self.registry)),
                instances: Some((*self.instances).clone()),
                ..SchemaSettings::default()
            },
            region: self.region.clone(),
        }
    }
}

impl fmt::Debug for InheritedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InheritedContext")
            .field("instances", &self.instances.keys().collect::<Vec<_>>())
            .field("region", &self.region)
            .finish()
    }
}

fn first_set<T: Clone>(
    tiers: &[&SchemaSettings],
    get: impl Fn(&SchemaSettings) -> Option<&T>,
) -> Option<T> {
    tiers.iter().find_map(|s| get(*s)).cloned()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagOrNames {
    Flag(bool),
    Names(Vec<String>),
}

fn deserialize_required_fields<'de, D>(deserializer: D) -> Result<Option<RequiredFields>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagOrNames>::deserialize(deserializer)? {
        None | Some(FlagOrNames::Flag(false)) => None,
        Some(FlagOrNames::Flag(true)) => Some(RequiredFields::All),
        Some(FlagOrNames::Names(names)) => Some(RequiredFields::Only(names)),
    })
}

fn deserialize_post_load<'de, D>(deserializer: D) -> Result<Option<PostLoad>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagOrNames>::deserialize(deserializer)? {
        None => None,
        Some(FlagOrNames::Flag(false)) => Some(PostLoad::Disabled),
        Some(FlagOrNames::Flag(true)) => Some(PostLoad::PrimaryKey),
        Some(FlagOrNames::Names(names)) => Some(PostLoad::Attributes(names)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormschema_catalog::MemoryRegistry;
    use serde_json::json;

    fn registry() -> Arc<dyn Registry> {
        Arc::new(MemoryRegistry::new())
    }

    fn declaration() -> SchemaDeclaration {
        SchemaDeclaration::builder("ExempleSchema")
            .model("Model.Exemple")
            .required_fields(RequiredFields::All)
            .build()
    }

    #[test]
    fn test_missing_registry() {
        let err = SchemaConfiguration::resolve(
            &declaration(),
            &SchemaSettings::new(),
            &SchemaContext::new(),
            &SchemaSettings::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            SchemaError::RegistryNotFound { ref schema } if schema == "ExempleSchema"
        ));
    }

    #[test]
    fn test_missing_model() {
        let declaration = SchemaDeclaration::builder("Anonymous").build();
        let err = SchemaConfiguration::resolve(
            &declaration,
            &SchemaSettings::new().with_registry(registry()),
            &SchemaContext::new(),
            &SchemaSettings::new(),
        )
        .unwrap_err();

        assert!(matches!(err, SchemaError::ModelNotConfigured { .. }));
    }

    #[test]
    fn test_precedence_per_key() {
        let instance = SchemaSettings::new()
            .with_registry(registry())
            .with_model("Model.Instance")
            .with_only_primary_key(true);
        let context = SchemaContext::new()
            .with_model("Model.Context")
            .with_region("FR");
        let call = SchemaSettings::new().with_required_fields(RequiredFields::Only(vec!["name".into()]));

        let config =
            SchemaConfiguration::resolve(&declaration(), &instance, &context, &call).unwrap();

        assert_eq!(config.model, "Model.Context");
        assert!(config.only_primary_key);
        assert_eq!(
            config.required_fields,
            Some(RequiredFields::Only(vec!["name".into()]))
        );
        assert_eq!(config.region.as_deref(), Some("FR"));
        assert_eq!(config.post_load, PostLoad::Disabled);
    }

    #[test]
    fn test_class_defaults_apply_last() {
        let config = SchemaConfiguration::resolve(
            &declaration(),
            &SchemaSettings::new().with_registry(registry()),
            &SchemaContext::new(),
            &SchemaSettings::new(),
        )
        .unwrap();

        assert_eq!(config.model, "Model.Exemple");
        assert_eq!(config.required_fields, Some(RequiredFields::All));
        assert!(!config.only_primary_key);
    }

    #[test]
    fn test_settings_from_json() {
        let settings: SchemaSettings = serde_json::from_value(json!({
            "model": "Model.Customer",
            "required_fields": ["name"],
            "only_primary_key": false,
            "post_load": true,
        }))
        .unwrap();

        assert_eq!(settings.model.as_deref(), Some("Model.Customer"));
        assert_eq!(
            settings.required_fields,
            Some(RequiredFields::Only(vec!["name".into()]))
        );
        assert_eq!(settings.only_primary_key, Some(false));
        assert_eq!(settings.post_load, Some(PostLoad::PrimaryKey));

        let settings: SchemaSettings =
            serde_json::from_value(json!({"required_fields": false, "post_load": ["name"]}))
                .unwrap();
        assert_eq!(settings.required_fields, None);
        assert_eq!(
            settings.post_load,
            Some(PostLoad::Attributes(vec!["name".into()]))
        );
    }

    #[test]
    fn test_context_from_json() {
        let context: SchemaContext = serde_json::from_value(json!({
            "required_fields": true,
            "region": "GB",
        }))
        .unwrap();

        assert_eq!(context.region.as_deref(), Some("GB"));
        assert_eq!(context.settings.required_fields, Some(RequiredFields::All));
        assert!(context.settings.registry.is_none());
    }
}
