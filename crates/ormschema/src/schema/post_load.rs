//! Resolution of loaded data to a persisted record.

use std::collections::BTreeMap;

use ormschema_catalog::{FilterExpr, ModelHandle, Record, Value};
use tracing::debug;

use crate::config::PostLoad;
use crate::error::{ErrorMap, SchemaError, ValidationError};

/// Key under which resolution failures are reported.
pub const INSTANCE_ERROR_KEY: &str = "instance";

/// Outcome of looking up the record the loaded data designates.
#[derive(Debug, Clone, PartialEq)]
pub enum PostLoadResolution {
    /// Exactly one record matched.
    Found(Record),
    /// No record matched the filter keys.
    NotFound {
        /// Filter keys used.
        keys: Vec<String>,
    },
    /// Several records matched the filter keys.
    Ambiguous {
        /// Number of matches.
        count: usize,
        /// Filter keys used.
        keys: Vec<String>,
    },
    /// A filter key is absent from the loaded data.
    MissingKey(String),
}

impl PostLoadResolution {
    /// Resolve `data` under `policy`. Returns `None` when the policy is
    /// disabled.
    pub fn resolve(
        model: &ModelHandle,
        policy: &PostLoad,
        data: &BTreeMap<String, Value>,
    ) -> Result<Option<Self>, SchemaError> {
        let resolution = match policy {
            PostLoad::Disabled => return Ok(None),
            PostLoad::PrimaryKey => Self::by_primary_key(model, data)?,
            PostLoad::Attributes(names) => Self::by_attributes(model, names, data)?,
        };

        debug!(
            model = model.name(),
            outcome = resolution.outcome(),
            "Post-load resolution"
        );
        Ok(Some(resolution))
    }

    fn by_primary_key(
        model: &ModelHandle,
        data: &BTreeMap<String, Value>,
    ) -> Result<Self, SchemaError> {
        let keys = model.primary_key_names();
        let values: Option<Vec<(String, Value)>> = keys
            .iter()
            .map(|key| data.get(key).map(|value| (key.clone(), value.clone())))
            .collect();

        let found = match values {
            Some(values) => model.fetch_by_primary_key(&values)?,
            None => None,
        };
        Ok(match found {
            Some(record) => PostLoadResolution::Found(record),
            None => PostLoadResolution::NotFound { keys },
        })
    }

    fn by_attributes(
        model: &ModelHandle,
        names: &[String],
        data: &BTreeMap<String, Value>,
    ) -> Result<Self, SchemaError> {
        let mut filters = Vec::with_capacity(names.len());
        for name in names {
            match data.get(name) {
                Some(value) => filters.push(FilterExpr::eq(name.clone(), value.clone())),
                None => return Ok(PostLoadResolution::MissingKey(name.clone())),
            }
        }

        let mut matches = model.fetch_all_matching(&filters)?;
        let keys = names.to_vec();
        Ok(match matches.len() {
            0 => PostLoadResolution::NotFound { keys },
            1 => PostLoadResolution::Found(matches.remove(0)),
            count => PostLoadResolution::Ambiguous { count, keys },
        })
    }

    /// The matched record, or the validation error describing the failure.
    pub fn into_record(self, model: &str) -> Result<Record, ValidationError> {
        let mut errors = ErrorMap::new();
        match self {
            PostLoadResolution::Found(record) => return Ok(record),
            PostLoadResolution::NotFound { keys } => errors.add(
                INSTANCE_ERROR_KEY,
                format!(
                    "No instance of {} found with the filter keys {}",
                    model,
                    key_list(&keys)
                ),
            ),
            PostLoadResolution::Ambiguous { count, keys } => errors.add(
                INSTANCE_ERROR_KEY,
                format!(
                    "{} instances of {} found with the filter keys {}",
                    count,
                    model,
                    key_list(&keys)
                ),
            ),
            PostLoadResolution::MissingKey(name) => {
                let message = format!("'{}' is unknown in the loaded data", name);
                errors.add(name, message);
            }
        }
        Err(ValidationError::new(errors))
    }

    fn outcome(&self) -> &'static str {
        match self {
            PostLoadResolution::Found(_) => "found",
            PostLoadResolution::NotFound { .. } => "not_found",
            PostLoadResolution::Ambiguous { .. } => "ambiguous",
            PostLoadResolution::MissingKey(_) => "missing_key",
        }
    }
}

fn key_list(keys: &[String]) -> String {
    let quoted: Vec<String> = keys.iter().map(|k| format!("'{}'", k)).collect();
    format!("[{}]", quoted.join(", "))
}
