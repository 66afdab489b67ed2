//! Build request types.

use serde::{Deserialize, Deserializer, Serialize};

/// Module name used when a request does not name one.
pub const DEFAULT_MODULE_NAME: &str = "nestmlmodule";

/// One model submitted for building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSubmission {
    pub name: String,
    pub script: String,
}

impl ModelSubmission {
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
        }
    }
}

/// A batch of models to build into one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Target module. Accepts a string or a list of strings (first wins).
    #[serde(
        default,
        deserialize_with = "deserialize_module_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub module_name: Option<String>,

    #[serde(default)]
    pub models: Vec<ModelSubmission>,
}

impl BuildRequest {
    pub fn new(module_name: impl Into<String>, models: Vec<ModelSubmission>) -> Self {
        Self {
            module_name: Some(module_name.into()),
            models,
        }
    }

    /// The module to build, falling back to [`DEFAULT_MODULE_NAME`].
    pub fn module_name(&self) -> &str {
        self.module_name.as_deref().unwrap_or(DEFAULT_MODULE_NAME)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModuleNameField {
    One(String),
    Many(Vec<String>),
}

fn deserialize_module_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<ModuleNameField>::deserialize(deserializer)?;
    Ok(match field {
        Some(ModuleNameField::One(name)) => Some(name),
        Some(ModuleNameField::Many(names)) => names.into_iter().next(),
        None => None,
    })
}
