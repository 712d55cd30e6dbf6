//! Configuration loading
//!
//! Two files drive a generation run:
//!
//! - a TOML [`Config`] naming the source document, the codec options and
//!   the per-API overrides;
//! - an optional [`ServiceConfig`], the YAML (or JSON) service configuration
//!   published alongside Google APIs, used to override names and
//!   documentation and to find auto-populated request fields.

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Packages of the interfaces most services include as mixins.
const MIXIN_PACKAGES: &[&str] = &["google.cloud.location", "google.iam.v1", "google.longrunning"];

/// Root of the TOML configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Options for the source parser.
    #[serde(default)]
    pub source: BTreeMap<String, String>,

    /// Long-running operation settings for Discovery documents.
    #[serde(default)]
    pub discovery: Option<Discovery>,

    /// Options for the language annotator, validated by the annotator.
    #[serde(default)]
    pub codec: BTreeMap<String, String>,

    #[serde(default)]
    pub documentation_overrides: Vec<DocumentationOverride>,

    #[serde(default)]
    pub pagination_overrides: Vec<PaginationOverride>,
}

/// Where the source document and service configuration live
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneralConfig {
    /// `openapi` or `discovery`.
    #[serde(default)]
    pub specification_format: String,

    #[serde(default)]
    pub specification_source: String,

    #[serde(default)]
    pub service_config: Option<String>,
}

/// Replaces text in the documentation of one model element
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DocumentationOverride {
    pub id: String,
    #[serde(rename = "match")]
    pub matches: String,
    pub replace: String,
}

/// Names the pageable item field for one method
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaginationOverride {
    /// Fully qualified method ID.
    pub id: String,
    pub item_field: String,
}

/// Long-running operation configuration for Discovery documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Discovery {
    /// ID of the message type returned by long-running methods.
    pub operation_id: String,

    /// Candidate pollers, tried in order.
    #[serde(default)]
    pub pollers: Vec<Poller>,
}

/// A method that polls operations created under a path prefix
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Poller {
    /// Path prefix, e.g. `compute/v1/projects/{project}/zones/{zone}`.
    pub prefix: String,
    pub method_id: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| GeneratorError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GeneratorError::Config(format!("Failed to parse config TOML: {}", e)))
    }
}

impl Discovery {
    /// IDs of the services that declare poller methods.
    pub fn lro_services(&self) -> BTreeSet<String> {
        self.pollers.iter().map(|p| p.service_id().to_string()).collect()
    }
}

impl Poller {
    /// The `{name}` segments of the prefix, in order.
    pub fn path_parameters(&self) -> Vec<String> {
        self.prefix
            .split('/')
            .filter_map(|s| s.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
            .map(str::to_string)
            .collect()
    }

    fn service_id(&self) -> &str {
        match self.method_id.rfind('.') {
            Some(idx) => &self.method_id[..idx],
            None => &self.method_id,
        }
    }
}

/// The subset of a Google service configuration read by the parsers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name, e.g. `secretmanager.googleapis.com`.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub documentation: Documentation,

    /// Interfaces of the service, e.g. `google.cloud.secretmanager.v1.SecretManagerService`.
    #[serde(default)]
    pub apis: Vec<ApiEntry>,

    #[serde(default)]
    pub publishing: Publishing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Documentation {
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiEntry {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Publishing {
    #[serde(default, alias = "methodSettings")]
    pub method_settings: Vec<MethodSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MethodSettings {
    /// Method selector, e.g. `google.cloud.secretmanager.v1.SecretManagerService.CreateSecret`.
    pub selector: String,

    #[serde(default, alias = "autoPopulatedFields")]
    pub auto_populated_fields: Vec<String>,
}

impl ServiceConfig {
    /// Load a service configuration from a YAML or JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Config(format!(
                "Failed to read service config file {:?}: {}",
                path, e
            ))
        })?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        tracing::debug!(path = %path.display(), json = is_json, "loading service config");
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            GeneratorError::Config(format!("Failed to parse service config YAML: {}", e))
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            GeneratorError::Config(format!("Failed to parse service config JSON: {}", e))
        })
    }

    /// Package and service name of the first interface that is not a mixin.
    ///
    /// An interface `google.cloud.secretmanager.v1.SecretManagerService`
    /// yields `("google.cloud.secretmanager.v1", "SecretManagerService")`.
    pub fn service_api(&self) -> Option<(&str, &str)> {
        self.apis
            .iter()
            .filter_map(|api| api.name.rsplit_once('.'))
            .find(|(package, _)| !MIXIN_PACKAGES.contains(package))
    }

    /// Auto-populated field names configured for the method `selector`.
    pub fn auto_populated_fields(&self, selector: &str) -> &[String] {
        self.publishing
            .method_settings
            .iter()
            .find(|s| s.selector == selector)
            .map(|s| s.auto_populated_fields.as_slice())
            .unwrap_or_default()
    }
}
