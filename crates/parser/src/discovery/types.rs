//! Google Discovery Document type definitions
//!
//! Based on JSON Schema Draft 3 with Google-specific extensions. Maps use
//! [`IndexMap`] so schemas, properties and parameters keep their document
//! order, which is also the order of the generated fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Discovery Document root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDoc {
    /// API name (e.g., "storage", "compute")
    #[serde(default)]
    pub name: String,

    /// API version (e.g., "v1")
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Document revision, typically a date like "20250302"
    #[serde(default)]
    pub revision: String,

    /// Root URL (e.g., "<https://compute.googleapis.com/>")
    #[serde(default)]
    pub root_url: String,

    /// Service path (e.g., "compute/v1/")
    #[serde(default)]
    pub service_path: String,

    /// Parameters accepted by every method
    #[serde(default)]
    pub parameters: IndexMap<String, Schema>,

    /// Schemas (data types)
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,

    /// Resources (collections of methods)
    #[serde(default)]
    pub resources: IndexMap<String, Resource>,

    /// Methods (at root level, rare)
    #[serde(default)]
    pub methods: IndexMap<String, Method>,
}

/// A schema, a property or a method parameter
///
/// Parameters reuse the schema definition and add `location` and `required`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub id: String,

    /// JSON type ("object", "string", "array", ...)
    #[serde(rename = "type", default)]
    pub schema_type: String,

    /// Format refining the type ("int64", "byte", "google-duration", ...)
    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub description: String,

    /// Reference to another schema, by schema name
    #[serde(rename = "$ref", default)]
    pub reference: String,

    #[serde(default)]
    pub properties: Option<IndexMap<String, Schema>>,

    /// Element schema for arrays
    #[serde(default)]
    pub items: Option<Box<Schema>>,

    /// Value schema for maps
    #[serde(default)]
    pub additional_properties: Option<Box<Schema>>,

    #[serde(rename = "enum", default)]
    pub enums: Option<Vec<String>>,

    #[serde(default)]
    pub enum_descriptions: Vec<String>,

    #[serde(default)]
    pub enum_deprecated: Vec<bool>,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub pattern: String,

    #[serde(default)]
    pub default: Option<String>,

    /// Parameter location ("path" or "query")
    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub repeated: bool,
}

/// A group of methods, possibly with nested resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub methods: IndexMap<String, Method>,

    #[serde(default)]
    pub resources: IndexMap<String, Resource>,

    #[serde(default)]
    pub deprecated: bool,
}

/// API method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    /// Method ID (e.g., "compute.instances.insert")
    #[serde(default)]
    pub id: String,

    /// URI template relative to the service path
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub flat_path: String,

    #[serde(default)]
    pub http_method: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: IndexMap<String, Schema>,

    #[serde(default)]
    pub parameter_order: Vec<String>,

    /// Request body schema, always a `$ref`
    #[serde(default)]
    pub request: Option<Schema>,

    /// Response schema, always a `$ref`
    #[serde(default)]
    pub response: Option<Schema>,

    /// OAuth scopes
    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub supports_media_upload: bool,

    /// Media upload configuration; methods carrying it are rejected
    #[serde(default)]
    pub media_upload: Option<serde_json::Value>,
}
