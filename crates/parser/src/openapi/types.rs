//! OpenAPI 3.0 type definitions
//!
//! Only the parts of the document that contribute to the API model are
//! represented. Maps are [`IndexMap`]s so schemas and properties keep their
//! declaration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// OpenAPI document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiSpec {
    /// OpenAPI version (e.g., "3.0.3")
    pub openapi: String,

    /// API metadata
    pub info: Info,

    /// API paths (endpoints)
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// Reusable components
    #[serde(default)]
    pub components: Option<Components>,

    /// Servers
    #[serde(default)]
    pub servers: Vec<Server>,
}

/// API information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    pub version: String,

    #[serde(default)]
    pub description: String,
}

/// Server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// Server URL, e.g. `https://secretmanager.googleapis.com`
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Path item (operations for a path)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    /// Parameters shared by every operation of the path
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// HTTP operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation ID, used as the method name
    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub request_body: Option<RequestBody>,

    #[serde(default)]
    pub responses: IndexMap<String, Response>,

    #[serde(default)]
    pub deprecated: bool,

    /// Tags (for grouping)
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Parameter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    /// Location: query, header, path, cookie
    #[serde(rename = "in")]
    pub location: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,

    /// Content types
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

/// Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,

    /// Content types
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Media type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Array items, a single schema or (in older documents) a list of schemas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Single(Box<Schema>),
    List(Vec<Schema>),
}

/// `additionalProperties`, either a flag or the schema of the map values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// Schema definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Type: string, number, integer, boolean, array, object
    #[serde(rename = "type", default)]
    pub schema_type: String,

    /// Format (e.g., int32, int64, date-time)
    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub description: String,

    /// Properties (for object type)
    #[serde(default)]
    pub properties: IndexMap<String, Schema>,

    /// Required properties
    #[serde(default)]
    pub required: Vec<String>,

    /// Items schema (for array type)
    #[serde(default)]
    pub items: Option<Items>,

    #[serde(default)]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default)]
    pub all_of: Vec<Schema>,

    /// Lower bound; `0` marks unsigned integers
    #[serde(default)]
    pub minimum: Option<f64>,

    #[serde(rename = "enum", default)]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(default)]
    pub deprecated: bool,

    /// Reference
    #[serde(rename = "$ref", default)]
    pub ref_path: Option<String>,
}

/// Reusable components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
}

impl PathItem {
    /// The operations of this path with their HTTP verbs.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("GET", &self.get),
            ("PUT", &self.put),
            ("POST", &self.post),
            ("DELETE", &self.delete),
            ("PATCH", &self.patch),
        ]
        .into_iter()
        .filter_map(|(verb, op)| op.as_ref().map(|op| (verb, op)))
    }
}

impl Schema {
    /// The schema name this schema references, directly or through a
    /// single-element `allOf`.
    pub fn reference(&self) -> Option<&str> {
        if let Some(ref_path) = &self.ref_path {
            return Some(ref_name(ref_path));
        }
        self.all_of
            .iter()
            .find_map(|s| s.ref_path.as_deref())
            .map(ref_name)
    }

    /// The element schema of an array.
    pub fn item_schema(&self) -> Option<&Schema> {
        match self.items.as_ref()? {
            Items::Single(schema) => Some(schema),
            Items::List(list) => list.first(),
        }
    }

    pub fn is_unsigned(&self) -> bool {
        self.minimum == Some(0.0)
    }
}

/// `#/components/schemas/Secret` -> `Secret`
fn ref_name(ref_path: &str) -> &str {
    ref_path.strip_prefix(SCHEMA_REF_PREFIX).unwrap_or(ref_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference() {
        let direct: Schema =
            serde_json::from_str(r##"{"$ref": "#/components/schemas/Secret"}"##).unwrap();
        assert_eq!(direct.reference(), Some("Secret"));

        let all_of: Schema = serde_json::from_str(
            r##"{"description": "x", "allOf": [{"$ref": "#/components/schemas/Policy"}]}"##,
        )
        .unwrap();
        assert_eq!(all_of.reference(), Some("Policy"));

        let scalar: Schema = serde_json::from_str(r##"{"type": "string"}"##).unwrap();
        assert_eq!(scalar.reference(), None);
    }

    #[test]
    fn test_items_forms() {
        let single: Schema =
            serde_json::from_str(r##"{"type": "array", "items": {"type": "string"}}"##).unwrap();
        assert_eq!(single.item_schema().unwrap().schema_type, "string");

        let list: Schema = serde_json::from_str(
            r##"{"type": "array", "items": [{"$ref": "#/components/schemas/Bar"}]}"##,
        )
        .unwrap();
        assert_eq!(list.item_schema().unwrap().reference(), Some("Bar"));
    }

    #[test]
    fn test_additional_properties_forms() {
        let flag: Schema =
            serde_json::from_str(r##"{"type": "object", "additionalProperties": true}"##).unwrap();
        assert!(matches!(
            flag.additional_properties,
            Some(AdditionalProperties::Allowed(true))
        ));

        let schema: Schema = serde_json::from_str(
            r##"{"type": "object", "additionalProperties": {"type": "string"}}"##,
        )
        .unwrap();
        assert!(matches!(
            schema.additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));
    }

    #[test]
    fn test_unsigned() {
        let schema: Schema =
            serde_json::from_str(r##"{"type": "integer", "format": "int32", "minimum": 0}"##)
                .unwrap();
        assert!(schema.is_unsigned());
    }

    #[test]
    fn test_operations_in_verb_order() {
        let item: PathItem = serde_json::from_str(
            r##"{"post": {"operationId": "Create"}, "get": {"operationId": "List"}}"##,
        )
        .unwrap();
        let verbs: Vec<_> = item.operations().map(|(verb, _)| verb).collect();
        assert_eq!(verbs, vec!["GET", "POST"]);
    }
}
