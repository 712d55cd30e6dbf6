//! OpenAPI spec file parser

use super::types::OpenApiSpec;
use sdkgen_common::{GeneratorError, Result, ServiceConfig, API};
use std::fs;
use std::path::Path;

/// OpenAPI specification parser
///
/// Reads OpenAPI 3.0 specifications, such as the ones generated for Google
/// Cloud services, and turns them into an [`API`] model.
pub struct OpenApiParser {
    /// Loaded OpenAPI spec
    spec: OpenApiSpec,

    service_config: Option<ServiceConfig>,
}

impl OpenApiParser {
    /// Load OpenAPI spec from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = OpenApiParser::from_file("secretmanager_openapi_v1.json")?;
    /// let model = parser.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GeneratorError::Parse(format!(
                "Failed to read OpenAPI file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse OpenAPI spec from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: OpenApiSpec = serde_json::from_str(json)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse OpenAPI JSON: {}", e)))?;

        Ok(Self {
            spec,
            service_config: None,
        })
    }

    /// Use `service_config` for the API name, package, service name and
    /// auto-populated fields.
    pub fn with_service_config(mut self, service_config: ServiceConfig) -> Self {
        self.service_config = Some(service_config);
        self
    }

    /// Parse OpenAPI spec into the API model
    pub fn parse(&self) -> Result<API> {
        super::converter::convert_openapi_to_api(&self.spec, self.service_config.as_ref())
    }

    /// Get reference to the underlying OpenAPI spec
    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_openapi() {
        let openapi_json = r#"{
            "openapi": "3.0.0",
            "info": {
                "title": "Test API",
                "version": "1.0.0"
            },
            "paths": {}
        }"#;

        let parser = OpenApiParser::from_json(openapi_json);
        assert!(parser.is_ok());

        let parser = parser.unwrap();
        assert_eq!(parser.spec().openapi, "3.0.0");
        assert_eq!(parser.spec().info.title, "Test API");

        let model = parser.parse().unwrap();
        assert_eq!(model.title, "Test API");
        assert_eq!(model.services.len(), 1);
        assert!(model.state.service("..Service").is_some());
    }

    #[test]
    fn test_yaml_is_not_a_spec() {
        let yaml = "type: google.api.Service\nname: secretmanager.googleapis.com\n";
        assert!(OpenApiParser::from_json(yaml).is_err());
    }
}
