//! Discovery document parser

use super::types::DiscoveryDoc;
use sdkgen_common::config::Discovery;
use sdkgen_common::{GeneratorError, Result, ServiceConfig, API};
use std::fs;
use std::path::Path;

/// Google Discovery Document parser
///
/// Reads Discovery documents for services like Compute Engine and turns
/// them into an [`API`] model: one message per schema, one service per
/// resource with methods, and a synthetic request per method.
pub struct DiscoveryParser {
    /// Loaded Discovery document
    doc: DiscoveryDoc,

    service_config: Option<ServiceConfig>,

    /// Long-running operation settings
    lro: Option<Discovery>,
}

impl DiscoveryParser {
    /// Load Discovery document from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = DiscoveryParser::from_file("compute.v1.json")?;
    /// let model = parser.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GeneratorError::Parse(format!(
                "Failed to read Discovery file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse Discovery document from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: DiscoveryDoc = serde_json::from_str(json)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse Discovery JSON: {}", e)))?;

        Ok(Self {
            doc,
            service_config: None,
            lro: None,
        })
    }

    /// Use `service_config` to override the API name, title, description
    /// and package.
    pub fn with_service_config(mut self, service_config: ServiceConfig) -> Self {
        self.service_config = Some(service_config);
        self
    }

    /// Annotate long-running operations using `lro`.
    pub fn with_lro(mut self, lro: Discovery) -> Self {
        self.lro = Some(lro);
        self
    }

    /// Parse Discovery document into the API model
    ///
    /// The model is cross-referenced: every `$ref` must name a schema of
    /// the document or a well-known type.
    pub fn parse(&self) -> Result<API> {
        super::converter::convert_discovery_to_api(
            &self.doc,
            self.service_config.as_ref(),
            self.lro.as_ref(),
        )
    }

    /// Get reference to the underlying Discovery document
    pub fn doc(&self) -> &DiscoveryDoc {
        &self.doc
    }
}
