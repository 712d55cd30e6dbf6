//! Source document parsing for sdkgen
//!
//! This crate turns OpenAPI and Discovery documents into the unified
//! [`API`] model, then runs the passes that refine it:
//!
//! 1. document parse, which loads the well-known types, runs the Discovery
//!    LRO pass, cross-references the model and marks auto-populated fields;
//! 2. documentation overrides from the configuration;
//! 3. recursive-field labelling;
//! 4. pagination detection, honoring the pagination overrides.
//!
//! ## Usage
//! ```rust,ignore
//! let config = Config::load(Path::new("sdkgen.toml"))?;
//! let model = sdkgen_parser::parse(&config)?;
//! ```

mod auto_populated;
pub mod discovery;
mod mapper;
pub mod openapi;
mod overrides;
mod pagination;
mod uritemplate;

pub use auto_populated::update_auto_populated_fields;
pub use discovery::DiscoveryParser;
pub use mapper::ScalarKind;
pub use openapi::OpenApiParser;
pub use overrides::apply_documentation_overrides;
pub use pagination::update_method_pagination;
pub use uritemplate::parse_uri_template;

use sdkgen_common::{label_recursive_fields, Config, GeneratorError, Result, ServiceConfig, API};
use std::path::{Path, PathBuf};

/// Source roots tried when the configuration does not list any.
const ROOT_SUFFIX: &str = "-root";

/// Parses the document named by `config`.
///
/// `specification-source` and `service-config` are resolved against the
/// source roots in the `[source]` table; the first root containing the
/// file wins.
pub fn parse(config: &Config) -> Result<API> {
    let source = resolve_source(config, &config.general.specification_source);
    tracing::debug!(source = %source.display(), format = %config.general.specification_format, "parsing");
    let contents = std::fs::read_to_string(&source).map_err(|e| {
        GeneratorError::Parse(format!(
            "Failed to read specification {}: {}",
            source.display(),
            e
        ))
    })?;
    let service_config = match &config.general.service_config {
        Some(name) if !name.is_empty() => {
            Some(ServiceConfig::load(&resolve_source(config, name))?)
        }
        _ => None,
    };
    match config.general.specification_format.as_str() {
        "discovery" => parse_discovery(config, service_config, &contents),
        "openapi" => parse_openapi(config, service_config, &contents),
        other => Err(GeneratorError::Config(format!(
            "unknown specification format {other:?}"
        ))),
    }
}

/// Parses a Discovery document and runs the model passes.
pub fn parse_discovery(
    config: &Config,
    service_config: Option<ServiceConfig>,
    contents: &str,
) -> Result<API> {
    let mut parser = DiscoveryParser::from_json(contents)?;
    if let Some(sc) = service_config {
        parser = parser.with_service_config(sc);
    }
    if let Some(lro) = &config.discovery {
        parser = parser.with_lro(lro.clone());
    }
    let model = parser.parse()?;
    finish(config, model)
}

/// Parses an OpenAPI document and runs the model passes.
pub fn parse_openapi(
    config: &Config,
    service_config: Option<ServiceConfig>,
    contents: &str,
) -> Result<API> {
    let mut parser = OpenApiParser::from_json(contents)?;
    if let Some(sc) = service_config {
        parser = parser.with_service_config(sc);
    }
    let model = parser.parse()?;
    finish(config, model)
}

fn finish(config: &Config, mut model: API) -> Result<API> {
    apply_documentation_overrides(&mut model, &config.documentation_overrides)?;
    label_recursive_fields(&mut model);
    update_method_pagination(&config.pagination_overrides, &mut model);
    tracing::debug!(
        name = %model.name,
        messages = model.messages.len(),
        services = model.services.len(),
        "model ready"
    );
    Ok(model)
}

/// Finds `name` under the configured source roots.
///
/// `[source] roots = "googleapis,discovery"` tries `googleapis-root` and
/// then `discovery-root`. Without `roots`, every `*-root` key is tried in
/// key order.
fn resolve_source(config: &Config, name: &str) -> PathBuf {
    let keys: Vec<String> = match config.source.get("roots") {
        Some(roots) => roots
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| format!("{r}{ROOT_SUFFIX}"))
            .collect(),
        None => config
            .source
            .keys()
            .filter(|k| k.ends_with(ROOT_SUFFIX))
            .cloned()
            .collect(),
    };
    keys.iter()
        .filter_map(|k| config.source.get(k))
        .map(|root| Path::new(root).join(name))
        .find(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(name))
}
