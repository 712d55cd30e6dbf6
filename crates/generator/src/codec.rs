//! Rust codec options
//!
//! The `[codec]` table of the configuration is a flat string map. This
//! module validates it key by key and turns it into a typed [`Codec`].

use sdkgen_common::{GeneratorError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Where the model came from. Some encodings differ by source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    #[default]
    Protobuf,
    OpenApi,
    Discovery,
}

impl FromStr for SourceFormat {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "protobuf" => Ok(Self::Protobuf),
            "openapi" => Ok(Self::OpenApi),
            "discovery" | "disco" => Ok(Self::Discovery),
            other => Err(GeneratorError::Codec(format!(
                "unknown specification format {other:?}"
            ))),
        }
    }
}

/// An external crate that provides the types of some source packages.
///
/// Declared as `package:<name> = "package=google-cloud-wkt,source=google.protobuf"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMapping {
    /// Name of the dependency in the generated `Cargo.toml`.
    pub name: String,
    /// Name of the crate on crates.io.
    pub package: String,
    pub version: Option<String>,
    pub path: Option<String>,
    /// Source packages, e.g. `google.protobuf`, whose types live in this crate.
    pub sources: Vec<String>,
    pub features: Vec<String>,
    /// Add the dependency even if no type references it.
    pub force_used: bool,
    /// Never add the dependency.
    pub ignore: bool,
}

/// Validated codec options.
#[derive(Debug, Clone)]
pub struct Codec {
    pub source: SourceFormat,
    pub version: String,
    pub release_level: String,
    pub copyright_year: String,
    /// Root module of the generated types.
    pub module_path: String,
    pub package_name_override: Option<String>,
    pub per_service_features: bool,
    /// `None` when not configured, which is different from an empty list.
    pub default_features: Option<Vec<String>>,
    pub disabled_rustdoc_warnings: Option<Vec<String>>,
    pub disabled_clippy_warnings: Option<Vec<String>>,
    /// Element ID to Rust name.
    pub name_overrides: BTreeMap<String, String>,
    pub internal_types: BTreeSet<String>,
    pub routing_required: bool,
    pub detailed_tracing_attributes: bool,
    pub generate_setter_samples: bool,
    pub include_grpc_only_methods: bool,
    pub extra_modules: Vec<String>,
    pub packages: Vec<PackageMapping>,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            source: SourceFormat::default(),
            version: "0.0.0".to_string(),
            release_level: "preview".to_string(),
            copyright_year: String::new(),
            module_path: "crate::model".to_string(),
            package_name_override: None,
            per_service_features: false,
            default_features: None,
            disabled_rustdoc_warnings: None,
            disabled_clippy_warnings: None,
            name_overrides: BTreeMap::new(),
            internal_types: BTreeSet::new(),
            routing_required: false,
            detailed_tracing_attributes: false,
            generate_setter_samples: false,
            include_grpc_only_methods: false,
            extra_modules: Vec::new(),
            packages: Vec::new(),
        }
    }
}

const PACKAGE_PREFIX: &str = "package:";

impl Codec {
    /// Builds the codec for a model parsed from `source`.
    ///
    /// Fails on unknown keys and on values that do not parse.
    pub fn new(source: SourceFormat, options: &BTreeMap<String, String>) -> Result<Self> {
        let mut codec = Self {
            source,
            ..Default::default()
        };
        for (key, value) in options {
            match key.as_str() {
                "version" => codec.version = value.clone(),
                "release-level" => codec.release_level = value.clone(),
                "copyright-year" => codec.copyright_year = value.clone(),
                "module-path" => codec.module_path = value.clone(),
                "package-name-override" => codec.package_name_override = Some(value.clone()),
                "per-service-features" => codec.per_service_features = parse_bool(key, value)?,
                "default-features" => codec.default_features = Some(parse_list(value)),
                "disabled-rustdoc-warnings" => {
                    codec.disabled_rustdoc_warnings = Some(parse_list(value))
                }
                "disabled-clippy-warnings" => {
                    codec.disabled_clippy_warnings = Some(parse_list(value))
                }
                "name-overrides" => codec.name_overrides = parse_name_overrides(value)?,
                "internal-types" => codec.internal_types = parse_list(value).into_iter().collect(),
                "routing-required" => codec.routing_required = parse_bool(key, value)?,
                "detailed-tracing-attributes" => {
                    codec.detailed_tracing_attributes = parse_bool(key, value)?
                }
                "generate-setter-samples" => {
                    codec.generate_setter_samples = parse_bool(key, value)?
                }
                "include-grpc-only-methods" => {
                    codec.include_grpc_only_methods = parse_bool(key, value)?
                }
                "extra-modules" => codec.extra_modules = parse_list(value),
                _ => match key.strip_prefix(PACKAGE_PREFIX) {
                    Some(name) => codec.packages.push(parse_package(name, value)?),
                    None => {
                        return Err(GeneratorError::Codec(format!(
                            "unknown Rust codec option {key:?}"
                        )))
                    }
                },
            }
        }
        Ok(codec)
    }

    /// The crate providing the types of `package`, if one is configured.
    pub fn package_for(&self, package: &str) -> Option<&PackageMapping> {
        self.packages
            .iter()
            .find(|p| !p.ignore && p.sources.iter().any(|s| s == package))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|_| {
        GeneratorError::Codec(format!("cannot parse {key:?} as a boolean, got {value:?}"))
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_name_overrides(value: &str) -> Result<BTreeMap<String, String>> {
    parse_list(value)
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((id, name)) if !id.is_empty() && !name.is_empty() => {
                Ok((id.to_string(), name.to_string()))
            }
            _ => Err(GeneratorError::Codec(format!(
                "malformed name override {entry:?}, expected `id=Name`"
            ))),
        })
        .collect()
}

fn parse_package(name: &str, value: &str) -> Result<PackageMapping> {
    let mut mapping = PackageMapping {
        name: name.to_string(),
        ..Default::default()
    };
    for entry in parse_list(value) {
        let Some((key, v)) = entry.split_once('=') else {
            return Err(GeneratorError::Codec(format!(
                "malformed entry {entry:?} for package {name}, expected `key=value`"
            )));
        };
        match key {
            "package" => mapping.package = v.to_string(),
            "version" => mapping.version = Some(v.to_string()),
            "path" => mapping.path = Some(v.to_string()),
            "source" => mapping.sources.push(v.to_string()),
            "feature" => mapping.features.push(v.to_string()),
            "force-used" => mapping.force_used = parse_bool(key, v)?,
            "ignore" => mapping.ignore = parse_bool(key, v)?,
            _ => {
                return Err(GeneratorError::Codec(format!(
                    "unknown key {key:?} for package {name}"
                )))
            }
        }
    }
    if mapping.package.is_empty() && !mapping.ignore {
        return Err(GeneratorError::Codec(format!(
            "missing `package` for package {name}"
        )));
    }
    Ok(mapping)
}
