//! Common types and utilities for sdkgen
//!
//! This crate contains the unified API model shared by the parsers and the
//! language annotators, together with the passes that only depend on the
//! model itself (cross-referencing, recursive-field labelling) and the
//! configuration types loaded by the CLI.
//!
//! ## Model Layout
//!
//! Every node lives in an arena owned by [`State`]. Nodes refer to each other
//! through typed handles ([`MessageId`], [`FieldId`], ...) so that recursive
//! and cyclic message graphs need no shared ownership. The four ID maps in
//! `State` are kept in sync with the arenas by the `add_*` helpers on [`API`].

pub mod config;
mod model;
mod path;
mod routing;
pub mod well_known;
mod xref;

pub use config::{Config, ServiceConfig};
pub use model::*;
pub use path::{
    PathSegment, PathTemplate, PathVariable, MULTI_SEGMENT_WILDCARD, SINGLE_SEGMENT_WILDCARD,
};
pub use routing::{
    RoutingInfo, RoutingInfoCombo, RoutingInfoComboItem, RoutingInfoVariant, RoutingPathSpec,
};
pub use xref::{cross_reference, label_recursive_fields};

use thiserror::Error;

/// Errors that can occur while building or annotating an API model
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// The source document is malformed or uses an unsupported construct.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A schema uses a `(type, format)` pair with no model mapping.
    #[error("unknown {base} format ({format}) for field {field}")]
    UnknownScalar {
        field: String,
        base: String,
        format: String,
    },

    /// The model is internally inconsistent.
    #[error("Reference error: {0}")]
    Reference(String),

    /// A configuration file or overlay is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A codec option is unknown or has a malformed value.
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scalar_message() {
        let err = GeneratorError::UnknownScalar {
            field: "..Message.field".to_string(),
            base: "string".to_string(),
            format: "uuid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown string format (uuid) for field ..Message.field"
        );
    }
}
