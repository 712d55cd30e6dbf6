//! OpenAPI 3.0 specification parser
//!
//! Parses OpenAPI 3.0 specs into the [`API`] model.
//!
//! ## Supported Documents
//!
//! The parser targets the OpenAPI specifications generated for Google Cloud
//! services: schemas under `components/schemas`, one operation per HTTP
//! binding, `allOf` wrappers around references, and Google-specific formats
//! such as `google-duration` and `google-fieldmask`.
//!
//! ## Usage
//! ```rust,ignore
//! use sdkgen_parser::openapi::OpenApiParser;
//!
//! let model = OpenApiParser::from_file("secretmanager_openapi_v1.json")?
//!     .with_service_config(service_config)
//!     .parse()?;
//! ```
//!
//! [`API`]: sdkgen_common::API

mod converter;
mod parser;
mod types;

pub use parser::OpenApiParser;
pub use types::*;
