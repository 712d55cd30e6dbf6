//! Google Discovery Document parser
//!
//! Parses Google Cloud Discovery Documents into the [`API`] model.
//!
//! ## Discovery Document Format
//!
//! Google Cloud APIs publish "Discovery Documents" that describe REST APIs.
//! Format is based on JSON Schema Draft 3 with Google-specific extensions.
//!
//! ## Discovery Sources
//!
//! - **List all APIs**: `GET https://www.googleapis.com/discovery/v1/apis`
//! - **Get specific API**: `GET https://{service}.googleapis.com/$discovery/rest?version={version}`
//!
//! ## Usage
//! ```rust,ignore
//! use sdkgen_parser::discovery::DiscoveryParser;
//!
//! let model = DiscoveryParser::from_file("compute.v1.json")?
//!     .with_service_config(service_config)
//!     .parse()?;
//! ```
//!
//! [`API`]: sdkgen_common::API

mod converter;
mod fields;
mod lro;
mod methods;
mod parser;
mod types;

pub use parser::DiscoveryParser;
pub use types::*;
