//! Rust annotations for sdkgen models
//!
//! This crate decorates a parsed [`API`] with everything the Rust templates
//! need: identifiers shaped for Rust, fully qualified type names, `serde_with`
//! adapters, request builder snippets and crate dependencies.
//!
//! ## Usage
//!
//! ```ignore
//! let annotator = RustAnnotator::new(SourceFormat::Discovery, &config.codec)?;
//! let annotations = annotator.annotate(&mut model)?;
//! println!("{}", annotations.package_name);
//! ```
//!
//! After [`RustAnnotator::annotate`] every generated node carries its
//! annotation in its codec slot, e.g. `model.state[id].codec.get::<MessageAnnotation>()`.

mod annotate;
pub mod annotations;
pub mod codec;
pub mod naming;

pub use annotations::{
    EnumAnnotation, EnumValueAnnotation, FieldAnnotations, MessageAnnotation, MethodAnnotation,
    ModelAnnotations, OneOfAnnotation, PathBindingAnnotation, PathInfoAnnotation,
    ServiceAnnotations,
};
pub use codec::{Codec, PackageMapping, SourceFormat};

use sdkgen_common::{Config, Result, API};
use std::collections::BTreeMap;

/// Annotates models for the Rust templates
pub struct RustAnnotator {
    codec: Codec,
}

impl RustAnnotator {
    /// Create an annotator from the `[codec]` options of a configuration
    pub fn new(source: SourceFormat, options: &BTreeMap<String, String>) -> Result<Self> {
        let codec = Codec::new(source, options)?;
        Ok(Self { codec })
    }

    /// Create an annotator for the source format and options of `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = config.general.specification_format.parse()?;
        Self::new(source, &config.codec)
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Annotate every generated node of `model`
    ///
    /// The model must be cross-referenced. On error the model is left
    /// unchanged.
    pub fn annotate(&self, model: &mut API) -> Result<ModelAnnotations> {
        tracing::debug!(model = %model.name, source = ?self.codec.source, "annotating model");
        let plan = annotate::Annotator::new(&self.codec, model).run()?;
        let annotations = plan.apply(model);
        tracing::debug!(
            package = %annotations.package_name,
            services = annotations.services.len(),
            dependencies = annotations.extern_packages.len(),
            "annotated model"
        );
        Ok(annotations)
    }
}
