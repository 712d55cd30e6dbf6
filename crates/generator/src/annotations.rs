//! Annotation types stored in the codec slots of the model
//!
//! Templates read these instead of the neutral model. Every name and type
//! here is already rendered as Rust source text.

use sdkgen_common::{EnumValueId, FieldId, MessageId, MethodId, ServiceId};

/// Annotations for the whole model, also returned by
/// [`RustAnnotator::annotate`](crate::RustAnnotator::annotate).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelAnnotations {
    /// Crate name, e.g. `google-cloud-workflows-v1`.
    pub package_name: String,
    /// Crate name as used in paths, e.g. `google_cloud_workflows_v1`.
    pub package_namespace: String,
    pub package_version: String,
    pub release_level: String,
    pub copyright_year: String,
    /// `Cargo.toml` dependency lines for the external crates in use.
    pub required_packages: Vec<String>,
    /// Names of the external crates in use.
    pub extern_packages: Vec<String>,
    pub has_lros: bool,
    /// Services with at least one generated method.
    pub services: Vec<ServiceId>,
    pub name_to_lower: String,
    pub per_service_features: bool,
    pub default_features: Option<Vec<String>>,
    pub disabled_rustdoc_warnings: Option<Vec<String>>,
    pub disabled_clippy_warnings: Option<Vec<String>>,
    pub extra_modules: Vec<String>,
    pub generate_setter_samples: bool,
    pub detailed_tracing_attributes: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceAnnotations {
    pub name: String,
    pub package_module_name: String,
    pub module_name: String,
    /// Cargo feature gating the service when per-service features are on.
    pub feature_name: String,
    pub doc_lines: Vec<String>,
    pub default_host: String,
    /// Methods with an HTTP binding, unless gRPC-only methods are included.
    pub methods: Vec<MethodId>,
    pub per_service_features: bool,
    /// Some methods were left out of `methods`.
    pub incomplete: bool,
    pub detailed_tracing_attributes: bool,
    /// Metadata and response types of the service's LROs, deduplicated.
    pub lro_types: Vec<MessageId>,
}

impl ServiceAnnotations {
    pub fn has_lros(&self) -> bool {
        !self.lro_types.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodAnnotation {
    pub name: String,
    pub name_no_mangling: String,
    pub builder_name: String,
    /// Expression producing the HTTP body from `req`.
    pub body: String,
    pub doc_lines: Vec<String>,
    pub system_parameters: Vec<SystemParameter>,
    pub service_name_to_pascal: String,
    pub service_name_to_camel: String,
    pub service_name_to_snake: String,
    pub return_type: String,
    pub routing_required: bool,
    pub detailed_tracing_attributes: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathInfoAnnotation {
    /// `"true"` if every binding uses an idempotent verb.
    pub is_idempotent: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathBindingAnnotation {
    /// The path with one `{}` per variable, e.g. `/v1/{}:create`.
    pub path_fmt: String,
    /// Request fields sent as query parameters, in declaration order.
    pub query_params: Vec<FieldId>,
    pub substitutions: Vec<BindingSubstitution>,
    pub detailed_tracing_attributes: bool,
}

impl PathBindingAnnotation {
    /// The path with each `{}` replaced by the name of its field.
    pub fn path_template(&self) -> String {
        let mut out = String::new();
        let mut rest = self.path_fmt.as_str();
        let mut names = self.substitutions.iter().map(|s| s.field_name.as_str());
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            out.push('{');
            out.push_str(names.next().unwrap_or_default());
            out.push('}');
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// One path variable and how to read it from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSubstitution {
    /// Expression of type `Option<&T>` reading the field from `req`.
    pub field_accessor: String,
    /// Dotted path of Rust field names, e.g. `child.project`.
    pub field_name: String,
    /// What the variable matches, e.g. `["projects", "*"]`.
    pub template: Vec<String>,
}

impl BindingSubstitution {
    pub fn template_as_string(&self) -> String {
        self.template.join("/")
    }

    /// Renders the template as a `&[Segment]` slice expression.
    pub fn template_as_array(&self) -> String {
        let last = self.template.len().saturating_sub(1);
        let segments = self
            .template
            .iter()
            .enumerate()
            .map(|(i, segment)| match segment.as_str() {
                "*" => "Segment::SingleWildcard".to_string(),
                "**" if i == last => "Segment::TrailingMultiWildcard".to_string(),
                "**" => "Segment::MultiWildcard".to_string(),
                literal => {
                    let lead = if i > 0 { "/" } else { "" };
                    let trail = if i < last { "/" } else { "" };
                    format!("Segment::Literal(\"{lead}{literal}{trail}\")")
                }
            })
            .collect::<Vec<_>>();
        format!("&[{}]", segments.join(", "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryLroAnnotations {
    pub method_name: String,
    pub return_type: String,
    pub polling_path_parameters: Vec<DiscoveryLroPathParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryLroPathParameter {
    pub name: String,
    pub setter_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationInfoAnnotation {
    pub metadata_type: String,
    pub response_type: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageAnnotation {
    pub name: String,
    pub module_name: String,
    pub qualified_name: String,
    pub relative_name: String,
    pub name_in_examples: String,
    pub package_module_name: String,
    /// ID without the leading dot.
    pub source_fqn: String,
    pub doc_lines: Vec<String>,
    /// Nested messages, enums or one-ofs need a module.
    pub has_nested_types: bool,
    /// Fields outside any one-of.
    pub basic_fields: Vec<FieldId>,
    pub internal: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldAnnotations {
    pub field_name: String,
    pub setter_name: String,
    /// Variant name when the field is part of a one-of.
    pub branch_name: String,
    pub fq_message_name: String,
    pub doc_lines: Vec<String>,
    pub field_type: String,
    /// The type without `Option`, `Vec` or `Box`.
    pub primitive_field_type: String,
    /// Statement adding the field to a request builder as a query parameter.
    pub add_query_parameter: String,
    pub key_type: String,
    pub key_field: Option<FieldId>,
    pub value_type: String,
    pub value_field: Option<FieldId>,
    pub is_boxed: bool,
    /// `serde_with` adapter, empty if none is needed.
    pub serde_as: String,
    pub skip_if_is_default: bool,
    pub is_wkt_null_value: bool,
    pub other_fields_in_group: Vec<FieldId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneOfAnnotation {
    pub field_name: String,
    pub setter_name: String,
    pub enum_name: String,
    pub qualified_name: String,
    pub relative_name: String,
    pub struct_qualified_name: String,
    pub scope_in_examples: String,
    pub field_type: String,
    pub doc_lines: Vec<String>,
    /// The member used in generated samples.
    pub example_field: Option<FieldId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumAnnotation {
    pub name: String,
    pub module_name: String,
    pub qualified_name: String,
    pub relative_name: String,
    pub doc_lines: Vec<String>,
    /// First value for each number and variant name.
    pub unique_names: Vec<EnumValueId>,
    pub name_in_examples: String,
    pub values_for_examples: Vec<EnumValueForExamples>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValueForExamples {
    pub enum_value: EnumValueId,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumValueAnnotation {
    pub name: String,
    pub variant_name: String,
    pub enum_type: String,
    pub doc_lines: Vec<String>,
}
