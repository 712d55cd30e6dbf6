use super::{Annotator, MethodPlan};
use crate::annotations::{
    BindingSubstitution, DiscoveryLroAnnotations, DiscoveryLroPathParameter, MethodAnnotation,
    OperationInfoAnnotation, PathBindingAnnotation, PathInfoAnnotation, ServiceAnnotations,
    SystemParameter,
};
use crate::codec::SourceFormat;
use crate::naming::{
    doc_lines, package_module_name, to_camel, to_kebab, to_pascal, to_snake,
    to_snake_no_mangling,
};
use sdkgen_common::well_known::EMPTY;
use sdkgen_common::{
    GeneratorError, MessageId, Method, MethodId, PathBinding, PathSegment, Result, ServiceId,
    Typez,
};

const IDEMPOTENT_VERBS: &[&str] = &["GET", "PUT", "DELETE"];

impl Annotator<'_> {
    pub(super) fn service(&self, id: ServiceId) -> ServiceAnnotations {
        let state = &self.model.state;
        let service = &state[id];
        let name = self.service_name(id);
        let methods: Vec<MethodId> = service
            .methods
            .iter()
            .copied()
            .filter(|m| {
                self.codec.include_grpc_only_methods || !state[*m].path_info.bindings.is_empty()
            })
            .collect();

        let mut lro_types: Vec<MessageId> = Vec::new();
        for method in &methods {
            let Some(op) = &state[*method].operation_info else {
                continue;
            };
            for type_id in [&op.metadata_type_id, &op.response_type_id] {
                if let Some(message) = state.message_by_id.get(type_id) {
                    if !lro_types.contains(message) {
                        lro_types.push(*message);
                    }
                }
            }
        }

        ServiceAnnotations {
            package_module_name: package_module_name(&service.package),
            module_name: to_snake(&name),
            feature_name: to_kebab(&name),
            doc_lines: doc_lines(&service.documentation),
            default_host: service.default_host.clone(),
            incomplete: methods.len() != service.methods.len(),
            methods,
            per_service_features: self.codec.per_service_features,
            detailed_tracing_attributes: self.codec.detailed_tracing_attributes,
            lro_types,
            name,
        }
    }

    fn service_name(&self, id: ServiceId) -> String {
        let service = &self.model.state[id];
        self.codec
            .name_overrides
            .get(&service.id)
            .cloned()
            .unwrap_or_else(|| to_pascal(&service.name))
    }

    pub(super) fn method(&self, id: MethodId, service_name: &str) -> Result<MethodPlan> {
        let state = &self.model.state;
        let method = &state[id];
        let input = method
            .input_type
            .or_else(|| state.message_by_id.get(&method.input_type_id).copied())
            .ok_or_else(|| {
                GeneratorError::Reference(format!(
                    "cannot find input type {} of method {}",
                    method.input_type_id, method.id
                ))
            })?;
        let return_type = self.return_type(method)?;

        let bindings = method
            .path_info
            .bindings
            .iter()
            .map(|b| self.path_binding(b, input, method))
            .collect::<Result<Vec<_>>>()?;
        let idempotent = !method.path_info.bindings.is_empty()
            && method
                .path_info
                .bindings
                .iter()
                .all(|b| IDEMPOTENT_VERBS.contains(&b.verb.as_str()));

        let discovery_lro = method.discovery_lro.as_ref().map(|lro| DiscoveryLroAnnotations {
            method_name: to_snake(&method.name),
            return_type: return_type.clone(),
            polling_path_parameters: lro
                .polling_path_parameters
                .iter()
                .map(|p| DiscoveryLroPathParameter {
                    name: to_snake(p),
                    setter_name: to_snake_no_mangling(p),
                })
                .collect(),
        });
        let operation_info = match &method.operation_info {
            Some(op) => Some(OperationInfoAnnotation {
                metadata_type: self.type_by_id(&op.metadata_type_id)?,
                response_type: self.type_by_id(&op.response_type_id)?,
            }),
            None => None,
        };

        let alt = match self.codec.source {
            SourceFormat::Protobuf => "json;enum-encoding=int",
            SourceFormat::OpenApi | SourceFormat::Discovery => "json",
        };
        let annotation = MethodAnnotation {
            name: to_snake(&method.name),
            name_no_mangling: to_snake_no_mangling(&method.name),
            builder_name: to_pascal(&method.name),
            body: self.body(method, input)?,
            doc_lines: doc_lines(&method.documentation),
            system_parameters: vec![SystemParameter {
                name: "$alt".to_string(),
                value: alt.to_string(),
            }],
            service_name_to_pascal: to_pascal(service_name),
            service_name_to_camel: to_camel(service_name),
            service_name_to_snake: to_snake(service_name),
            return_type,
            routing_required: self.codec.routing_required,
            detailed_tracing_attributes: self.codec.detailed_tracing_attributes,
        };
        Ok(MethodPlan {
            id,
            method: annotation,
            path_info: PathInfoAnnotation {
                is_idempotent: idempotent.to_string(),
            },
            bindings,
            discovery_lro,
            operation_info,
        })
    }

    fn return_type(&self, method: &Method) -> Result<String> {
        if method.returns_empty || method.output_type_id == EMPTY {
            return Ok("()".to_string());
        }
        self.type_by_id(&method.output_type_id)
    }

    /// Expression building the HTTP body from `req`.
    fn body(&self, method: &Method, input: MessageId) -> Result<String> {
        let state = &self.model.state;
        let body = match method.path_info.body_field_path.as_str() {
            "" => "None::<gaxi::http::NoBody>".to_string(),
            "*" => "Some(req)".to_string(),
            name => {
                let field = state.field_named(input, name).ok_or_else(|| {
                    GeneratorError::Reference(format!(
                        "cannot find body field {name} of method {}",
                        method.id
                    ))
                })?;
                if state[field].optional {
                    format!("req.{}", to_snake(name))
                } else {
                    format!("Some(req.{})", to_snake(name))
                }
            }
        };
        Ok(body)
    }

    fn path_binding(
        &self,
        binding: &PathBinding,
        input: MessageId,
        method: &Method,
    ) -> Result<PathBindingAnnotation> {
        let state = &self.model.state;
        let mut path_fmt = String::new();
        let mut substitutions = Vec::new();
        for segment in &binding.path_template.segments {
            path_fmt.push('/');
            match segment {
                PathSegment::Literal(literal) => path_fmt.push_str(literal),
                PathSegment::Variable(variable) => {
                    path_fmt.push_str("{}");
                    let field_accessor =
                        self.field_accessor(&variable.field_path, input).ok_or_else(|| {
                            GeneratorError::Reference(format!(
                                "cannot find path field {} in the request of {}",
                                variable.field_name(),
                                method.id
                            ))
                        })?;
                    let template = if variable.segments.is_empty() {
                        vec!["*".to_string()]
                    } else {
                        variable.segments.clone()
                    };
                    substitutions.push(BindingSubstitution {
                        field_accessor,
                        field_name: variable
                            .field_path
                            .iter()
                            .map(|p| to_snake(p))
                            .collect::<Vec<_>>()
                            .join("."),
                        template,
                    });
                }
            }
        }
        if path_fmt.is_empty() {
            path_fmt.push('/');
        }
        if let Some(verb) = &binding.path_template.verb {
            path_fmt.push(':');
            path_fmt.push_str(verb);
        }

        Ok(PathBindingAnnotation {
            path_fmt,
            query_params: state[input]
                .fields
                .iter()
                .copied()
                .filter(|f| binding.query_parameters.contains(&state[*f].name))
                .collect(),
            substitutions,
            detailed_tracing_attributes: self.codec.detailed_tracing_attributes,
        })
    }

    /// Expression of type `Option<&T>` reaching the field at `path` from `req`.
    ///
    /// Returns `None` if some element of the path is not a field.
    pub(super) fn field_accessor(&self, path: &[String], input: MessageId) -> Option<String> {
        let state = &self.model.state;
        let mut accessor = "Some(&req)".to_string();
        let mut message = Some(input);
        let mut leaf = None;
        for name in path {
            let field = state.field_named(message?, name)?;
            let f = &state[field];
            let rust_name = to_snake(name);
            if f.optional {
                accessor.push_str(&format!(".and_then(|m| m.{rust_name}.as_ref())"));
            } else {
                accessor.push_str(&format!(".map(|m| &m.{rust_name})"));
            }
            message = self.message_of(f);
            leaf = Some(f.typez);
        }
        if leaf == Some(Typez::String) {
            accessor.push_str(".map(|s| s.as_str())");
        }
        Some(accessor)
    }
}
