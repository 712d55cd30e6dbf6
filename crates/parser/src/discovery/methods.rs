//! Resources to services, methods to RPCs
//!
//! Each resource with methods becomes a service. Discovery methods take
//! their parameters individually, so every method also gets a synthetic
//! request message holding the path and query parameters plus a `body`
//! field for the request payload. The synthetic requests are nested in a
//! placeholder message that shares the service ID.

use super::fields::make_field;
use super::types::{DiscoveryDoc, Method as DiscoMethod, Resource, Schema};
use crate::uritemplate::parse_uri_template;
use sdkgen_common::well_known;
use sdkgen_common::{
    Field, GeneratorError, Message, MessageId, Method, PathBinding, PathInfo, Result, Service,
    ServiceId, Typez, API,
};
use std::collections::{BTreeSet, HashSet};

const BODY_FIELD: &str = "body";

/// Adds a service for `resource` (when it has methods) and for every
/// nested resource.
pub(super) fn add_service_recursive(
    model: &mut API,
    doc: &DiscoveryDoc,
    name: &str,
    resource: &Resource,
) -> Result<()> {
    if !resource.methods.is_empty() {
        add_service(model, doc, name, resource)?;
    }
    for (child_name, child) in &resource.resources {
        add_service_recursive(model, doc, child_name, child)?;
    }
    Ok(())
}

fn add_service(model: &mut API, doc: &DiscoveryDoc, name: &str, resource: &Resource) -> Result<()> {
    let id = format!(".{}.{}", model.package_name, name);
    let default_host = doc.root_url.strip_prefix("https://").unwrap_or(&doc.root_url);
    let default_host = default_host.strip_suffix('/').unwrap_or(default_host);
    tracing::debug!(service = %id, methods = resource.methods.len(), "adding service");

    let service = model.add_service(Service {
        name: name.to_string(),
        id: id.clone(),
        package: model.package_name.clone(),
        documentation: format!("Service for the `{name}` resource."),
        default_host: default_host.to_string(),
        deprecated: resource.deprecated,
        ..Default::default()
    });
    // Messages and services live in separate ID namespaces.
    let placeholder = model.add_message(Message {
        name: name.to_string(),
        id: id.clone(),
        package: model.package_name.clone(),
        documentation: format!("Synthetic messages for the [{name}][{}] service", &id[1..]),
        service_placeholder: true,
        ..Default::default()
    });
    for (method_name, method) in &resource.methods {
        make_method(model, doc, service, placeholder, method_name, method)?;
    }
    Ok(())
}

fn make_method(
    model: &mut API,
    doc: &DiscoveryDoc,
    service: ServiceId,
    placeholder: MessageId,
    name: &str,
    input: &DiscoMethod,
) -> Result<()> {
    let parent_id = model.state[placeholder].id.clone();
    let id = format!("{parent_id}.{name}");
    if input.media_upload.is_some() {
        return Err(GeneratorError::Parse(format!(
            "media upload methods are not supported, id={id}"
        )));
    }
    let body_id = method_type(model, &id, "request type", input.request.as_ref())?;
    let output_id = method_type(model, &id, "response type", input.response.as_ref())?;

    let request = model.add_message(Message {
        name: format!("{name}Request"),
        id: format!("{parent_id}.{name}Request"),
        package: model.package_name.clone(),
        documentation: format!(
            "Synthetic request message for the [{name}()][{}] method.",
            &id[1..]
        ),
        parent: Some(placeholder),
        synthetic_request: true,
        deprecated: input.deprecated,
        ..Default::default()
    });

    let uri_template = if doc.service_path.ends_with('/') {
        format!("{}{}", doc.service_path, input.path)
    } else {
        format!("{}/{}", doc.service_path, input.path)
    };
    let uri_template = uri_template.strip_prefix('/').unwrap_or(&uri_template);
    let path_template = parse_uri_template(uri_template)?;

    let mut query_parameters = BTreeSet::new();
    let mut field_names = HashSet::new();
    for (param_name, param) in &input.parameters {
        if param.location != "path" {
            query_parameters.insert(param_name.clone());
        }
        let mut field = make_field(model, request, param_name, param)?;
        field.optional = !param.required;
        field_names.insert(field.name.clone());
        model.add_field(request, field);
    }

    let mut body_field_path = String::new();
    if body_id != well_known::EMPTY {
        if field_names.contains(BODY_FIELD) {
            return Err(GeneratorError::Parse(format!(
                "body is a request or path parameter in method {id}"
            )));
        }
        let request_id = model.state[request].id.clone();
        model.add_field(
            request,
            Field {
                name: BODY_FIELD.to_string(),
                json_name: BODY_FIELD.to_string(),
                id: format!("{request_id}.{BODY_FIELD}"),
                documentation: format!(
                    "Synthetic request body field for the [{name}()][{}] method.",
                    &id[1..]
                ),
                typez: Typez::Message,
                typez_id: body_id,
                optional: true,
                ..Default::default()
            },
        );
        body_field_path = BODY_FIELD.to_string();
    }

    let input_type_id = model.state[request].id.clone();
    model.add_method(
        service,
        Method {
            name: name.to_string(),
            id,
            documentation: input.description.clone(),
            deprecated: input.deprecated,
            input_type_id,
            returns_empty: output_id == well_known::EMPTY,
            output_type_id: output_id,
            path_info: PathInfo {
                bindings: vec![PathBinding {
                    verb: input.http_method.clone(),
                    path_template,
                    query_parameters,
                    ..Default::default()
                }],
                body_field_path,
                ..Default::default()
            },
            ..Default::default()
        },
    );
    Ok(())
}

/// The message ID for a request or response schema.
///
/// Methods without a request or response use `google.protobuf.Empty`.
fn method_type(
    model: &API,
    method_id: &str,
    what: &str,
    schema: Option<&Schema>,
) -> Result<String> {
    let Some(schema) = schema else {
        return Ok(well_known::EMPTY.to_string());
    };
    if schema.reference.is_empty() {
        return Err(GeneratorError::Parse(format!(
            "expected a ref-like schema for {what} in method {method_id}"
        )));
    }
    Ok(format!(".{}.{}", model.package_name, schema.reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> DiscoveryDoc {
        serde_json::from_str(json).unwrap()
    }

    const DOC: &str = r##"{
        "rootUrl": "https://compute.googleapis.com/",
        "servicePath": "compute/v1/",
        "resources": {
            "zones": {
                "methods": {
                    "get": {
                        "path": "projects/{project}/zones/{zone}",
                        "httpMethod": "GET",
                        "description": "Returns the specified Zone resource.",
                        "parameters": {
                            "project": {"type": "string", "location": "path", "required": true},
                            "zone": {"type": "string", "location": "path", "required": true},
                            "filter": {"type": "string", "location": "query"}
                        },
                        "response": {"$ref": "Zone"}
                    },
                    "setLabels": {
                        "path": "projects/{project}/zones/{zone}/setLabels",
                        "httpMethod": "POST",
                        "parameters": {
                            "project": {"type": "string", "location": "path", "required": true},
                            "zone": {"type": "string", "location": "path", "required": true}
                        },
                        "request": {"$ref": "SetLabelsRequest"},
                        "response": {"$ref": "Operation"}
                    }
                },
                "resources": {
                    "nested": {"methods": {"delete": {"path": "x/{y}", "httpMethod": "DELETE",
                        "parameters": {"y": {"type": "string", "location": "path", "required": true}}}}}
                }
            },
            "empty": {}
        }
    }"##;

    fn build(doc: &DiscoveryDoc) -> Result<API> {
        let mut model = API::new("compute", "");
        for (name, resource) in &doc.resources {
            add_service_recursive(&mut model, doc, name, resource)?;
        }
        Ok(model)
    }

    #[test]
    fn test_services() {
        let model = build(&doc(DOC)).unwrap();
        let ids: Vec<&str> = model
            .services
            .iter()
            .map(|s| model.state[*s].id.as_str())
            .collect();
        assert_eq!(ids, vec!["..zones", "..nested"]);

        let service = model.state.service("..zones").unwrap();
        assert_eq!(service.documentation, "Service for the `zones` resource.");
        assert_eq!(service.default_host, "compute.googleapis.com");
        assert_eq!(service.methods.len(), 2);

        let placeholder = model.state.message("..zones").unwrap();
        assert!(placeholder.service_placeholder);
        assert_eq!(
            placeholder.documentation,
            "Synthetic messages for the [zones][.zones] service"
        );
        assert_eq!(placeholder.messages.len(), 2);
    }

    #[test]
    fn test_method_without_body() {
        let model = build(&doc(DOC)).unwrap();
        let method = model.state.method("..zones.get").unwrap();
        assert_eq!(method.documentation, "Returns the specified Zone resource.");
        assert_eq!(method.input_type_id, "..zones.getRequest");
        assert_eq!(method.output_type_id, "..Zone");
        assert!(!method.returns_empty);
        assert_eq!(method.path_info.body_field_path, "");

        let binding = &method.path_info.bindings[0];
        assert_eq!(binding.verb, "GET");
        assert_eq!(
            binding.path_template.flat_path(),
            "compute/v1/projects/{project}/zones/{zone}"
        );
        assert_eq!(
            binding.query_parameters,
            BTreeSet::from(["filter".to_string()])
        );

        let request = model.state.message("..zones.getRequest").unwrap();
        assert!(request.synthetic_request);
        assert_eq!(
            request.documentation,
            "Synthetic request message for the [get()][.zones.get] method."
        );
        let fields: Vec<_> = request
            .fields
            .iter()
            .map(|f| &model.state[*f])
            .map(|f| (f.name.as_str(), f.optional))
            .collect();
        assert_eq!(
            fields,
            vec![("project", false), ("zone", false), ("filter", true)]
        );
    }

    #[test]
    fn test_method_with_body() {
        let model = build(&doc(DOC)).unwrap();
        let method = model.state.method("..zones.setLabels").unwrap();
        assert_eq!(method.path_info.body_field_path, "body");
        let request = model.state.message("..zones.setLabelsRequest").unwrap();
        let body = &model.state[*request.fields.last().unwrap()];
        assert_eq!(body.id, "..zones.setLabelsRequest.body");
        assert_eq!(body.typez_id, "..SetLabelsRequest");
        assert!(body.optional);
        assert_eq!(
            body.documentation,
            "Synthetic request body field for the [setLabels()][.zones.setLabels] method."
        );
    }

    #[test]
    fn test_method_returning_nothing() {
        let model = build(&doc(DOC)).unwrap();
        let method = model.state.method("..nested.delete").unwrap();
        assert_eq!(method.output_type_id, ".google.protobuf.Empty");
        assert!(method.returns_empty);
    }

    #[test]
    fn test_method_errors() {
        let cases = [
            r##"{"resources": {"r": {"methods": {"m": {"path": "a", "request": {"type": "object"}}}}}}"##,
            r##"{"resources": {"r": {"methods": {"m": {"path": "a", "response": {"type": "object"}}}}}}"##,
            r##"{"resources": {"r": {"methods": {"m": {"path": "a", "mediaUpload": {"accept": ["*/*"]}}}}}}"##,
            r##"{"resources": {"r": {"methods": {"m": {"path": "a/{+b}"}}}}}"##,
            r##"{"resources": {"r": {"methods": {"m": {"path": "a", "request": {"$ref": "R"},
                "parameters": {"body": {"type": "string", "location": "query"}}}}}}}"##,
        ];
        for input in cases {
            assert!(build(&doc(input)).is_err(), "{input}");
        }
        let err = build(&doc(cases[2])).unwrap_err();
        assert!(
            err.to_string().contains("media upload methods are not supported, id=..r.m"),
            "{err}"
        );
    }
}
