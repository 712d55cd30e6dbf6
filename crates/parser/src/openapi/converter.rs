//! Converts an OpenAPI specification into the API model
//!
//! Every schema under `components/schemas` becomes a message. All
//! operations are methods of a single service, named after the service
//! configuration interface or `Service` when there is none. Each operation
//! gets its own synthetic request message holding its parameters and a
//! `body` field for the request body.

use super::types::{AdditionalProperties, OpenApiSpec, Operation, Parameter, Schema};
use crate::auto_populated::update_auto_populated_fields;
use crate::mapper::{insert_map_type, ScalarKind};
use sdkgen_common::well_known::{self, load_well_known_types};
use sdkgen_common::{
    cross_reference, Enum, EnumValue, Field, FieldBehavior, GeneratorError, Message, MessageId,
    Method, PathBinding, PathInfo, PathTemplate, Result, Service, ServiceConfig, ServiceId, Typez,
    API,
};
use std::collections::BTreeSet;

const DEFAULT_SERVICE_NAME: &str = "Service";
const BODY_FIELD: &str = "body";
const JSON_CONTENT: &str = "application/json";

/// Builds a cross-referenced [`API`] from `spec`.
pub(super) fn convert_openapi_to_api(
    spec: &OpenApiSpec,
    service_config: Option<&ServiceConfig>,
) -> Result<API> {
    let default_host = spec
        .servers
        .first()
        .map(|s| host_name(&s.url))
        .unwrap_or_default();
    let mut model = API::new(default_host.split('.').next().unwrap_or_default(), "");
    model.title = spec.info.title.clone();
    model.description = spec.info.description.clone();

    let mut service_name = DEFAULT_SERVICE_NAME.to_string();
    if let Some(sc) = service_config {
        if !sc.name.is_empty() {
            let name = sc.name.strip_suffix(".googleapis.com").unwrap_or(&sc.name);
            model.name = name.to_string();
        }
        if !sc.title.is_empty() {
            model.title = sc.title.clone();
        }
        if !sc.documentation.summary.is_empty() {
            model.description = sc.documentation.summary.clone();
        }
        if let Some((package, name)) = sc.service_api() {
            model.package_name = package.to_string();
            service_name = name.to_string();
        }
    }
    tracing::debug!(name = %model.name, package = %model.package_name, "converting openapi spec");

    if let Some(components) = &spec.components {
        for (name, schema) in &components.schemas {
            add_message(&mut model, name, schema)?;
        }
    }

    let service_id = format!(".{}.{}", model.package_name, service_name);
    let service = model.add_service(Service {
        name: service_name.clone(),
        id: service_id.clone(),
        package: model.package_name.clone(),
        documentation: spec.info.description.clone(),
        default_host,
        ..Default::default()
    });
    let placeholder = model.add_message(Message {
        name: service_name.clone(),
        id: service_id.clone(),
        package: model.package_name.clone(),
        documentation: format!(
            "Synthetic messages for the [{service_name}][{}] service.",
            &service_id[1..]
        ),
        service_placeholder: true,
        ..Default::default()
    });
    for (path, item) in &spec.paths {
        for (verb, operation) in item.operations() {
            let parameters: Vec<&Parameter> =
                item.parameters.iter().chain(&operation.parameters).collect();
            make_method(
                &mut model,
                service,
                placeholder,
                path,
                verb,
                operation,
                &parameters,
            )?;
        }
    }

    load_well_known_types(&mut model);
    cross_reference(&mut model)?;
    if let Some(sc) = service_config {
        update_auto_populated_fields(sc, &mut model, |f| f.auto_populated);
    }
    Ok(model)
}

/// `https://secretmanager.googleapis.com/` -> `secretmanager.googleapis.com`
fn host_name(url: &str) -> String {
    let host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    host.trim_end_matches('/').to_string()
}

fn add_message(model: &mut API, name: &str, schema: &Schema) -> Result<()> {
    let message = model.add_message(Message {
        name: name.to_string(),
        id: format!(".{}.{}", model.package_name, name),
        package: model.package_name.clone(),
        documentation: schema.description.clone(),
        deprecated: schema.deprecated,
        ..Default::default()
    });
    add_message_fields(model, message, schema)
}

fn add_message_fields(model: &mut API, message: MessageId, schema: &Schema) -> Result<()> {
    for (field_name, property) in &schema.properties {
        let required = schema.required.iter().any(|r| r == field_name);
        let field = make_field(model, message, field_name, property, required)?;
        model.add_field(message, field);
    }
    Ok(())
}

/// Builds the field for property `name` of `message`.
///
/// Message-typed fields are always optional, repeated and map fields
/// never are, and scalars are optional unless `required`. Inline objects
/// and enums are created nested in `message`.
fn make_field(
    model: &mut API,
    message: MessageId,
    name: &str,
    schema: &Schema,
    required: bool,
) -> Result<Field> {
    let id = format!("{}.{name}", model.state[message].id);
    let mut field = Field {
        name: name.to_string(),
        json_name: name.to_string(),
        id: id.clone(),
        documentation: schema.description.clone(),
        deprecated: schema.deprecated,
        ..Default::default()
    };
    if let Some(reference) = schema.reference() {
        field.typez = Typez::Message;
        field.typez_id = message_ref(model, reference);
        field.optional = true;
        return Ok(field);
    }
    match schema.schema_type.as_str() {
        "array" => {
            let items = schema.item_schema().ok_or_else(|| {
                GeneratorError::Parse(format!("missing `items` for array field {id}"))
            })?;
            let element = make_field(model, message, name, items, required)?;
            field.typez = element.typez;
            field.typez_id = element.typez_id;
            field.repeated = true;
        }
        "object" => match &schema.additional_properties {
            Some(AdditionalProperties::Schema(value))
                if !value.schema_type.is_empty() || value.reference().is_some() =>
            {
                let (typez, typez_id) = value_type(model, &id, value)?;
                field.typez = Typez::Message;
                field.typez_id = insert_map_type(model, typez, &typez_id);
                field.map = true;
            }
            _ if !schema.properties.is_empty() => {
                let package = model.state[message].package.clone();
                let nested = model.add_message(Message {
                    name: name.to_string(),
                    id: id.clone(),
                    package,
                    documentation: format!(
                        "The message type for the [{name}][{}] field.",
                        &id[1..]
                    ),
                    parent: Some(message),
                    deprecated: schema.deprecated,
                    ..Default::default()
                });
                add_message_fields(model, nested, schema)?;
                field.typez = Typez::Message;
                field.typez_id = id;
                field.optional = true;
            }
            // Untyped objects hold arbitrary JSON.
            _ => {
                field.typez = Typez::Message;
                field.typez_id = well_known::ANY.to_string();
                field.optional = true;
            }
        },
        "string" if !schema.enum_values.is_empty() => {
            add_enum(model, message, name, schema)?;
            field.typez = Typez::Enum;
            field.typez_id = id;
            field.optional = !required;
        }
        _ => {
            let kind = ScalarKind::from_openapi(
                &schema.schema_type,
                &schema.format,
                schema.is_unsigned(),
                &id,
            )?;
            field.typez = kind.typez();
            field.typez_id = kind.typez_id().to_string();
            field.optional = kind.is_message() || !required;
        }
    }
    Ok(field)
}

/// Creates the enum for a string property with an `enum` value list,
/// nested in `message`. Values are numbered in declaration order.
fn add_enum(model: &mut API, message: MessageId, name: &str, schema: &Schema) -> Result<()> {
    let id = format!("{}.{name}", model.state[message].id);
    let values = schema
        .enum_values
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                GeneratorError::Parse(format!("enum value {v} of field {id} is not a string"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let package = model.state[message].package.clone();
    let enumeration = model.add_enum(Enum {
        name: name.to_string(),
        id: id.clone(),
        package,
        documentation: format!("The enumerated type for the [{name}][{}] field.", &id[1..]),
        parent: Some(message),
        deprecated: schema.deprecated,
        ..Default::default()
    });
    for (number, value) in values.into_iter().enumerate() {
        model.add_enum_value(
            enumeration,
            EnumValue {
                id: format!("{id}.{value}"),
                name: value,
                number: number as i32,
                ..Default::default()
            },
        );
    }
    Ok(())
}

/// Element type of an array or map value.
fn value_type(model: &API, field_id: &str, schema: &Schema) -> Result<(Typez, String)> {
    if let Some(reference) = schema.reference() {
        return Ok((Typez::Message, message_ref(model, reference)));
    }
    let kind = ScalarKind::from_openapi(
        &schema.schema_type,
        &schema.format,
        schema.is_unsigned(),
        field_id,
    )?;
    Ok((kind.typez(), kind.typez_id().to_string()))
}

fn message_ref(model: &API, name: &str) -> String {
    format!(".{}.{}", model.package_name, name)
}

fn make_method(
    model: &mut API,
    service: ServiceId,
    placeholder: MessageId,
    path: &str,
    verb: &str,
    operation: &Operation,
    parameters: &[&Parameter],
) -> Result<()> {
    let Some(name) = operation.operation_id.as_deref() else {
        return Err(GeneratorError::Parse(format!(
            "missing operationId for {verb} {path}"
        )));
    };
    let service_id = model.state[service].id.clone();
    let id = format!("{service_id}.{name}");
    tracing::debug!(method = %id, verb, path, "adding method");

    let request_id = format!("{service_id}.{name}Request");
    let request = model.add_message(Message {
        name: format!("{name}Request"),
        id: request_id.clone(),
        package: model.package_name.clone(),
        documentation: format!(
            "Synthetic request message for the [{name}()][{}] method.",
            &id[1..]
        ),
        parent: Some(placeholder),
        synthetic_request: true,
        deprecated: operation.deprecated,
        ..Default::default()
    });

    let mut query_parameters = BTreeSet::new();
    for param in parameters {
        let is_path = match param.location.as_str() {
            "path" => true,
            "query" => false,
            _ => continue,
        };
        if param.name == BODY_FIELD && operation.request_body.is_some() {
            return Err(GeneratorError::Parse(format!(
                "body is a request or path parameter in method {id}"
            )));
        }
        let field = parameter_field(model, request, path, param, is_path)?;
        if !is_path {
            query_parameters.insert(param.name.clone());
        }
        model.add_field(request, field);
    }

    let mut body_field_path = String::new();
    if let Some(body) = &operation.request_body {
        let reference = body
            .content
            .get(JSON_CONTENT)
            .and_then(|m| m.schema.as_ref())
            .and_then(Schema::reference)
            .ok_or_else(|| {
                GeneratorError::Parse(format!(
                    "expected a ref-like schema for the request body in method {id}"
                ))
            })?;
        model.add_field(
            request,
            Field {
                name: BODY_FIELD.to_string(),
                json_name: BODY_FIELD.to_string(),
                id: format!("{request_id}.{BODY_FIELD}"),
                documentation: "The request body.".to_string(),
                typez: Typez::Message,
                typez_id: message_ref(model, reference),
                optional: true,
                ..Default::default()
            },
        );
        body_field_path = BODY_FIELD.to_string();
    }

    let output_type_id = operation
        .responses
        .get("200")
        .and_then(|r| r.content.get(JSON_CONTENT))
        .and_then(|m| m.schema.as_ref())
        .and_then(Schema::reference)
        .map(|reference| message_ref(model, reference))
        .unwrap_or_else(|| well_known::EMPTY.to_string());

    model.add_method(
        service,
        Method {
            name: name.to_string(),
            id,
            documentation: operation.description.clone(),
            deprecated: operation.deprecated,
            input_type_id: request_id,
            returns_empty: output_type_id == well_known::EMPTY,
            output_type_id,
            path_info: PathInfo {
                bindings: vec![PathBinding {
                    verb: verb.to_string(),
                    path_template: parse_openapi_path(path)?,
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

/// Path parameters are always required strings; query parameters keep
/// the type of their schema.
fn parameter_field(
    model: &mut API,
    request: MessageId,
    path: &str,
    param: &Parameter,
    is_path: bool,
) -> Result<Field> {
    let default_schema = Schema {
        schema_type: "string".to_string(),
        ..Default::default()
    };
    let schema = match (&param.schema, is_path) {
        (Some(schema), false) => schema,
        _ => &default_schema,
    };
    let required = is_path || param.required;
    let mut field = make_field(model, request, &param.name, schema, required)?;
    field.documentation = if is_path || param.description.is_empty() {
        format!(
            "The `{{{}}}` component of the target path.\n\nThe full target path will be in the form `{path}`.",
            param.name
        )
    } else {
        param.description.clone()
    };
    field.deprecated = param.deprecated || schema.deprecated;
    if required {
        field.optional = false;
        field.behavior = vec![FieldBehavior::Required];
    }
    field.auto_populated =
        !required && schema.schema_type == "string" && schema.format == "uuid4";
    Ok(field)
}

/// Parses an OpenAPI path such as `/v1/projects/{project}/secrets/{secret}:setIamPolicy`.
fn parse_openapi_path(path: &str) -> Result<PathTemplate> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let last_segment = trimmed.rfind('/').map_or(0, |idx| idx + 1);
    let (segments, verb) = match trimmed[last_segment..].find(':') {
        Some(colon) => {
            let (head, tail) = trimmed.split_at(last_segment + colon);
            (head, Some(&tail[1..]))
        }
        None => (trimmed, None),
    };

    let mut template = PathTemplate::new();
    for segment in segments.split('/') {
        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if name.is_empty() || name.contains(['{', '}']) {
                return Err(GeneratorError::Parse(format!(
                    "invalid path variable {segment:?} in {path}"
                )));
            }
            template = template.with_variable_named(&[name]);
        } else if segment.is_empty() || segment.contains(['{', '}']) {
            return Err(GeneratorError::Parse(format!(
                "invalid path segment {segment:?} in {path}"
            )));
        } else {
            template = template.with_literal(segment);
        }
    }
    if let Some(verb) = verb {
        if verb.is_empty() {
            return Err(GeneratorError::Parse(format!("empty verb in path {path}")));
        }
        template = template.with_verb(verb);
    }
    Ok(template)
}
