//! Converts a Discovery document into the API model

use super::fields::make_message_fields;
use super::lro::lro_annotations;
use super::methods::add_service_recursive;
use super::types::{DiscoveryDoc, Resource, Schema};
use crate::auto_populated::update_auto_populated_fields;
use sdkgen_common::config::Discovery;
use sdkgen_common::well_known::load_well_known_types;
use sdkgen_common::{cross_reference, GeneratorError, Message, Result, ServiceConfig, API};

/// Builds a cross-referenced [`API`] from `doc`.
///
/// The service configuration, when present, overrides the name, title,
/// description and package of the API, and lists the auto-populated
/// request fields. Discovery documents carry no package, so without a
/// service configuration every ID starts with `..`.
pub(super) fn convert_discovery_to_api(
    doc: &DiscoveryDoc,
    service_config: Option<&ServiceConfig>,
    lro: Option<&Discovery>,
) -> Result<API> {
    let mut model = API::new(doc.name.clone(), "");
    model.title = doc.title.clone();
    model.description = doc.description.clone();
    model.revision = doc.revision.clone();
    if let Some(sc) = service_config {
        apply_service_config(&mut model, sc);
    }
    tracing::debug!(
        name = %model.name,
        package = %model.package_name,
        schemas = doc.schemas.len(),
        "converting discovery document"
    );

    for (name, schema) in &doc.schemas {
        add_message(&mut model, name, schema)?;
    }
    for (name, resource) in &doc.resources {
        add_service_recursive(&mut model, doc, name, resource)?;
    }
    if !doc.methods.is_empty() {
        // Methods declared at the root belong to a service named after the API.
        let root = Resource {
            methods: doc.methods.clone(),
            ..Default::default()
        };
        add_service_recursive(&mut model, doc, &doc.name, &root)?;
    }

    let mut messages = std::mem::take(&mut model.messages);
    messages.sort_by(|a, b| model.state[*a].id.cmp(&model.state[*b].id));
    model.messages = messages;
    let mut services = std::mem::take(&mut model.services);
    services.sort_by(|a, b| model.state[*a].id.cmp(&model.state[*b].id));
    model.services = services;

    load_well_known_types(&mut model);
    if let Some(lro) = lro {
        lro_annotations(&mut model, lro)?;
    }
    cross_reference(&mut model)?;
    if let Some(sc) = service_config {
        update_auto_populated_fields(sc, &mut model, |f| {
            f.is_string() && f.optional && !f.repeated
        });
    }
    Ok(model)
}

fn apply_service_config(model: &mut API, sc: &ServiceConfig) {
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
    if let Some((package, _)) = sc.service_api() {
        model.package_name = package.to_string();
    }
}

/// Top-level schemas must be objects; each becomes a top-level message.
fn add_message(model: &mut API, name: &str, schema: &Schema) -> Result<()> {
    let id = format!(".{}.{}", model.package_name, name);
    if schema.schema_type != "object" {
        return Err(GeneratorError::Parse(format!(
            "schema {id} must be an object, found type {:?}",
            schema.schema_type
        )));
    }
    let message = model.add_message(Message {
        name: name.to_string(),
        id,
        package: model.package_name.clone(),
        documentation: schema.description.clone(),
        deprecated: schema.deprecated,
        ..Default::default()
    });
    make_message_fields(model, message, schema)
}
