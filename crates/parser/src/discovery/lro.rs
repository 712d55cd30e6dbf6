//! Long-running operations for Discovery services
//!
//! Discovery documents do not say which methods start long-running
//! operations. The `[discovery]` configuration names the operation message
//! and the poller methods, keyed by path prefix. Methods returning the
//! operation message are matched to a poller through their path, and each
//! service using a poller gets a `getOperation` method that mirrors it.

use sdkgen_common::config::Discovery;
use sdkgen_common::{DiscoveryLro, GeneratorError, Method, MethodId, Result, API};

/// Annotates long-running methods and adds the per-service `getOperation`.
pub(crate) fn lro_annotations(model: &mut API, config: &Discovery) -> Result<()> {
    let lro_services = config.lro_services();
    for service in model.services.clone() {
        let service_id = model.state[service].id.clone();
        if lro_services.contains(&service_id) {
            continue;
        }
        let mut service_mixin: Option<MethodId> = None;
        for method in model.state[service].methods.clone() {
            if model.state[method].output_type_id != config.operation_id {
                continue;
            }
            let Some((mixin, polling_path_parameters)) = find_poller(model, method, config) else {
                continue;
            };
            model.state[method].discovery_lro = Some(DiscoveryLro {
                polling_path_parameters,
                ..Default::default()
            });
            if let Some(previous) = service_mixin {
                if previous != mixin {
                    return Err(GeneratorError::Reference(format!(
                        "mismatched LRO mixin, want={}, got={}",
                        model.state[previous].id, model.state[mixin].id
                    )));
                }
            }
            service_mixin = Some(mixin);
        }
        let Some(mixin) = service_mixin else {
            continue;
        };

        let source = &model.state[mixin];
        let source_service_id = source
            .id
            .rsplit_once('.')
            .map(|(service, _)| service.to_string())
            .unwrap_or_default();
        tracing::debug!(service = %service_id, poller = %source.id, "adding getOperation");
        let method = Method {
            name: "getOperation".to_string(),
            id: format!("{service_id}.getOperation"),
            documentation: source.documentation.clone(),
            input_type_id: source.input_type_id.clone(),
            output_type_id: source.output_type_id.clone(),
            returns_empty: source.returns_empty,
            path_info: source.path_info.clone(),
            pagination: source.pagination,
            routing: source.routing.clone(),
            auto_populated: source.auto_populated.clone(),
            source_service_id,
            ..Default::default()
        };
        model.add_method(service, method);
    }
    Ok(())
}

/// The first poller whose prefix matches one of the method's paths.
fn find_poller(model: &API, method: MethodId, config: &Discovery) -> Option<(MethodId, Vec<String>)> {
    let flat_paths: Vec<String> = model.state[method]
        .path_info
        .bindings
        .iter()
        .map(|b| b.path_template.flat_path())
        .collect();
    for candidate in &config.pollers {
        for path in &flat_paths {
            if !path.starts_with(&candidate.prefix) {
                continue;
            }
            match model.state.method_by_id.get(&candidate.method_id) {
                Some(poller) => return Some((*poller, candidate.path_parameters())),
                None => tracing::warn!(
                    method = %model.state[method].id,
                    poller = %candidate.method_id,
                    "skipping LRO poller, method not found"
                ),
            }
        }
    }
    None
}
