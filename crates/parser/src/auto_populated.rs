//! Auto-populated request fields
//!
//! Service configurations list, per method, request fields that client
//! libraries fill in with a fresh UUID when the application leaves them
//! empty (typically `requestId`). Only fields that are eligible for this
//! treatment are honored; the eligibility test depends on the source format.

use sdkgen_common::{Field, ServiceConfig, API};

/// Records the auto-populated fields of every method in `model`.
///
/// The method selector is `{package}.{Service}.{method}`. Listed fields
/// that are missing from the request, or fail `eligible`, are ignored.
pub fn update_auto_populated_fields<F>(service_config: &ServiceConfig, model: &mut API, eligible: F)
where
    F: Fn(&Field) -> bool,
{
    for service in model.services.clone() {
        for method in model.state[service].methods.clone() {
            let m = &model.state[method];
            let selector = format!("{}.{}", model.state[service].id.trim_start_matches('.'), m.name);
            let Some(request) = model.state.message_by_id.get(&m.input_type_id).copied() else {
                continue;
            };
            let mut fields = Vec::new();
            for name in service_config.auto_populated_fields(&selector) {
                match model.state.field_named(request, name) {
                    Some(field) if eligible(&model.state[field]) => fields.push(field),
                    Some(_) => {
                        tracing::debug!(selector = %selector, field = %name, "field cannot be auto-populated")
                    }
                    None => tracing::debug!(selector = %selector, field = %name, "field not found"),
                }
            }
            for field in &fields {
                model.state[*field].auto_populated = true;
            }
            model.state[method].auto_populated = fields;
        }
    }
}
