//! The Rust annotator
//!
//! Annotation runs in two steps. [`Annotator::run`] reads the model and
//! computes every annotation into a [`Plan`]; [`Plan::apply`] then stores
//! them in the codec slots. The model is never borrowed mutably while
//! names are being resolved.

mod messages;
mod services;
mod types;

use crate::annotations::*;
use crate::codec::{Codec, PackageMapping};
use crate::naming::{package_name, package_namespace};
use sdkgen_common::{
    EnumId, EnumValueId, FieldId, MessageId, MethodId, OneOfId, Result, ServiceId, API,
};
use std::collections::BTreeSet;

pub(crate) struct Annotator<'a> {
    codec: &'a Codec,
    model: &'a API,
    /// Source package of the types generated in this crate.
    package: String,
}

/// Annotations for one method and the nodes it owns.
pub(crate) struct MethodPlan {
    id: MethodId,
    method: MethodAnnotation,
    path_info: PathInfoAnnotation,
    bindings: Vec<PathBindingAnnotation>,
    discovery_lro: Option<DiscoveryLroAnnotations>,
    operation_info: Option<OperationInfoAnnotation>,
}

/// Every annotation computed for a model, ready to be stored.
#[derive(Default)]
pub(crate) struct Plan {
    model: ModelAnnotations,
    messages: Vec<(MessageId, MessageAnnotation)>,
    fields: Vec<(FieldId, FieldAnnotations)>,
    one_ofs: Vec<(OneOfId, OneOfAnnotation)>,
    enums: Vec<(EnumId, EnumAnnotation)>,
    enum_values: Vec<(EnumValueId, EnumValueAnnotation)>,
    services: Vec<(ServiceId, ServiceAnnotations)>,
    methods: Vec<MethodPlan>,
}

impl<'a> Annotator<'a> {
    pub fn new(codec: &'a Codec, model: &'a API) -> Self {
        let package = if !model.package_name.is_empty() {
            model.package_name.clone()
        } else {
            model
                .services
                .first()
                .map(|s| model.state[*s].package.clone())
                .unwrap_or_default()
        };
        Self {
            codec,
            model,
            package,
        }
    }

    pub fn run(&self) -> Result<Plan> {
        let state = &self.model.state;
        let mut plan = Plan::default();

        for id in self.model.all_messages() {
            plan.messages.push((id, self.message(id)));
            for field in &state[id].fields {
                plan.fields.push((*field, self.field(*field)?));
            }
            for group in &state[id].one_ofs {
                plan.one_ofs.push((*group, self.one_of(*group)?));
            }
        }
        for id in self.model.all_enums() {
            let (annotation, values) = self.enumeration(id);
            plan.enums.push((id, annotation));
            plan.enum_values.extend(values);
        }

        let mut services = Vec::new();
        let mut features = Vec::new();
        let mut has_lros = false;
        for id in &self.model.services {
            let service = self.service(*id);
            for method in &state[*id].methods {
                plan.methods.push(self.method(*method, &service.name)?);
            }
            has_lros |= service.methods.iter().any(|m| {
                state[*m].operation_info.is_some() || state[*m].discovery_lro.is_some()
            });
            if !service.methods.is_empty() {
                services.push(*id);
                features.push(service.feature_name.clone());
            }
            tracing::debug!(
                service = %state[*id].id,
                methods = service.methods.len(),
                incomplete = service.incomplete,
                "annotated service"
            );
            plan.services.push((*id, service));
        }

        let per_service_features = self.codec.per_service_features && !services.is_empty();
        let default_features = per_service_features
            .then(|| self.codec.default_features.clone().unwrap_or(features));
        let required = self.required_packages(&services);
        let crate_name = self.crate_name();
        plan.model = ModelAnnotations {
            package_namespace: package_namespace(&crate_name),
            package_name: crate_name,
            package_version: self.codec.version.clone(),
            release_level: self.codec.release_level.clone(),
            copyright_year: self.codec.copyright_year.clone(),
            required_packages: required.iter().map(|p| dependency_line(p)).collect(),
            extern_packages: required.iter().map(|p| p.name.clone()).collect(),
            has_lros,
            services,
            name_to_lower: self.model.name.to_lowercase(),
            per_service_features,
            default_features,
            disabled_rustdoc_warnings: self.codec.disabled_rustdoc_warnings.clone(),
            disabled_clippy_warnings: self.codec.disabled_clippy_warnings.clone(),
            extra_modules: self.codec.extra_modules.clone(),
            generate_setter_samples: self.codec.generate_setter_samples,
            detailed_tracing_attributes: self.codec.detailed_tracing_attributes,
        };
        Ok(plan)
    }

    fn crate_name(&self) -> String {
        match &self.codec.package_name_override {
            Some(name) => name.clone(),
            None if self.package.is_empty() => package_name(&self.model.name),
            None => package_name(&self.package),
        }
    }

    /// External crates providing types used by the generated code.
    fn required_packages(&self, services: &[ServiceId]) -> Vec<&'a PackageMapping> {
        let used = self.used_packages(services);
        let mut required: Vec<_> = self
            .codec
            .packages
            .iter()
            .filter(|p| !p.ignore)
            .filter(|p| p.force_used || p.sources.iter().any(|s| used.contains(s)))
            .collect();
        required.sort_by(|a, b| a.name.cmp(&b.name));
        required
    }

    fn used_packages(&self, services: &[ServiceId]) -> BTreeSet<String> {
        let state = &self.model.state;
        let mut used = BTreeSet::new();
        for message in self.model.all_messages() {
            for field in &state[message].fields {
                self.collect_field_packages(*field, &mut used);
            }
        }
        for service in services {
            for method in &state[*service].methods {
                let m = &state[*method];
                let mut ids = vec![&m.input_type_id, &m.output_type_id];
                if let Some(op) = &m.operation_info {
                    ids.push(&op.metadata_type_id);
                    ids.push(&op.response_type_id);
                }
                for id in ids {
                    if let Some(message) = state.message(id) {
                        used.insert(message.package.clone());
                    }
                }
            }
        }
        used
    }

    fn collect_field_packages(&self, field: FieldId, used: &mut BTreeSet<String>) {
        let state = &self.model.state;
        let f = &state[field];
        if let Some(e) = f.enum_type {
            used.insert(state[e].package.clone());
        }
        if let Some(m) = self.message_of(f) {
            if state[m].is_map {
                for entry in state[m].fields.clone() {
                    self.collect_field_packages(entry, used);
                }
            } else {
                used.insert(state[m].package.clone());
            }
        }
    }
}

fn dependency_line(p: &PackageMapping) -> String {
    let mut parts = Vec::new();
    if let Some(version) = &p.version {
        parts.push(format!("version = {version:?}"));
    }
    if let Some(path) = &p.path {
        parts.push(format!("path = {path:?}"));
    }
    parts.push(format!("package = {:?}", p.package));
    if !p.features.is_empty() {
        let features = p
            .features
            .iter()
            .map(|f| format!("{f:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("features = [{features}]"));
    }
    format!("{} = {{ {} }}", p.name, parts.join(", "))
}

impl Plan {
    /// Stores every annotation in its node and returns the model annotations.
    pub fn apply(self, model: &mut API) -> ModelAnnotations {
        let state = &mut model.state;
        for (id, annotation) in self.messages {
            state[id].codec.set(annotation);
        }
        for (id, annotation) in self.fields {
            state[id].codec.set(annotation);
        }
        for (id, annotation) in self.one_ofs {
            state[id].codec.set(annotation);
        }
        for (id, annotation) in self.enums {
            state[id].codec.set(annotation);
        }
        for (id, annotation) in self.enum_values {
            state[id].codec.set(annotation);
        }
        for (id, annotation) in self.services {
            state[id].codec.set(annotation);
        }
        for plan in self.methods {
            let method = &mut state[plan.id];
            method.codec.set(plan.method);
            method.path_info.codec.set(plan.path_info);
            for (binding, annotation) in method.path_info.bindings.iter_mut().zip(plan.bindings) {
                binding.codec.set(annotation);
            }
            if let (Some(lro), Some(annotation)) = (method.discovery_lro.as_mut(), plan.discovery_lro) {
                lro.codec.set(annotation);
            }
            if let (Some(op), Some(annotation)) =
                (method.operation_info.as_mut(), plan.operation_info)
            {
                op.codec.set(annotation);
            }
        }
        model.codec.set(self.model.clone());
        self.model
    }
}
