//! Rust type names and `serde_with` adapters for model types

use super::Annotator;
use crate::codec::SourceFormat;
use crate::naming::{package_name, package_namespace, to_pascal, to_snake};
use sdkgen_common::well_known::{self, wrapped_type};
use sdkgen_common::{EnumId, Field, FieldId, GeneratorError, MessageId, Result, Typez};

/// Default name of the crate providing the well-known types.
const WKT: &str = "wkt";

fn scalar_type(typez: Typez) -> Option<&'static str> {
    let name = match typez {
        Typez::Double => "f64",
        Typez::Float => "f32",
        Typez::Int32 | Typez::Sfixed32 | Typez::Sint32 => "i32",
        Typez::Int64 | Typez::Sfixed64 | Typez::Sint64 => "i64",
        Typez::Uint32 | Typez::Fixed32 => "u32",
        Typez::Uint64 | Typez::Fixed64 => "u64",
        Typez::Bool => "bool",
        Typez::String => "std::string::String",
        Typez::Bytes => "::bytes::Bytes",
        _ => return None,
    };
    Some(name)
}

impl Annotator<'_> {
    /// Rust name of a message, honoring name overrides.
    pub(super) fn message_name(&self, id: MessageId) -> String {
        let message = &self.model.state[id];
        self.codec
            .name_overrides
            .get(&message.id)
            .cloned()
            .unwrap_or_else(|| to_pascal(&message.name))
    }

    pub(super) fn enum_name(&self, id: EnumId) -> String {
        let enumeration = &self.model.state[id];
        self.codec
            .name_overrides
            .get(&enumeration.id)
            .cloned()
            .unwrap_or_else(|| to_pascal(&enumeration.name))
    }

    /// Module names of `parent` and its ancestors, outermost first.
    pub(super) fn scope(&self, parent: Option<MessageId>) -> Vec<String> {
        let mut modules = Vec::new();
        let mut current = parent;
        while let Some(id) = current {
            modules.push(to_snake(&self.message_name(id)));
            current = self.model.state[id].parent;
        }
        modules.reverse();
        modules
    }

    /// Path of `name` relative to the `model` module of its crate.
    pub(super) fn relative_name(&self, parent: Option<MessageId>, name: &str) -> String {
        let mut parts = self.scope(parent);
        parts.push(name.to_string());
        parts.join("::")
    }

    /// Prefixes a relative name with the module of the crate defining `package`.
    pub(super) fn qualify(&self, package: &str, relative: &str) -> String {
        if package == well_known::PACKAGE {
            let wkt = self
                .codec
                .package_for(package)
                .map(|p| p.name.as_str())
                .unwrap_or(WKT);
            return format!("{wkt}::{relative}");
        }
        if !package.is_empty() && package != self.package {
            if let Some(mapping) = self.codec.package_for(package) {
                return format!("{}::model::{relative}", mapping.name);
            }
        }
        format!("{}::{relative}", self.codec.module_path)
    }

    /// Crate namespace used in generated samples for types from `package`.
    pub(super) fn examples_namespace(&self, package: &str) -> String {
        if package == self.package {
            return package_namespace(&self.crate_name());
        }
        package_namespace(&package_name(package))
    }

    pub(super) fn message_type(&self, id: MessageId) -> String {
        let message = &self.model.state[id];
        let relative = self.relative_name(message.parent, &self.message_name(id));
        self.qualify(&message.package, &relative)
    }

    pub(super) fn enum_type(&self, id: EnumId) -> String {
        let enumeration = &self.model.state[id];
        let relative = self.relative_name(enumeration.parent, &self.enum_name(id));
        self.qualify(&enumeration.package, &relative)
    }

    /// Rust type of a message referenced by ID.
    pub(super) fn type_by_id(&self, id: &str) -> Result<String> {
        self.model
            .state
            .message_by_id
            .get(id)
            .map(|m| self.message_type(*m))
            .ok_or_else(|| GeneratorError::Reference(format!("cannot find message {id}")))
    }

    pub(super) fn message_of(&self, field: &Field) -> Option<MessageId> {
        if field.typez != Typez::Message {
            return None;
        }
        field
            .message_type
            .or_else(|| self.model.state.message_by_id.get(&field.typez_id).copied())
    }

    fn enum_of(&self, field: &Field) -> Option<EnumId> {
        field
            .enum_type
            .or_else(|| self.model.state.enum_by_id.get(&field.typez_id).copied())
    }

    /// The `key` and `value` fields when `field` is a map.
    pub(super) fn map_entry(&self, field: &Field) -> Result<Option<(FieldId, FieldId)>> {
        let Some(message) = self.message_of(field) else {
            return Ok(None);
        };
        let state = &self.model.state;
        if !state[message].is_map {
            return Ok(None);
        }
        match (
            state.field_named(message, "key"),
            state.field_named(message, "value"),
        ) {
            (Some(key), Some(value)) => Ok(Some((key, value))),
            _ => Err(GeneratorError::Reference(format!(
                "map type {} of field {} needs a key and a value field",
                field.typez_id, field.id
            ))),
        }
    }

    /// The field type without any `Option`, `Vec` or `Box` wrapper.
    pub(super) fn primitive_field_type(&self, field: &Field) -> Result<String> {
        match field.typez {
            Typez::Message => {
                if let Some((key, value)) = self.map_entry(field)? {
                    let state = &self.model.state;
                    return Ok(format!(
                        "std::collections::HashMap<{},{}>",
                        self.primitive_field_type(&state[key])?,
                        self.primitive_field_type(&state[value])?
                    ));
                }
                self.message_of(field)
                    .map(|m| self.message_type(m))
                    .ok_or_else(|| {
                        GeneratorError::Reference(format!(
                            "cannot find message {} for field {}",
                            field.typez_id, field.id
                        ))
                    })
            }
            Typez::Enum => self.enum_of(field).map(|e| self.enum_type(e)).ok_or_else(|| {
                GeneratorError::Reference(format!(
                    "cannot find enum {} for field {}",
                    field.typez_id, field.id
                ))
            }),
            typez => scalar_type(typez).map(str::to_string).ok_or_else(|| {
                GeneratorError::Codec(format!(
                    "unsupported type {typez:?} for field {}",
                    field.id
                ))
            }),
        }
    }

    fn base64(&self) -> &'static str {
        match self.codec.source {
            SourceFormat::Discovery => "serde_with::base64::Base64<serde_with::base64::UrlSafe>",
            SourceFormat::Protobuf | SourceFormat::OpenApi => "serde_with::base64::Base64",
        }
    }

    /// Adapter for a scalar, empty if serde's default encoding is right.
    fn scalar_serde_as(&self, typez: Typez) -> &'static str {
        match typez {
            Typez::Int32 | Typez::Sfixed32 | Typez::Sint32 => "wkt::internal::I32",
            Typez::Int64 | Typez::Sfixed64 | Typez::Sint64 => "wkt::internal::I64",
            Typez::Uint32 | Typez::Fixed32 => "wkt::internal::U32",
            Typez::Uint64 | Typez::Fixed64 => "wkt::internal::U64",
            Typez::Float => "wkt::internal::F32",
            Typez::Double => "wkt::internal::F64",
            Typez::Bytes => self.base64(),
            _ => "",
        }
    }

    fn element_serde_as(&self, field: &Field) -> &'static str {
        match field.typez {
            Typez::Message => wrapped_type(&field.typez_id)
                .map(|t| self.scalar_serde_as(t))
                .unwrap_or(""),
            typez => self.scalar_serde_as(typez),
        }
    }

    /// The `serde_with` adapter for a field, empty if none is needed.
    pub(super) fn serde_as(&self, field: &Field, entry: Option<(FieldId, FieldId)>) -> String {
        let Some((key, value)) = entry else {
            return self.element_serde_as(field).to_string();
        };
        let state = &self.model.state;
        let key = match state[key].typez {
            Typez::Bool => "serde_with::DisplayFromStr",
            typez => match self.scalar_serde_as(typez) {
                "" => "serde_with::Same",
                adapter => adapter,
            },
        };
        let value = match self.element_serde_as(&state[value]) {
            "" => "serde_with::Same",
            adapter => adapter,
        };
        if key == "serde_with::Same" && value == "serde_with::Same" {
            return String::new();
        }
        format!("std::collections::HashMap<{key}, {value}>")
    }
}
