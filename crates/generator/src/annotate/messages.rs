use super::Annotator;
use crate::annotations::{
    EnumAnnotation, EnumValueAnnotation, EnumValueForExamples, FieldAnnotations,
    MessageAnnotation, OneOfAnnotation,
};
use crate::naming::{
    doc_lines, enum_variant_name, package_module_name, to_pascal, to_screaming_snake, to_snake,
    to_snake_no_mangling,
};
use sdkgen_common::well_known::NULL_VALUE;
use sdkgen_common::{
    EnumId, EnumValueId, Field, FieldId, GeneratorError, MessageId, OneOfId, Result, Typez,
};
use std::collections::BTreeSet;

/// Enum values shown in generated samples.
const MAX_EXAMPLE_VALUES: usize = 3;

impl Annotator<'_> {
    pub(super) fn message(&self, id: MessageId) -> MessageAnnotation {
        let state = &self.model.state;
        let message = &state[id];
        let name = self.message_name(id);
        let relative_name = self.relative_name(message.parent, &name);
        MessageAnnotation {
            module_name: to_snake(&name),
            qualified_name: self.qualify(&message.package, &relative_name),
            name_in_examples: format!(
                "{}::model::{relative_name}",
                self.examples_namespace(&message.package)
            ),
            package_module_name: package_module_name(&message.package),
            source_fqn: message.id.trim_start_matches('.').to_string(),
            doc_lines: doc_lines(&message.documentation),
            has_nested_types: !message.enums.is_empty()
                || !message.one_ofs.is_empty()
                || message.messages.iter().any(|m| !state[*m].is_map),
            basic_fields: message
                .fields
                .iter()
                .copied()
                .filter(|f| !state[*f].is_one_of)
                .collect(),
            internal: self.codec.internal_types.contains(&message.id),
            name,
            relative_name,
        }
    }

    pub(super) fn field(&self, id: FieldId) -> Result<FieldAnnotations> {
        let state = &self.model.state;
        let field = &state[id];
        let parent = field.parent.ok_or_else(|| {
            GeneratorError::Reference(format!("field {} has no parent message", field.id))
        })?;
        let entry = self.map_entry(field)?;
        let is_map = entry.is_some() || field.map;
        let primitive = self.primitive_field_type(field)?;
        let is_message = field.typez == Typez::Message;
        let is_boxed = if field.is_one_of {
            is_message
        } else {
            is_message && field.recursive && !field.repeated && !is_map
        };
        let field_type = if is_map {
            primitive.clone()
        } else if field.repeated {
            format!("std::vec::Vec<{primitive}>")
        } else if is_boxed && (field.is_one_of || !field.optional) {
            format!("std::boxed::Box<{primitive}>")
        } else if is_boxed {
            format!("std::option::Option<std::boxed::Box<{primitive}>>")
        } else if field.optional {
            format!("std::option::Option<{primitive}>")
        } else {
            primitive.clone()
        };
        let (key_type, value_type) = match entry {
            Some((key, value)) => (
                self.primitive_field_type(&state[key])?,
                self.primitive_field_type(&state[value])?,
            ),
            None => Default::default(),
        };
        let other_fields_in_group = field
            .group
            .map(|g| {
                state[g]
                    .fields
                    .iter()
                    .copied()
                    .filter(|f| *f != id)
                    .collect()
            })
            .unwrap_or_default();

        Ok(FieldAnnotations {
            field_name: to_snake(&field.name),
            setter_name: to_snake_no_mangling(&field.name),
            branch_name: to_pascal(&field.name),
            fq_message_name: self.message_type(parent),
            doc_lines: doc_lines(&field.documentation),
            field_type,
            primitive_field_type: primitive,
            add_query_parameter: add_query_parameter(field, is_map),
            key_type,
            key_field: entry.map(|(key, _)| key),
            value_type,
            value_field: entry.map(|(_, value)| value),
            is_boxed,
            serde_as: self.serde_as(field, entry),
            skip_if_is_default: is_map || !field.is_singular(),
            is_wkt_null_value: field.typez == Typez::Enum && field.typez_id == NULL_VALUE,
            other_fields_in_group,
        })
    }

    pub(super) fn one_of(&self, id: OneOfId) -> Result<OneOfAnnotation> {
        let state = &self.model.state;
        let group = &state[id];
        let parent = group.parent.ok_or_else(|| {
            GeneratorError::Reference(format!("one-of {} has no parent message", group.id))
        })?;
        let package = &state[parent].package;
        let enum_name = self
            .codec
            .name_overrides
            .get(&group.id)
            .cloned()
            .unwrap_or_else(|| to_pascal(&group.name));
        let scope = self.scope(Some(parent)).join("::");
        let relative_name = format!("{scope}::{enum_name}");
        let qualified_name = self.qualify(package, &relative_name);
        Ok(OneOfAnnotation {
            field_name: to_snake(&group.name),
            setter_name: to_snake_no_mangling(&group.name),
            struct_qualified_name: self.message_type(parent),
            scope_in_examples: format!("{}::model::{scope}", self.examples_namespace(package)),
            field_type: qualified_name.clone(),
            doc_lines: doc_lines(&group.documentation),
            example_field: self.example_field(&group.fields),
            enum_name,
            qualified_name,
            relative_name,
        })
    }

    /// Picks the one-of member that makes the simplest sample.
    fn example_field(&self, fields: &[FieldId]) -> Option<FieldId> {
        let state = &self.model.state;
        let is_map = |f: &Field| f.map || self.message_of(f).is_some_and(|m| state[m].is_map);
        let preferences: [&dyn Fn(&Field) -> bool; 4] = [
            &|f: &Field| {
                !f.deprecated && !is_map(f) && !f.repeated && f.typez != Typez::Message
            },
            &|f: &Field| !f.deprecated && !is_map(f) && f.typez == Typez::Message,
            &|f: &Field| !f.deprecated && !is_map(f),
            &|f: &Field| !f.deprecated,
        ];
        preferences
            .iter()
            .find_map(|accept| fields.iter().copied().find(|f| accept(&state[*f])))
            .or_else(|| fields.first().copied())
    }

    pub(super) fn enumeration(
        &self,
        id: EnumId,
    ) -> (EnumAnnotation, Vec<(EnumValueId, EnumValueAnnotation)>) {
        let state = &self.model.state;
        let enumeration = &state[id];
        let name = self.enum_name(id);
        let relative_name = self.relative_name(enumeration.parent, &name);

        let values: Vec<_> = enumeration
            .values
            .iter()
            .map(|v| {
                let value = &state[*v];
                let annotation = EnumValueAnnotation {
                    name: to_screaming_snake(&value.name),
                    variant_name: enum_variant_name(&enumeration.name, &value.name),
                    enum_type: name.clone(),
                    doc_lines: doc_lines(&value.documentation),
                };
                (*v, annotation)
            })
            .collect();

        // Number aliases are already gone from `unique_number_values`, so
        // they cannot claim a variant name.
        let mut variants = BTreeSet::new();
        let unique_names: Vec<EnumValueId> = enumeration
            .unique_number_values
            .iter()
            .copied()
            .filter(|v| variants.insert(enum_variant_name(&enumeration.name, &state[*v].name)))
            .collect();

        let preferred: Vec<EnumValueId> = unique_names
            .iter()
            .copied()
            .filter(|v| !state[*v].deprecated && state[*v].number != 0)
            .take(MAX_EXAMPLE_VALUES)
            .collect();
        let examples = if preferred.is_empty() {
            unique_names.clone()
        } else {
            preferred
        };

        let annotation = EnumAnnotation {
            module_name: to_snake(&name),
            qualified_name: self.qualify(&enumeration.package, &relative_name),
            name_in_examples: format!(
                "{}::model::{relative_name}",
                self.examples_namespace(&enumeration.package)
            ),
            doc_lines: doc_lines(&enumeration.documentation),
            values_for_examples: examples
                .into_iter()
                .enumerate()
                .map(|(index, enum_value)| EnumValueForExamples { enum_value, index })
                .collect(),
            unique_names,
            name,
            relative_name,
        };
        (annotation, values)
    }
}

/// Statement adding `field` to `builder` as a query parameter.
fn add_query_parameter(field: &Field, is_map: bool) -> String {
    let name = to_snake(&field.name);
    let key = if field.json_name.is_empty() {
        &field.name
    } else {
        &field.json_name
    };
    let is_message = field.typez == Typez::Message;
    if field.is_one_of {
        return if is_message {
            format!(
                "let builder = req.{name}().map(|p| serde_json::to_value(p).map_err(Error::ser) ).transpose()?.into_iter().fold(builder, |builder, p| {{ use gaxi::query_parameter::QueryParameter; p.add(builder, \"{key}\") }});"
            )
        } else {
            format!(
                "let builder = req.{name}().iter().fold(builder, |builder, p| builder.query(&[(\"{key}\", p)]));"
            )
        };
    }
    if is_map {
        return format!(
            "let builder = {{ use gaxi::query_parameter::QueryParameter; serde_json::to_value(&req.{name}).map_err(Error::ser)?.add(builder, \"{key}\") }};"
        );
    }
    if is_message && field.repeated {
        return format!(
            "let builder = req.{name}.iter().map(|p| serde_json::to_value(p).map_err(Error::ser) ).collect::<Result<Vec<_>>>()?.into_iter().fold(builder, |builder, v| {{ use gaxi::query_parameter::QueryParameter; v.add(builder, \"{key}\") }});"
        );
    }
    if is_message {
        return format!(
            "let builder = req.{name}.as_ref().map(|p| serde_json::to_value(p).map_err(Error::ser) ).transpose()?.into_iter().fold(builder, |builder, v| {{ use gaxi::query_parameter::QueryParameter; v.add(builder, \"{key}\") }});"
        );
    }
    if field.optional || field.repeated {
        return format!(
            "let builder = req.{name}.iter().fold(builder, |builder, p| builder.query(&[(\"{key}\", p)]));"
        );
    }
    format!("let builder = builder.query(&[(\"{key}\", &req.{name})]);")
}
