//! Schema properties to message fields
//!
//! A property becomes one of four kinds of field, checked in order: an array
//! (repeated field), a map, an inline object (nested message) or a scalar.
//! Enum-valued properties also create an enum nested in the parent message.

use super::types::Schema;
use crate::mapper::{insert_map_type, ScalarKind};
use sdkgen_common::{
    Enum, EnumValue, Field, GeneratorError, Message, MessageId, Result, Typez, API,
};

/// Adds a field to `message` for each property of `schema`, in order.
pub(super) fn make_message_fields(
    model: &mut API,
    message: MessageId,
    schema: &Schema,
) -> Result<()> {
    let Some(properties) = &schema.properties else {
        return Ok(());
    };
    for (name, property) in properties {
        let field = make_field(model, message, name, property)?;
        model.add_field(message, field);
    }
    Ok(())
}

/// Builds the field for one property of `message`.
///
/// The field is returned, not added, so method parameters can adjust it
/// before it joins the synthetic request.
pub(super) fn make_field(
    model: &mut API,
    message: MessageId,
    name: &str,
    schema: &Schema,
) -> Result<Field> {
    if schema.schema_type == "array" {
        return make_array_field(model, message, name, schema);
    }
    if schema.items.is_some() {
        return Err(GeneratorError::Parse(format!(
            "`items` is only valid for arrays, found type {:?} in field {}.{}",
            schema.schema_type, model.state[message].id, name
        )));
    }
    if let Some(field) = maybe_map_field(model, message, name, schema)? {
        return Ok(field);
    }
    if let Some(field) = maybe_inline_object_field(model, message, name, schema)? {
        return Ok(field);
    }
    make_scalar_field(model, message, name, schema)
}

fn make_array_field(
    model: &mut API,
    message: MessageId,
    name: &str,
    schema: &Schema,
) -> Result<Field> {
    let Some(items) = &schema.items else {
        return Err(GeneratorError::Parse(format!(
            "missing `items` for array field {}.{}",
            model.state[message].id, name
        )));
    };
    let mut field = match maybe_inline_object_field(model, message, name, items)? {
        Some(field) => field,
        None => make_scalar_field(model, message, name, items)?,
    };
    field.documentation = schema.description.clone();
    field.repeated = true;
    field.optional = false;
    Ok(field)
}

fn maybe_map_field(
    model: &mut API,
    message: MessageId,
    name: &str,
    schema: &Schema,
) -> Result<Option<Field>> {
    if schema.schema_type != "object" || !schema.format.is_empty() {
        return Ok(None);
    }
    let Some(value) = &schema.additional_properties else {
        return Ok(None);
    };
    let message_id = model.state[message].id.clone();
    let map_id = if !value.reference.is_empty() {
        let value_id = format!(".{}.{}", model.package_name, value.reference);
        insert_map_type(model, Typez::Message, &value_id)
    } else if value.enums.is_some() {
        make_message_enum(model, message, name, value)?;
        insert_map_type(model, Typez::Enum, &format!("{message_id}.{name}"))
    } else {
        let (typez, typez_id) = scalar_type(model, &message_id, name, value)?;
        insert_map_type(model, typez, &typez_id)
    };
    Ok(Some(Field {
        name: name.to_string(),
        json_name: name.to_string(),
        id: format!("{message_id}.{name}"),
        documentation: schema.description.clone(),
        typez: Typez::Message,
        typez_id: map_id,
        deprecated: schema.deprecated,
        map: true,
        ..Default::default()
    }))
}

/// Objects with properties become a message nested in `parent`.
fn maybe_inline_object_field(
    model: &mut API,
    parent: MessageId,
    name: &str,
    schema: &Schema,
) -> Result<Option<Field>> {
    if schema.schema_type != "object" || schema.properties.is_none() {
        return Ok(None);
    }
    let id = format!("{}.{}", model.state[parent].id, name);
    let package = model.state[parent].package.clone();
    let nested = model.add_message(Message {
        name: name.to_string(),
        id: id.clone(),
        package,
        documentation: format!("The message type for the [{name}][{}] field.", &id[1..]),
        parent: Some(parent),
        deprecated: schema.deprecated,
        ..Default::default()
    });
    make_message_fields(model, nested, schema)?;
    Ok(Some(Field {
        name: name.to_string(),
        json_name: name.to_string(),
        id: id.clone(),
        documentation: schema.description.clone(),
        typez: Typez::Message,
        typez_id: id,
        deprecated: schema.deprecated,
        optional: true,
        ..Default::default()
    }))
}

fn make_scalar_field(
    model: &mut API,
    message: MessageId,
    name: &str,
    schema: &Schema,
) -> Result<Field> {
    make_message_enum(model, message, name, schema)?;
    let message_id = model.state[message].id.clone();
    let (typez, typez_id) = scalar_type(model, &message_id, name, schema)?;
    Ok(Field {
        name: name.to_string(),
        // Discovery field names are already camelCase.
        json_name: name.to_string(),
        id: format!("{message_id}.{name}"),
        documentation: schema.description.clone(),
        typez,
        typez_id,
        deprecated: schema.deprecated,
        optional: true,
        ..Default::default()
    })
}

fn scalar_type(
    model: &API,
    message_id: &str,
    name: &str,
    schema: &Schema,
) -> Result<(Typez, String)> {
    if schema.schema_type.is_empty() && !schema.reference.is_empty() {
        let id = format!(".{}.{}", model.package_name, schema.reference);
        return Ok((Typez::Message, id));
    }
    if schema.schema_type == "string" && schema.enums.is_some() {
        return Ok((Typez::Enum, format!("{message_id}.{name}")));
    }
    let kind = ScalarKind::from_discovery(
        &schema.schema_type,
        &schema.format,
        &format!("{message_id}.{name}"),
    )?;
    Ok((kind.typez(), kind.typez_id().to_string()))
}

/// Creates the enum for an enum-valued property, nested in `message`.
fn make_message_enum(
    model: &mut API,
    message: MessageId,
    name: &str,
    schema: &Schema,
) -> Result<()> {
    let Some(values) = &schema.enums else {
        return Ok(());
    };
    if values.len() != schema.enum_descriptions.len() {
        return Err(GeneratorError::Parse(
            "mismatched enum value list vs. enum value descriptions list".to_string(),
        ));
    }
    if !schema.enum_deprecated.is_empty() && values.len() != schema.enum_deprecated.len() {
        return Err(GeneratorError::Parse(
            "mismatched enum value list vs. enum deprecated values list".to_string(),
        ));
    }
    let id = format!("{}.{}", model.state[message].id, name);
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
    for (number, (value, documentation)) in values.iter().zip(&schema.enum_descriptions).enumerate()
    {
        model.add_enum_value(
            enumeration,
            EnumValue {
                name: value.clone(),
                id: format!("{id}.{value}"),
                number: number as i32,
                documentation: documentation.clone(),
                deprecated: schema.enum_deprecated.get(number).copied().unwrap_or(false),
                ..Default::default()
            },
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_message() -> (API, MessageId) {
        let mut model = API::new("test", "test");
        let message = model.add_message(Message {
            name: "Message".to_string(),
            id: ".test.Message".to_string(),
            package: "test".to_string(),
            ..Default::default()
        });
        (model, message)
    }

    fn schema(json: &str) -> Schema {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_scalar_field() {
        let (mut model, message) = model_with_message();
        let input = schema(r#"{"type": "string", "format": "int64", "description": "The id."}"#);
        let field = make_field(&mut model, message, "id", &input).unwrap();
        assert_eq!(field.id, ".test.Message.id");
        assert_eq!(field.json_name, "id");
        assert_eq!(field.typez, Typez::Int64);
        assert_eq!(field.typez_id, "int64");
        assert_eq!(field.documentation, "The id.");
        assert!(field.optional);
        assert!(!field.repeated);
    }

    #[test]
    fn test_ref_field() {
        let (mut model, message) = model_with_message();
        let input = schema(r#"{"$ref": "Other"}"#);
        let field = make_field(&mut model, message, "other", &input).unwrap();
        assert_eq!(field.typez, Typez::Message);
        assert_eq!(field.typez_id, ".test.Other");
        assert!(field.optional);
    }

    #[test]
    fn test_array_field() {
        let (mut model, message) = model_with_message();
        let input = schema(
            r#"{"type": "array", "description": "The names.", "items": {"type": "string"}}"#,
        );
        let field = make_field(&mut model, message, "names", &input).unwrap();
        assert!(field.repeated);
        assert!(!field.optional);
        assert_eq!(field.typez, Typez::String);
        assert_eq!(field.documentation, "The names.");
    }

    #[test]
    fn test_array_requires_items() {
        let (mut model, message) = model_with_message();
        let input = schema(r#"{"type": "array"}"#);
        assert!(make_field(&mut model, message, "names", &input).is_err());
    }

    #[test]
    fn test_items_require_array() {
        let (mut model, message) = model_with_message();
        let input = schema(r#"{"type": "string", "items": {"type": "string"}}"#);
        assert!(make_field(&mut model, message, "names", &input).is_err());
    }

    #[test]
    fn test_enum_field() {
        let (mut model, message) = model_with_message();
        let input = schema(
            r#"{
                "type": "string",
                "enum": ["GREEN", "RED"],
                "enumDescriptions": ["Go.", "Stop."],
                "enumDeprecated": [false, true]
            }"#,
        );
        let field = make_field(&mut model, message, "color", &input).unwrap();
        assert_eq!(field.typez, Typez::Enum);
        assert_eq!(field.typez_id, ".test.Message.color");

        let enumeration = model.state.enumeration(".test.Message.color").unwrap();
        assert_eq!(
            enumeration.documentation,
            "The enumerated type for the [color][test.Message.color] field."
        );
        assert_eq!(enumeration.parent, Some(message));
        let values: Vec<_> = enumeration
            .values
            .iter()
            .map(|v| &model.state[*v])
            .map(|v| (v.name.as_str(), v.number, v.documentation.as_str(), v.deprecated))
            .collect();
        assert_eq!(values, vec![("GREEN", 0, "Go.", false), ("RED", 1, "Stop.", true)]);
        assert_eq!(model.state[message].enums.len(), 1);
    }

    #[test]
    fn test_enum_mismatched_lists() {
        let (mut model, message) = model_with_message();
        let input = schema(r#"{"type": "string", "enum": ["A", "B"], "enumDescriptions": ["a"]}"#);
        let err = make_field(&mut model, message, "f", &input).unwrap_err();
        assert!(err.to_string().contains("descriptions"), "{err}");

        let input = schema(
            r#"{"type": "string", "enum": ["A"], "enumDescriptions": ["a"], "enumDeprecated": [true, false]}"#,
        );
        let err = make_field(&mut model, message, "g", &input).unwrap_err();
        assert!(err.to_string().contains("deprecated"), "{err}");
    }

    #[test]
    fn test_map_fields() {
        let (mut model, message) = model_with_message();
        let input = schema(r#"{"type": "object", "additionalProperties": {"type": "string"}}"#);
        let field = make_field(&mut model, message, "labels", &input).unwrap();
        assert!(field.map);
        assert!(!field.optional);
        assert_eq!(field.typez_id, "$map<string, string>");

        let input = schema(r#"{"type": "object", "additionalProperties": {"$ref": "Other"}}"#);
        let field = make_field(&mut model, message, "others", &input).unwrap();
        assert_eq!(field.typez_id, "$map<string, .test.Other>");

        let input = schema(
            r#"{"type": "object", "additionalProperties": {"type": "string", "enum": ["A"], "enumDescriptions": ["a"]}}"#,
        );
        let field = make_field(&mut model, message, "states", &input).unwrap();
        assert_eq!(field.typez_id, "$map<string, .test.Message.states>");
        assert!(model.state.enumeration(".test.Message.states").is_some());
        let helper = model.state.message("$map<string, .test.Message.states>").unwrap();
        assert_eq!(model.state[helper.fields[1]].typez, Typez::Enum);
    }

    #[test]
    fn test_inline_object_field() {
        let (mut model, message) = model_with_message();
        let input = schema(
            r#"{
                "type": "object",
                "description": "Some details.",
                "properties": {
                    "count": {"type": "integer", "format": "int32"},
                    "inner": {"type": "object", "properties": {"flag": {"type": "boolean"}}}
                }
            }"#,
        );
        let field = make_field(&mut model, message, "details", &input).unwrap();
        assert_eq!(field.typez, Typez::Message);
        assert_eq!(field.typez_id, ".test.Message.details");
        assert_eq!(field.documentation, "Some details.");
        assert!(field.optional);

        let nested = model.state.message(".test.Message.details").unwrap();
        assert_eq!(
            nested.documentation,
            "The message type for the [details][test.Message.details] field."
        );
        assert_eq!(nested.parent, Some(message));
        assert_eq!(nested.fields.len(), 2);
        assert_eq!(nested.messages.len(), 1);
        assert!(model.state.message(".test.Message.details.inner").is_some());
        assert_eq!(model.state[message].messages.len(), 1);
    }

    #[test]
    fn test_unknown_format() {
        let (mut model, message) = model_with_message();
        let input = schema(r#"{"type": "integer", "format": "int8"}"#);
        let err = make_field(&mut model, message, "small", &input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown integer format (int8) for field .test.Message.small"
        );
    }
}
