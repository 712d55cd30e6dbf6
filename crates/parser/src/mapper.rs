//! Shared schema-to-field mapping helpers
//!
//! Both document formats describe scalar fields as a `(type, format)` pair.
//! Each format maps the pair into a [`ScalarKind`] with its own validating
//! constructor; unknown pairs become [`GeneratorError::UnknownScalar`].

use sdkgen_common::well_known;
use sdkgen_common::{Field, GeneratorError, Message, Result, Typez, API};

/// Every scalar a schema can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    Duration,
    Timestamp,
    FieldMask,
    Struct,
    Value,
    Any,
}

impl ScalarKind {
    /// Maps a Discovery `(type, format)` pair.
    ///
    /// `field` is the fully qualified field name, used in errors.
    pub fn from_discovery(base: &str, format: &str, field: &str) -> Result<Self> {
        let kind = match (base, format) {
            ("boolean", _) => Self::Bool,
            ("integer", "int32") => Self::Int32,
            ("integer", "uint32") => Self::Uint32,
            ("integer", "int64") => Self::Int64,
            ("integer", "uint64") => Self::Uint64,
            ("number", "float") => Self::Float,
            ("number", "double") => Self::Double,
            ("string", "" | "date") => Self::String,
            ("string", "byte") => Self::Bytes,
            ("string", "google-duration") => Self::Duration,
            ("string", "date-time" | "google-datetime") => Self::Timestamp,
            ("string", "google-fieldmask") => Self::FieldMask,
            ("string", "int64") => Self::Int64,
            ("string", "uint64") => Self::Uint64,
            ("any", "google.protobuf.Value") => Self::Value,
            ("object", "google.protobuf.Struct") => Self::Struct,
            ("object", "google.protobuf.Any") => Self::Any,
            _ => return Err(unknown(base, format, field)),
        };
        Ok(kind)
    }

    /// Maps an OpenAPI `(type, format)` pair.
    ///
    /// `unsigned` is set when the schema declares `minimum: 0`.
    pub fn from_openapi(base: &str, format: &str, unsigned: bool, field: &str) -> Result<Self> {
        let kind = match (base, format) {
            ("boolean", _) => Self::Bool,
            ("integer" | "string", "int32") if unsigned => Self::Uint32,
            ("integer" | "string", "int32") => Self::Int32,
            ("integer" | "string", "int64") if unsigned => Self::Uint64,
            ("integer" | "string", "int64") => Self::Int64,
            ("integer", "uint32") => Self::Uint32,
            ("integer", "uint64") => Self::Uint64,
            ("number", "float") => Self::Float,
            ("number", "double") => Self::Double,
            ("string", "" | "date" | "uuid4") => Self::String,
            ("string", "byte") => Self::Bytes,
            ("string", "google-duration") => Self::Duration,
            ("string", "date-time" | "google-datetime") => Self::Timestamp,
            ("string", "google-fieldmask") => Self::FieldMask,
            _ => return Err(unknown(base, format, field)),
        };
        Ok(kind)
    }

    pub fn typez(self) -> Typez {
        match self {
            Self::Bool => Typez::Bool,
            Self::Int32 => Typez::Int32,
            Self::Uint32 => Typez::Uint32,
            Self::Int64 => Typez::Int64,
            Self::Uint64 => Typez::Uint64,
            Self::Float => Typez::Float,
            Self::Double => Typez::Double,
            Self::String => Typez::String,
            Self::Bytes => Typez::Bytes,
            Self::Duration
            | Self::Timestamp
            | Self::FieldMask
            | Self::Struct
            | Self::Value
            | Self::Any => Typez::Message,
        }
    }

    /// The type ID recorded on the field.
    pub fn typez_id(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Duration => well_known::DURATION,
            Self::Timestamp => well_known::TIMESTAMP,
            Self::FieldMask => well_known::FIELD_MASK,
            Self::Struct => well_known::STRUCT,
            Self::Value => well_known::VALUE,
            Self::Any => well_known::ANY,
        }
    }

    /// Well-known message types are always optional fields.
    pub fn is_message(self) -> bool {
        self.typez() == Typez::Message
    }
}

fn unknown(base: &str, format: &str, field: &str) -> GeneratorError {
    let base = if base.is_empty() { "scalar" } else { base };
    GeneratorError::UnknownScalar {
        field: field.to_string(),
        base: base.to_string(),
        format: format.to_string(),
    }
}

/// Returns the ID of the `$map<string, V>` helper message for `value_typez_id`.
///
/// Helpers are cached in the model index, so each value type gets exactly
/// one helper per model. They are not part of the top-level message list.
pub fn insert_map_type(model: &mut API, value_typez: Typez, value_typez_id: &str) -> String {
    let id = format!("$map<string, {value_typez_id}>");
    if model.state.map_type(&id).is_some() {
        return id;
    }
    tracing::trace!(id = %id, "adding map helper");
    let message = model.add_indexed_message(Message {
        name: id.clone(),
        id: id.clone(),
        documentation: id.clone(),
        package: "$".to_string(),
        is_map: true,
        ..Default::default()
    });
    model.add_field(
        message,
        Field {
            name: "key".to_string(),
            json_name: "key".to_string(),
            id: format!("{id}.key"),
            typez: Typez::String,
            typez_id: "string".to_string(),
            ..Default::default()
        },
    );
    model.add_field(
        message,
        Field {
            name: "value".to_string(),
            json_name: "value".to_string(),
            id: format!("{id}.value"),
            typez: value_typez,
            typez_id: value_typez_id.to_string(),
            ..Default::default()
        },
    );
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_scalars() {
        let cases = [
            ("boolean", "", ScalarKind::Bool),
            ("integer", "int32", ScalarKind::Int32),
            ("integer", "uint32", ScalarKind::Uint32),
            ("integer", "int64", ScalarKind::Int64),
            ("integer", "uint64", ScalarKind::Uint64),
            ("number", "float", ScalarKind::Float),
            ("number", "double", ScalarKind::Double),
            ("string", "", ScalarKind::String),
            ("string", "date", ScalarKind::String),
            ("string", "byte", ScalarKind::Bytes),
            ("string", "google-duration", ScalarKind::Duration),
            ("string", "date-time", ScalarKind::Timestamp),
            ("string", "google-datetime", ScalarKind::Timestamp),
            ("string", "google-fieldmask", ScalarKind::FieldMask),
            ("string", "int64", ScalarKind::Int64),
            ("string", "uint64", ScalarKind::Uint64),
            ("any", "google.protobuf.Value", ScalarKind::Value),
            ("object", "google.protobuf.Struct", ScalarKind::Struct),
            ("object", "google.protobuf.Any", ScalarKind::Any),
        ];
        for (base, format, want) in cases {
            let got = ScalarKind::from_discovery(base, format, "..M.f").unwrap();
            assert_eq!(got, want, "({base}, {format})");
        }
        assert_eq!(ScalarKind::Duration.typez_id(), ".google.protobuf.Duration");
        assert_eq!(ScalarKind::Duration.typez(), Typez::Message);
        assert_eq!(ScalarKind::Uint64.typez_id(), "uint64");
    }

    #[test]
    fn test_discovery_unknown_scalars() {
        for (base, format) in [
            ("integer", "int8"),
            ("number", "int32"),
            ("string", "uuid"),
            ("any", ""),
            ("object", "google.protobuf.Empty"),
            ("", ""),
            ("unknown", "int32"),
        ] {
            let err = ScalarKind::from_discovery(base, format, "..Message.field").unwrap_err();
            match err {
                GeneratorError::UnknownScalar { field, .. } => {
                    assert_eq!(field, "..Message.field")
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
        let err = ScalarKind::from_discovery("", "", "..M.f").unwrap_err();
        assert_eq!(err.to_string(), "unknown scalar format () for field ..M.f");
    }

    #[test]
    fn test_openapi_scalars() {
        let cases = [
            ("integer", "int32", false, ScalarKind::Int32),
            ("integer", "int32", true, ScalarKind::Uint32),
            ("integer", "int64", false, ScalarKind::Int64),
            ("string", "int64", false, ScalarKind::Int64),
            ("string", "int64", true, ScalarKind::Uint64),
            ("string", "int32", false, ScalarKind::Int32),
            ("string", "uuid4", false, ScalarKind::String),
            ("string", "date-time", false, ScalarKind::Timestamp),
        ];
        for (base, format, unsigned, want) in cases {
            let got = ScalarKind::from_openapi(base, format, unsigned, "..M.f").unwrap();
            assert_eq!(got, want, "({base}, {format}, {unsigned})");
        }
        assert!(ScalarKind::from_openapi("number", "int32", false, "..M.f").is_err());
    }

    #[test]
    fn test_insert_map_type_is_cached() {
        let mut model = API::new("test", "");
        let id = insert_map_type(&mut model, Typez::String, "string");
        assert_eq!(id, "$map<string, string>");
        let again = insert_map_type(&mut model, Typez::String, "string");
        assert_eq!(again, id);

        assert!(model.messages.is_empty());
        let helper = model.state.message(&id).unwrap();
        assert!(helper.is_map);
        assert_eq!(helper.package, "$");
        assert_eq!(helper.fields.len(), 2);
        let key = &model.state[helper.fields[0]];
        let value = &model.state[helper.fields[1]];
        assert_eq!((key.name.as_str(), key.typez), ("key", Typez::String));
        assert_eq!(value.name, "value");
        assert_eq!(value.id, "$map<string, string>.value");

        let other = insert_map_type(&mut model, Typez::Message, "..Foo");
        assert_eq!(other, "$map<string, ..Foo>");
        assert_eq!(model.state.message_by_id.len(), 2);
    }
}
