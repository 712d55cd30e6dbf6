//! Protobuf well-known types
//!
//! OpenAPI and Discovery documents reference these types by ID without
//! declaring them, so the parsers load them into the model index before
//! cross-referencing.

use crate::model::{Enum, Field, Message, Typez, API};

pub const PACKAGE: &str = "google.protobuf";

pub const EMPTY: &str = ".google.protobuf.Empty";
pub const ANY: &str = ".google.protobuf.Any";
pub const STRUCT: &str = ".google.protobuf.Struct";
pub const VALUE: &str = ".google.protobuf.Value";
pub const LIST_VALUE: &str = ".google.protobuf.ListValue";
pub const FIELD_MASK: &str = ".google.protobuf.FieldMask";
pub const DURATION: &str = ".google.protobuf.Duration";
pub const TIMESTAMP: &str = ".google.protobuf.Timestamp";
pub const NULL_VALUE: &str = ".google.protobuf.NullValue";

pub const BYTES_VALUE: &str = ".google.protobuf.BytesValue";
pub const UINT64_VALUE: &str = ".google.protobuf.UInt64Value";
pub const INT64_VALUE: &str = ".google.protobuf.Int64Value";
pub const UINT32_VALUE: &str = ".google.protobuf.UInt32Value";
pub const INT32_VALUE: &str = ".google.protobuf.Int32Value";
pub const FLOAT_VALUE: &str = ".google.protobuf.FloatValue";
pub const DOUBLE_VALUE: &str = ".google.protobuf.DoubleValue";
pub const BOOL_VALUE: &str = ".google.protobuf.BoolValue";

const MESSAGES: &[&str] = &[
    ANY,
    STRUCT,
    VALUE,
    LIST_VALUE,
    EMPTY,
    FIELD_MASK,
    DURATION,
    TIMESTAMP,
    BYTES_VALUE,
    UINT64_VALUE,
    INT64_VALUE,
    UINT32_VALUE,
    INT32_VALUE,
    FLOAT_VALUE,
    DOUBLE_VALUE,
    BOOL_VALUE,
];

/// Adds the well-known messages and `NullValue` to the model index.
///
/// Types already present in the index are left alone.
pub fn load_well_known_types(model: &mut API) {
    for id in MESSAGES {
        if model.state.message_by_id.contains_key(*id) {
            continue;
        }
        let name = id.rsplit('.').next().unwrap_or(id);
        let message = model.add_indexed_message(Message {
            name: name.to_string(),
            id: id.to_string(),
            package: PACKAGE.to_string(),
            ..Default::default()
        });
        if *id == FIELD_MASK {
            model.add_field(
                message,
                Field {
                    name: "paths".to_string(),
                    json_name: "paths".to_string(),
                    id: format!("{FIELD_MASK}.paths"),
                    typez: Typez::String,
                    typez_id: "string".to_string(),
                    repeated: true,
                    ..Default::default()
                },
            );
        }
    }
    if !model.state.enum_by_id.contains_key(NULL_VALUE) {
        model.add_indexed_enum(Enum {
            name: "NullValue".to_string(),
            id: NULL_VALUE.to_string(),
            package: PACKAGE.to_string(),
            ..Default::default()
        });
    }
}

/// Maps a wrapper type ID to the scalar type it wraps.
pub fn wrapped_type(id: &str) -> Option<Typez> {
    match id {
        BYTES_VALUE => Some(Typez::Bytes),
        UINT64_VALUE => Some(Typez::Uint64),
        INT64_VALUE => Some(Typez::Int64),
        UINT32_VALUE => Some(Typez::Uint32),
        INT32_VALUE => Some(Typez::Int32),
        FLOAT_VALUE => Some(Typez::Float),
        DOUBLE_VALUE => Some(Typez::Double),
        BOOL_VALUE => Some(Typez::Bool),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_well_known_types() {
        let mut model = API::new("test", "test");
        load_well_known_types(&mut model);
        load_well_known_types(&mut model);

        assert!(model.messages.is_empty());
        assert!(model.enums.is_empty());
        for id in MESSAGES {
            let message = model.state.message(id).expect("well-known message");
            assert_eq!(message.package, PACKAGE);
            assert_eq!(&format!(".{}.{}", PACKAGE, message.name), id);
        }
        let mask = model.state.message(FIELD_MASK).expect("FieldMask");
        assert_eq!(mask.fields.len(), 1);
        let paths = &model.state[mask.fields[0]];
        assert!(paths.repeated);
        assert!(paths.is_string());
        assert!(model.state.enumeration(NULL_VALUE).is_some());
    }

    #[test]
    fn test_wrapped_type() {
        assert_eq!(wrapped_type(INT32_VALUE), Some(Typez::Int32));
        assert_eq!(wrapped_type(BOOL_VALUE), Some(Typez::Bool));
        assert_eq!(wrapped_type(DURATION), None);
    }
}
