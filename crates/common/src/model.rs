//! The unified API model
//!
//! One `API` value is built per source document. Parsers add nodes through
//! the helpers on [`API`], later passes refine them in place, and language
//! annotators fill the [`CodecSlot`] on each node.

use crate::path::PathTemplate;
use crate::routing::RoutingInfo;
use crate::{GeneratorError, Result};
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

macro_rules! arena_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);
    };
}

arena_handle!(
    /// Handle to a [`Message`] in [`State`].
    MessageId
);
arena_handle!(
    /// Handle to a [`Field`] in [`State`].
    FieldId
);
arena_handle!(
    /// Handle to a [`OneOf`] in [`State`].
    OneOfId
);
arena_handle!(
    /// Handle to an [`Enum`] in [`State`].
    EnumId
);
arena_handle!(
    /// Handle to an [`EnumValue`] in [`State`].
    EnumValueId
);
arena_handle!(
    /// Handle to a [`Service`] in [`State`].
    ServiceId
);
arena_handle!(
    /// Handle to a [`Method`] in [`State`].
    MethodId
);

/// Language-specific annotation attached to a model node.
///
/// The passes over the neutral model never look inside the slot. Each
/// annotator stores its own concrete type and reads it back with
/// [`CodecSlot::get`].
#[derive(Clone, Default)]
pub struct CodecSlot(Option<Arc<dyn Any + Send + Sync>>);

impl CodecSlot {
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.0 = Some(Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for CodecSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("CodecSlot(set)"),
            None => f.write_str("CodecSlot(empty)"),
        }
    }
}

/// Declared type of a field, using the protobuf type numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Typez {
    #[default]
    Undefined,
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

/// Field behavior annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldBehavior {
    Optional,
    Required,
    OutputOnly,
    InputOnly,
    Immutable,
    UnorderedList,
    NonEmptyDefault,
    Identifier,
}

/// Root of the model for one source document.
#[derive(Debug, Clone, Default)]
pub struct API {
    /// Short API name, e.g. `secretmanager`.
    pub name: String,
    /// Package containing the API types, e.g. `google.cloud.secretmanager.v1`.
    pub package_name: String,
    pub title: String,
    pub description: String,
    /// Document revision, only known for Discovery documents.
    pub revision: String,
    /// Top-level messages, in the order they were added.
    pub messages: Vec<MessageId>,
    /// Top-level enums.
    pub enums: Vec<EnumId>,
    /// Services declared by the document.
    pub services: Vec<ServiceId>,
    pub state: State,
    pub codec: CodecSlot,
}

/// Arenas and ID indexes for every node of an [`API`].
#[derive(Debug, Clone, Default)]
pub struct State {
    pub message_by_id: HashMap<String, MessageId>,
    pub enum_by_id: HashMap<String, EnumId>,
    pub service_by_id: HashMap<String, ServiceId>,
    pub method_by_id: HashMap<String, MethodId>,
    messages: Vec<Message>,
    fields: Vec<Field>,
    one_ofs: Vec<OneOf>,
    enums: Vec<Enum>,
    enum_values: Vec<EnumValue>,
    services: Vec<Service>,
    methods: Vec<Method>,
    map_types: HashMap<String, MessageId>,
}

#[derive(Debug, Clone, Default)]
pub struct Message {
    pub name: String,
    /// Fully qualified ID, e.g. `.google.cloud.secretmanager.v1.Secret`.
    pub id: String,
    pub package: String,
    pub documentation: String,
    pub parent: Option<MessageId>,
    pub fields: Vec<FieldId>,
    pub one_ofs: Vec<OneOfId>,
    pub messages: Vec<MessageId>,
    pub enums: Vec<EnumId>,
    /// Synthetic `$map<K, V>` helper with exactly two fields, `key` and `value`.
    pub is_map: bool,
    /// Holds the synthetic request messages of a service.
    pub service_placeholder: bool,
    /// Created by a parser to hold a method's path, query and body parameters.
    pub synthetic_request: bool,
    pub deprecated: bool,
    pub pagination: Option<PaginationInfo>,
    pub codec: CodecSlot,
}

#[derive(Debug, Clone, Default)]
pub struct Field {
    pub name: String,
    pub json_name: String,
    pub id: String,
    pub documentation: String,
    pub typez: Typez,
    /// Type reference: a scalar name (`string`) or a message/enum ID.
    pub typez_id: String,
    pub repeated: bool,
    pub optional: bool,
    pub map: bool,
    pub is_one_of: bool,
    pub deprecated: bool,
    pub synthetic: bool,
    pub auto_populated: bool,
    /// The field type transitively contains the parent message.
    pub recursive: bool,
    pub behavior: Vec<FieldBehavior>,
    pub message_type: Option<MessageId>,
    pub enum_type: Option<EnumId>,
    pub group: Option<OneOfId>,
    pub parent: Option<MessageId>,
    pub codec: CodecSlot,
}

impl Field {
    pub fn is_string(&self) -> bool {
        self.typez == Typez::String
    }

    pub fn is_bytes(&self) -> bool {
        self.typez == Typez::Bytes
    }

    pub fn is_bool(&self) -> bool {
        self.typez == Typez::Bool
    }

    pub fn is_like_int(&self) -> bool {
        matches!(
            self.typez,
            Typez::Int32
                | Typez::Int64
                | Typez::Uint32
                | Typez::Uint64
                | Typez::Sint32
                | Typez::Sint64
                | Typez::Fixed32
                | Typez::Fixed64
                | Typez::Sfixed32
                | Typez::Sfixed64
        )
    }

    pub fn is_like_float(&self) -> bool {
        matches!(self.typez, Typez::Float | Typez::Double)
    }

    pub fn is_enum(&self) -> bool {
        self.typez == Typez::Enum
    }

    pub fn is_object(&self) -> bool {
        self.typez == Typez::Message
    }

    /// Singular, non-optional, non-oneof field.
    pub fn is_singular(&self) -> bool {
        !self.repeated && !self.optional && !self.map && !self.is_one_of
    }
}

/// A group of mutually exclusive fields.
#[derive(Debug, Clone, Default)]
pub struct OneOf {
    pub name: String,
    pub id: String,
    pub documentation: String,
    pub fields: Vec<FieldId>,
    pub parent: Option<MessageId>,
    pub codec: CodecSlot,
}

#[derive(Debug, Clone, Default)]
pub struct Enum {
    pub name: String,
    pub id: String,
    pub package: String,
    pub documentation: String,
    pub parent: Option<MessageId>,
    /// Every declared value, including aliases.
    pub values: Vec<EnumValueId>,
    /// First value declared for each distinct number, in declaration order.
    pub unique_number_values: Vec<EnumValueId>,
    pub deprecated: bool,
    pub codec: CodecSlot,
}

#[derive(Debug, Clone, Default)]
pub struct EnumValue {
    pub name: String,
    pub id: String,
    pub number: i32,
    pub documentation: String,
    pub deprecated: bool,
    pub parent: Option<EnumId>,
    pub codec: CodecSlot,
}

#[derive(Debug, Clone, Default)]
pub struct Service {
    pub name: String,
    pub id: String,
    pub package: String,
    pub documentation: String,
    /// Host name without scheme, e.g. `secretmanager.googleapis.com`.
    pub default_host: String,
    pub methods: Vec<MethodId>,
    pub deprecated: bool,
    pub codec: CodecSlot,
}

#[derive(Debug, Clone, Default)]
pub struct Method {
    pub name: String,
    pub id: String,
    pub documentation: String,
    pub input_type_id: String,
    pub output_type_id: String,
    pub input_type: Option<MessageId>,
    pub output_type: Option<MessageId>,
    pub path_info: PathInfo,
    /// The request's page token field, set by the pagination pass.
    pub pagination: Option<FieldId>,
    pub routing: Vec<RoutingInfo>,
    pub operation_info: Option<OperationInfo>,
    pub discovery_lro: Option<DiscoveryLro>,
    pub returns_empty: bool,
    pub client_side_streaming: bool,
    pub server_side_streaming: bool,
    pub deprecated: bool,
    /// Request fields the client library fills in when left empty.
    pub auto_populated: Vec<FieldId>,
    pub service: Option<ServiceId>,
    /// For mixin methods, the ID of the service that declares them.
    pub source_service_id: String,
    pub source_service: Option<ServiceId>,
    pub codec: CodecSlot,
}

/// HTTP bindings of a method.
#[derive(Debug, Clone, Default)]
pub struct PathInfo {
    pub bindings: Vec<PathBinding>,
    /// `*` for the whole request, a field name, or empty for no body.
    pub body_field_path: String,
    pub codec: CodecSlot,
}

/// One HTTP verb and path template a method can be called with.
#[derive(Debug, Clone, Default)]
pub struct PathBinding {
    pub verb: String,
    pub path_template: PathTemplate,
    /// Names of request fields sent as query parameters.
    pub query_parameters: BTreeSet<String>,
    pub codec: CodecSlot,
}

/// Long-running operation metadata declared by protobuf methods.
#[derive(Debug, Clone, Default)]
pub struct OperationInfo {
    pub metadata_type_id: String,
    pub response_type_id: String,
    pub codec: CodecSlot,
}

/// Long-running operation polling data for Discovery methods.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryLro {
    /// Path variables of the poller prefix, in order.
    pub polling_path_parameters: Vec<String>,
    pub codec: CodecSlot,
}

/// Pagination fields of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationInfo {
    pub next_page_token: FieldId,
    pub pageable_item: FieldId,
}

macro_rules! arena_index {
    ($handle:ident, $node:ident, $arena:ident) => {
        impl Index<$handle> for State {
            type Output = $node;

            fn index(&self, id: $handle) -> &$node {
                &self.$arena[id.0]
            }
        }

        impl IndexMut<$handle> for State {
            fn index_mut(&mut self, id: $handle) -> &mut $node {
                &mut self.$arena[id.0]
            }
        }
    };
}

arena_index!(MessageId, Message, messages);
arena_index!(FieldId, Field, fields);
arena_index!(OneOfId, OneOf, one_ofs);
arena_index!(EnumId, Enum, enums);
arena_index!(EnumValueId, EnumValue, enum_values);
arena_index!(ServiceId, Service, services);
arena_index!(MethodId, Method, methods);

impl State {
    pub fn message_ids(&self) -> impl Iterator<Item = MessageId> {
        (0..self.messages.len()).map(MessageId)
    }

    pub fn field_ids(&self) -> impl Iterator<Item = FieldId> {
        (0..self.fields.len()).map(FieldId)
    }

    pub fn one_of_ids(&self) -> impl Iterator<Item = OneOfId> {
        (0..self.one_ofs.len()).map(OneOfId)
    }

    pub fn enum_ids(&self) -> impl Iterator<Item = EnumId> {
        (0..self.enums.len()).map(EnumId)
    }

    pub fn enum_value_ids(&self) -> impl Iterator<Item = EnumValueId> {
        (0..self.enum_values.len()).map(EnumValueId)
    }

    pub fn service_ids(&self) -> impl Iterator<Item = ServiceId> {
        (0..self.services.len()).map(ServiceId)
    }

    pub fn method_ids(&self) -> impl Iterator<Item = MethodId> {
        (0..self.methods.len()).map(MethodId)
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.message_by_id.get(id).map(|m| &self[*m])
    }

    pub fn enumeration(&self, id: &str) -> Option<&Enum> {
        self.enum_by_id.get(id).map(|e| &self[*e])
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.service_by_id.get(id).map(|s| &self[*s])
    }

    pub fn method(&self, id: &str) -> Option<&Method> {
        self.method_by_id.get(id).map(|m| &self[*m])
    }

    /// Finds a field of `message` by its (unqualified) name.
    pub fn field_named(&self, message: MessageId, name: &str) -> Option<FieldId> {
        self[message]
            .fields
            .iter()
            .copied()
            .find(|f| self[*f].name == name)
    }

    /// Fails if two messages, enums, services or methods share an ID.
    ///
    /// The `*_by_id` maps keep only the last node added for an ID, so a
    /// duplicate leaves an earlier node unreachable by ID.
    pub fn check_unique_ids(&self) -> Result<()> {
        fn check<'a, H: Copy + PartialEq + 'a>(
            kind: &str,
            nodes: impl Iterator<Item = (H, &'a str)>,
            index: &HashMap<String, H>,
        ) -> Result<()> {
            for (handle, id) in nodes {
                if index.get(id) != Some(&handle) {
                    return Err(GeneratorError::Parse(format!("duplicate {kind} id {id}")));
                }
            }
            Ok(())
        }
        check(
            "message",
            self.message_ids().zip(self.messages.iter().map(|m| m.id.as_str())),
            &self.message_by_id,
        )?;
        check(
            "enum",
            self.enum_ids().zip(self.enums.iter().map(|e| e.id.as_str())),
            &self.enum_by_id,
        )?;
        check(
            "service",
            self.service_ids().zip(self.services.iter().map(|s| s.id.as_str())),
            &self.service_by_id,
        )?;
        check(
            "method",
            self.method_ids().zip(self.methods.iter().map(|m| m.id.as_str())),
            &self.method_by_id,
        )
    }

    /// Returns the cached `$map<K, V>` helper for `id`, if one exists.
    pub fn map_type(&self, id: &str) -> Option<MessageId> {
        self.map_types.get(id).copied()
    }

    fn insert_message(&mut self, message: Message) -> MessageId {
        let id = MessageId(self.messages.len());
        self.message_by_id.insert(message.id.clone(), id);
        if message.is_map {
            self.map_types.insert(message.id.clone(), id);
        }
        self.messages.push(message);
        id
    }

    fn insert_enum(&mut self, enumeration: Enum) -> EnumId {
        let id = EnumId(self.enums.len());
        self.enum_by_id.insert(enumeration.id.clone(), id);
        self.enums.push(enumeration);
        id
    }
}

impl API {
    pub fn new(name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_name: package_name.into(),
            ..Default::default()
        }
    }

    /// Adds a message to the index and to its parent (or the top-level list).
    pub fn add_message(&mut self, message: Message) -> MessageId {
        let parent = message.parent;
        let id = self.state.insert_message(message);
        match parent {
            Some(p) => self.state[p].messages.push(id),
            None => self.messages.push(id),
        }
        id
    }

    /// Adds a message to the ID index only.
    ///
    /// Used for well-known types and map helpers, which are referenced by
    /// fields but never generated as part of this API.
    pub fn add_indexed_message(&mut self, message: Message) -> MessageId {
        self.state.insert_message(message)
    }

    /// Appends a field to `message`.
    pub fn add_field(&mut self, message: MessageId, mut field: Field) -> FieldId {
        field.parent = Some(message);
        let id = FieldId(self.state.fields.len());
        self.state.fields.push(field);
        self.state[message].fields.push(id);
        id
    }

    /// Appends a one-of group to `message`; its fields must already be added.
    pub fn add_one_of(&mut self, message: MessageId, mut one_of: OneOf) -> OneOfId {
        one_of.parent = Some(message);
        let id = OneOfId(self.state.one_ofs.len());
        self.state.one_ofs.push(one_of);
        self.state[message].one_ofs.push(id);
        id
    }

    /// Adds an enum to the index and to its parent (or the top-level list).
    pub fn add_enum(&mut self, enumeration: Enum) -> EnumId {
        let parent = enumeration.parent;
        let id = self.state.insert_enum(enumeration);
        match parent {
            Some(p) => self.state[p].enums.push(id),
            None => self.enums.push(id),
        }
        id
    }

    /// Adds an enum to the ID index only.
    pub fn add_indexed_enum(&mut self, enumeration: Enum) -> EnumId {
        self.state.insert_enum(enumeration)
    }

    /// Appends a value to `enumeration`, keeping the unique-number list current.
    pub fn add_enum_value(&mut self, enumeration: EnumId, mut value: EnumValue) -> EnumValueId {
        value.parent = Some(enumeration);
        let number = value.number;
        let id = EnumValueId(self.state.enum_values.len());
        self.state.enum_values.push(value);
        let duplicate = self.state[enumeration]
            .unique_number_values
            .iter()
            .any(|v| self.state[*v].number == number);
        let e = &mut self.state[enumeration];
        e.values.push(id);
        if !duplicate {
            e.unique_number_values.push(id);
        }
        id
    }

    pub fn add_service(&mut self, service: Service) -> ServiceId {
        let id = self.add_indexed_service(service);
        self.services.push(id);
        id
    }

    /// Adds a service to the ID index only, as done for mixin services.
    pub fn add_indexed_service(&mut self, service: Service) -> ServiceId {
        let id = ServiceId(self.state.services.len());
        self.state.service_by_id.insert(service.id.clone(), id);
        self.state.services.push(service);
        id
    }

    /// Appends a method to `service` and indexes it.
    pub fn add_method(&mut self, service: ServiceId, method: Method) -> MethodId {
        let id = MethodId(self.state.methods.len());
        self.state.method_by_id.insert(method.id.clone(), id);
        self.state.methods.push(method);
        self.state[service].methods.push(id);
        id
    }

    /// Iterates every message reachable from the top-level list, depth first.
    pub fn all_messages(&self) -> Vec<MessageId> {
        let mut out = Vec::new();
        let mut stack: Vec<MessageId> = self.messages.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.state[id].messages.iter().rev().copied());
        }
        out
    }

    /// Iterates every enum reachable from the top-level lists.
    pub fn all_enums(&self) -> Vec<EnumId> {
        let mut out = self.enums.clone();
        for m in self.all_messages() {
            out.extend(self.state[m].enums.iter().copied());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(typez: Typez) -> Field {
        Field {
            typez,
            ..Default::default()
        }
    }

    #[test]
    fn test_field_type_predicates() {
        assert!(field(Typez::String).is_string());
        assert!(field(Typez::Bytes).is_bytes());
        assert!(field(Typez::Bool).is_bool());
        for t in [
            Typez::Int32,
            Typez::Int64,
            Typez::Uint32,
            Typez::Uint64,
            Typez::Sint32,
            Typez::Sint64,
            Typez::Fixed32,
            Typez::Fixed64,
            Typez::Sfixed32,
            Typez::Sfixed64,
        ] {
            let f = field(t);
            assert!(f.is_like_int(), "{t:?}");
            assert!(!f.is_like_float() && !f.is_string() && !f.is_object(), "{t:?}");
        }
        assert!(field(Typez::Float).is_like_float());
        assert!(field(Typez::Double).is_like_float());
        assert!(field(Typez::Enum).is_enum());
        assert!(field(Typez::Message).is_object());
        assert!(!field(Typez::Message).is_like_int());
    }

    #[test]
    fn test_add_message_keeps_index_in_sync() {
        let mut model = API::new("test", "test");
        let parent = model.add_message(Message {
            name: "Parent".to_string(),
            id: ".test.Parent".to_string(),
            ..Default::default()
        });
        let child = model.add_message(Message {
            name: "Child".to_string(),
            id: ".test.Parent.Child".to_string(),
            parent: Some(parent),
            ..Default::default()
        });
        let helper = model.add_indexed_message(Message {
            name: "$map<string, string>".to_string(),
            id: "$map<string, string>".to_string(),
            is_map: true,
            ..Default::default()
        });

        assert_eq!(model.messages, vec![parent]);
        assert_eq!(model.state[parent].messages, vec![child]);
        assert_eq!(model.state.message_by_id[".test.Parent.Child"], child);
        assert_eq!(model.state.map_type("$map<string, string>"), Some(helper));
        assert_eq!(model.all_messages(), vec![parent, child]);
    }

    #[test]
    fn test_duplicate_ids() {
        let mut model = API::new("test", "test");
        let service = model.add_service(Service {
            name: "Service".to_string(),
            id: ".test.Service".to_string(),
            ..Default::default()
        });
        // Messages and services are separate ID namespaces.
        model.add_message(Message {
            name: "Service".to_string(),
            id: ".test.Service".to_string(),
            ..Default::default()
        });
        assert!(model.state.check_unique_ids().is_ok());

        let mut messages = model.clone();
        messages.add_message(Message {
            name: "Other".to_string(),
            id: ".test.Service".to_string(),
            ..Default::default()
        });
        let err = messages.state.check_unique_ids().unwrap_err();
        assert!(matches!(err, GeneratorError::Parse(_)), "{err:?}");
        assert!(err.to_string().contains("duplicate message id .test.Service"), "{err}");

        let mut services = model.clone();
        services.add_indexed_service(Service {
            name: "Service".to_string(),
            id: ".test.Service".to_string(),
            ..Default::default()
        });
        let err = services.state.check_unique_ids().unwrap_err();
        assert!(err.to_string().contains("duplicate service id"), "{err}");

        let mut methods = model.clone();
        for _ in 0..2 {
            methods.add_method(
                service,
                Method {
                    name: "get".to_string(),
                    id: ".test.Service.get".to_string(),
                    ..Default::default()
                },
            );
        }
        let err = methods.state.check_unique_ids().unwrap_err();
        assert!(matches!(err, GeneratorError::Parse(_)), "{err:?}");
        assert!(err.to_string().contains("duplicate method id .test.Service.get"), "{err}");

        let mut enums = model.clone();
        for _ in 0..2 {
            enums.add_enum(Enum {
                name: "State".to_string(),
                id: ".test.State".to_string(),
                ..Default::default()
            });
        }
        assert!(enums.state.check_unique_ids().is_err());
    }

    #[test]
    fn test_enum_unique_values_keep_first() {
        let mut model = API::new("test", "test");
        let e = model.add_enum(Enum {
            name: "Color".to_string(),
            id: ".test.Color".to_string(),
            ..Default::default()
        });
        let mut ids = Vec::new();
        for (name, number) in [("RED", 0), ("CRIMSON", 0), ("GREEN", 1), ("SCARLET", 0)] {
            ids.push(model.add_enum_value(
                e,
                EnumValue {
                    name: name.to_string(),
                    number,
                    ..Default::default()
                },
            ));
        }

        let color = &model.state[e];
        assert_eq!(color.values, ids);
        assert_eq!(color.unique_number_values, vec![ids[0], ids[2]]);
    }

    #[test]
    fn test_codec_slot() {
        let mut slot = CodecSlot::default();
        assert!(!slot.is_set());
        assert!(slot.get::<String>().is_none());
        slot.set("annotation".to_string());
        assert_eq!(slot.get::<String>().map(String::as_str), Some("annotation"));
        assert!(slot.get::<u32>().is_none());
        let copy = slot.clone();
        assert!(copy.is_set());
    }
}
