//! Cross-reference pass
//!
//! Parsers record type references as ID strings. This pass resolves them
//! into arena handles and fills in the back-references (field parents,
//! one-of groups, method services) that later passes rely on.

use crate::model::{MessageId, Typez, API};
use crate::{GeneratorError, Result};
use std::collections::HashSet;

/// Resolves every type reference in `model`.
///
/// Fails on duplicate IDs and on the first field or method that references
/// an unknown ID.
pub fn cross_reference(model: &mut API) -> Result<()> {
    model.state.check_unique_ids()?;
    tracing::debug!(
        model = %model.name,
        messages = model.messages.len(),
        services = model.services.len(),
        "cross-referencing"
    );
    let state = &mut model.state;

    for message in state.message_ids().collect::<Vec<_>>() {
        for field in state[message].fields.clone() {
            state[field].parent = Some(message);
        }
        for group in state[message].one_ofs.clone() {
            state[group].parent = Some(message);
            for field in state[group].fields.clone() {
                state[field].group = Some(group);
                state[field].parent = Some(message);
            }
        }
    }

    for field in state.field_ids().collect::<Vec<_>>() {
        let f = &state[field];
        match f.typez {
            Typez::Message => {
                let target = state.message_by_id.get(&f.typez_id).copied().ok_or_else(|| {
                    GeneratorError::Reference(format!(
                        "cannot find message type {} for field {}",
                        f.typez_id, f.id
                    ))
                })?;
                state[field].message_type = Some(target);
            }
            Typez::Enum => {
                let target = state.enum_by_id.get(&f.typez_id).copied().ok_or_else(|| {
                    GeneratorError::Reference(format!(
                        "cannot find enum type {} for field {}",
                        f.typez_id, f.id
                    ))
                })?;
                state[field].enum_type = Some(target);
            }
            _ => {}
        }
    }

    for service in state.service_ids().collect::<Vec<_>>() {
        for method in state[service].methods.clone() {
            let m = &state[method];
            let lookup = |id: &str, what: &str| {
                state.message_by_id.get(id).copied().ok_or_else(|| {
                    GeneratorError::Reference(format!(
                        "cannot find {what} type {id} for method {}",
                        m.id
                    ))
                })
            };
            let input = lookup(&m.input_type_id, "input")?;
            let output = lookup(&m.output_type_id, "output")?;
            let source = if m.source_service_id.is_empty() {
                None
            } else {
                Some(
                    state
                        .service_by_id
                        .get(&m.source_service_id)
                        .copied()
                        .ok_or_else(|| {
                            GeneratorError::Reference(format!(
                                "cannot find source service {} for method {}",
                                m.source_service_id, m.id
                            ))
                        })?,
                )
            };
            let m = &mut state[method];
            m.input_type = Some(input);
            m.output_type = Some(output);
            m.source_service = source;
            m.service = Some(service);
        }
    }
    Ok(())
}

/// Marks fields whose type (transitively) contains their parent message.
///
/// Code generators need this to box such fields.
pub fn label_recursive_fields(model: &mut API) {
    let state = &model.state;
    let mut recursive = Vec::new();
    for message in state.message_ids() {
        for field in &state[message].fields {
            let f = &state[*field];
            let mut visited = HashSet::from([message]);
            let value = references(model, &f.typez_id, f.typez, message, &mut visited);
            recursive.push((*field, value));
        }
    }
    for (field, value) in recursive {
        model.state[field].recursive = value;
    }
}

fn references(
    model: &API,
    typez_id: &str,
    typez: Typez,
    target: MessageId,
    visited: &mut HashSet<MessageId>,
) -> bool {
    if typez != Typez::Message {
        return false;
    }
    let Some(id) = model.state.message_by_id.get(typez_id).copied() else {
        return false;
    };
    if id == target {
        return true;
    }
    if !visited.insert(id) {
        return false;
    }
    model.state[id].fields.iter().any(|f| {
        let field = &model.state[*f];
        references(model, &field.typez_id, field.typez, target, visited)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Enum, Field, Message, Method, OneOf, Service};

    fn message(model: &mut API, name: &str) -> MessageId {
        model.add_message(Message {
            name: name.to_string(),
            id: format!(".test.{name}"),
            package: "test".to_string(),
            ..Default::default()
        })
    }

    fn field(name: &str, typez: Typez, typez_id: &str) -> Field {
        Field {
            name: name.to_string(),
            json_name: name.to_string(),
            id: format!(".test.Message.{name}"),
            typez,
            typez_id: typez_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cross_reference_duplicate_message() {
        let mut model = API::new("test", "test");
        message(&mut model, "Thing");
        message(&mut model, "Thing");
        let err = cross_reference(&mut model).unwrap_err();
        assert!(matches!(err, GeneratorError::Parse(_)), "{err:?}");
        assert!(err.to_string().contains(".test.Thing"), "{err}");
    }

    #[test]
    fn test_cross_reference_one_ofs() {
        let mut model = API::new("test", "test");
        let message1 = message(&mut model, "Message1");
        let mut fields = Vec::new();
        for i in 0..4 {
            let mut f = field(&format!("field{i}"), Typez::String, "string");
            f.is_one_of = true;
            fields.push(model.add_field(message1, f));
        }
        let basic = model.add_field(message1, field("basic_field", Typez::String, "string"));
        let group0 = model.add_one_of(
            message1,
            OneOf {
                name: "group0".to_string(),
                fields: vec![fields[0], fields[1]],
                ..Default::default()
            },
        );
        let group1 = model.add_one_of(
            message1,
            OneOf {
                name: "group1".to_string(),
                fields: vec![fields[2], fields[3]],
                ..Default::default()
            },
        );

        cross_reference(&mut model).unwrap();

        assert_eq!(model.state[fields[0]].group, Some(group0));
        assert_eq!(model.state[fields[1]].group, Some(group0));
        assert_eq!(model.state[fields[2]].group, Some(group1));
        assert_eq!(model.state[fields[3]].group, Some(group1));
        assert_eq!(model.state[basic].group, None);
        for f in fields.iter().chain([&basic]) {
            assert_eq!(model.state[*f].parent, Some(message1));
        }
        assert_eq!(model.state[group0].parent, Some(message1));
    }

    #[test]
    fn test_cross_reference_fields() {
        let mut model = API::new("test", "test");
        let message_t = message(&mut model, "MessageT");
        let enum_t = model.add_enum(Enum {
            name: "EnumT".to_string(),
            id: ".test.EnumT".to_string(),
            ..Default::default()
        });
        let parent = message(&mut model, "Message");
        let field_m = model.add_field(
            parent,
            field("message_field", Typez::Message, ".test.MessageT"),
        );
        let field_e = model.add_field(parent, field("enum_field", Typez::Enum, ".test.EnumT"));

        cross_reference(&mut model).unwrap();

        assert_eq!(model.state[field_m].message_type, Some(message_t));
        assert_eq!(model.state[field_e].enum_type, Some(enum_t));
        assert_eq!(model.state[field_m].parent, Some(parent));
        assert_eq!(model.state[field_e].parent, Some(parent));
    }

    #[test]
    fn test_cross_reference_missing_type() {
        let mut model = API::new("test", "test");
        let parent = message(&mut model, "Message");
        model.add_field(parent, field("bad", Typez::Message, ".test.Missing"));
        let err = cross_reference(&mut model).unwrap_err();
        assert!(err.to_string().contains(".test.Missing"), "{err}");

        let mut model = API::new("test", "test");
        let parent = message(&mut model, "Message");
        model.add_field(parent, field("bad", Typez::Enum, ".test.MissingEnum"));
        assert!(cross_reference(&mut model).is_err());
    }

    #[test]
    fn test_cross_reference_method() {
        let mut model = API::new("test", "test");
        let request = message(&mut model, "Request");
        let response = message(&mut model, "Response");
        let service = model.add_service(Service {
            name: "Service".to_string(),
            id: ".test.Service".to_string(),
            ..Default::default()
        });
        let mixin = model.add_indexed_service(Service {
            name: "Operations".to_string(),
            id: ".google.longrunning.Operations".to_string(),
            ..Default::default()
        });
        let method = model.add_method(
            service,
            Method {
                name: "GetResource".to_string(),
                id: ".test.Service.GetResource".to_string(),
                input_type_id: ".test.Request".to_string(),
                output_type_id: ".test.Response".to_string(),
                ..Default::default()
            },
        );
        let mixin_method = model.add_method(
            service,
            Method {
                name: "GetOperation".to_string(),
                id: ".test.Service.GetOperation".to_string(),
                source_service_id: ".google.longrunning.Operations".to_string(),
                input_type_id: ".test.Request".to_string(),
                output_type_id: ".test.Response".to_string(),
                ..Default::default()
            },
        );

        cross_reference(&mut model).unwrap();

        let m = &model.state[method];
        assert_eq!(m.input_type, Some(request));
        assert_eq!(m.output_type, Some(response));
        assert_eq!(m.service, Some(service));
        assert_eq!(m.source_service, None);
        let m = &model.state[mixin_method];
        assert_eq!(m.service, Some(service));
        assert_eq!(m.source_service, Some(mixin));
    }

    #[test]
    fn test_cross_reference_method_missing_output() {
        let mut model = API::new("test", "test");
        message(&mut model, "Request");
        let service = model.add_service(Service {
            name: "Service".to_string(),
            id: ".test.Service".to_string(),
            ..Default::default()
        });
        model.add_method(
            service,
            Method {
                name: "Get".to_string(),
                id: ".test.Service.Get".to_string(),
                input_type_id: ".test.Request".to_string(),
                output_type_id: ".test.Missing".to_string(),
                ..Default::default()
            },
        );
        let err = cross_reference(&mut model).unwrap_err();
        assert!(err.to_string().contains("output type .test.Missing"), "{err}");
    }

    #[test]
    fn test_label_recursive_fields() {
        let mut model = API::new("test", "test");
        let parent = message(&mut model, "Parent");
        let child = message(&mut model, "Child");
        let leaf = message(&mut model, "Leaf");
        let to_child = model.add_field(parent, field("child", Typez::Message, ".test.Child"));
        let to_leaf = model.add_field(parent, field("leaf", Typez::Message, ".test.Leaf"));
        let name = model.add_field(parent, field("name", Typez::String, "string"));
        let back = model.add_field(child, field("parent", Typez::Message, ".test.Parent"));
        let selfref = model.add_field(leaf, field("next", Typez::Message, ".test.Leaf"));

        label_recursive_fields(&mut model);

        assert!(model.state[to_child].recursive);
        assert!(!model.state[to_leaf].recursive);
        assert!(!model.state[name].recursive);
        assert!(model.state[back].recursive);
        assert!(model.state[selfref].recursive);
    }
}
