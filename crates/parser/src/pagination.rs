//! List-method pagination detection
//!
//! Marks the methods that follow the [AIP-4233] conventions: the request has
//! a page size and a page token, and the response has a next page token and
//! one field holding the page items.
//!
//! [AIP-4233]: https://google.aip.dev/client-libraries/4233

use sdkgen_common::config::PaginationOverride;
use sdkgen_common::{FieldId, MessageId, PaginationInfo, Typez, API};

const PAGE_SIZE: &str = "pageSize";
const MAX_RESULTS: &str = "maxResults";
const PAGE_TOKEN: &str = "pageToken";
const NEXT_PAGE_TOKEN: &str = "nextPageToken";

/// Marks every method of `model` that conforms to AIP-4233 as pageable.
///
/// `overrides` name the page item field for methods where the default
/// choice (first repeated message field, else first map field) is wrong.
/// Methods that only partially conform are left alone.
pub fn update_method_pagination(overrides: &[PaginationOverride], model: &mut API) {
    for method in model.state.method_ids().collect::<Vec<_>>() {
        let m = &model.state[method];
        let Some(request) = model.state.message_by_id.get(&m.input_type_id).copied() else {
            continue;
        };
        let Some(page_token) = request_page_token(model, request) else {
            continue;
        };
        let Some(response) = model.state.message_by_id.get(&m.output_type_id).copied() else {
            continue;
        };
        let Some(info) = response_info(model, overrides, &m.id, response) else {
            continue;
        };
        tracing::debug!(method = %m.id, "pageable method");
        model.state[method].pagination = Some(page_token);
        model.state[response].pagination = Some(info);
    }
}

fn request_page_token(model: &API, request: MessageId) -> Option<FieldId> {
    let fields = &model.state[request].fields;
    // Some services (e.g. sqladmin.googleapis.com) predate AIP-4233 and use
    // `maxResults` for the page size.
    let has_size = fields.iter().any(|f| {
        let field = &model.state[*f];
        match field.json_name.as_str() {
            PAGE_SIZE => is_page_size_type(field.typez),
            MAX_RESULTS => {
                is_page_size_type(field.typez)
                    || (field.typez == Typez::Message
                        && matches!(
                            field.typez_id.as_str(),
                            ".google.protobuf.Int32Value" | ".google.protobuf.UInt32Value"
                        ))
            }
            _ => false,
        }
    });
    if !has_size {
        return None;
    }
    string_field(model, request, PAGE_TOKEN)
}

fn is_page_size_type(typez: Typez) -> bool {
    matches!(typez, Typez::Int32 | Typez::Uint32)
}

fn response_info(
    model: &API,
    overrides: &[PaginationOverride],
    method_id: &str,
    response: MessageId,
) -> Option<PaginationInfo> {
    let pageable_item = response_item(model, overrides, method_id, response)?;
    let next_page_token = string_field(model, response, NEXT_PAGE_TOKEN)?;
    Some(PaginationInfo {
        next_page_token,
        pageable_item,
    })
}

fn response_item(
    model: &API,
    overrides: &[PaginationOverride],
    method_id: &str,
    response: MessageId,
) -> Option<FieldId> {
    if let Some(o) = overrides.iter().find(|o| o.id == method_id) {
        return model.state.field_named(response, &o.item_field);
    }
    let fields = &model.state[response].fields;
    fields
        .iter()
        .copied()
        .find(|f| model.state[*f].repeated && model.state[*f].typez == Typez::Message)
        .or_else(|| fields.iter().copied().find(|f| model.state[*f].map))
}

fn string_field(model: &API, message: MessageId, json_name: &str) -> Option<FieldId> {
    model.state[message].fields.iter().copied().find(|f| {
        let field = &model.state[*f];
        field.json_name == json_name && field.typez == Typez::String
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgen_common::{Field, Message, Method, MethodId, Service};

    struct Fixture {
        model: API,
        method: MethodId,
        request: MessageId,
        response: MessageId,
    }

    fn field(name: &str, typez: Typez) -> Field {
        Field {
            name: name.to_string(),
            json_name: name.to_string(),
            typez,
            ..Default::default()
        }
    }

    fn repeated_message(name: &str) -> Field {
        Field {
            typez_id: ".package.Resource".to_string(),
            repeated: true,
            ..field(name, Typez::Message)
        }
    }

    fn map_field(name: &str) -> Field {
        Field {
            typez_id: "$map<string, .package.Resource>".to_string(),
            map: true,
            ..field(name, Typez::Message)
        }
    }

    fn fixture(request_fields: Vec<Field>, response_fields: Vec<Field>) -> Fixture {
        let mut model = API::new("test", "package");
        let request = model.add_message(Message {
            name: "Request".to_string(),
            id: ".package.Request".to_string(),
            ..Default::default()
        });
        for f in request_fields {
            model.add_field(request, f);
        }
        let response = model.add_message(Message {
            name: "Response".to_string(),
            id: ".package.Response".to_string(),
            ..Default::default()
        });
        for f in response_fields {
            model.add_field(response, f);
        }
        let service = model.add_service(Service {
            name: "Service".to_string(),
            id: ".package.Service".to_string(),
            ..Default::default()
        });
        let method = model.add_method(
            service,
            Method {
                name: "List".to_string(),
                id: ".package.Service.List".to_string(),
                input_type_id: ".package.Request".to_string(),
                output_type_id: ".package.Response".to_string(),
                ..Default::default()
            },
        );
        Fixture {
            model,
            method,
            request,
            response,
        }
    }

    fn simple_request() -> Vec<Field> {
        vec![
            field("parent", Typez::String),
            field("pageToken", Typez::String),
            field("pageSize", Typez::Int32),
        ]
    }

    fn simple_response() -> Vec<Field> {
        vec![field("nextPageToken", Typez::String), repeated_message("items")]
    }

    #[test]
    fn test_page_simple() {
        let mut f = fixture(simple_request(), simple_response());
        update_method_pagination(&[], &mut f.model);

        let token = f.model.state.field_named(f.request, "pageToken");
        assert_eq!(f.model.state[f.method].pagination, token);
        assert_eq!(
            f.model.state[f.response].pagination,
            Some(PaginationInfo {
                next_page_token: f.model.state.field_named(f.response, "nextPageToken").unwrap(),
                pageable_item: f.model.state.field_named(f.response, "items").unwrap(),
            })
        );
    }

    #[test]
    fn test_page_with_override() {
        let mut response = simple_response();
        response.push(repeated_message("otherItems"));
        let mut f = fixture(simple_request(), response);
        let overrides = vec![PaginationOverride {
            id: ".package.Service.List".to_string(),
            item_field: "otherItems".to_string(),
        }];
        update_method_pagination(&overrides, &mut f.model);

        let info = f.model.state[f.response].pagination.unwrap();
        assert_eq!(f.model.state[info.pageable_item].name, "otherItems");
    }

    #[test]
    fn test_page_with_missing_override_field() {
        let mut f = fixture(simple_request(), simple_response());
        let overrides = vec![PaginationOverride {
            id: ".package.Service.List".to_string(),
            item_field: "missing".to_string(),
        }];
        update_method_pagination(&overrides, &mut f.model);

        assert!(f.model.state[f.method].pagination.is_none());
        assert!(f.model.state[f.response].pagination.is_none());
    }

    #[test]
    fn test_page_max_results() {
        for size in [
            field("maxResults", Typez::Int32),
            field("maxResults", Typez::Uint32),
            Field {
                typez_id: ".google.protobuf.UInt32Value".to_string(),
                ..field("maxResults", Typez::Message)
            },
            Field {
                typez_id: ".google.protobuf.Int32Value".to_string(),
                ..field("maxResults", Typez::Message)
            },
        ] {
            let mut f = fixture(vec![size, field("pageToken", Typez::String)], simple_response());
            update_method_pagination(&[], &mut f.model);
            assert!(f.model.state[f.method].pagination.is_some());
        }
    }

    #[test]
    fn test_page_bad_request() {
        for request in [
            vec![field("pageToken", Typez::String)],
            vec![field("pageSize", Typez::Int32)],
            vec![field("pageSize", Typez::Int64), field("pageToken", Typez::String)],
            vec![field("pageSize", Typez::Int32), field("pageToken", Typez::Bytes)],
            vec![
                Field {
                    typez_id: ".google.protobuf.Int32Value".to_string(),
                    ..field("pageSize", Typez::Message)
                },
                field("pageToken", Typez::String),
            ],
        ] {
            let mut f = fixture(request, simple_response());
            update_method_pagination(&[], &mut f.model);
            assert!(f.model.state[f.method].pagination.is_none());
            assert!(f.model.state[f.response].pagination.is_none());
        }
    }

    #[test]
    fn test_page_bad_response() {
        for response in [
            vec![repeated_message("items")],
            vec![field("nextPageToken", Typez::String)],
            vec![field("nextPageToken", Typez::Int32), repeated_message("items")],
            vec![
                field("nextPageToken", Typez::String),
                Field {
                    repeated: true,
                    ..field("names", Typez::String)
                },
            ],
        ] {
            let mut f = fixture(simple_request(), response);
            update_method_pagination(&[], &mut f.model);
            assert!(f.model.state[f.method].pagination.is_none());
        }
    }

    #[test]
    fn test_page_repeated_wins_over_map() {
        let response = vec![
            field("nextPageToken", Typez::String),
            map_field("byName"),
            repeated_message("items"),
            repeated_message("moreItems"),
        ];
        let mut f = fixture(simple_request(), response);
        update_method_pagination(&[], &mut f.model);

        let info = f.model.state[f.response].pagination.unwrap();
        assert_eq!(f.model.state[info.pageable_item].name, "items");
    }

    #[test]
    fn test_page_map_items() {
        let response = vec![
            field("nextPageToken", Typez::String),
            map_field("byName"),
            map_field("byId"),
        ];
        let mut f = fixture(simple_request(), response);
        update_method_pagination(&[], &mut f.model);

        let info = f.model.state[f.response].pagination.unwrap();
        assert_eq!(f.model.state[info.pageable_item].name, "byName");
    }

    #[test]
    fn test_page_missing_messages() {
        let mut f = fixture(simple_request(), simple_response());
        let service = f.model.services[0];
        let orphan = f.model.add_method(
            service,
            Method {
                name: "Orphan".to_string(),
                id: ".package.Service.Orphan".to_string(),
                input_type_id: ".package.Missing".to_string(),
                output_type_id: ".package.Response".to_string(),
                ..Default::default()
            },
        );
        let no_output = f.model.add_method(
            service,
            Method {
                name: "NoOutput".to_string(),
                id: ".package.Service.NoOutput".to_string(),
                input_type_id: ".package.Request".to_string(),
                output_type_id: ".package.Missing".to_string(),
                ..Default::default()
            },
        );
        update_method_pagination(&[], &mut f.model);

        assert!(f.model.state[orphan].pagination.is_none());
        assert!(f.model.state[no_output].pagination.is_none());
        assert!(f.model.state[f.method].pagination.is_some());
    }
}
