//! Documentation overrides
//!
//! Some source documents carry comments that render badly, or not at all,
//! in generated code. The configuration can replace text in the
//! documentation of any element, addressed by its fully qualified ID.

use sdkgen_common::config::DocumentationOverride;
use sdkgen_common::{GeneratorError, Result, API};

/// Applies every override in `overrides` to `model`.
///
/// Fails if an override names an element that does not exist, or if the
/// element's documentation does not contain the `match` text.
pub fn apply_documentation_overrides(
    model: &mut API,
    overrides: &[DocumentationOverride],
) -> Result<()> {
    for o in overrides {
        let Some(documentation) = documentation_mut(model, &o.id) else {
            return Err(GeneratorError::Config(format!(
                "cannot find element {} for documentation override",
                o.id
            )));
        };
        if !documentation.contains(&o.matches) {
            return Err(GeneratorError::Config(format!(
                "cannot find matching text {:?} in the documentation of {}",
                o.matches, o.id
            )));
        }
        *documentation = documentation.replacen(&o.matches, &o.replace, 1);
    }
    Ok(())
}

fn documentation_mut<'a>(model: &'a mut API, id: &str) -> Option<&'a mut String> {
    let state = &mut model.state;
    if let Some(m) = state.message_by_id.get(id).copied() {
        return Some(&mut state[m].documentation);
    }
    if let Some(e) = state.enum_by_id.get(id).copied() {
        return Some(&mut state[e].documentation);
    }
    if let Some(s) = state.service_by_id.get(id).copied() {
        return Some(&mut state[s].documentation);
    }
    if let Some(m) = state.method_by_id.get(id).copied() {
        return Some(&mut state[m].documentation);
    }
    // Fields and enum values are not indexed by ID.
    if let Some(f) = state.field_ids().find(|f| state[*f].id == id) {
        return Some(&mut state[f].documentation);
    }
    if let Some(v) = state.enum_value_ids().find(|v| state[*v].id == id) {
        return Some(&mut state[v].documentation);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgen_common::{Enum, EnumValue, Field, Message, Method, Service};

    fn doc_override(id: &str, matches: &str, replace: &str) -> DocumentationOverride {
        DocumentationOverride {
            id: id.to_string(),
            matches: matches.to_string(),
            replace: replace.to_string(),
        }
    }

    fn model() -> API {
        let mut model = API::new("test", "test");
        let message = model.add_message(Message {
            name: "Secret".to_string(),
            id: ".test.Secret".to_string(),
            documentation: "A secret. See [link].".to_string(),
            ..Default::default()
        });
        model.add_field(
            message,
            Field {
                name: "name".to_string(),
                id: ".test.Secret.name".to_string(),
                documentation: "The name, in the form `projects/*`.".to_string(),
                ..Default::default()
            },
        );
        let e = model.add_enum(Enum {
            name: "State".to_string(),
            id: ".test.Secret.State".to_string(),
            parent: Some(message),
            documentation: "The state.".to_string(),
            ..Default::default()
        });
        model.add_enum_value(
            e,
            EnumValue {
                name: "ENABLED".to_string(),
                id: ".test.Secret.State.ENABLED".to_string(),
                documentation: "Enabled <b>now</b>.".to_string(),
                ..Default::default()
            },
        );
        let service = model.add_service(Service {
            name: "SecretService".to_string(),
            id: ".test.SecretService".to_string(),
            documentation: "Manages secrets.".to_string(),
            ..Default::default()
        });
        model.add_method(
            service,
            Method {
                name: "Get".to_string(),
                id: ".test.SecretService.Get".to_string(),
                documentation: "Gets a secret.".to_string(),
                ..Default::default()
            },
        );
        model
    }

    #[test]
    fn test_apply_overrides() {
        let mut model = model();
        let overrides = vec![
            doc_override(".test.Secret", "[link]", "the docs"),
            doc_override(".test.Secret.name", "`projects/*`", "`projects/{project}`"),
            doc_override(".test.Secret.State", "state", "secret state"),
            doc_override(".test.Secret.State.ENABLED", "<b>now</b>", "now"),
            doc_override(".test.SecretService", "Manages", "Stores"),
            doc_override(".test.SecretService.Get", "a secret", "one secret"),
        ];
        apply_documentation_overrides(&mut model, &overrides).unwrap();

        let state = &model.state;
        assert_eq!(state.message(".test.Secret").unwrap().documentation, "A secret. See the docs.");
        let secret = state.message_by_id[".test.Secret"];
        let name = state.field_named(secret, "name").unwrap();
        assert_eq!(state[name].documentation, "The name, in the form `projects/{project}`.");
        let e = state.enumeration(".test.Secret.State").unwrap();
        assert_eq!(e.documentation, "The secret state.");
        assert_eq!(state[e.values[0]].documentation, "Enabled now.");
        assert_eq!(state.service(".test.SecretService").unwrap().documentation, "Stores secrets.");
        assert_eq!(state.method(".test.SecretService.Get").unwrap().documentation, "Gets one secret.");
    }

    #[test]
    fn test_override_unknown_element() {
        let mut model = model();
        let err = apply_documentation_overrides(
            &mut model,
            &[doc_override(".test.Missing", "a", "b")],
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::Config(_)));
        assert!(err.to_string().contains(".test.Missing"));
    }

    #[test]
    fn test_override_no_match() {
        let mut model = model();
        let err = apply_documentation_overrides(
            &mut model,
            &[doc_override(".test.Secret", "not there", "b")],
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::Config(_)));
        assert_eq!(
            model.state.message(".test.Secret").unwrap().documentation,
            "A secret. See [link]."
        );
    }
}
