//! HTTP path templates

use std::fmt;

/// Matches exactly one path segment.
pub const SINGLE_SEGMENT_WILDCARD: &str = "*";

/// Matches one or more path segments.
pub const MULTI_SEGMENT_WILDCARD: &str = "**";

/// An HTTP path template such as `v1/projects/{project}/secrets:list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTemplate {
    pub segments: Vec<PathSegment>,
    pub verb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    Variable(PathVariable),
}

/// A variable bound to a (possibly nested) request field.
///
/// `segments` describes what the variable matches, e.g. `["projects", "*"]`
/// for `{name=projects/*}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVariable {
    pub field_path: Vec<String>,
    pub segments: Vec<String>,
    pub allow_reserved: bool,
}

impl PathTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_literal(mut self, literal: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Literal(literal.into()));
        self
    }

    pub fn with_variable(mut self, variable: PathVariable) -> Self {
        self.segments.push(PathSegment::Variable(variable));
        self
    }

    /// Adds a variable for `field_path` that matches a single segment.
    pub fn with_variable_named(self, field_path: &[&str]) -> Self {
        self.with_variable(PathVariable::new(field_path).with_match())
    }

    pub fn with_verb(mut self, verb: impl Into<String>) -> Self {
        self.verb = Some(verb.into());
        self
    }

    /// Renders the template with variables shown as `{field.path}`.
    pub fn flat_path(&self) -> String {
        let mut path = self
            .segments
            .iter()
            .map(|s| match s {
                PathSegment::Literal(l) => l.clone(),
                PathSegment::Variable(v) => format!("{{{}}}", v.field_name()),
            })
            .collect::<Vec<_>>()
            .join("/");
        if let Some(verb) = &self.verb {
            path.push(':');
            path.push_str(verb);
        }
        path
    }

    /// Iterates over the variables of the template, in order.
    pub fn variables(&self) -> impl Iterator<Item = &PathVariable> {
        self.segments.iter().filter_map(|s| match s {
            PathSegment::Variable(v) => Some(v),
            PathSegment::Literal(_) => None,
        })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flat_path())
    }
}

impl PathVariable {
    pub fn new(field_path: &[&str]) -> Self {
        Self {
            field_path: field_path.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_literal(mut self, literal: impl Into<String>) -> Self {
        self.segments.push(literal.into());
        self
    }

    pub fn with_match(mut self) -> Self {
        self.segments.push(SINGLE_SEGMENT_WILDCARD.to_string());
        self
    }

    pub fn with_match_recursive(mut self) -> Self {
        self.segments.push(MULTI_SEGMENT_WILDCARD.to_string());
        self
    }

    pub fn with_allow_reserved(mut self) -> Self {
        self.allow_reserved = true;
        self
    }

    /// The field path joined with `.`.
    pub fn field_name(&self) -> String {
        self.field_path.join(".")
    }
}
