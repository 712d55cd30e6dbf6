//! RFC 6570 URI template parser
//!
//! Discovery documents describe method paths as level 1 URI templates, e.g.
//! `projects/{project}/zones/{zone}/instances`. The parser keeps the
//! structure of the template so codecs can emit typed path builders.
//!
//! Only simple `{identifier}` expressions are accepted; expressions using any
//! level 2 or level 3 operator are rejected.

use sdkgen_common::{GeneratorError, PathSegment, PathTemplate, PathVariable, Result};

const BEGIN_EXPRESSION: char = '{';
const END_EXPRESSION: char = '}';
const SLASH: char = '/';

/// Characters that terminate a literal.
const LITERAL_STOP: &[char] = &[' ', '"', '\'', '<', '>', '\\', '^', '`', '{', '|', '}', '/'];

/// Parses a URI template as a [`PathTemplate`].
///
/// # Example
/// ```rust,ignore
/// let template = parse_uri_template("projects/{project}/zones/{zone}")?;
/// assert_eq!(template.flat_path(), "projects/{project}/zones/{zone}");
/// ```
pub fn parse_uri_template(uri_template: &str) -> Result<PathTemplate> {
    let mut template = PathTemplate::new();
    let mut pos = 0;
    loop {
        let rest = &uri_template[pos..];
        if rest.is_empty() {
            return Err(GeneratorError::Parse(format!(
                "expected a segment, found eof: {uri_template}"
            )));
        }
        let (segment, width) = if rest.starts_with(BEGIN_EXPRESSION) {
            parse_expression(rest)?
        } else {
            parse_literal(rest)?
        };
        template.segments.push(segment);
        pos += width;
        if !uri_template[pos..].starts_with(SLASH) {
            break;
        }
        pos += SLASH.len_utf8();
    }
    if pos != uri_template.len() {
        return Err(GeneratorError::Parse(format!(
            "trailing data ({:?}) cannot be parsed as a URI template",
            &uri_template[pos..]
        )));
    }
    Ok(template)
}

/// Parses a `{identifier}` expression at the start of `input`.
///
/// Returns the segment and the number of bytes consumed.
fn parse_expression(input: &str) -> Result<(PathSegment, usize)> {
    let Some(tail) = input.strip_prefix(BEGIN_EXPRESSION) else {
        return Err(GeneratorError::Parse(format!(
            "missing `{{` character in expression {input:?}"
        )));
    };
    match tail.chars().next() {
        Some('+' | '#') => {
            return Err(GeneratorError::Parse(format!(
                "level 2 expressions unsupported input={input:?}"
            )))
        }
        Some('.' | '/' | '?' | '&') => {
            return Err(GeneratorError::Parse(format!(
                "level 3 expressions unsupported input={input:?}"
            )))
        }
        Some('=' | ',' | '!' | '@' | '|') => {
            return Err(GeneratorError::Parse(format!(
                "reserved character on expression {input:?}"
            )))
        }
        _ => {}
    }
    let width = identifier_width(tail);
    if width == 0 {
        return Err(GeneratorError::Parse(format!(
            "no identifier found on expression {input:?}"
        )));
    }
    let (id, rest) = tail.split_at(width);
    if !rest.starts_with(END_EXPRESSION) {
        return Err(GeneratorError::Parse(format!(
            "missing `}}` character at the end of the expression {input:?}"
        )));
    }
    let variable = PathVariable::new(&[id]).with_match();
    Ok((PathSegment::Variable(variable), width + 2))
}

/// Length of the `[A-Za-z][A-Za-z0-9_]*` identifier at the start of `input`.
fn identifier_width(input: &str) -> usize {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(input.len())
}

/// Parses a literal at the start of `input`.
///
/// Returns the segment and the number of bytes consumed.
fn parse_literal(input: &str) -> Result<(PathSegment, usize)> {
    let width = input.find(LITERAL_STOP).unwrap_or(input.len());
    let (literal, tail) = input.split_at(width);
    if literal.is_empty() {
        return Err(GeneratorError::Parse(format!(
            "invalid empty literal with input={input:?}"
        )));
    }
    if let Some(c) = tail.chars().next() {
        if c != SLASH {
            return Err(GeneratorError::Parse(format!(
                "found unexpected character {c:?} in literal {input:?}, stopped at position {width}"
            )));
        }
    }
    Ok((PathSegment::Literal(literal.to_string()), width))
}
