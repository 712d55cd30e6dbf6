//! Rust identifier shaping

use convert_case::{Case, Casing};

/// Strict and reserved keywords. Identifiers matching one of these are
/// emitted as raw identifiers.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Splits an identifier at separators and case changes.
///
/// Digits never start a new word: `ipv4_address` is `ipv4 address`, and
/// `HTTPServer` is `HTTP Server`.
fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, c) in chars.iter().copied().enumerate() {
        if matches!(c, '_' | '-' | ' ' | '.') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let lower_upper = prev.is_lowercase() || prev.is_ascii_digit();
            let acronym_end = prev.is_uppercase() && next_is_lower;
            if lower_upper || acronym_end {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn convert(name: &str, case: Case) -> String {
    words(name).join(" ").from_case(Case::Lower).to_case(case)
}

/// Prefixes `name` with `r#` if it is a keyword.
pub fn escape_keyword(name: String) -> String {
    if KEYWORDS.contains(&name.as_str()) {
        format!("r#{name}")
    } else {
        name
    }
}

/// `snake_case`, escaped.
pub fn to_snake(name: &str) -> String {
    escape_keyword(to_snake_no_mangling(name))
}

/// `snake_case` as used in setter names and documentation.
pub fn to_snake_no_mangling(name: &str) -> String {
    convert(name, Case::Snake)
}

/// `PascalCase`, escaped.
pub fn to_pascal(name: &str) -> String {
    escape_keyword(convert(name, Case::Pascal))
}

pub fn to_camel(name: &str) -> String {
    convert(name, Case::Camel)
}

pub fn to_kebab(name: &str) -> String {
    convert(name, Case::Kebab)
}

pub fn to_screaming_snake(name: &str) -> String {
    convert(name, Case::Constant)
}

/// Variant name for an enum value.
///
/// Values conventionally repeat the enum name as a prefix
/// (`STATE_ENABLED` in `State`). The prefix is dropped unless what remains
/// would start with a digit.
pub fn enum_variant_name(enum_name: &str, value_name: &str) -> String {
    let value = to_screaming_snake(value_name);
    let prefix = format!("{}_", to_screaming_snake(enum_name));
    let stripped = match value.strip_prefix(&prefix) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_alphabetic()) => rest,
        _ => value.as_str(),
    };
    to_pascal(stripped)
}

/// Formats documentation as `///` lines.
pub fn doc_lines(documentation: &str) -> Vec<String> {
    if documentation.trim().is_empty() {
        return Vec::new();
    }
    documentation
        .trim_end()
        .lines()
        .map(|line| match line.trim_end() {
            "" => "///".to_string(),
            text => format!("/// {text}"),
        })
        .collect()
}

/// Crate name for a source package, e.g. `google-cloud-workflows-v1` for
/// `google.cloud.workflows.v1`.
pub fn package_name(package: &str) -> String {
    let rest = package.strip_prefix("google.").unwrap_or(package);
    let rest = rest.strip_prefix("cloud.").unwrap_or(rest);
    format!("google-cloud-{}", rest.replace('.', "-"))
}

/// The crate name as it appears in `use` paths.
pub fn package_namespace(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}

/// Module path mirroring a source package, e.g. `test::v1`.
pub fn package_module_name(package: &str) -> String {
    package.replace('.', "::")
}
