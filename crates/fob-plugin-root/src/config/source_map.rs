//! Lenient JSON parsing and source positions
//!
//! `package.json` is read the way bundlers usually accept it: comments and
//! trailing commas are allowed. `serde_json::Value` drops positions, so
//! diagnostics re-parse the text into a `jsonc-parser` AST to find where a
//! JSON pointer lands.

use jsonc_parser::ast::{self, ObjectPropName};
use jsonc_parser::common::{Range, Ranged};
use jsonc_parser::{CollectOptions, ParseOptions};
use miette::SourceSpan;
use serde_json::Value;

/// Escape a single JSON pointer component (RFC 6901)
pub fn encode_pointer_component(component: &str) -> String {
    component.replace('~', "~0").replace('/', "~1")
}

/// Build a JSON pointer from raw (unescaped) components
pub fn pointer(components: &[&str]) -> String {
    components
        .iter()
        .map(|c| format!("/{}", encode_pointer_component(c)))
        .collect()
}

fn parse_options() -> ParseOptions {
    ParseOptions {
        allow_comments: true,
        allow_trailing_commas: true,
        ..Default::default()
    }
}

/// A parse failure with the offending range when the parser reported one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    pub span: Option<SourceSpan>,
}

/// Parse `source` into a value
///
/// Returns `Ok(None)` for documents without a value: empty, whitespace or
/// comments only.
pub fn parse(source: &str) -> Result<Option<Value>, ParseFailure> {
    jsonc_parser::parse_to_serde_value(source, &parse_options()).map_err(|e| ParseFailure {
        message: e.to_string(),
        span: Some(span(e.range())),
    })
}

/// Location of a member in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Span of the key, `None` for the document root
    pub key: Option<SourceSpan>,
    /// Span of the value
    pub value: SourceSpan,
}

/// Find the key and value spans addressed by `path` (raw object keys)
///
/// With duplicated keys the last occurrence wins, as it does for the parsed
/// value.
pub fn locate(source: &str, path: &[&str]) -> Option<Location> {
    let parsed =
        jsonc_parser::parse_to_ast(source, &CollectOptions::default(), &parse_options()).ok()?;
    let mut value = parsed.value.as_ref()?;
    let mut key = None;

    for segment in path {
        let ast::Value::Object(object) = value else {
            return None;
        };
        let prop = object
            .properties
            .iter()
            .rev()
            .find(|prop| prop_name(&prop.name) == *segment)?;
        key = Some(span(prop.name.range()));
        value = &prop.value;
    }

    Some(Location {
        key,
        value: span(value.range()),
    })
}

fn prop_name<'a>(name: &'a ObjectPropName<'_>) -> &'a str {
    match name {
        ObjectPropName::String(s) => s.value.as_ref(),
        ObjectPropName::Word(w) => w.value,
    }
}

fn span(range: Range) -> SourceSpan {
    SourceSpan::new(range.start.into(), range.end.saturating_sub(range.start))
}
