//! Schema validation for the alias configuration
//!
//! The accepted shape is `{ "/"?: string, "~"?: string }` with no other keys.
//! Validation is a gate: it either passes or produces a [`SchemaError`] that
//! points at the offending key inside `package.json`.

use miette::{Diagnostic, LabeledSpan, NamedSource};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::locator::LocatedConfig;
use super::source_map::{self, Location};
use crate::alias::AliasPrefix;

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// The plugin key holds something other than an object
    NotAnObject { found: &'static str },
    /// A key outside `/` and `~`
    UnexpectedKey { key: String },
    /// A recognized key with a non-string value
    NotAString { key: String, found: &'static str },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::NotAnObject { found } => {
                write!(f, "Expected an object, found {found}")
            }
            ViolationKind::UnexpectedKey { key } => write!(
                f,
                "Unexpected property \"{key}\", expected one of {}",
                expected_keys()
            ),
            ViolationKind::NotAString { key, found } => {
                write!(f, "Expected a string for \"{key}\", found {found}")
            }
        }
    }
}

/// Violation plus where it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer into `package.json`, e.g. `/fob-plugin-root/~0`
    pub key_path: String,
    pub kind: ViolationKind,
    span: Option<miette::SourceSpan>,
}

impl SchemaViolation {
    fn label(&self) -> LabeledSpan {
        let text = match &self.kind {
            ViolationKind::NotAnObject { .. } => "expected an object",
            ViolationKind::UnexpectedKey { .. } => "unexpected property",
            ViolationKind::NotAString { .. } => "expected a string",
        };
        let span = self.span.unwrap_or_else(|| (0, 0).into());
        LabeledSpan::new_with_span(Some(text.to_string()), span)
    }
}

/// Invalid alias configuration
#[derive(Debug, Error, Diagnostic)]
#[error("Invalid config for {plugin}: {}", first_message(.violations))]
#[diagnostic(
    code(fob::root::invalid_config),
    help("Only \"/\" and \"~\" are allowed, each mapping to a directory relative to package.json")
)]
pub struct SchemaError {
    pub plugin: String,
    pub file_path: PathBuf,
    violations: Vec<SchemaViolation>,
    #[source_code]
    source_code: NamedSource<String>,
    #[label(collection)]
    labels: Vec<LabeledSpan>,
}

impl SchemaError {
    fn new(plugin: &str, config: &LocatedConfig, violations: Vec<SchemaViolation>) -> Self {
        let labels = violations.iter().map(SchemaViolation::label).collect();
        Self {
            plugin: plugin.to_string(),
            file_path: config.path.clone(),
            violations,
            source_code: NamedSource::new(config.path.display().to_string(), config.source.clone()),
            labels,
        }
    }

    /// All violations, in document order
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }

    /// JSON pointer of the first violation
    pub fn key_path(&self) -> &str {
        self.violations
            .first()
            .map(|v| v.key_path.as_str())
            .unwrap_or_default()
    }
}

/// Validate the raw value found under `plugin` in `config`
///
/// All violations are collected; the error reports them together.
pub fn validate_config(value: &Value, config: &LocatedConfig, plugin: &str) -> Result<(), SchemaError> {
    let mut violations = Vec::new();

    match value {
        Value::Object(map) => {
            for (key, entry) in map {
                let path = [plugin, key.as_str()];
                let location = source_map::locate(&config.source, &path);
                let key_path = source_map::pointer(&path);

                if AliasPrefix::from_key(key).is_none() {
                    violations.push(SchemaViolation {
                        key_path,
                        kind: ViolationKind::UnexpectedKey { key: key.clone() },
                        span: location.and_then(|l| l.key),
                    });
                } else if !entry.is_string() {
                    violations.push(SchemaViolation {
                        key_path,
                        kind: ViolationKind::NotAString {
                            key: key.clone(),
                            found: type_name(entry),
                        },
                        span: location.map(|l| l.value),
                    });
                }
            }
        }
        other => {
            let location: Option<Location> = source_map::locate(&config.source, &[plugin]);
            violations.push(SchemaViolation {
                key_path: source_map::pointer(&[plugin]),
                kind: ViolationKind::NotAnObject {
                    found: type_name(other),
                },
                span: location.map(|l| l.value),
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(
            file = %config.path.display(),
            count = violations.len(),
            "alias config failed validation"
        );
        Err(SchemaError::new(plugin, config, violations))
    }
}

fn first_message(violations: &[SchemaViolation]) -> String {
    violations
        .first()
        .map(|v| v.kind.to_string())
        .unwrap_or_default()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected_keys() -> String {
    AliasPrefix::ALL
        .iter()
        .map(|p| format!("\"{}\"", p.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    const KEY: &str = "fob-plugin-root";

    fn located(source: &str) -> LocatedConfig {
        LocatedConfig::parse(Path::new("/proj/package.json"), source.to_string()).unwrap()
    }

    fn check(source: &str) -> Result<(), SchemaError> {
        let config = located(source);
        let value = config.json.get(KEY).cloned().unwrap_or(Value::Null);
        validate_config(&value, &config, KEY)
    }

    #[test]
    fn accepts_both_prefixes() {
        check(r#"{"fob-plugin-root": {"/": "src", "~": "lib"}}"#).unwrap();
        check(r#"{"fob-plugin-root": {"~": "."}}"#).unwrap();
        check(r#"{"fob-plugin-root": {}}"#).unwrap();
    }

    #[test]
    fn rejects_unknown_key() {
        let err = check(r#"{"fob-plugin-root": {"@": "src"}}"#).unwrap_err();
        assert_eq!(err.key_path(), "/fob-plugin-root/@");
        assert_eq!(
            err.violations()[0].kind,
            ViolationKind::UnexpectedKey { key: "@".into() }
        );
        assert!(err.to_string().contains("Unexpected property \"@\""));
        assert!(err.to_string().starts_with("Invalid config for fob-plugin-root"));
    }

    #[test]
    fn rejects_non_string_value() {
        let source = r#"{
  "fob-plugin-root": {
    "~": 42
  }
}"#;
        let err = check(source).unwrap_err();
        assert_eq!(err.key_path(), "/fob-plugin-root/~0");
        assert_eq!(
            err.violations()[0].kind,
            ViolationKind::NotAString {
                key: "~".into(),
                found: "number"
            }
        );

        let label = err.labels().unwrap().next().unwrap();
        assert_eq!(&source[label.offset()..label.offset() + label.len()], "42");
    }

    #[test]
    fn rejects_non_object_config() {
        let config = located(r#"{"fob-plugin-root": ["src"]}"#);
        let err = validate_config(&json!(["src"]), &config, KEY).unwrap_err();
        assert_eq!(err.key_path(), "/fob-plugin-root");
        assert_eq!(
            err.violations()[0].kind,
            ViolationKind::NotAnObject { found: "array" }
        );
    }

    #[test]
    fn collects_every_violation_in_order() {
        let err = check(r#"{"fob-plugin-root": {"/": true, "x": "a", "~": "ok"}}"#).unwrap_err();
        let paths: Vec<_> = err.violations().iter().map(|v| v.key_path.as_str()).collect();
        assert_eq!(paths, vec!["/fob-plugin-root/~1", "/fob-plugin-root/x"]);
        assert_eq!(err.labels().unwrap().count(), 2);
    }

    #[test]
    fn diagnostic_carries_file_and_code() {
        let err = check(r#"{"fob-plugin-root": {"x": "a"}}"#).unwrap_err();
        assert_eq!(err.file_path, Path::new("/proj/package.json"));
        assert_eq!(
            err.code().unwrap().to_string(),
            "fob::root::invalid_config"
        );
        assert!(err.source_code().is_some());
    }
}
