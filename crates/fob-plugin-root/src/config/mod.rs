//! Alias configuration: discovery, validation, and table construction
//!
//! Lookup runs in two stages:
//!
//! 1. Walk up from the importing file to the nearest `package.json`.
//! 2. If that file has no usable alias config, walk up again from the
//!    fallback directory (the project root unless configured otherwise).
//!
//! Invalidations from both stages are always returned so a build cache can
//! react when a config file is later created or edited.

mod locator;
mod schema;
pub mod source_map;

pub use locator::{ConfigLocator, LocatedConfig, Lookup};
pub use schema::{SchemaError, SchemaViolation, ViolationKind, validate_config};

use serde_json::Value;
use std::path::Path;

use crate::alias::AliasTable;
use crate::error::Result;
use crate::invalidation::InvalidationSet;
use crate::runtime::Runtime;

/// Outcome of alias config loading
#[derive(Debug, Default)]
pub struct AliasLookup {
    /// `None` when no config applies; aliasing is then skipped
    pub table: Option<AliasTable>,
    pub invalidations: InvalidationSet,
}

/// Load the alias table that applies to a file
///
/// # Arguments
///
/// * `resolve_from` - the importing file
/// * `fallback_dir` - where the second lookup starts
/// * `locator` - which file name to look for
/// * `key` - top-level key holding the alias map
pub async fn load_alias_config(
    runtime: &dyn Runtime,
    resolve_from: &Path,
    fallback_dir: &Path,
    locator: &ConfigLocator,
    key: &str,
) -> Result<AliasLookup> {
    let start = resolve_from.parent().unwrap_or(resolve_from);
    let first = locator.locate(runtime, start).await?;
    let mut invalidations = first.invalidations;

    let config = match first.config.filter(|c| has_usable_value(c, key)) {
        Some(config) => config,
        None => {
            let second = locator.locate(runtime, fallback_dir).await?;
            invalidations.extend(second.invalidations);
            match second.config.filter(|c| has_usable_value(c, key)) {
                Some(config) => config,
                None => {
                    tracing::debug!(
                        from = %resolve_from.display(),
                        "no alias config found"
                    );
                    return Ok(AliasLookup {
                        table: None,
                        invalidations,
                    });
                }
            }
        }
    };

    let value = config.get(key).cloned().unwrap_or(Value::Null);
    validate_config(&value, &config, key)?;

    let table = match &value {
        Value::Object(map) => AliasTable::from_config(map, config.dir()),
        _ => AliasTable::new(),
    };

    tracing::debug!(
        config = %config.path.display(),
        aliases = table.len(),
        "loaded alias config"
    );

    Ok(AliasLookup {
        table: Some(table),
        invalidations,
    })
}

/// JSON-falsy values (`null`, `false`, `0`, `""`) count as "not configured"
fn has_usable_value(config: &LocatedConfig, key: &str) -> bool {
    match config.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
