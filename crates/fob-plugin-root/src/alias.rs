//! Alias table construction
//!
//! Turns the validated `{ "/": "...", "~": "..." }` object into absolute
//! target directories, keeping the key order of the source document.

use indexmap::IndexMap;
use path_clean::PathClean;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// The two recognized alias prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasPrefix {
    /// `/` - project-root style imports (`/components/Button`)
    Root,
    /// `~` - home style imports (`~/utils/a.js`)
    Home,
}

impl AliasPrefix {
    pub const ALL: [AliasPrefix; 2] = [AliasPrefix::Root, AliasPrefix::Home];

    pub fn as_str(&self) -> &'static str {
        match self {
            AliasPrefix::Root => "/",
            AliasPrefix::Home => "~",
        }
    }

    /// Parse a configuration key; anything but `/` and `~` is rejected
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|prefix| prefix.as_str() == key)
    }
}

impl fmt::Display for AliasPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping from alias prefix to absolute target directory
///
/// Iteration order is the order in which the keys appeared in `package.json`;
/// the rewriter relies on it for first-match-wins precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: IndexMap<AliasPrefix, PathBuf>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a validated config object
    ///
    /// Targets are resolved against `config_dir`, the directory holding the
    /// `package.json` that declared them. Unknown keys and non-string values
    /// are skipped; validation has already reported them.
    pub fn from_config(config: &Map<String, Value>, config_dir: &Path) -> Self {
        let mut table = Self::new();
        for (key, value) in config {
            if let (Some(prefix), Some(target)) = (AliasPrefix::from_key(key), value.as_str()) {
                table.insert(prefix, config_dir.join(target).clean());
            }
        }
        table
    }

    /// Insert or replace an entry
    ///
    /// Replacing keeps the original position, matching how a JSON object with
    /// a duplicated key is read.
    pub fn insert(&mut self, prefix: AliasPrefix, target: impl Into<PathBuf>) {
        self.entries.insert(prefix, target.into());
    }

    /// Builder-style variant of [`AliasTable::insert`]
    pub fn with(mut self, prefix: AliasPrefix, target: impl Into<PathBuf>) -> Self {
        self.insert(prefix, target);
        self
    }

    pub fn get(&self, prefix: AliasPrefix) -> Option<&Path> {
        self.entries.get(&prefix).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AliasPrefix, &Path)> {
        self.entries.iter().map(|(prefix, target)| (*prefix, target.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
