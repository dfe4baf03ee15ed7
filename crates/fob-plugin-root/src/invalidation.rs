//! Cache invalidation hints
//!
//! Every resolution reports which files it consulted (invalidate on change)
//! and which files it looked for but did not find (invalidate on create).
//! A build cache uses these to decide when a cached resolution is stale.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Re-run resolution if a file named `file_name` appears in `directory`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreateInvalidation {
    pub directory: PathBuf,
    pub file_name: String,
}

impl FileCreateInvalidation {
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Build from the full path of a file that was missing
    ///
    /// Returns `None` for paths without a file name (e.g. `/`).
    pub fn for_missing_file(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let directory = path.parent()?.to_path_buf();
        Some(Self {
            directory,
            file_name,
        })
    }

    /// Full path of the file whose creation invalidates the result
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Ordered, de-duplicated invalidation hints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationSet {
    on_file_create: IndexSet<FileCreateInvalidation>,
    on_file_change: IndexSet<PathBuf>,
}

impl InvalidationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate_on_file_create(&mut self, invalidation: FileCreateInvalidation) {
        self.on_file_create.insert(invalidation);
    }

    pub fn invalidate_on_file_change(&mut self, path: impl Into<PathBuf>) {
        self.on_file_change.insert(path.into());
    }

    /// Append `other` after the entries already present
    pub fn extend(&mut self, other: InvalidationSet) {
        self.on_file_create.extend(other.on_file_create);
        self.on_file_change.extend(other.on_file_change);
    }

    /// Builder-style variant of [`InvalidationSet::extend`]
    pub fn merged(mut self, other: InvalidationSet) -> Self {
        self.extend(other);
        self
    }

    pub fn on_file_create(&self) -> impl Iterator<Item = &FileCreateInvalidation> {
        self.on_file_create.iter()
    }

    pub fn on_file_change(&self) -> impl Iterator<Item = &Path> {
        self.on_file_change.iter().map(PathBuf::as_path)
    }

    pub fn file_create_len(&self) -> usize {
        self.on_file_create.len()
    }

    pub fn file_change_len(&self) -> usize {
        self.on_file_change.len()
    }

    pub fn is_empty(&self) -> bool {
        self.on_file_create.is_empty() && self.on_file_change.is_empty()
    }

    /// Split into plain vectors, preserving order
    pub fn into_parts(self) -> (Vec<FileCreateInvalidation>, Vec<PathBuf>) {
        (
            self.on_file_create.into_iter().collect(),
            self.on_file_change.into_iter().collect(),
        )
    }
}
