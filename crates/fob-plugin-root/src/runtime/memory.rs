//! In-memory runtime
//!
//! Holds a virtual project as a map of absolute paths to file contents.
//! Directories are implied by the files beneath them.

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Runtime serving files from memory only
#[derive(Debug, Clone)]
pub struct MemoryRuntime {
    files: Arc<RwLock<FxHashMap<PathBuf, Vec<u8>>>>,
    /// Current working directory for resolving relative paths
    cwd: PathBuf,
}

impl MemoryRuntime {
    /// Create an empty in-memory runtime with the given working directory
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            files: Arc::new(RwLock::new(FxHashMap::default())),
            cwd: cwd.into(),
        }
    }

    /// Add (or replace) a file
    ///
    /// The path is normalized before storage to ensure consistent lookup.
    pub fn add_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let path: PathBuf = path.into();
        let normalized = self.normalize(&path);
        self.files.write().insert(normalized, content.into());
    }

    /// Builder-style variant of [`MemoryRuntime::add_file`]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Remove a file, returning whether it existed
    pub fn remove_file(&self, path: &Path) -> bool {
        let normalized = self.normalize(path);
        self.files.write().remove(&normalized).is_some()
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.clean()
        } else {
            self.cwd.join(path).clean()
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let normalized = self.normalize(path);
        self.files
            .read()
            .get(&normalized)
            .cloned()
            .ok_or(RuntimeError::FileNotFound(normalized))
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let normalized = self.normalize(path);
        if let Some(content) = self.files.read().get(&normalized) {
            return Ok(FileMetadata {
                size: content.len() as u64,
                is_dir: false,
                is_file: true,
            });
        }

        if self.is_dir(&normalized) {
            return Ok(FileMetadata {
                size: 0,
                is_dir: true,
                is_file: false,
            });
        }

        Err(RuntimeError::FileNotFound(normalized))
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = self.normalize(path);
        self.files.read().contains_key(&normalized) || self.is_dir(&normalized)
    }
}
