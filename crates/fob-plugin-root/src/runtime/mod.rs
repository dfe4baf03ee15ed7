//! Input filesystem abstraction for the root resolver
//!
//! Config lookup never touches `std::fs` directly. Everything goes through the
//! `Runtime` trait so the resolver can run against the real filesystem
//! (`NativeRuntime`) or an in-memory project (`MemoryRuntime`).

mod memory;
mod native;

pub use memory::MemoryRuntime;
pub use native::NativeRuntime;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

/// File metadata
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether this is a file
    pub is_file: bool,
}

/// Read-only platform runtime
///
/// The resolver only ever reads: it looks for `package.json` files and loads
/// their source text. Implementations must be shareable across concurrent
/// resolution calls.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Get file metadata
    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Whether this runtime reads the host filesystem
    ///
    /// Delegates that bypass the runtime (such as `OxcDelegate`) are only
    /// usable when this returns `true`.
    fn is_native(&self) -> bool {
        false
    }

    /// Read a file as UTF-8 text
    async fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes).map_err(|e| {
            RuntimeError::Io(format!("{} contains invalid UTF-8: {}", path.display(), e))
        })
    }

    /// Returns true when `path` exists and is a regular file
    async fn is_file(&self, path: &Path) -> bool {
        if !self.exists(path) {
            return false;
        }
        matches!(self.metadata(path).await, Ok(metadata) if metadata.is_file)
    }
}
