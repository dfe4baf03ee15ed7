//! Native runtime backed by tokio's filesystem API

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

/// Runtime that reads from the real filesystem
#[derive(Debug, Clone)]
pub struct NativeRuntime {
    /// Base directory for relative paths
    cwd: PathBuf,
}

impl NativeRuntime {
    /// Create a native runtime rooted at `cwd`
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Get the working directory of this runtime
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let full_path = self.resolve_path(path);
        tokio::fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(full_path.clone())
            } else {
                RuntimeError::Io(format!("Failed to read {}: {}", full_path.display(), e))
            }
        })
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let full_path = self.resolve_path(path);
        let metadata = tokio::fs::metadata(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RuntimeError::FileNotFound(full_path.clone())
            } else {
                RuntimeError::Io(format!(
                    "Failed to get metadata for {}: {}",
                    full_path.display(),
                    e
                ))
            }
        })?;

        Ok(FileMetadata {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
            is_file: metadata.is_file(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    fn is_native(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_files_relative_to_cwd() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), "{}").unwrap();

        let runtime = NativeRuntime::new(temp.path());
        let content = runtime.read_to_string(Path::new("package.json")).await.unwrap();
        assert_eq!(content, "{}");
        assert!(runtime.is_file(Path::new("package.json")).await);
        assert!(runtime.is_native());
    }

    #[tokio::test]
    async fn missing_file_maps_to_not_found() {
        let temp = TempDir::new().unwrap();
        let runtime = NativeRuntime::new(temp.path());

        let err = runtime
            .read_file(&temp.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::FileNotFound(_)));
        assert!(!runtime.exists(&temp.path().join("nope.json")));
    }

    #[tokio::test]
    async fn directories_are_not_files() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("package.json")).unwrap();

        let runtime = NativeRuntime::new(temp.path());
        assert!(runtime.exists(&temp.path().join("package.json")));
        assert!(!runtime.is_file(&temp.path().join("package.json")).await);
    }
}
