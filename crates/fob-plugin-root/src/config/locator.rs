//! Upward `package.json` discovery
//!
//! Walks from a starting directory towards the filesystem root and stops at
//! the first `package.json`. Every step is recorded: directories without the
//! file become create-invalidations, the file that was found becomes a
//! change-invalidation.

use miette::NamedSource;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::source_map;
use crate::error::{ResolverError, Result};
use crate::invalidation::{FileCreateInvalidation, InvalidationSet};
use crate::runtime::Runtime;

/// A parsed config file
#[derive(Debug, Clone)]
pub struct LocatedConfig {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Raw source text, kept for diagnostics
    pub source: String,
    pub json: Value,
}

impl LocatedConfig {
    /// Parse `source` as the JSON document stored at `path`
    ///
    /// Comments and trailing commas are accepted. A file without any value
    /// (empty, whitespace or comments only) parses to `null`, which carries
    /// no config.
    pub fn parse(path: &Path, source: String) -> Result<Self> {
        match source_map::parse(&source) {
            Ok(json) => Ok(Self {
                path: path.to_path_buf(),
                source,
                json: json.unwrap_or(Value::Null),
            }),
            Err(failure) => Err(ResolverError::InvalidPackageJson {
                path: path.to_path_buf(),
                message: failure.message,
                source_code: NamedSource::new(path.display().to_string(), source),
                span: failure.span,
            }),
        }
    }

    /// Directory holding the file
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// Value stored under `key` at the top level
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.json.get(key)
    }
}

/// Result of one upward search
#[derive(Debug, Default)]
pub struct Lookup {
    pub config: Option<LocatedConfig>,
    pub invalidations: InvalidationSet,
}

/// Finds the nearest config file above a directory
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    file_name: String,
}

impl Default for ConfigLocator {
    fn default() -> Self {
        Self::new("package.json")
    }
}

impl ConfigLocator {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Search `start_dir` and its ancestors
    ///
    /// The filesystem root itself is never checked, and the walk does not
    /// continue past a `node_modules` directory.
    pub async fn locate(&self, runtime: &dyn Runtime, start_dir: &Path) -> Result<Lookup> {
        let mut invalidations = InvalidationSet::new();
        let mut dir = Some(start_dir);

        while let Some(current) = dir {
            if current.parent().is_none() || current.file_name() == Some(OsStr::new("node_modules")) {
                break;
            }

            let candidate = current.join(&self.file_name);
            tracing::debug!(path = %candidate.display(), "probing for config file");

            if runtime.is_file(&candidate).await {
                invalidations.invalidate_on_file_change(&candidate);
                let source = runtime.read_to_string(&candidate).await?;
                let config = LocatedConfig::parse(&candidate, source)?;
                return Ok(Lookup {
                    config: Some(config),
                    invalidations,
                });
            }

            invalidations
                .invalidate_on_file_create(FileCreateInvalidation::new(current, &self.file_name));
            dir = current.parent();
        }

        Ok(Lookup {
            config: None,
            invalidations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MemoryRuntime;

    #[tokio::test]
    async fn finds_nearest_package_json() {
        let runtime = MemoryRuntime::new("/")
            .with_file("/proj/package.json", r#"{"name": "root"}"#)
            .with_file("/proj/packages/ui/package.json", r#"{"name": "ui"}"#);

        let lookup = ConfigLocator::default()
            .locate(&runtime, Path::new("/proj/packages/ui/src/components"))
            .await
            .unwrap();

        let config = lookup.config.unwrap();
        assert_eq!(config.path, PathBuf::from("/proj/packages/ui/package.json"));
        assert_eq!(config.get("name"), Some(&Value::from("ui")));
        assert_eq!(config.dir(), Path::new("/proj/packages/ui"));

        let (creates, changes) = lookup.invalidations.into_parts();
        assert_eq!(changes, vec![PathBuf::from("/proj/packages/ui/package.json")]);
        assert_eq!(
            creates,
            vec![
                FileCreateInvalidation::new("/proj/packages/ui/src/components", "package.json"),
                FileCreateInvalidation::new("/proj/packages/ui/src", "package.json"),
            ]
        );
    }

    #[tokio::test]
    async fn records_every_visited_directory_when_missing() {
        let runtime = MemoryRuntime::new("/").with_file("/a/b/c/index.js", "");

        let lookup = ConfigLocator::default()
            .locate(&runtime, Path::new("/a/b/c"))
            .await
            .unwrap();

        assert!(lookup.config.is_none());
        assert_eq!(lookup.invalidations.file_change_len(), 0);
        let dirs: Vec<_> = lookup
            .invalidations
            .on_file_create()
            .map(|i| i.directory.clone())
            .collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b"),
                PathBuf::from("/a")
            ]
        );
    }

    #[tokio::test]
    async fn stops_at_node_modules() {
        let runtime = MemoryRuntime::new("/").with_file("/proj/package.json", "{}");

        let lookup = ConfigLocator::default()
            .locate(&runtime, Path::new("/proj/node_modules/pkg/lib"))
            .await
            .unwrap();

        assert!(lookup.config.is_none());
        assert_eq!(lookup.invalidations.file_create_len(), 2);
    }

    #[tokio::test]
    async fn directory_named_like_config_is_skipped() {
        let runtime = MemoryRuntime::new("/")
            .with_file("/proj/package.json/inner.txt", "")
            .with_file("/package.json", "{}");

        let lookup = ConfigLocator::default()
            .locate(&runtime, Path::new("/proj"))
            .await
            .unwrap();
        assert!(lookup.config.is_none());
    }

    #[tokio::test]
    async fn invalid_json_is_reported_with_location() {
        let runtime = MemoryRuntime::new("/").with_file("/proj/package.json", "{\n  \"name\": ,\n}");

        let err = ConfigLocator::default()
            .locate(&runtime, Path::new("/proj/src"))
            .await
            .unwrap_err();

        match err {
            ResolverError::InvalidPackageJson { path, span, .. } => {
                assert_eq!(path, PathBuf::from("/proj/package.json"));
                assert!(span.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn accepts_comments_and_trailing_commas() {
        let runtime = MemoryRuntime::new("/").with_file(
            "/proj/package.json",
            "{\n  // aliases\n  \"fob-plugin-root\": {\"~\": \"src\",},\n}",
        );

        let lookup = ConfigLocator::default()
            .locate(&runtime, Path::new("/proj/app"))
            .await
            .unwrap();

        let config = lookup.config.unwrap();
        assert_eq!(config.get("fob-plugin-root").unwrap()["~"], "src");
    }

    #[tokio::test]
    async fn empty_file_is_found_without_config() {
        for source in ["", "  \n", "// todo\n"] {
            let runtime = MemoryRuntime::new("/").with_file("/proj/package.json", source);

            let lookup = ConfigLocator::default()
                .locate(&runtime, Path::new("/proj/src"))
                .await
                .unwrap();

            let config = lookup.config.unwrap();
            assert_eq!(config.json, Value::Null);
            assert!(config.get("fob-plugin-root").is_none());
            let changes: Vec<_> = lookup.invalidations.on_file_change().collect();
            assert_eq!(changes, vec![Path::new("/proj/package.json")]);
        }
    }

    #[tokio::test]
    async fn custom_file_name() {
        let runtime = MemoryRuntime::new("/").with_file("/proj/fob.json", "{}");
        let locator = ConfigLocator::new("fob.json");
        assert_eq!(locator.file_name(), "fob.json");

        let lookup = locator.locate(&runtime, Path::new("/proj/src")).await.unwrap();
        assert_eq!(lookup.config.unwrap().path, PathBuf::from("/proj/fob.json"));
    }
}
