//! Delegate resolution
//!
//! After alias rewriting the specifier is handed to a general-purpose module
//! resolver. [`OxcDelegate`] is the default and wraps `oxc_resolver`; tests
//! and embedders can plug in their own [`ResolutionDelegate`].

use async_trait::async_trait;
use oxc_resolver::{ResolveContext, ResolveError, ResolveOptions, Resolver};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ResolverError, Result};
use crate::invalidation::{FileCreateInvalidation, InvalidationSet};
use crate::runtime::Runtime;

/// Build environment of the importing module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Whether the bundle is scope hoisted; selects the main field order
    pub should_scope_hoist: bool,
}

/// Everything a delegate needs to resolve one specifier
#[derive(Debug, Clone)]
pub struct DelegateRequest {
    /// Possibly rewritten specifier
    pub specifier: String,
    /// Importing file, absent for entries
    pub parent: Option<PathBuf>,
    /// Dependency originates from a URL reference (e.g. CSS `url()`)
    pub is_url: bool,
    pub env: Environment,
    pub project_root: PathBuf,
    /// Extensions without the leading dot
    pub extensions: Vec<String>,
    pub main_fields: Vec<String>,
}

impl DelegateRequest {
    /// Directory the specifier is resolved against
    pub fn base_dir(&self) -> &Path {
        self.parent
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(&self.project_root)
    }

    /// Specifier as the delegate should see it
    ///
    /// URL references treat bare names as relative paths, so `url(img.png)`
    /// looks next to the stylesheet instead of in `node_modules`. Their
    /// `?query` and `#hash` suffixes are dropped.
    pub fn effective_specifier(&self) -> String {
        if !self.is_url || self.specifier.contains(':') {
            return self.specifier.clone();
        }

        let path = self
            .specifier
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        if is_bare(path) {
            format!("./{path}")
        } else {
            path.to_string()
        }
    }
}

fn is_bare(specifier: &str) -> bool {
    !(specifier.starts_with('.') || specifier.starts_with('/'))
}

/// A successful delegate resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    pub invalidations: InvalidationSet,
    /// The module is mapped to `false` by a `browser` field and should be
    /// replaced with an empty module
    pub excluded: bool,
}

impl Resolution {
    pub fn new(path: impl Into<PathBuf>, invalidations: InvalidationSet) -> Self {
        Self {
            path: path.into(),
            invalidations,
            excluded: false,
        }
    }

    pub fn excluded(path: impl Into<PathBuf>, invalidations: InvalidationSet) -> Self {
        Self {
            excluded: true,
            ..Self::new(path, invalidations)
        }
    }
}

/// Resolves a (possibly rewritten) specifier to a file
///
/// `Ok(None)` means "not found" and lets the bundler try the next resolver.
/// `runtime` is the build's input filesystem.
#[async_trait]
pub trait ResolutionDelegate: Send + Sync + std::fmt::Debug {
    async fn resolve(
        &self,
        request: DelegateRequest,
        runtime: &dyn Runtime,
    ) -> Result<Option<Resolution>>;
}

type ResolverKey = (Vec<String>, Vec<String>);

/// Default delegate backed by `oxc_resolver`
///
/// `oxc_resolver` reads the host filesystem itself, so this delegate only
/// accepts native runtimes and fails with
/// [`ResolverError::UnsupportedRuntime`] otherwise. Resolve against a
/// [`MemoryRuntime`](crate::MemoryRuntime) with a custom delegate.
///
/// One resolver is kept per extension/main-field combination so its
/// filesystem cache survives across calls.
#[derive(Debug, Default)]
pub struct OxcDelegate {
    resolvers: Mutex<FxHashMap<ResolverKey, Arc<Resolver>>>,
}

impl OxcDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolver_for(&self, extensions: &[String], main_fields: &[String]) -> Arc<Resolver> {
        let key = (extensions.to_vec(), main_fields.to_vec());
        let mut resolvers = self.resolvers.lock();
        resolvers
            .entry(key)
            .or_insert_with(|| {
                // `browser` maps in package.json only apply when listed as an alias field
                let alias_fields = if main_fields.iter().any(|f| f == "browser") {
                    vec![vec!["browser".to_string()]]
                } else {
                    Vec::new()
                };
                Arc::new(Resolver::new(ResolveOptions {
                    extensions: extensions.iter().map(|e| format!(".{e}")).collect(),
                    main_fields: main_fields.to_vec(),
                    alias_fields,
                    ..Default::default()
                }))
            })
            .clone()
    }
}

fn collect_invalidations(context: ResolveContext) -> InvalidationSet {
    let mut invalidations = InvalidationSet::new();

    let mut files: Vec<_> = context.file_dependencies.into_iter().collect();
    files.sort();
    for file in files {
        invalidations.invalidate_on_file_change(file);
    }

    let mut missing: Vec<_> = context.missing_dependencies.into_iter().collect();
    missing.sort();
    for path in missing {
        if let Some(invalidation) = FileCreateInvalidation::for_missing_file(&path) {
            invalidations.invalidate_on_file_create(invalidation);
        }
    }

    invalidations
}

#[async_trait]
impl ResolutionDelegate for OxcDelegate {
    async fn resolve(
        &self,
        request: DelegateRequest,
        runtime: &dyn Runtime,
    ) -> Result<Option<Resolution>> {
        if !runtime.is_native() {
            return Err(ResolverError::unsupported_runtime(&request.specifier));
        }

        let resolver = self.resolver_for(&request.extensions, &request.main_fields);
        let base_dir = request.base_dir().to_path_buf();
        let specifier = request.effective_specifier();

        let outcome = tokio::task::spawn_blocking(move || {
            let mut context = ResolveContext::default();
            let result = resolver.resolve_with_context(&base_dir, &specifier, None, &mut context);
            (result, context)
        })
        .await
        .map_err(|e| ResolverError::delegate(&request.specifier, e.to_string()))?;

        let (result, context) = outcome;
        match result {
            Ok(resolution) => {
                let path = resolution.path().to_path_buf();
                tracing::trace!(
                    specifier = %request.specifier,
                    path = %path.display(),
                    "delegate resolved"
                );
                Ok(Some(Resolution::new(path, collect_invalidations(context))))
            }
            Err(ResolveError::Ignored(path)) => {
                tracing::trace!(
                    specifier = %request.specifier,
                    path = %path.display(),
                    "module excluded by browser field"
                );
                Ok(Some(Resolution::excluded(path, collect_invalidations(context))))
            }
            Err(ResolveError::NotFound(_)) => {
                tracing::trace!(specifier = %request.specifier, "delegate found nothing");
                Ok(None)
            }
            Err(e) => Err(ResolverError::delegate(&request.specifier, e.to_string())),
        }
    }
}
