//! The root resolver
//!
//! Ties config lookup, alias rewriting and the delegate together behind the
//! single-operation [`Resolver`] trait.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use crate::config::{ConfigLocator, load_alias_config};
use crate::delegate::{DelegateRequest, Environment, OxcDelegate, ResolutionDelegate};
use crate::error::{ResolverError, Result};
use crate::invalidation::InvalidationSet;
use crate::options::RootResolverOptions;
use crate::rewrite::rewrite_specifier;
use crate::runtime::Runtime;

/// `imports-loader?$=jquery!./example.js` and friends
static WEBPACK_LOADER_SYNTAX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\S+-loader\S*!\S+").ok());

fn is_webpack_loader_syntax(specifier: &str) -> bool {
    WEBPACK_LOADER_SYNTAX
        .as_ref()
        .is_some_and(|re| re.is_match(specifier))
}

/// A module reference as seen by the bundler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Specifier exactly as written in the source
    pub specifier: String,
    /// File the import appears in; `None` for entry points
    pub resolve_from: Option<PathBuf>,
    pub is_url: bool,
    pub env: Environment,
}

impl Dependency {
    pub fn new(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            resolve_from: None,
            is_url: false,
            env: Environment::default(),
        }
    }

    pub fn from_file(mut self, importer: impl Into<PathBuf>) -> Self {
        self.resolve_from = Some(importer.into());
        self
    }

    pub fn url(mut self) -> Self {
        self.is_url = true;
        self
    }

    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }
}

/// Build-wide inputs shared by every resolution call
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub runtime: &'a dyn Runtime,
    pub project_root: &'a Path,
}

/// Result of one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved {
        path: PathBuf,
        invalidations: InvalidationSet,
    },
    /// `path` is mapped to `false` by a `browser` field; the bundler should
    /// substitute an empty module
    Excluded {
        path: PathBuf,
        invalidations: InvalidationSet,
    },
    /// The delegate found nothing; the bundler may try another resolver
    NotFound { specifier: String },
}

impl ResolveOutcome {
    /// Resolved file; `None` for excluded and missing modules
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Resolved { path, .. } => Some(path),
            Self::Excluded { .. } | Self::NotFound { .. } => None,
        }
    }

    pub fn invalidations(&self) -> Option<&InvalidationSet> {
        match self {
            Self::Resolved { invalidations, .. } | Self::Excluded { invalidations, .. } => {
                Some(invalidations)
            }
            Self::NotFound { .. } => None,
        }
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded { .. })
    }
}

/// Importing file as an absolute path
fn importer(dependency: &Dependency, context: &BuildContext<'_>) -> Option<PathBuf> {
    dependency
        .resolve_from
        .as_deref()
        .map(|path| context.project_root.join(path))
}

/// A bundler resolver plugin
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `specifier`, requested by `dependency`, to a file
    async fn resolve(
        &self,
        dependency: &Dependency,
        context: &BuildContext<'_>,
        specifier: &str,
    ) -> Result<ResolveOutcome>;
}

/// Resolver that rewrites `/` and `~` aliases declared in `package.json`
///
/// # Example
///
/// ```rust,no_run
/// use fob_plugin_root::{BuildContext, Dependency, NativeRuntime, Resolver, RootResolver};
/// use std::path::Path;
///
/// # async fn run() -> fob_plugin_root::Result<()> {
/// let runtime = NativeRuntime::new("/proj");
/// let context = BuildContext {
///     runtime: &runtime,
///     project_root: Path::new("/proj"),
/// };
///
/// let dependency = Dependency::new("~/utils/a.js").from_file("/proj/app/index.js");
/// let outcome = RootResolver::default()
///     .resolve(&dependency, &context, &dependency.specifier)
///     .await?;
/// println!("{:?}", outcome.path());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RootResolver {
    options: RootResolverOptions,
    delegate: Arc<dyn ResolutionDelegate>,
}

impl Default for RootResolver {
    fn default() -> Self {
        Self::new(RootResolverOptions::default())
    }
}

impl RootResolver {
    /// Create a resolver backed by [`OxcDelegate`]
    pub fn new(options: RootResolverOptions) -> Self {
        Self::with_delegate(options, Arc::new(OxcDelegate::new()))
    }

    pub fn with_delegate(options: RootResolverOptions, delegate: Arc<dyn ResolutionDelegate>) -> Self {
        Self { options, delegate }
    }

    pub fn options(&self) -> &RootResolverOptions {
        &self.options
    }

    /// Apply alias rewriting only, without calling the delegate
    ///
    /// Returns the specifier to hand to the delegate together with the
    /// invalidations collected during config lookup.
    pub async fn rewrite(
        &self,
        dependency: &Dependency,
        context: &BuildContext<'_>,
        specifier: &str,
    ) -> Result<(String, InvalidationSet)> {
        let Some(resolve_from) = importer(dependency, context) else {
            return Ok((specifier.to_string(), InvalidationSet::new()));
        };

        let locator = ConfigLocator::new(&self.options.config_file_name);
        let lookup = load_alias_config(
            context.runtime,
            &resolve_from,
            self.options.fallback_dir(context.project_root),
            &locator,
            &self.options.config_key,
        )
        .await?;

        let rewritten = match &lookup.table {
            Some(table) => rewrite_specifier(specifier, table, &resolve_from).into_owned(),
            None => specifier.to_string(),
        };
        Ok((rewritten, lookup.invalidations))
    }
}

#[async_trait]
impl Resolver for RootResolver {
    async fn resolve(
        &self,
        dependency: &Dependency,
        context: &BuildContext<'_>,
        specifier: &str,
    ) -> Result<ResolveOutcome> {
        if is_webpack_loader_syntax(&dependency.specifier) {
            return Err(ResolverError::webpack_loader_syntax(&dependency.specifier));
        }

        let (rewritten, plugin_invalidations) = self.rewrite(dependency, context, specifier).await?;

        let request = DelegateRequest {
            specifier: rewritten,
            parent: importer(dependency, context),
            is_url: dependency.is_url,
            env: dependency.env,
            project_root: context.project_root.to_path_buf(),
            extensions: self.options.extensions.clone(),
            main_fields: self.options.main_fields(&dependency.env),
        };

        match self.delegate.resolve(request, context.runtime).await? {
            Some(resolution) if resolution.excluded => Ok(ResolveOutcome::Excluded {
                path: resolution.path,
                invalidations: resolution.invalidations.merged(plugin_invalidations),
            }),
            Some(resolution) => Ok(ResolveOutcome::Resolved {
                path: resolution.path,
                invalidations: resolution.invalidations.merged(plugin_invalidations),
            }),
            None => Ok(ResolveOutcome::NotFound {
                specifier: specifier.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::Resolution;
    use crate::invalidation::FileCreateInvalidation;
    use crate::runtime::MemoryRuntime;
    use parking_lot::Mutex;

    /// Records requests and answers from a fixed list of existing files
    #[derive(Debug, Default)]
    struct RecordingDelegate {
        requests: Mutex<Vec<DelegateRequest>>,
        found: bool,
        excluded: bool,
    }

    #[async_trait]
    impl ResolutionDelegate for RecordingDelegate {
        async fn resolve(
            &self,
            request: DelegateRequest,
            _runtime: &dyn Runtime,
        ) -> Result<Option<Resolution>> {
            let path = request.base_dir().join(&request.specifier);
            self.requests.lock().push(request);
            if !self.found {
                return Ok(None);
            }
            let mut invalidations = InvalidationSet::new();
            invalidations.invalidate_on_file_change(&path);
            if self.excluded {
                return Ok(Some(Resolution::excluded(path, invalidations)));
            }
            Ok(Some(Resolution::new(path, invalidations)))
        }
    }

    fn resolver(found: bool) -> (RootResolver, Arc<RecordingDelegate>) {
        let delegate = Arc::new(RecordingDelegate {
            found,
            ..Default::default()
        });
        let resolver = RootResolver::with_delegate(RootResolverOptions::default(), delegate.clone());
        (resolver, delegate)
    }

    fn project() -> MemoryRuntime {
        MemoryRuntime::new("/proj")
            .with_file("/proj/package.json", r#"{"fob-plugin-root": {"~": "src"}}"#)
            .with_file("/proj/app/index.js", "")
            .with_file("/proj/src/utils/a.js", "")
    }

    #[test]
    fn detects_webpack_loader_syntax() {
        assert!(is_webpack_loader_syntax("imports-loader?$=jquery!./example.js"));
        assert!(is_webpack_loader_syntax("style-loader!css-loader!./a.css"));
        assert!(!is_webpack_loader_syntax("./loader!.js"));
        assert!(!is_webpack_loader_syntax("~/my-loader.js"));
    }

    #[tokio::test]
    async fn rewrites_before_delegating() {
        let runtime = project();
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };
        let (resolver, delegate) = resolver(true);

        let dependency = Dependency::new("~/utils/a.js").from_file("/proj/app/index.js");
        let outcome = resolver
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap();

        let requests = delegate.requests.lock();
        assert_eq!(requests[0].specifier, "../src/utils/a.js");
        assert_eq!(requests[0].main_fields, vec!["source", "browser", "main", "module"]);

        let ResolveOutcome::Resolved {
            path,
            invalidations,
        } = outcome
        else {
            panic!("expected a resolution");
        };
        assert_eq!(path, PathBuf::from("/proj/app/../src/utils/a.js"));

        // delegate invalidations come first
        let changes: Vec<_> = invalidations.on_file_change().collect();
        assert_eq!(changes[0], Path::new("/proj/app/../src/utils/a.js"));
        assert_eq!(changes[1], Path::new("/proj/package.json"));
        let creates: Vec<_> = invalidations.on_file_create().cloned().collect();
        assert_eq!(creates, vec![FileCreateInvalidation::new("/proj/app", "package.json")]);
    }

    #[tokio::test]
    async fn not_found_drops_plugin_invalidations() {
        let runtime = project();
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };
        let (resolver, _) = resolver(false);

        let dependency = Dependency::new("~/missing").from_file("/proj/app/index.js");
        let outcome = resolver
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ResolveOutcome::NotFound {
                specifier: "~/missing".into()
            }
        );
        assert!(outcome.invalidations().is_none());
    }

    #[tokio::test]
    async fn excluded_modules_keep_plugin_invalidations() {
        let runtime = project();
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };
        let delegate = Arc::new(RecordingDelegate {
            found: true,
            excluded: true,
            ..Default::default()
        });
        let resolver = RootResolver::with_delegate(RootResolverOptions::default(), delegate);

        let dependency = Dependency::new("~/utils/a.js").from_file("/proj/app/index.js");
        let outcome = resolver
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap();

        assert!(outcome.is_excluded());
        assert_eq!(outcome.path(), None);
        let changes: Vec<_> = outcome.invalidations().unwrap().on_file_change().collect();
        assert_eq!(changes[1], Path::new("/proj/package.json"));
    }

    #[tokio::test]
    async fn relative_importers_are_anchored_at_the_project_root() {
        let runtime = project();
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };
        let (resolver, delegate) = resolver(true);

        let dependency = Dependency::new("~/utils/a.js").from_file("app/index.js");
        let (rewritten, invalidations) = resolver
            .rewrite(&dependency, &context, &dependency.specifier)
            .await
            .unwrap();
        assert_eq!(rewritten, "../src/utils/a.js");
        assert_eq!(
            invalidations.on_file_change().collect::<Vec<_>>(),
            vec![Path::new("/proj/package.json")]
        );

        resolver
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap();
        let requests = delegate.requests.lock();
        assert_eq!(requests[0].specifier, "../src/utils/a.js");
        assert_eq!(requests[0].parent.as_deref(), Some(Path::new("/proj/app/index.js")));
    }

    #[tokio::test]
    async fn default_delegate_rejects_in_memory_projects() {
        let runtime = project();
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };

        let dependency = Dependency::new("~/utils/a.js").from_file("/proj/app/index.js");
        let err = RootResolver::default()
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ResolverError::UnsupportedRuntime { ref specifier } if specifier == "../src/utils/a.js"
        ));
    }

    #[tokio::test]
    async fn webpack_syntax_fails_before_any_lookup() {
        let runtime = MemoryRuntime::new("/proj")
            .with_file("/proj/package.json", r#"{"fob-plugin-root": {"@": "src"}}"#);
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };
        let (resolver, delegate) = resolver(true);

        let dependency = Dependency::new("style-loader!./a.css").from_file("/proj/index.js");
        let err = resolver
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolverError::WebpackLoaderSyntax { .. }));
        assert!(err.to_string().contains("style-loader!./a.css"));
        assert!(delegate.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn entries_skip_config_lookup() {
        let runtime = MemoryRuntime::new("/proj")
            .with_file("/proj/package.json", r#"{"fob-plugin-root": {"~": 1}}"#);
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };
        let (resolver, delegate) = resolver(true);

        let dependency = Dependency::new("./index.js");
        let outcome = resolver
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap();

        assert_eq!(outcome.path(), Some(Path::new("/proj/./index.js")));
        assert_eq!(delegate.requests.lock()[0].parent, None);
    }

    #[tokio::test]
    async fn scope_hoisting_prefers_module_field() {
        let runtime = project();
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };
        let (resolver, delegate) = resolver(true);

        let dependency = Dependency::new("react")
            .from_file("/proj/app/index.js")
            .with_env(Environment {
                should_scope_hoist: true,
            });
        resolver
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap();

        let requests = delegate.requests.lock();
        assert_eq!(requests[0].specifier, "react");
        assert_eq!(requests[0].main_fields, vec!["source", "browser", "module", "main"]);
    }

    #[tokio::test]
    async fn invalid_config_halts_resolution() {
        let runtime = MemoryRuntime::new("/proj")
            .with_file("/proj/package.json", r#"{"fob-plugin-root": {"~": 1}}"#);
        let context = BuildContext {
            runtime: &runtime,
            project_root: Path::new("/proj"),
        };
        let (resolver, delegate) = resolver(true);

        let dependency = Dependency::new("~/a").from_file("/proj/index.js");
        let err = resolver
            .resolve(&dependency, &context, &dependency.specifier)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolverError::InvalidConfig(_)));
        assert!(delegate.requests.lock().is_empty());
    }
}
