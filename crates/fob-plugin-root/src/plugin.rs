//! Rolldown integration
//!
//! Only available with the `rolldown` feature. Wraps [`RootResolver`] as a
//! `resolve_id` hook so aliased imports resolve inside a Rolldown build.

use anyhow::Context;
use rolldown_common::ResolvedExternal;
use rolldown_plugin::{
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use crate::delegate::Environment;
use crate::options::RootResolverOptions;
use crate::resolver::{BuildContext, Dependency, ResolveOutcome, Resolver, RootResolver};
use crate::runtime::{NativeRuntime, Runtime};

/// Rolldown plugin resolving `/` and `~` aliases
#[derive(Debug, Clone)]
pub struct RootResolverPlugin {
    resolver: Arc<RootResolver>,
    runtime: Arc<dyn Runtime>,
    project_root: PathBuf,
    env: Environment,
}

impl RootResolverPlugin {
    /// Plugin reading from the real filesystem under `project_root`
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            resolver: Arc::new(RootResolver::default()),
            runtime: Arc::new(NativeRuntime::new(project_root.clone())),
            project_root,
            env: Environment {
                should_scope_hoist: true,
            },
        }
    }

    pub fn with_options(mut self, options: RootResolverOptions) -> Self {
        self.resolver = Arc::new(RootResolver::new(options));
        self
    }

    pub fn with_resolver(mut self, resolver: RootResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Rolldown output is always scope hoisted; set `false` to prefer `main`
    pub fn with_scope_hoisting(mut self, enabled: bool) -> Self {
        self.env.should_scope_hoist = enabled;
        self
    }

    fn dependency(&self, specifier: &str, importer: Option<&str>) -> Dependency {
        let dependency = Dependency::new(specifier).with_env(self.env);
        match importer {
            // Virtual modules have no location on disk
            Some(importer) if !importer.starts_with('\0') => {
                dependency.from_file(self.project_root.join(importer))
            }
            _ => dependency,
        }
    }
}

impl Plugin for RootResolverPlugin {
    fn name(&self) -> Cow<'static, str> {
        "fob-plugin-root".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let dependency = self.dependency(args.specifier, args.importer);
        let resolver = Arc::clone(&self.resolver);
        let runtime = Arc::clone(&self.runtime);
        let project_root = self.project_root.clone();

        async move {
            let context = BuildContext {
                runtime: runtime.as_ref(),
                project_root: &project_root,
            };

            let outcome = resolver
                .resolve(&dependency, &context, &dependency.specifier)
                .await
                .with_context(|| format!("Failed to resolve '{}'", dependency.specifier))?;

            match outcome {
                ResolveOutcome::Resolved { path, .. } => Ok(Some(HookResolveIdOutput {
                    id: path.to_string_lossy().into_owned().into(),
                    external: Some(ResolvedExternal::Bool(false)),
                    ..Default::default()
                })),
                // Rolldown has no empty-module result; its own resolver
                // applies `browser: false` maps
                ResolveOutcome::Excluded { .. } | ResolveOutcome::NotFound { .. } => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn importer_becomes_resolve_from() {
        let plugin = RootResolverPlugin::new("/proj");

        let dependency = plugin.dependency("~/a", Some("src/index.ts"));
        assert_eq!(
            dependency.resolve_from.as_deref(),
            Some(Path::new("/proj/src/index.ts"))
        );
        assert!(dependency.env.should_scope_hoist);

        let plugin = plugin.with_scope_hoisting(false);
        assert!(!plugin.dependency("~/a", None).env.should_scope_hoist);

        let absolute = plugin.dependency("~/a", Some("/elsewhere/main.ts"));
        assert_eq!(
            absolute.resolve_from.as_deref(),
            Some(Path::new("/elsewhere/main.ts"))
        );
    }

    #[test]
    fn entries_and_virtual_importers_have_no_origin() {
        let plugin = RootResolverPlugin::new("/proj");
        assert!(plugin.dependency("./main.ts", None).resolve_from.is_none());
        assert!(
            plugin
                .dependency("~/a", Some("\0virtual:entry"))
                .resolve_from
                .is_none()
        );
        assert_eq!(plugin.name(), "fob-plugin-root");
    }
}
