//! # fob-plugin-root
//!
//! Resolver plugin that rewrites root (`/`) and home (`~`) import aliases.
//!
//! Aliases are declared in `package.json` under the `fob-plugin-root` key:
//!
//! ```json
//! {
//!   "name": "my-app",
//!   "fob-plugin-root": {
//!     "~": "src",
//!     "/": "."
//!   }
//! }
//! ```
//!
//! With that config, `import "~/utils/a.js"` from `app/index.js` is rewritten
//! to `../src/utils/a.js` and then resolved by the delegate resolver
//! (`oxc_resolver` by default) with the usual extension probing and
//! `package.json` main-field selection.
//!
//! ## Lookup
//!
//! The nearest `package.json` above the importing file is used when it has the
//! key. Otherwise a second lookup starts at the project root (or
//! [`RootResolverOptions::fallback_config_dir`]). No config at all is fine:
//! the specifier is passed through unchanged.
//!
//! Every resolution reports the config files it read and the directories
//! where a new `package.json` would change the outcome, see
//! [`InvalidationSet`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use fob_plugin_root::{
//!     BuildContext, Dependency, NativeRuntime, ResolveOutcome, Resolver, RootResolver,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> fob_plugin_root::Result<()> {
//! let runtime = NativeRuntime::new("/proj");
//! let context = BuildContext {
//!     runtime: &runtime,
//!     project_root: Path::new("/proj"),
//! };
//!
//! let resolver = RootResolver::default();
//! let dependency = Dependency::new("~/utils/a").from_file("/proj/app/index.js");
//!
//! if let ResolveOutcome::Resolved { path, invalidations } =
//!     resolver.resolve(&dependency, &context, &dependency.specifier).await?
//! {
//!     println!("{} ({} files watched)", path.display(), invalidations.file_change_len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `rolldown`: [`RootResolverPlugin`], a Rolldown `resolve_id` plugin
//! - `logging`: `logging::init_logging` helpers built on `tracing-subscriber`

pub mod alias;
pub mod config;
pub mod delegate;
mod error;
pub mod invalidation;
pub mod options;
pub mod resolver;
pub mod rewrite;
pub mod runtime;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "rolldown")]
mod plugin;

pub use alias::{AliasPrefix, AliasTable};
pub use config::{AliasLookup, ConfigLocator, LocatedConfig, SchemaError, load_alias_config};
pub use delegate::{DelegateRequest, Environment, OxcDelegate, Resolution, ResolutionDelegate};
pub use error::{ResolverError, Result};
pub use invalidation::{FileCreateInvalidation, InvalidationSet};
pub use options::RootResolverOptions;
pub use resolver::{BuildContext, Dependency, ResolveOutcome, Resolver, RootResolver};
pub use rewrite::{Rewrite, find_rewrite, rewrite_specifier};
pub use runtime::{FileMetadata, MemoryRuntime, NativeRuntime, Runtime, RuntimeError, RuntimeResult};

#[cfg(feature = "rolldown")]
pub use plugin::RootResolverPlugin;
