//! Resolver configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::delegate::Environment;

/// Top-level `package.json` key holding the alias map
pub const DEFAULT_CONFIG_KEY: &str = "fob-plugin-root";

/// File searched for during config lookup
pub const DEFAULT_CONFIG_FILE: &str = "package.json";

/// Extensions tried by the delegate, in order
pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "json", "css", "styl", "vue"];

/// Options for [`RootResolver`](crate::RootResolver)
///
/// # Example
///
/// ```rust
/// use fob_plugin_root::RootResolverOptions;
///
/// let options = RootResolverOptions::new()
///     .with_config_key("my-aliases")
///     .with_extensions(["ts", "js"]);
///
/// assert_eq!(options.config_key, "my-aliases");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RootResolverOptions {
    /// Extensions without the leading dot
    pub extensions: Vec<String>,

    /// Key inside `package.json` that holds the alias map
    pub config_key: String,

    /// Name of the config file looked up on the way to the root
    pub config_file_name: String,

    /// Directory where the second lookup starts when the importer's own
    /// ancestors carry no alias config
    ///
    /// Defaults to the project root of each request.
    pub fallback_config_dir: Option<PathBuf>,
}

impl Default for RootResolverOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            config_key: DEFAULT_CONFIG_KEY.to_string(),
            config_file_name: DEFAULT_CONFIG_FILE.to_string(),
            fallback_config_dir: None,
        }
    }
}

impl RootResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the extension list
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| {
                let e: String = e.into();
                e.trim_start_matches('.').to_string()
            })
            .collect();
        self
    }

    pub fn with_config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = key.into();
        self
    }

    pub fn with_config_file_name(mut self, name: impl Into<String>) -> Self {
        self.config_file_name = name.into();
        self
    }

    pub fn with_fallback_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_config_dir = Some(dir.into());
        self
    }

    /// Where the fallback lookup starts for a given project root
    pub fn fallback_dir<'a>(&'a self, project_root: &'a Path) -> &'a Path {
        self.fallback_config_dir.as_deref().unwrap_or(project_root)
    }

    /// Main fields in lookup order
    ///
    /// `source` and `browser` always come first. With scope hoisting the ESM
    /// entry (`module`) is preferred over `main`, otherwise `main` wins.
    pub fn main_fields(&self, env: &Environment) -> Vec<String> {
        let tail: [&str; 2] = if env.should_scope_hoist {
            ["module", "main"]
        } else {
            ["main", "module"]
        };
        ["source", "browser"]
            .into_iter()
            .chain(tail)
            .map(String::from)
            .collect()
    }
}
