//! Error types for the root resolver

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::SchemaError;
use crate::runtime::RuntimeError;

pub type Result<T> = std::result::Result<T, ResolverError>;

/// Errors that stop resolution of a dependency
#[derive(Debug, Error, Diagnostic)]
pub enum ResolverError {
    /// Webpack-style loader chains (`style-loader!./a.css`)
    #[error(
        "The import path: {specifier} is using webpack specific loader import syntax, which isn't supported by fob."
    )]
    #[diagnostic(
        code(fob::root::webpack_loader_syntax),
        help("Remove the loader prefix and register a fob plugin for this file type instead")
    )]
    WebpackLoaderSyntax { specifier: String },

    /// Alias configuration failed schema validation
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidConfig(#[from] SchemaError),

    /// A `package.json` on the lookup path is not valid JSON
    #[error("Failed to parse {}: {message}", path.display())]
    #[diagnostic(code(fob::root::invalid_package_json))]
    InvalidPackageJson {
        path: PathBuf,
        message: String,
        #[source_code]
        source_code: NamedSource<String>,
        #[label("invalid JSON")]
        span: Option<SourceSpan>,
    },

    /// Filesystem access failed
    #[error(transparent)]
    #[diagnostic(code(fob::root::runtime))]
    Runtime(#[from] RuntimeError),

    /// The delegate resolver failed for a reason other than "not found"
    #[error("Failed to resolve '{specifier}': {message}")]
    #[diagnostic(code(fob::root::delegate))]
    Delegate { specifier: String, message: String },

    /// The delegate cannot read the build's runtime
    #[error("Cannot resolve '{specifier}': the oxc delegate only reads the native filesystem")]
    #[diagnostic(
        code(fob::root::unsupported_runtime),
        help("Use NativeRuntime, or pass a ResolutionDelegate that reads through the runtime")
    )]
    UnsupportedRuntime { specifier: String },
}

impl ResolverError {
    pub fn webpack_loader_syntax(specifier: impl Into<String>) -> Self {
        Self::WebpackLoaderSyntax {
            specifier: specifier.into(),
        }
    }

    pub fn delegate(specifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delegate {
            specifier: specifier.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_runtime(specifier: impl Into<String>) -> Self {
        Self::UnsupportedRuntime {
            specifier: specifier.into(),
        }
    }
}
