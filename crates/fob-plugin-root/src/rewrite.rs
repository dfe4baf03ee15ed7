//! Specifier rewriting
//!
//! `~/utils/a.js` imported from `/proj/app/index.js` with `"~": "src"` in
//! `/proj/package.json` becomes `../src/utils/a.js`. The rewritten specifier
//! is relative to the importing file so the delegate resolver treats it as a
//! path rather than a package name. Importers must be absolute;
//! [`RootResolver`](crate::RootResolver) joins relative ones onto the
//! project root first.

use path_clean::PathClean;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use crate::alias::{AliasPrefix, AliasTable};

/// A specifier rewrite that matched an alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub prefix: AliasPrefix,
    /// Absolute path the specifier points at
    pub target: PathBuf,
    /// Specifier relative to the importer's directory
    pub specifier: String,
}

/// Rewrite `specifier` using the first alias in `table` that it starts with
///
/// Matching is a plain string prefix test in table order; the first match
/// wins even when a later prefix would also match. Returns the input
/// unchanged when nothing matches.
pub fn rewrite_specifier<'a>(specifier: &'a str, table: &AliasTable, importer: &Path) -> Cow<'a, str> {
    match find_rewrite(specifier, table, importer) {
        Some(rewrite) => Cow::Owned(rewrite.specifier),
        None => Cow::Borrowed(specifier),
    }
}

/// Same as [`rewrite_specifier`] but reports which alias applied
pub fn find_rewrite(specifier: &str, table: &AliasTable, importer: &Path) -> Option<Rewrite> {
    let (prefix, target_dir) = table
        .iter()
        .find(|(prefix, _)| specifier.starts_with(prefix.as_str()))?;

    let rest = &specifier[prefix.as_str().len()..];
    let target = target_dir.join(rest.trim_start_matches('/')).clean();

    let from_dir = importer.parent().unwrap_or(importer).clean();
    let specifier = relative_specifier(&target, &from_dir);

    tracing::debug!(
        prefix = %prefix,
        target = %target.display(),
        rewritten = %specifier,
        "rewrote aliased specifier"
    );

    Some(Rewrite {
        prefix,
        target,
        specifier,
    })
}

/// Express `target` relative to `from_dir`, starting with `.`
///
/// Both paths must be absolute (or both relative). Otherwise no relative
/// path exists and `target` is returned as is.
fn relative_specifier(target: &Path, from_dir: &Path) -> String {
    if target.is_absolute() != from_dir.is_absolute() {
        return to_slash(target);
    }
    let Some(relative) = pathdiff::diff_paths(target, from_dir) else {
        return to_slash(target);
    };

    let relative = to_slash(&relative);
    if relative.starts_with('.') {
        relative
    } else {
        format!("./{relative}")
    }
}

/// Join path components with `/` regardless of platform
fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}
