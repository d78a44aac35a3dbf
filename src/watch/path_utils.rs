// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path};

/// Convert a path into a string relative to `root`, with forward slashes and
/// a leading `/` (`"/src/main.go"`). The root itself becomes `""`.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` for paths outside `root`, including anything shorter than
/// the root prefix. Callers treat that as "not matching".
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slash_prefixed(rel));
    }

    // Different absolute prefixes can name the same directory (symlinks,
    // /private/var on macOS).
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(slash_prefixed(rel));
        }
    }

    None
}

fn slash_prefixed(rel: &Path) -> String {
    let mut out = String::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            out.push('/');
            out.push_str(&part.to_string_lossy());
        }
    }
    out
}
