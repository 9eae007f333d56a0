// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.
//!
//! Every path that is compared against configuration or used as a cache key
//! goes through [`watch_key`], so matching never depends on platform
//! separators or on how the notifier spelled the absolute prefix.

use std::path::{Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Only if both attempts fail do we give up.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(normalize_key(&rel.to_string_lossy()));
    }

    // macOS reports /private/var/... for /var/... and similar.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(normalize_key(&rel.to_string_lossy()));
        }
    }

    None
}

/// Key under which `path` is matched and cached.
///
/// Paths under `root` become root-relative; anything else (extra include
/// directories outside the project) keeps its absolute, slash-normalized
/// spelling.
pub fn watch_key(root: &Path, path: &Path) -> String {
    relative_str(root, path).unwrap_or_else(|| normalize_key(&path.to_string_lossy()))
}

/// Resolve a key produced by [`watch_key`] back into a filesystem path.
pub fn key_to_path(root: &Path, key: &str) -> PathBuf {
    let p = Path::new(key);
    if p.is_absolute() || key.starts_with('/') {
        p.to_path_buf()
    } else if key.is_empty() {
        root.to_path_buf()
    } else {
        root.join(key)
    }
}

/// Slash-normalize a path string.
///
/// Backslashes become `/`, `./` segments and duplicate separators are
/// dropped, and a trailing `/` is removed (except for a bare `/`).
pub fn normalize_key(raw: &str) -> String {
    let replaced = raw.trim().replace('\\', "/");
    let absolute = replaced.starts_with('/');

    let parts: Vec<&str> = replaced
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Component-wise prefix test: `vendor` covers `vendor` and `vendor/x`, but
/// not `vendor2/x`.
pub fn is_under(prefix: &str, key: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    match key.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}
