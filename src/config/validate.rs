// src/config/validate.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::model::{
    Config, RawConfigFile, DEFAULT_BUILD_COMMAND, DEFAULT_SOURCE_EXTENSION, DEFAULT_WEB_PORT,
};
use crate::errors::{Result, XrunError};
use crate::watch::path_utils::{normalize_key, relative_str};

impl Config {
    /// Validate `raw` and normalize every path against `root`.
    ///
    /// `root` should already be canonical; it is the directory keys are made
    /// relative to.
    pub fn from_raw(raw: RawConfigFile, root: &Path) -> Result<Config> {
        let exclude_dirs = relative_keys("ExcludeDirs", &raw.exclude_dirs, root)?;
        let exclude_files = relative_keys("ExcludeFiles", &raw.exclude_files, root)?;
        let include_files = relative_keys("IncludeFiles", &raw.include_files, root)?;
        let include_dirs = include_dir_paths(&raw.include_dirs, root)?;

        let build_command = match raw.build_command {
            Some(cmd) => cmd,
            None => DEFAULT_BUILD_COMMAND.iter().map(|s| s.to_string()).collect(),
        };
        if build_command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(XrunError::ConfigError(
                "BuildCommand must name a program".to_string(),
            ));
        }

        let source_extension = raw
            .source_extension
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .unwrap_or_else(|| DEFAULT_SOURCE_EXTENSION.to_string());
        if source_extension.is_empty() {
            return Err(XrunError::ConfigError(
                "SourceExtension must not be empty".to_string(),
            ));
        }

        Ok(Config {
            mode: raw.mode,
            exclude_dirs,
            exclude_files,
            include_files,
            include_dirs,
            build_command,
            source_extension,
            web_port: raw.web_port.unwrap_or(DEFAULT_WEB_PORT),
            source: None,
        })
    }
}

/// Active entries of `map`, as root-relative keys.
fn relative_keys(
    field: &str,
    map: &BTreeMap<String, bool>,
    root: &Path,
) -> Result<BTreeSet<String>> {
    let mut keys = BTreeSet::new();
    for (raw, _) in map.iter().filter(|(_, active)| **active) {
        let key = to_relative_key(raw, root).ok_or_else(|| {
            XrunError::ConfigError(format!(
                "{field} entry '{raw}' is outside the project root {}",
                root.display()
            ))
        })?;
        if key.is_empty() {
            return Err(XrunError::ConfigError(format!(
                "{field} entry '{raw}' does not name a path below the project root"
            )));
        }
        keys.insert(key);
    }
    Ok(keys)
}

/// Active `IncludeDirs` entries as absolute paths. Entries outside the root
/// are allowed here; they are the reason this option exists.
fn include_dir_paths(map: &BTreeMap<String, bool>, root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for (raw, _) in map.iter().filter(|(_, active)| **active) {
        if raw.trim().is_empty() {
            return Err(XrunError::ConfigError(
                "IncludeDirs entry must not be empty".to_string(),
            ));
        }
        let path = Path::new(raw.trim());
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        // Resolve `..` where the directory exists; keep the spelling otherwise
        // and let watch registration report it.
        let abs = abs.canonicalize().unwrap_or(abs);
        if !dirs.contains(&abs) {
            dirs.push(abs);
        }
    }
    Ok(dirs)
}

/// Turn a configured path into a root-relative key, or `None` if it points
/// outside `root`.
fn to_relative_key(raw: &str, root: &Path) -> Option<String> {
    let trimmed = raw.trim();
    let path = Path::new(trimmed);
    if path.is_absolute() {
        return relative_str(root, path);
    }
    let key = normalize_key(trimmed);
    if key.split('/').any(|seg| seg == "..") {
        return None;
    }
    Some(key)
}
