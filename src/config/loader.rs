// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{Config, RawConfigFile};
use crate::errors::Result;

/// Config file names looked up in the project root, in priority order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["xrun.json", "xrun.toml"];

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// The format is chosen by extension: `.toml` is TOML, anything else JSON.
/// This only performs deserialization; see [`Config::from_raw`] for
/// normalization.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config = if is_toml {
        toml::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };

    Ok(config)
}

/// First existing config file in `root`, if any.
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Load the project config for `root`, falling back to defaults when no
/// config file exists.
///
/// A config file that exists but fails to parse or validate is an error;
/// callers treat that as fatal.
pub fn load_for_root(root: &Path) -> Result<Config> {
    match find_config_file(root) {
        Some(path) => {
            let raw = load_from_path(&path)?;
            let mut config = Config::from_raw(raw, root)?;
            config.source = Some(path);
            Ok(config)
        }
        None => {
            debug!(root = %root.display(), "no config file found; using defaults");
            Config::from_raw(RawConfigFile::default(), root)
        }
    }
}
