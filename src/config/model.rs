// src/config/model.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Deserialize;

use crate::watch::path_utils::is_under;

/// Default build command; the output name and forwarded CLI arguments are
/// appended as `-o <name> <args...>`.
pub const DEFAULT_BUILD_COMMAND: [&str; 2] = ["go", "build"];

/// Default extension of files that count as build sources.
pub const DEFAULT_SOURCE_EXTENSION: &str = "go";

/// Default port exported to the application through `XRUN_WEB_PORT`.
pub const DEFAULT_WEB_PORT: u16 = 53126;

/// Configuration as read from `xrun.json` / `xrun.toml`.
///
/// ```json
/// {
///     "Mode": 3,
///     "ExcludeDirs": { ".git": true, "vendor": true },
///     "ExcludeFiles": { "gen/bindata.go": true },
///     "IncludeFiles": { "templates/index.html": true },
///     "IncludeDirs": { "../shared": true }
/// }
/// ```
///
/// Path maps only take effect for entries whose value is `true`. Lower-camel
/// keys (`excludeDirs`, ...) are accepted too.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Verbosity level; see [`crate::logging::level_from_mode`].
    #[serde(rename = "Mode", alias = "mode", default)]
    pub mode: u8,

    #[serde(
        rename = "ExcludeDirs",
        alias = "excludeDirs",
        default = "default_exclude_dirs"
    )]
    pub exclude_dirs: BTreeMap<String, bool>,

    #[serde(rename = "ExcludeFiles", alias = "excludeFiles", default)]
    pub exclude_files: BTreeMap<String, bool>,

    #[serde(rename = "IncludeFiles", alias = "includeFiles", default)]
    pub include_files: BTreeMap<String, bool>,

    #[serde(rename = "IncludeDirs", alias = "includeDirs", default)]
    pub include_dirs: BTreeMap<String, bool>,

    /// Program + leading arguments of the build command.
    #[serde(rename = "BuildCommand", alias = "buildCommand", default)]
    pub build_command: Option<Vec<String>>,

    /// Extension (without the dot) of files that count as build sources.
    #[serde(rename = "SourceExtension", alias = "sourceExtension", default)]
    pub source_extension: Option<String>,

    #[serde(rename = "WebPort", alias = "webPort", default)]
    pub web_port: Option<u16>,
}

fn default_exclude_dirs() -> BTreeMap<String, bool> {
    BTreeMap::from([(".git".to_string(), true), (".svn".to_string(), true)])
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            mode: 0,
            exclude_dirs: default_exclude_dirs(),
            exclude_files: BTreeMap::new(),
            include_files: BTreeMap::new(),
            include_dirs: BTreeMap::new(),
            build_command: None,
            source_extension: None,
            web_port: None,
        }
    }
}

/// Validated, normalized configuration.
///
/// Constructed via [`Config::from_raw`], which also enforces that every path
/// is a root-relative, slash-normalized key. Read-only after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: u8,
    pub exclude_dirs: BTreeSet<String>,
    pub exclude_files: BTreeSet<String>,
    pub include_files: BTreeSet<String>,
    /// Absolute paths of extra directories to watch.
    pub include_dirs: Vec<PathBuf>,
    pub build_command: Vec<String>,
    pub source_extension: String,
    pub web_port: u16,
    /// File the config was loaded from (`None` when defaults were used).
    pub source: Option<PathBuf>,
}

impl Config {
    /// True if `key` is, or is nested under, an excluded directory.
    pub fn is_excluded_dir(&self, key: &str) -> bool {
        self.exclude_dirs.iter().any(|dir| is_under(dir, key))
    }

    pub fn is_excluded_file(&self, key: &str) -> bool {
        self.exclude_files.contains(key)
    }

    pub fn is_included_file(&self, key: &str) -> bool {
        self.include_files.contains(key)
    }

    /// True if `key` has the build-source extension.
    pub fn is_source_file(&self, key: &str) -> bool {
        std::path::Path::new(key)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.source_extension)
    }
}
