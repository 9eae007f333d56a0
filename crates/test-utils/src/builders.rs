#![allow(dead_code)]

use std::path::Path;

use xrun::config::{Config, RawConfigFile};

/// Builder for `Config` to simplify test setup.
///
/// Starts from the same defaults as a missing config file.
pub struct ConfigBuilder {
    raw: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfigFile::default(),
        }
    }

    pub fn mode(mut self, mode: u8) -> Self {
        self.raw.mode = mode;
        self
    }

    pub fn exclude_dir(mut self, path: &str) -> Self {
        self.raw.exclude_dirs.insert(path.to_string(), true);
        self
    }

    pub fn exclude_file(mut self, path: &str) -> Self {
        self.raw.exclude_files.insert(path.to_string(), true);
        self
    }

    pub fn include_file(mut self, path: &str) -> Self {
        self.raw.include_files.insert(path.to_string(), true);
        self
    }

    /// Add an entry with `false`, which must have no effect.
    pub fn inactive_include_file(mut self, path: &str) -> Self {
        self.raw.include_files.insert(path.to_string(), false);
        self
    }

    pub fn include_dir(mut self, path: &str) -> Self {
        self.raw.include_dirs.insert(path.to_string(), true);
        self
    }

    pub fn build_command(mut self, cmd: &[&str]) -> Self {
        self.raw.build_command = Some(cmd.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn source_extension(mut self, ext: &str) -> Self {
        self.raw.source_extension = Some(ext.to_string());
        self
    }

    pub fn web_port(mut self, port: u16) -> Self {
        self.raw.web_port = Some(port);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.raw
    }

    pub fn build(self, root: &Path) -> Config {
        Config::from_raw(self.raw, root).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
