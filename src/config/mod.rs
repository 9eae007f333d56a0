// src/config/mod.rs

//! Configuration loading and validation for xrun.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Normalize paths to root-relative keys (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{find_config_file, load_for_root, load_from_path, CONFIG_FILE_NAMES};
pub use model::{Config, RawConfigFile};
