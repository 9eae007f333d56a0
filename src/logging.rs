// src/logging.rs

//! Logging setup for `xrun` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `XRUN_LOG` environment variable (e.g. "info", "debug")
//! 2. `Mode` from the config file (1 = trace ... 5 = error)
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that the supervised application owns stdout.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable that overrides the configured verbosity.
pub const LOG_ENV_VAR: &str = "XRUN_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(mode: u8) -> Result<()> {
    let level = std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|s| parse_level_str(&s))
        .or_else(|| level_from_mode(mode))
        .unwrap_or(Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Map the config `Mode` value to a level.
///
/// `0` means "not set". Anything above the critical level clamps to error.
pub fn level_from_mode(mode: u8) -> Option<Level> {
    match mode {
        0 => None,
        1 => Some(Level::TRACE),
        2 => Some(Level::DEBUG),
        3 => Some(Level::INFO),
        4 => Some(Level::WARN),
        _ => Some(Level::ERROR),
    }
}

pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
