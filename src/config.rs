// src/config.rs

//! Configuration loading utilities.
//!
//! Reads the TOML file (falling back to defaults when it is absent) and
//! applies `MEDIADROP_*` environment overrides on top.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

pub const ENV_HOST: &str = "MEDIADROP_HOST";
pub const ENV_PORT: &str = "MEDIADROP_PORT";
pub const ENV_STORAGE_DIR: &str = "MEDIADROP_STORAGE_DIR";
pub const ENV_YTDLP_BIN: &str = "MEDIADROP_YTDLP_BIN";
pub const ENV_TIMEOUT_SECS: &str = "MEDIADROP_TIMEOUT_SECS";

/// Load configuration from `path` plus process environment overrides.
///
/// A missing file yields defaults; a malformed one is an error.
pub fn load(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)
            .map_err(|e| AppError::config(format!("Failed to load {path:?}: {e}")))?
    } else {
        Config::default()
    };

    apply_env_overrides_from(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Where [`load`] took its values from, for the startup log line.
pub fn describe_source(path: &Path) -> String {
    if path.exists() {
        format!("Loaded configuration from {}", path.display())
    } else {
        format!("No config file at {}, using defaults", path.display())
    }
}

/// Apply overrides looked up through `lookup`.
pub fn apply_env_overrides_from(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(host) = lookup(ENV_HOST) {
        config.server.host = host;
    }
    if let Some(port) = lookup(ENV_PORT) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{ENV_PORT} is not a port: '{port}'")))?;
    }
    if let Some(dir) = lookup(ENV_STORAGE_DIR) {
        config.storage.root_dir = dir.into();
    }
    if let Some(binary) = lookup(ENV_YTDLP_BIN) {
        config.extractor.binary = binary;
    }
    if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
        config.extractor.timeout_secs = secs.trim().parse().map_err(|_| {
            AppError::config(format!("{ENV_TIMEOUT_SECS} is not a number: '{secs}'"))
        })?;
    }
    Ok(())
}
