//! Configuration file loading.
//!
//! This module handles loading docroot configuration from TOML files
//! at XDG-compliant locations.

use crate::config::types::DocrootConfig;
use crate::error::DocrootError;
use std::path::{Path, PathBuf};

/// Default configuration file name for project-local config.
const LOCAL_CONFIG_NAME: &str = "docroot.toml";

/// Default configuration file name within XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
const APP_NAME: &str = "docroot";

/// Loads configuration from the default search paths.
///
/// Search order:
/// 1. `./docroot.toml` (project-local)
/// 2. `~/.config/docroot/config.toml` (XDG config)
///
/// Returns the default configuration if no config file is found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed or is
/// invalid.
pub fn load() -> Result<DocrootConfig, DocrootError> {
    for path in search_paths() {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading configuration");
            return from_path(&path);
        }
    }

    Ok(DocrootConfig::default())
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file contains invalid TOML
/// - The TOML doesn't match the expected schema
/// - A value is out of range
pub fn from_path(path: &Path) -> Result<DocrootConfig, DocrootError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        DocrootError::configuration("config_file", format!("failed to read '{}': {}", path.display(), e))
    })?;

    let config: DocrootConfig = toml::from_str(&contents).map_err(|e| {
        DocrootError::configuration("config_file", format!("failed to parse '{}': {}", path.display(), e))
    })?;
    config.validate()?;
    Ok(config)
}

/// Parses and validates configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid, doesn't match the schema, or
/// fails [`DocrootConfig::validate`].
pub fn from_str(toml_str: &str) -> Result<DocrootConfig, DocrootError> {
    let config: DocrootConfig = toml::from_str(toml_str)
        .map_err(|e| DocrootError::configuration("config", format!("invalid TOML: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Returns the paths that would be searched for configuration files.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];

    if let Some(dir) = xdg_config_dir() {
        paths.push(dir.join(XDG_CONFIG_NAME));
    }

    paths
}

/// Returns the path to the XDG config directory for docroot.
///
/// This is `~/.config/docroot` on most systems.
#[must_use]
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}
