//! Client configuration.
//!
//! Loading, validating, and merging `stencil-maker.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to override.
//!
//! ## Config File Location
//!
//! The file is taken from `--config <path>` when given, otherwise from
//! `stencil-maker.toml` in the working directory if one exists. With neither,
//! stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! base_url = "https://stencil-maker-backend.onrender.com"
//! preview_path = "generate-preview/"
//! stencil_path = "generate-stencil/"
//!
//! [storage]
//! # directory = "/sdcard/Download"   # Tried before the platform directories
//! android_fallback = "/data/user/0/host.exp.exponent/cache/"
//!
//! [share]
//! # command = "xdg-open"             # Omit: no share facility, file is just saved
//! dialog_title = "Your Stencil PDF"
//!
//! [loading]
//! interval_ms = 800
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "stencil-maker.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Rendering service origin and endpoint paths.
    pub server: ServerConfig,
    /// Where downloaded PDFs are written.
    pub storage: StorageConfig,
    /// Share facility handed the written PDF.
    pub share: ShareConfig,
    /// Status text rotation while a request is in flight.
    pub loading: LoadingConfig,
}

impl ClientConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.server.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "server.base_url must start with http:// or https:// (got {base:?})"
            )));
        }
        if self.server.preview_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.preview_path must not be empty".into(),
            ));
        }
        if self.server.stencil_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.stencil_path must not be empty".into(),
            ));
        }
        if self.loading.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "loading.interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub base_url: String,
    pub preview_path: String,
    pub stencil_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://stencil-maker-backend.onrender.com".to_string(),
            preview_path: "generate-preview/".to_string(),
            stencil_path: "generate-stencil/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Explicit directory, probed before the platform cache/document dirs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Last-resort cache directory of the app sandbox, used on Android only.
    pub android_fallback: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: None,
            android_fallback: "/data/user/0/host.exp.exponent/cache/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShareConfig {
    /// Program invoked with the PDF path. Absent means sharing is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Title passed along with the shared file.
    pub dialog_title: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            command: None,
            dialog_title: "Your Stencil PDF".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadingConfig {
    /// Milliseconds between status text changes.
    pub interval_ms: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self { interval_ms: 800 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ClientConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ClientConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ClientConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Pick the config file to read.
///
/// An explicit path always wins (and must exist). Otherwise
/// [`DEFAULT_CONFIG_FILE`] inside `cwd` is used if present.
pub fn locate_config(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = cwd.join(DEFAULT_CONFIG_FILE);
            candidate.is_file().then_some(candidate)
        }
    }
}

/// Load config from `path`, or stock defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Stencil Maker Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Rendering service
# ---------------------------------------------------------------------------
[server]
# Origin of the rendering service.
base_url = "https://stencil-maker-backend.onrender.com"

# Endpoint answering with a raster preview of the gridded image.
preview_path = "generate-preview/"

# Endpoint answering with the multi-page PDF stencil.
stencil_path = "generate-stencil/"

# ---------------------------------------------------------------------------
# Storage for downloaded PDFs
# ---------------------------------------------------------------------------
[storage]
# Directory tried first. When unset, the platform cache directory is used,
# then the documents directory.
# directory = "/sdcard/Download"

# Android only: sandbox cache directory used when the platform reports
# neither a cache nor a documents directory.
android_fallback = "/data/user/0/host.exp.exponent/cache/"

# ---------------------------------------------------------------------------
# Sharing
# ---------------------------------------------------------------------------
[share]
# Program that receives the PDF path once it is written (e.g. "xdg-open").
# When unset, the file is saved and its path printed.
# command = "xdg-open"

# Title passed along with the shared file.
dialog_title = "Your Stencil PDF"

# ---------------------------------------------------------------------------
# Loading messages
# ---------------------------------------------------------------------------
[loading]
# Milliseconds between status message changes while a request is running.
interval_ms = 800
"##
}
