//! Settings file loading and parsing.
//!
//! Settings control how a [`ToolServer`](crate::server::ToolServer) runs:
//! its name, instructions, transport and log level. They are optional;
//! every field has a default.
//!
//! # Settings File Locations
//!
//! 1. An explicit path passed to [`load_settings`]
//! 2. Default location:
//!    - **Linux/macOS:** `~/.fnmcp/settings.json`
//!    - **Windows:** `%USERPROFILE%\.fnmcp\settings.json`

mod settings;

pub use settings::{LogLevel, RunOptions, ServerConfig, Settings, TransportKind};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

/// Returns the default settings directory.
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".fnmcp"))
}

/// Returns the platform-specific default settings file path.
#[must_use]
pub fn default_settings_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("settings.json"))
}

/// Loads and validates a settings file.
///
/// An explicit `path` must exist. Without one, the default location is
/// tried and a missing file yields [`Settings::default`].
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given file does not exist
/// - The file cannot be read
/// - The JSON is malformed or has unknown fields
/// - Validation fails
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_settings_path() {
            Some(p) if p.exists() => p,
            _ => {
                debug!("No settings file found, using defaults");
                return Ok(Settings::default());
            }
        },
    };

    let contents = std::fs::read_to_string(&settings_path).map_err(|e| ConfigError::ReadError {
        path: settings_path.clone(),
        source: e,
    })?;

    let settings: Settings =
        serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: settings_path.clone(),
            source: e,
        })?;

    settings.validate()?;
    debug!(path = %settings_path.display(), "Loaded settings");

    Ok(settings)
}
