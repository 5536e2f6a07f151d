//! Settings structures for deserialisation.
//!
//! These structures map directly to the JSON settings file format.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::ConfigError;
use crate::mcp::transport::{Transport, DEFAULT_HOST, DEFAULT_PORT};

/// Root settings structure.
///
/// This is the top-level structure that matches the JSON settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Server identity settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// How the server runs.
    #[serde(default)]
    pub run: RunOptions,
}

impl Settings {
    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "server name must not be empty".to_string(),
            });
        }
        self.run.validate()
    }
}

/// Server identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Name reported to clients.
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Usage instructions reported to clients.
    #[serde(default)]
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            instructions: None,
        }
    }
}

fn default_server_name() -> String {
    "fnmcp".to_string()
}

/// Transport selector as written in settings files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// stdin / stdout.
    #[default]
    Stdio,
    /// Newline-delimited JSON-RPC over TCP.
    Tcp,
}

/// Options for [`ToolServer::run`](crate::server::ToolServer::run).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunOptions {
    /// Which transport to serve on.
    #[serde(default)]
    pub transport: TransportKind,

    /// Bind address; only used by the TCP transport.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port; only used by the TCP transport.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enables verbose diagnostics regardless of `log_level`.
    #[serde(default)]
    pub debug: bool,

    /// Minimum severity to log.
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            host: default_host(),
            port: default_port(),
            debug: false,
            log_level: LogLevel::default(),
        }
    }
}

impl RunOptions {
    /// Options for the TCP transport on `host:port`.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            transport: TransportKind::Tcp,
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Resolves the transport these options select.
    #[must_use]
    pub fn transport(&self) -> Transport {
        match self.transport {
            TransportKind::Stdio => Transport::Stdio,
            TransportKind::Tcp => Transport::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }

    /// The level the subscriber should be installed at.
    #[must_use]
    pub fn effective_level(&self) -> Level {
        let level = self.log_level.as_tracing();
        if self.debug && level < Level::DEBUG {
            Level::DEBUG
        } else {
            level
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP transport is selected with an empty host
    /// or port zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport == TransportKind::Tcp {
            if self.host.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: "TCP transport requires a host".to_string(),
                });
            }
            if self.port == 0 {
                return Err(ConfigError::ValidationError {
                    message: "TCP transport requires a non-zero port".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Standard log severities.
///
/// Parsed case-insensitively; `warning` and `critical` are accepted as
/// aliases for `warn` and `error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Diagnostics.
    Debug,
    /// Lifecycle events.
    Info,
    /// Problems that do not stop the server.
    #[default]
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Converts to the matching `tracing` level.
    #[must_use]
    pub const fn as_tracing(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    // `Self::Error` would name the associated type here
    #[allow(clippy::use_self)]
    fn try_from(value: String) -> Result<Self, String> {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "critical" => Ok(LogLevel::Error),
            _ => Err(format!(
                "invalid log level '{value}'; expected one of trace, debug, info, warn, error"
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tracing().as_str())
    }
}
