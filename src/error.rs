//! Error types for configuration handling and the server run loop.
//!
//! Tool-level errors live in [`crate::tool::error`]; the types here cover
//! everything around the tools: JSON configuration files and transports.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },

    /// Configuration file could not be written.
    #[error("failed to write configuration file: {path}")]
    WriteError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be serialised.
    #[error("failed to serialise configuration")]
    Serialize(#[source] serde_json::Error),

    /// The home directory could not be determined.
    #[error("could not determine the home directory")]
    HomeDirUnavailable,
}

/// Errors that end [`ToolServer::run`](crate::server::ToolServer::run).
#[derive(Error, Debug)]
pub enum ServerError {
    /// The async runtime could not be created.
    #[error("failed to create async runtime")]
    Runtime(#[source] std::io::Error),

    /// The TCP listener could not be bound.
    #[error("failed to bind {address}")]
    Bind {
        /// Requested `host:port`.
        address: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Transport I/O failed.
    #[error("transport error")]
    Io(#[from] std::io::Error),
}
