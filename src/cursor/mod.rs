//! Registration of servers in the Cursor editor's MCP configuration.
//!
//! The editor reads `mcp.json` from a per-platform directory:
//!
//! - **macOS:** `~/.cursor/mcp.json`
//! - **Windows:** `~/AppData/Roaming/cursor/mcp.json`
//! - **Other:** `~/.config/cursor/mcp.json`
//!
//! A missing file is treated as `{"mcpServers": {}}`. Rewrites keep entry
//! order and any keys this module does not know about.

mod document;

pub use document::{McpConfigFile, ServerEntry};

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::ConfigError;

/// Returns the editor's configuration directory under `home` for `os`
/// (as reported by [`std::env::consts::OS`]).
#[must_use]
pub fn config_dir_in(home: &Path, os: &str) -> PathBuf {
    match os {
        "macos" => home.join(".cursor"),
        "windows" => home.join("AppData").join("Roaming").join("cursor"),
        _ => home.join(".config").join("cursor"),
    }
}

/// Returns the `mcp.json` path for the current user and platform.
///
/// # Errors
///
/// Returns [`ConfigError::HomeDirUnavailable`] if the home directory is unknown.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirUnavailable)?;
    Ok(config_dir_in(&home, std::env::consts::OS).join("mcp.json"))
}

/// An `mcp.json` file loaded for editing.
#[derive(Debug, Clone)]
pub struct CursorConfig {
    path: PathBuf,
    document: McpConfigFile,
}

impl CursorConfig {
    /// Loads the file at `path`, or an empty configuration if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        if !path.exists() {
            debug!(path = %path.display(), "No MCP configuration yet");
            return Ok(Self {
                path,
                document: McpConfigFile::default(),
            });
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;
        let document = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;

        Ok(Self { path, document })
    }

    /// Returns the file this configuration is read from and saved to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the parsed document.
    #[must_use]
    pub const fn document(&self) -> &McpConfigFile {
        &self.document
    }

    /// Adds or replaces a server entry, returning the one it replaced.
    pub fn add_server(&mut self, name: impl Into<String>, entry: ServerEntry) -> Option<ServerEntry> {
        self.document.servers.insert(name.into(), entry)
    }

    /// Removes a server entry, keeping the order of the rest.
    pub fn remove_server(&mut self, name: &str) -> Option<ServerEntry> {
        self.document.servers.shift_remove(name)
    }

    /// Looks up a server entry.
    #[must_use]
    pub fn server(&self, name: &str) -> Option<&ServerEntry> {
        self.document.servers.get(name)
    }

    /// Returns registered server names in file order.
    #[must_use]
    pub fn server_names(&self) -> Vec<&str> {
        self.document.servers.keys().map(String::as_str).collect()
    }

    /// Writes the configuration back, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut contents =
            serde_json::to_string_pretty(&self.document).map_err(ConfigError::Serialize)?;
        contents.push('\n');

        std::fs::write(&self.path, contents).map_err(|e| ConfigError::WriteError {
            path: self.path.clone(),
            source: e,
        })?;

        info!(path = %self.path.display(), servers = self.document.servers.len(), "Saved MCP configuration");
        Ok(())
    }
}

/// Builder for a launch entry.
///
/// Relative paths are resolved against the current directory when the entry
/// is built, so the editor can launch the server from anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerRegistration {
    command: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: IndexMap<String, String>,
}

impl ServerRegistration {
    /// Starts a registration for `command`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Appends arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Resolves paths and produces the entry.
    ///
    /// A command naming an existing relative path becomes absolute; a bare
    /// program name such as `python` is left for the editor to find on
    /// `PATH`. Without an explicit working directory, the command's own
    /// directory is used when the command is a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn into_entry(self) -> Result<ServerEntry, ConfigError> {
        let current_dir = || {
            std::env::current_dir().map_err(|e| ConfigError::ReadError {
                path: PathBuf::from("."),
                source: e,
            })
        };

        let command_path = Path::new(&self.command);
        let resolved = if command_path.is_absolute() {
            Some(command_path.to_path_buf())
        } else if command_path.exists() {
            Some(current_dir()?.join(command_path))
        } else {
            None
        };

        let cwd = match self.cwd {
            Some(dir) if dir.is_absolute() => Some(dir),
            Some(dir) => Some(current_dir()?.join(dir)),
            None => resolved
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_path_buf),
        };

        let command = resolved.map_or(self.command, |p| p.to_string_lossy().into_owned());

        Ok(ServerEntry {
            command: Some(command),
            args: self.args,
            cwd: cwd.map(|p| p.to_string_lossy().into_owned()),
            env: self.env,
            extra: serde_json::Map::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_directories() {
        let home = Path::new("/home/ada");
        assert_eq!(config_dir_in(home, "macos"), home.join(".cursor"));
        assert_eq!(
            config_dir_in(home, "windows"),
            home.join("AppData").join("Roaming").join("cursor")
        );
        assert_eq!(config_dir_in(home, "linux"), home.join(".config").join("cursor"));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = CursorConfig::load(dir.path().join("mcp.json")).unwrap();
        assert!(config.server_names().is_empty());
    }

    #[test]
    fn bare_program_stays_on_path() {
        let entry = ServerRegistration::new("definitely-not-a-local-file")
            .args(["serve"])
            .into_entry()
            .unwrap();
        assert_eq!(entry.command.as_deref(), Some("definitely-not-a-local-file"));
        assert_eq!(entry.args, ["serve"]);
        assert!(entry.cwd.is_none());
    }

    #[test]
    fn absolute_command_sets_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("server");
        std::fs::write(&binary, b"").unwrap();

        let entry = ServerRegistration::new(binary.to_string_lossy())
            .env("RUST_LOG", "debug")
            .into_entry()
            .unwrap();
        assert_eq!(entry.cwd.as_deref(), Some(&*dir.path().to_string_lossy()));
        assert_eq!(entry.env["RUST_LOG"], "debug");
    }

    #[test]
    fn explicit_cwd_wins() {
        let entry = ServerRegistration::new("/opt/tools/server")
            .cwd("/srv")
            .into_entry()
            .unwrap();
        assert_eq!(entry.command.as_deref(), Some("/opt/tools/server"));
        assert_eq!(entry.cwd.as_deref(), Some("/srv"));
    }
}
