//! fnmcp: manage MCP server registrations for the Cursor editor.
//!
//! Servers themselves are built with the library; this binary only edits
//! the editor's `mcp.json` so it knows how to launch them.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, error, Level};

use fnmcp::cursor::{self, CursorConfig, ServerRegistration};
use fnmcp::error::ConfigError;
use fnmcp::logging;

/// Expose Rust functions as MCP tools and register them with editors.
#[derive(Parser, Debug)]
#[command(name = "fnmcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the Cursor editor's MCP configuration
    Cursor {
        /// Use this mcp.json instead of the platform default
        #[arg(long, value_name = "PATH", global = true)]
        config_file: Option<PathBuf>,

        #[command(subcommand)]
        action: CursorCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CursorCommand {
    /// Add or replace a server entry
    AddServer {
        /// Server name
        name: String,

        /// Executable that starts the server
        command: String,

        /// Argument passed to the command (repeatable)
        #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Working directory (default: the command's directory)
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Environment variable as KEY=VALUE (repeatable)
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
    },

    /// Remove a server entry
    RemoveServer {
        /// Server name
        name: String,
    },

    /// List registered servers
    ListServers,

    /// Print the configuration file path
    ConfigPath,
}

/// Parses a `KEY=VALUE` pair.
fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Runs a cursor subcommand, returning whether it succeeded.
fn run_cursor(config_file: Option<PathBuf>, action: CursorCommand) -> Result<bool, ConfigError> {
    let path = match config_file {
        Some(path) => path,
        None => cursor::default_config_path()?,
    };
    debug!(path = %path.display(), "Using MCP configuration");

    match action {
        CursorCommand::AddServer {
            name,
            command,
            args,
            cwd,
            env,
        } => {
            let mut registration = ServerRegistration::new(command).args(args);
            if let Some(cwd) = cwd {
                registration = registration.cwd(cwd);
            }
            for (key, value) in env {
                registration = registration.env(key, value);
            }

            let mut config = CursorConfig::load(path)?;
            let replaced = config.add_server(name.clone(), registration.into_entry()?);
            config.save()?;

            let verb = if replaced.is_some() { "Updated" } else { "Added" };
            println!("{verb} '{name}' server in Cursor MCP configuration.");
            println!("Configuration file location: {}", config.path().display());
            Ok(true)
        }
        CursorCommand::RemoveServer { name } => {
            let mut config = CursorConfig::load(path)?;
            if config.remove_server(&name).is_none() {
                println!("Server '{name}' does not exist in configuration.");
                return Ok(false);
            }
            config.save()?;
            println!("Removed '{name}' server from Cursor MCP configuration.");
            Ok(true)
        }
        CursorCommand::ListServers => {
            let config = CursorConfig::load(path)?;
            println!("Servers registered in Cursor MCP configuration:");
            for name in config.server_names() {
                println!("- {name}");
            }
            Ok(true)
        }
        CursorCommand::ConfigPath => {
            println!("{}", path.display());
            Ok(true)
        }
    }
}

/// Entry point for the fnmcp command line.
fn main() -> ExitCode {
    let args = Args::parse();

    logging::init(logging::level_from_verbosity(
        args.verbose,
        args.quiet,
        Level::WARN,
    ));

    let result = match args.command {
        Command::Cursor {
            config_file,
            action,
        } => run_cursor(config_file, action),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
