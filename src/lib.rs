//! fnmcp: expose ordinary Rust functions as MCP tools
//!
//! Describe a function once, register it with a [`server::ToolServer`], and
//! serve it to any Model Context Protocol client over stdio or TCP.
//!
//! # Architecture
//!
//! The library adapts functions; the protocol engine only dispatches:
//!
//! - **Signature inspection**: parameter names, types and defaults from an
//!   explicit descriptor or the [`tool_fn!`] macro
//! - **Return normalisation**: any supported return value becomes text,
//!   image or structured content
//! - **Invocation**: argument validation, defaults, and failures reported as
//!   error content instead of crashing the server
//!
//! ```no_run
//! use fnmcp::config::RunOptions;
//! use fnmcp::server::{RegisterOptions, ToolServer};
//! use fnmcp::tool_fn;
//!
//! /// Adds two integers.
//! fn add(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! let mut server = ToolServer::new("calculator");
//! server
//!     .register(tool_fn!(/// Adds two integers.
//!         add(a: i64, b: i64)), RegisterOptions::default())
//!     .expect("add has a valid signature");
//! server.run(&RunOptions::default()).expect("server failed");
//! ```
//!
//! # Modules
//!
//! - [`tool`] — Signature inspection, normalisation and the tool adapter
//! - [`server`] — The registration and run facade
//! - [`mcp`] — MCP protocol implementation
//! - [`config`] — Settings loading and run options
//! - [`cursor`] — Cursor editor `mcp.json` management
//! - [`logging`] — Tracing subscriber setup
//! - [`error`] — Error types

pub mod config;
pub mod cursor;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod server;
pub mod tool;
