//! Model Context Protocol (MCP) server implementation.
//!
//! A small JSON-RPC 2.0 engine that advertises registered tools and routes
//! `tools/call` requests to their handlers. It knows nothing about how a tool
//! is implemented; the [`crate::server`] facade supplies the handlers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        McpServer                         │
//! │                                                          │
//! │   ┌──────────────┐    ┌─────────────┐    ┌────────────┐  │
//! │   │  Transport   │───▶│   Session   │───▶│  Handlers  │  │
//! │   │ (stdio, tcp) │    │ (lifecycle) │    │ (per tool) │  │
//! │   └──────────────┘    └─────────────┘    └────────────┘  │
//! │          │                   │                  │        │
//! │          ▼                   ▼                  ▼        │
//! │   ┌──────────────────────────────────────────────────┐   │
//! │   │               JSON-RPC Messages                  │   │
//! │   └──────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::{McpServer, ServerInfo, ToolCallResult, ToolContent, ToolDefinition};
pub use transport::{LineTransport, Transport, DEFAULT_HOST, DEFAULT_PORT};
