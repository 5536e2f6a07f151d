//! Serde model of the editor's `mcp.json`.
//!
//! Only the fields this crate edits are typed. Everything else is captured
//! by the flattened `extra` maps and written back untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConfigFile {
    /// Registered servers, in file order.
    #[serde(rename = "mcpServers", default)]
    pub servers: IndexMap<String, ServerEntry>,

    /// Top-level keys other than `mcpServers`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How the editor launches one server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Executable to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Command-line arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    /// Extra environment variables.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    /// Keys other than the ones above, e.g. `url` for remote servers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
