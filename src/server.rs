//! The server facade: register functions, then run.
//!
//! [`ToolServer`] owns the tools; [`McpServer`] owns the protocol. Tools are
//! held in registration order until [`ToolServer::run`] pushes them into a
//! fresh protocol server and blocks in its request loop.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::{RunOptions, Settings};
use crate::error::ServerError;
use crate::logging;
use crate::mcp::server::{McpServer, ServerInfo, ToolDefinition};
use crate::tool::{Callable, InvocationResult, SignatureError, ToolAdapter, ToolDescriptor};

/// Per-registration overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Tool name; defaults to the callable's name.
    pub name: Option<String>,
    /// Tool description; defaults to the callable's documentation.
    pub description: Option<String>,
}

impl RegisterOptions {
    /// Overrides the tool name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }

    /// Overrides the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Outcome of [`ToolServer::register_all`].
#[derive(Debug, Default)]
pub struct BatchRegistration {
    /// Descriptors of the tools that were registered, in order.
    pub registered: Vec<ToolDescriptor>,
    /// Callables that were skipped, by name, with the reason.
    pub failed: Vec<(String, SignatureError)>,
}

impl BatchRegistration {
    /// Returns `true` if every callable was registered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A named collection of tools that can be served over MCP.
#[derive(Debug, Clone)]
pub struct ToolServer {
    name: String,
    instructions: Option<String>,
    tools: IndexMap<String, ToolAdapter>,
}

impl ToolServer {
    /// Creates an empty server.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: None,
            tools: IndexMap::new(),
        }
    }

    /// Creates an empty server named and described by `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.server.name.clone())
            .with_instructions(settings.server.instructions.clone())
    }

    /// Sets the usage instructions reported to clients.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<Option<String>>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Returns the server name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the usage instructions, if any.
    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Registers a callable as a tool and returns its descriptor.
    ///
    /// Registering a second tool under an existing name replaces the first
    /// in place; it keeps the original position in [`list`](Self::list).
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] if the callable cannot be described. The
    /// server is left unchanged in that case.
    pub fn register(
        &mut self,
        callable: Callable,
        options: RegisterOptions,
    ) -> Result<ToolDescriptor, SignatureError> {
        let descriptor = ToolDescriptor::from_callable(callable, options.name, options.description)?;
        let name = descriptor.name().to_string();

        if self
            .tools
            .insert(name.clone(), ToolAdapter::new(descriptor.clone()))
            .is_some()
        {
            warn!(tool = %name, "Tool registered twice; the later registration wins");
        } else {
            info!(tool = %name, parameters = descriptor.parameters().len(), "Registered tool");
        }

        Ok(descriptor)
    }

    /// Registers each callable under its own name, skipping the ones that
    /// fail inspection.
    pub fn register_all<I>(&mut self, callables: I) -> BatchRegistration
    where
        I: IntoIterator<Item = Callable>,
    {
        let mut batch = BatchRegistration::default();

        for callable in callables {
            let name = callable.name().to_string();
            match self.register(callable, RegisterOptions::default()) {
                Ok(descriptor) => batch.registered.push(descriptor),
                Err(e) => {
                    warn!(tool = %name, error = %e, "Skipping tool");
                    batch.failed.push((name, e));
                }
            }
        }

        batch
    }

    /// Returns the registered tools in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().map(ToolAdapter::descriptor).collect()
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(ToolAdapter::descriptor)
    }

    /// Invokes a tool directly, bypassing the protocol.
    ///
    /// Returns `None` if no tool has that name.
    #[must_use]
    pub fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> Option<InvocationResult> {
        self.tools.get(name).map(|adapter| adapter.invoke(arguments))
    }

    /// Builds a protocol server holding every registered tool.
    #[must_use]
    pub fn to_mcp_server(&self) -> McpServer {
        let mut server =
            McpServer::new(ServerInfo::new(&self.name)).with_instructions(self.instructions.clone());

        for adapter in self.tools.values() {
            let descriptor = adapter.descriptor();
            let definition = ToolDefinition {
                name: descriptor.name().to_string(),
                description: descriptor.description().to_string(),
                input_schema: descriptor.input_schema(),
            };
            let adapter = adapter.clone();
            server.register_tool(definition, move |args| adapter.invoke(args));
        }

        server
    }

    /// Initialises logging and serves the tools until the client disconnects
    /// or the process is told to stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be created, the TCP listener
    /// cannot be bound, or the transport fails.
    pub fn run(&self, options: &RunOptions) -> Result<(), ServerError> {
        logging::init(options.effective_level());

        let transport = options.transport();
        let mut server = self.to_mcp_server();
        info!(
            server = %self.name,
            tools = server.tool_count(),
            transport = %transport,
            "Starting MCP server"
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        runtime.block_on(server.run(transport))?;
        info!(server = %self.name, "Server shut down");
        Ok(())
    }
}

/// Builds a server exposing a single function.
///
/// The server is named `server_name`, or after the tool when not given, and
/// reports `instructions` to clients during initialisation.
///
/// # Errors
///
/// Returns a [`SignatureError`] if the callable cannot be described.
pub fn convert_function(
    callable: Callable,
    options: RegisterOptions,
    server_name: Option<&str>,
    instructions: Option<String>,
) -> Result<ToolServer, SignatureError> {
    let tool_name = options
        .name
        .clone()
        .unwrap_or_else(|| callable.name().to_string());
    let mut server = ToolServer::new(server_name.unwrap_or(&tool_name)).with_instructions(instructions);
    server.register(callable, options)?;
    Ok(server)
}
