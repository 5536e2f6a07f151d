//! MCP server lifecycle and tool dispatch.
//!
//! Each session goes through:
//!
//! 1. **Initialisation**: `initialize` request, then the `initialized` notification
//! 2. **Operation**: `tools/list`, `tools/call` and `ping`
//! 3. **Shutdown**: end of stream or a termination signal
//!
//! Tools are registered up front through [`McpServer::register_tool`]; the
//! server knows nothing about how they are implemented beyond their handler.

use std::future::Future;
use std::io;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION,
};
use crate::mcp::transport::{LineTransport, Transport};
use crate::tool::{canonical_json, InvocationResult};

/// Handler invoked for `tools/call`.
pub type ToolHandler = Box<dyn Fn(&Map<String, Value>) -> InvocationResult + Send + Sync>;

/// Server state within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for `initialize`.
    AwaitingInit,
    /// `initialize` answered, waiting for `notifications/initialized`.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// The session is over.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server identity reported in the initialisation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl ServerInfo {
    /// Creates server info with this crate's version.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client identity received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters of the `initialize` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by the client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// A tool as listed by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the arguments.
    pub input_schema: Value,
}

/// Parameters of the `tools/call` request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Tool to call.
    pub name: String,
    /// Tool arguments; absent or `null` means no arguments.
    #[serde(default)]
    pub arguments: Value,
}

/// One content item in a `tools/call` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// Base64-encoded image content.
    Image {
        /// Base64 payload.
        data: String,
        /// Mime type of the decoded payload.
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

/// The result object of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content items.
    pub content: Vec<ToolContent>,
    /// Machine-readable result, for clients that understand it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    /// Whether the call failed.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if passes &T
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            structured_content: None,
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(message)
        }
    }
}

impl From<InvocationResult> for ToolCallResult {
    fn from(result: InvocationResult) -> Self {
        match result {
            InvocationResult::Text(text) => Self::text(text),
            InvocationResult::Image { data, mime_type } => Self {
                content: vec![ToolContent::Image {
                    data: BASE64_STANDARD.encode(data),
                    mime_type,
                }],
                structured_content: None,
                is_error: false,
            },
            InvocationResult::Structured(value) => Self {
                content: vec![ToolContent::Text {
                    text: canonical_json(&value),
                }],
                structured_content: value.is_object().then_some(value),
                is_error: false,
            },
            InvocationResult::Error { message, kind } => Self::error(format!("{kind}: {message}")),
        }
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: ToolHandler,
}

/// A minimal MCP server that dispatches `tools/call` to registered handlers.
pub struct McpServer {
    state: ServerState,
    info: ServerInfo,
    instructions: Option<String>,
    protocol_version: Option<String>,
    tools: IndexMap<String, RegisteredTool>,
}

impl McpServer {
    /// Creates a server with no tools.
    #[must_use]
    pub fn new(info: ServerInfo) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            info,
            instructions: None,
            protocol_version: None,
            tools: IndexMap::new(),
        }
    }

    /// Sets usage instructions returned to clients at initialisation.
    #[must_use]
    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions;
        self
    }

    /// Registers a tool. A later registration under the same name replaces
    /// the earlier one.
    pub fn register_tool<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(&Map<String, Value>) -> InvocationResult + Send + Sync + 'static,
    {
        let name = definition.name.clone();
        let previous = self.tools.insert(
            name.clone(),
            RegisteredTool {
                definition,
                handler: Box::new(handler),
            },
        );
        if previous.is_some() {
            warn!(tool = %name, "Replaced tool registered under the same name");
        }
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Returns the current session state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Runs the server on the given transport until the client disconnects
    /// (stdio) or a termination signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound, signal handlers
    /// cannot be installed, or transport I/O fails.
    pub async fn run(&mut self, transport: Transport) -> Result<(), ServerError> {
        match transport {
            Transport::Stdio => {
                let shutdown = shutdown_signal();
                tokio::pin!(shutdown);

                let (reader, writer) = LineTransport::stdio().into_parts();
                tokio::select! {
                    signal = &mut shutdown => {
                        info!(signal = signal?, "Initiating graceful shutdown");
                        self.state = ServerState::ShuttingDown;
                    }
                    result = self.serve(reader, writer) => result?,
                }
                Ok(())
            }
            Transport::Tcp { host, port } => {
                let address = format!("{host}:{port}");
                let listener = TcpListener::bind(&address)
                    .await
                    .map_err(|source| ServerError::Bind {
                        address: address.clone(),
                        source,
                    })?;
                info!(address = %address, "Listening for MCP connections");

                self.serve_listener(listener, shutdown_signal()).await
            }
        }
    }

    /// Accepts connections on `listener` one at a time until `shutdown`
    /// resolves. Each connection is a fresh session.
    ///
    /// A failed accept or a broken connection is logged and the loop moves on
    /// to the next client.
    ///
    /// # Errors
    ///
    /// Returns an error only if `shutdown` itself fails.
    pub async fn serve_listener<S>(
        &mut self,
        listener: TcpListener,
        shutdown: S,
    ) -> Result<(), ServerError>
    where
        S: Future<Output = io::Result<&'static str>>,
    {
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                signal = &mut shutdown => {
                    info!(signal = signal?, "Initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok(connection) => connection,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                },
            };

            info!(peer = %peer, "Client connected");
            let (read_half, write_half) = stream.into_split();
            tokio::select! {
                signal = &mut shutdown => {
                    info!(signal = signal?, "Initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }
                result = self.serve(BufReader::new(read_half), write_half) => {
                    if let Err(e) = result {
                        warn!(peer = %peer, error = %e, "Connection failed");
                    }
                }
            }
            info!(peer = %peer, "Client disconnected");
        }
    }

    /// Serves one session over a reader and writer until end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub async fn serve<R, W>(&mut self, reader: R, writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.state = ServerState::AwaitingInit;
        self.protocol_version = None;
        let mut transport = LineTransport::new(reader, writer);

        while let Some(line) = transport.read_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            match parse_message(&line) {
                Ok(IncomingMessage::Request(req)) => {
                    match self.handle_request(&req) {
                        Ok(response) => transport.write_message(&response).await?,
                        Err(error) => transport.write_message(&error).await?,
                    }
                }
                Ok(IncomingMessage::Notification(notif)) => self.handle_notification(&notif),
                Err(error) => transport.write_message(&error).await?,
            }

            if self.state == ServerState::ShuttingDown {
                break;
            }
        }

        self.state = ServerState::ShuttingDown;
        Ok(())
    }

    fn handle_request(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        debug!(id = %req.id, method = %req.method, "Handling request");
        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req),
            "ping" => Ok(JsonRpcResponse::success(req.id.clone(), json!({}))),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" if self.state == ServerState::Initialising => {
                info!("Client initialised, session running");
                self.state = ServerState::Running;
            }
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::invalid_state(
                req.id.clone(),
                "Server already initialised",
            ));
        }

        let params: InitializeParams = parse_params(req, "initialize")?;
        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested_version = %params.protocol_version,
                "Initialising session"
            );
        }

        self.protocol_version = Some(MCP_PROTOCOL_VERSION.to_string());
        self.state = ServerState::Initialising;

        let mut result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities {
                tools: ToolCapabilities::default(),
            },
            "serverInfo": self.info,
        });
        if let Some(instructions) = &self.instructions {
            result["instructions"] = json!(instructions);
        }

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let tools: Vec<&ToolDefinition> = self.tools.values().map(|t| &t.definition).collect();
        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "tools": tools }),
        ))
    }

    fn handle_tools_call(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = parse_params(req, "tool call")?;
        let arguments = match params.arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => {
                return Err(JsonRpcError::invalid_params(
                    req.id.clone(),
                    "Tool arguments must be an object",
                ))
            }
        };

        let result = match self.tools.get(&params.name) {
            Some(tool) => {
                let outcome = (tool.handler)(&arguments);
                debug!(
                    tool = %params.name,
                    is_error = outcome.is_error(),
                    "Tool call finished"
                );
                ToolCallResult::from(outcome)
            }
            None => ToolCallResult::error(format!("Unknown tool: {}", params.name)),
        };

        let value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), value))
    }

    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::invalid_state(id.clone(), "Server not initialised"));
        }
        Ok(())
    }
}

/// Decodes request parameters, treating absent parameters as an error.
fn parse_params<T: for<'de> Deserialize<'de>>(
    req: &JsonRpcRequest,
    what: &str,
) -> Result<T, JsonRpcError> {
    let params = req.params.as_ref().ok_or_else(|| {
        JsonRpcError::invalid_params(req.id.clone(), format!("Missing {what} params"))
    })?;

    T::deserialize(params).map_err(|e| {
        JsonRpcError::invalid_params(req.id.clone(), format!("Invalid {what} params: {e}"))
    })
}

/// Resolves when the process is asked to stop, naming the signal.
#[cfg(unix)]
async fn shutdown_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

/// Resolves when the process is asked to stop, naming the signal.
#[cfg(windows)]
async fn shutdown_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
