//! Integration tests for the MCP session around a tool server.
//!
//! These tests drive a full JSON-RPC session over in-memory streams:
//! handshake, tool listing, calls, and error responses.

use fnmcp::mcp::protocol::{parse_message, IncomingMessage, RequestId, MCP_PROTOCOL_VERSION};
use fnmcp::server::{RegisterOptions, ToolServer};
use fnmcp::tool::{Image, InvocationResult, ReturnValue};
use fnmcp::tool_fn;
use serde_json::{json, Value};

fn add(a: i64, b: i64) -> i64 {
    a + b
}

fn divide(a: f64, b: f64) -> Result<f64, String> {
    if b == 0.0 {
        return Err("Cannot divide by zero".to_string());
    }
    Ok(a / b)
}

fn stats(values: Vec<i64>) -> InvocationResult {
    let total: i64 = values.iter().sum();
    InvocationResult::Structured(json!({"total": total, "count": values.len()}))
}

fn histogram(words: Vec<String>) -> ReturnValue {
    let mut counts = serde_json::Map::new();
    for word in words {
        let count = counts.get(&word).and_then(Value::as_i64).unwrap_or(0);
        counts.insert(word, json!(count + 1));
    }
    ReturnValue::Mapping(counts)
}

fn pixel() -> Image {
    Image::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
}

fn calculator() -> ToolServer {
    let mut server = ToolServer::new("calculator").with_instructions("Do sums.".to_string());
    let batch = server.register_all([
        tool_fn!(
            /// Add two integers.
            add(a: i64, b: i64)
        ),
        tool_fn!(divide(a: f64, b: f64)),
        tool_fn!(stats(values: Vec<i64>)),
        tool_fn!(pixel()),
        tool_fn!(histogram(words: Vec<String>)),
    ]);
    assert!(batch.is_complete());
    server
}

async fn session(server: &ToolServer, requests: &[Value]) -> Vec<Value> {
    let mut lines = vec![
        json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {"name": "integration", "version": "0.0.1"}
        }}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    ];
    lines.extend_from_slice(requests);
    let input: String = lines.iter().map(|l| format!("{l}\n")).collect();

    let mut output = Vec::new();
    server
        .to_mcp_server()
        .serve(input.as_bytes(), &mut output)
        .await
        .unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn call(id: i64, name: &str, arguments: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "tools/call", "params": {
        "name": name,
        "arguments": arguments
    }})
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let IncomingMessage::Request(req) = parse_message(json).unwrap() else {
        panic!("Expected Request");
    };
    assert_eq!(req.method, "initialize");
    assert_eq!(req.id, RequestId::Number(1));
}

#[test]
fn test_parse_tools_call_request() {
    let json = r#"{"jsonrpc": "2.0", "id": "abc", "method": "tools/call",
        "params": {"name": "add", "arguments": {"a": 1, "b": 2}}}"#;

    let IncomingMessage::Request(req) = parse_message(json).unwrap() else {
        panic!("Expected Request");
    };
    assert_eq!(req.id, RequestId::String("abc".to_string()));
    assert_eq!(req.params.unwrap()["arguments"]["b"], 2);
}

// =============================================================================
// Session Tests
// =============================================================================

#[tokio::test]
async fn test_initialize_reports_server() {
    let responses = session(&calculator(), &[]).await;
    let result = &responses[0]["result"];
    assert_eq!(result["serverInfo"]["name"], "calculator");
    assert_eq!(result["instructions"], "Do sums.");
}

#[tokio::test]
async fn test_tools_list_schema() {
    let responses = session(
        &calculator(),
        &[json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})],
    )
    .await;

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["add", "divide", "stats", "pixel", "histogram"]);

    assert_eq!(tools[0]["description"], "Add two integers.");
    assert_eq!(
        tools[0]["inputSchema"],
        json!({
            "type": "object",
            "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
            "required": ["a", "b"]
        })
    );
    assert_eq!(tools[1]["description"], "Function divide");
    assert_eq!(tools[1]["inputSchema"]["properties"]["a"]["type"], "number");
    assert_eq!(tools[2]["inputSchema"]["properties"]["values"]["type"], "array");
}

#[tokio::test]
async fn test_add_returns_text() {
    let responses = session(&calculator(), &[call(1, "add", json!({"a": 2, "b": 3}))]).await;
    assert_eq!(
        responses[1]["result"],
        json!({"content": [{"type": "text", "text": "5"}]})
    );
}

#[tokio::test]
async fn test_missing_argument_is_tool_error() {
    let responses = session(&calculator(), &[call(1, "add", json!({"a": 2}))]).await;
    let result = &responses[1]["result"];
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("MissingArgument"));
    assert!(text.contains('b'));
}

#[tokio::test]
async fn test_type_mismatch_is_tool_error() {
    let responses = session(&calculator(), &[call(1, "add", json!({"a": "2", "b": 3}))]).await;
    let text = responses[1]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("TypeMismatch"));
}

#[tokio::test]
async fn test_divide_by_zero_is_execution_error() {
    let responses = session(
        &calculator(),
        &[
            call(1, "divide", json!({"a": 1, "b": 0})),
            call(2, "divide", json!({"a": 10, "b": 4})),
        ],
    )
    .await;

    assert_eq!(responses[1]["result"]["isError"], true);
    assert_eq!(
        responses[1]["result"]["content"][0]["text"],
        "ExecutionError: Cannot divide by zero"
    );
    assert_eq!(responses[2]["result"]["content"][0]["text"], "2.5");
}

#[tokio::test]
async fn test_structured_and_image_results() {
    let responses = session(
        &calculator(),
        &[
            call(1, "stats", json!({"values": [1, 2, 3]})),
            call(2, "pixel", json!({})),
            call(3, "histogram", json!({"words": ["b", "a", "b"]})),
        ],
    )
    .await;

    let structured = &responses[1]["result"];
    assert_eq!(structured["content"][0]["text"], r#"{"count":3,"total":6}"#);
    assert_eq!(structured["structuredContent"], json!({"count": 3, "total": 6}));

    let image = &responses[2]["result"]["content"][0];
    assert_eq!(image["type"], "image");
    assert_eq!(image["mimeType"], "image/jpeg");
    assert_eq!(image["data"], "/9j/4A==");

    let mapping = &responses[3]["result"];
    assert_eq!(mapping["content"][0]["text"], r#"{"a":1,"b":2}"#);
    assert!(mapping.get("structuredContent").is_none());
}

#[tokio::test]
async fn test_unknown_tool_and_method() {
    let responses = session(
        &calculator(),
        &[
            call(1, "subtract", json!({})),
            json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}),
        ],
    )
    .await;

    assert_eq!(responses[1]["result"]["isError"], true);
    assert_eq!(responses[2]["error"]["code"], -32601);
}

#[tokio::test]
async fn test_overwritten_tool_is_served() {
    let mut server = calculator();
    server
        .register(
            tool_fn!(divide(a: f64, b: f64)),
            RegisterOptions::named("add").with_description("Not really add."),
        )
        .unwrap();

    let responses = session(
        &server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
            call(2, "add", json!({"a": 1, "b": 2})),
        ],
    )
    .await;

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert_eq!(tools[0]["description"], "Not really add.");
    assert_eq!(responses[2]["result"]["content"][0]["text"], "0.5");
}
