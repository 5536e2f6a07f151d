//! Integration tests for editing the Cursor `mcp.json`.

use fnmcp::cursor::{CursorConfig, ServerEntry, ServerRegistration};
use serde_json::{json, Value};

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn add_list_remove_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cursor").join("mcp.json");

    let mut config = CursorConfig::load(&path).unwrap();
    let entry = ServerRegistration::new("/opt/calc/bin/calc")
        .args(["--stdio"])
        .env("RUST_LOG", "info")
        .into_entry()
        .unwrap();
    assert!(config.add_server("calculator", entry).is_none());
    config.save().unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.ends_with('\n'));
    assert!(written.contains("\n  \"mcpServers\""));
    assert_eq!(
        read_json(&path),
        json!({"mcpServers": {"calculator": {
            "command": "/opt/calc/bin/calc",
            "args": ["--stdio"],
            "cwd": "/opt/calc/bin",
            "env": {"RUST_LOG": "info"}
        }}})
    );

    let mut config = CursorConfig::load(&path).unwrap();
    assert_eq!(config.server_names(), ["calculator"]);
    assert!(config.remove_server("calculator").is_some());
    assert!(config.remove_server("calculator").is_none());
    config.save().unwrap();

    assert_eq!(read_json(&path), json!({"mcpServers": {}}));
}

#[test]
fn unrelated_keys_and_order_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");
    std::fs::write(
        &path,
        r#"{
  "mcpServers": {
    "zeta": {"url": "http://localhost:9000/sse"},
    "alpha": {"command": "alpha", "disabled": true}
  },
  "experimental": {"flag": 1}
}"#,
    )
    .unwrap();

    let mut config = CursorConfig::load(&path).unwrap();
    config.add_server(
        "mid",
        ServerEntry {
            command: Some("/usr/bin/mid".to_string()),
            ..ServerEntry::default()
        },
    );
    config.save().unwrap();

    let config = CursorConfig::load(&path).unwrap();
    assert_eq!(config.server_names(), ["zeta", "alpha", "mid"]);

    let value = read_json(&path);
    assert_eq!(value["experimental"], json!({"flag": 1}));
    assert_eq!(value["mcpServers"]["zeta"], json!({"url": "http://localhost:9000/sse"}));
    assert_eq!(value["mcpServers"]["alpha"]["disabled"], true);
}

#[test]
fn replacing_a_server_keeps_its_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");

    let mut config = CursorConfig::load(&path).unwrap();
    for name in ["one", "two", "three"] {
        config.add_server(name, ServerEntry::default());
    }
    let replaced = config.add_server(
        "one",
        ServerEntry {
            command: Some("new".to_string()),
            ..ServerEntry::default()
        },
    );

    assert!(replaced.is_some());
    assert_eq!(config.server_names(), ["one", "two", "three"]);
    assert_eq!(config.server("one").unwrap().command.as_deref(), Some("new"));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mcp.json");
    std::fs::write(&path, "{ nope").unwrap();

    let err = CursorConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse"));
}
