//! End-to-end tests for the MCP HTTP surface.
//!
//! These tests spin up the **real** Axum server on an OS-assigned ephemeral
//! port, make actual HTTP requests via `reqwest`, and verify the full
//! request/response cycle including JSON parsing.

use std::net::SocketAddr;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use toolbridge_adapters::{
    Adapter, AdapterError, AdapterType, HealthStatus, Result as AdapterResult, ToolDefinition,
};
use toolbridge_runtime::ToolRegistry;
use toolbridge_server::router;

// ── helpers ──────────────────────────────────────────────────────────────────

struct EchoAdapter;

#[async_trait]
impl Adapter for EchoAdapter {
    fn id(&self) -> &str {
        "echo"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Information
    }

    async fn connect(&mut self) -> AdapterResult<()> {
        Ok(())
    }

    async fn disconnect(&mut self) -> AdapterResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> AdapterResult<HealthStatus> {
        Ok(HealthStatus::Healthy)
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "echo".into(),
            description: "Echo the arguments back".into(),
            parameters: json!({"type": "object"}),
        }]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> AdapterResult<Value> {
        match name {
            "echo" => Ok(json!({"echo": params})),
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: "echo".into(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_config(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Bind to 127.0.0.1:0, start the MCP router, return the base URL.
async fn start_test_server() -> String {
    let registry = ToolRegistry::new();
    registry
        .register(Box::new(EchoAdapter))
        .await
        .expect("register");

    let app = router(registry);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to port 0");
    let addr: SocketAddr = listener.local_addr().expect("get local addr");
    let base = format!("http://127.0.0.1:{}", addr.port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    // Small yield so the listener is ready.
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    base
}

async fn rpc(base: &str, body: Value) -> Value {
    let client = reqwest::Client::new();
    client
        .post(format!("{base}/mcp"))
        .json(&body)
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON")
}

// ── POST /mcp ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_over_http() {
    let base = start_test_server().await;
    let resp = rpc(
        &base,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await;

    assert_eq!(resp["jsonrpc"], "2.0");
    assert_eq!(resp["id"], 1);
    assert_eq!(resp["result"]["serverInfo"]["name"], "toolbridge");
    assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn tools_list_over_http() {
    let base = start_test_server().await;
    let resp = rpc(
        &base,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await;

    let tools = resp["result"]["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "echo");
    assert!(tools[0].get("inputSchema").is_some());
}

#[tokio::test]
async fn tools_call_over_http() {
    let base = start_test_server().await;
    let resp = rpc(
        &base,
        json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "echo", "arguments": {"x": 1}}
        }),
    )
    .await;

    assert!(resp.get("error").is_none(), "{resp}");
    let text = resp["result"]["content"][0]["text"]
        .as_str()
        .expect("text block");
    assert!(text.contains("\"x\": 1"), "{text}");
}

#[tokio::test]
async fn unknown_tool_over_http_sets_is_error() {
    let base = start_test_server().await;
    let resp = rpc(
        &base,
        json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": {"name": "missing", "arguments": {}}
        }),
    )
    .await;

    assert_eq!(resp["result"]["isError"], true);
}

#[tokio::test]
async fn batch_request_over_http() {
    let base = start_test_server().await;
    let resp = rpc(
        &base,
        json!([
            {"jsonrpc": "2.0", "id": 1, "method": "ping"},
            {"jsonrpc": "2.0", "id": 2, "method": "tools/list"},
        ]),
    )
    .await;

    let responses = resp.as_array().expect("batch response array");
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["id"], 2);
}

#[tokio::test]
async fn invalid_json_yields_parse_error() {
    let base = start_test_server().await;
    let client = reqwest::Client::new();
    let resp: Value = client
        .post(format!("{base}/mcp"))
        .header("content-type", "application/json")
        .body("not valid json!!!")
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");

    assert_eq!(resp["error"]["code"], -32700);
}

// ── GET /health ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_adapters() {
    let base = start_test_server().await;
    let client = reqwest::Client::new();
    let resp: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid JSON");

    assert_eq!(resp["status"], "ok");
    let adapters = resp["adapters"].as_array().expect("adapters array");
    assert_eq!(adapters.len(), 1);
    assert_eq!(adapters[0]["id"], "echo");
    assert_eq!(adapters[0]["health"], "healthy");
}
