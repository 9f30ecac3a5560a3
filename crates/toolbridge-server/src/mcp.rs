//! MCP (Model Context Protocol) server implementation.
//!
//! Implements the MCP JSON-RPC 2.0 protocol over HTTP, exposing every tool
//! in the registry.  Supports the `initialize`, `tools/list`, `tools/call`,
//! and `ping` methods, plus batch requests.
//!
//! The MCP specification version targeted is `2024-11-05`.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use toolbridge_runtime::{outcome, ToolRegistry};

// ---------------------------------------------------------------------------
// MCP protocol version
// ---------------------------------------------------------------------------

/// The MCP protocol version this server implements.
const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// The server name reported during initialization.
const SERVER_NAME: &str = "toolbridge";

/// The server version reported during initialization.
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// JSON-RPC types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be `"2.0"`.
    pub jsonrpc: String,
    /// Request identifier.  May be a number, string, or null for
    /// notifications.
    #[serde(default)]
    pub id: Option<Value>,
    /// The method to invoke.
    pub method: String,
    /// Method parameters (defaults to `null` if absent).
    #[serde(default)]
    pub params: Value,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Echoed from the request.
    pub id: Option<Value>,
    /// Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code (negative numbers are reserved by JSON-RPC).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC error codes.
const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

impl JsonRpcResponse {
    /// Construct a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Construct an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MCP-specific types
// ---------------------------------------------------------------------------

/// An MCP tool definition returned by `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolDefinition {
    /// The machine-readable tool name.
    pub name: String,
    /// Human-readable description of the tool.
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The result of an MCP `tools/call` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolResult {
    /// The content blocks returned by the tool.
    pub content: Vec<McpContent>,
    /// Whether the tool call resulted in an error.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// A single content block within an MCP tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpContent {
    /// The content type (e.g. `"text"`).
    #[serde(rename = "type")]
    pub content_type: String,
    /// The textual content.
    pub text: String,
}

impl McpContent {
    /// Create a text content block.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            content_type: "text".into(),
            text: value.into(),
        }
    }
}

impl McpToolResult {
    /// Create a successful tool result with a single text block.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::text(text)],
            is_error: None,
        }
    }

    /// Create an error tool result with a single text block.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::text(text)],
            is_error: Some(true),
        }
    }
}

// ---------------------------------------------------------------------------
// McpServer
// ---------------------------------------------------------------------------

/// MCP protocol server backed by the tool registry.
#[derive(Clone)]
pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    /// Create a new MCP server over the given registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Handle a single JSON-RPC request and return a response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = %request.method, "MCP request received");

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            other => {
                tracing::warn!(method = %other, "unknown MCP method");
                JsonRpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    format!("method not found: {other}"),
                )
            }
        }
    }

    /// Handle the `initialize` handshake.
    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    /// Handle `tools/list` from the registry's combined catalog.
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<McpToolDefinition> = self
            .registry
            .list_tools()
            .into_iter()
            .map(|t| McpToolDefinition {
                name: t.name,
                description: t.description,
                input_schema: t.parameters,
            })
            .collect();
        match serde_json::to_value(&tools) {
            Ok(tools_value) => JsonRpcResponse::success(id, json!({ "tools": tools_value })),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize tool list");
                JsonRpcResponse::error(id, INTERNAL_ERROR, "failed to serialize tool list")
            }
        }
    }

    /// Handle `tools/call` by dispatching through the registry.
    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_owned(),
            None => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    "missing required field `name` in params",
                );
            }
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let dispatched = self.registry.dispatch(&name, arguments).await;
        let payload = outcome::report(&name, dispatched);

        let result = if outcome::is_error(&payload) {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("tool execution failed");
            McpToolResult::error(message)
        } else {
            McpToolResult::success(render_payload(payload))
        };

        match serde_json::to_value(&result) {
            Ok(v) => JsonRpcResponse::success(id, v),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize tool result");
                JsonRpcResponse::error(id, INTERNAL_ERROR, "failed to serialize tool result")
            }
        }
    }
}

/// Convert a tool payload to the text carried in an MCP content block.
fn render_payload(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Axum handler
// ---------------------------------------------------------------------------

/// Handle a single MCP JSON-RPC request.
///
/// Accepts `POST /mcp` with a JSON body that is either a single JSON-RPC
/// request object or an array of request objects (batch mode).
pub async fn handle_mcp_request(State(registry): State<ToolRegistry>, body: String) -> Json<Value> {
    let mcp = McpServer::new(registry);

    // Try to parse as an array first (batch request), then as a single request.
    if let Ok(batch) = serde_json::from_str::<Vec<JsonRpcRequest>>(&body) {
        if batch.is_empty() {
            return Json(json!(JsonRpcResponse::error(
                None,
                INVALID_REQUEST,
                "empty batch request",
            )));
        }
        let mut responses = Vec::with_capacity(batch.len());
        for req in batch {
            responses.push(mcp.handle_request(req).await);
        }
        return Json(json!(responses));
    }

    match serde_json::from_str::<JsonRpcRequest>(&body) {
        Ok(request) => {
            let response = mcp.handle_request(request).await;
            Json(json!(response))
        }
        Err(e) => Json(json!(JsonRpcResponse::error(
            None,
            PARSE_ERROR,
            format!("failed to parse JSON-RPC request: {e}"),
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
