//! Chat backend adapter.
//!
//! Forwards a single message to a webhook-style chat backend under a fresh
//! session id and returns the backend's reply.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{RemoteClient, RemoteRequest};
use crate::config::env_var;
use crate::error::{AdapterError, Result};
use crate::traits::{Adapter, AdapterType, HealthStatus, ToolDefinition};

/// Environment variable holding the chat backend URL.
pub const ENV_CHAT_API_URL: &str = "CHAT_API_URL";

const CHAT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reply used when the backend answers without an `output` field.
const NO_RESPONSE: &str = "(no response)";

/// Configuration for the chat adapter.
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    /// Chat backend URL (`CHAT_API_URL`).
    pub api_url: Option<String>,
}

impl ChatConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            api_url: env_var(ENV_CHAT_API_URL),
        }
    }
}

/// Chat backend service adapter.
pub struct ChatAdapter {
    id: String,
    connected: bool,
    config: ChatConfig,
    client: RemoteClient,
}

impl ChatAdapter {
    /// Create a new chat adapter with an injected configuration.
    pub fn new(id: impl Into<String>, config: ChatConfig) -> Self {
        Self {
            id: id.into(),
            connected: false,
            config,
            client: RemoteClient::new(),
        }
    }

    /// Create a new chat adapter configured from the environment.
    pub fn from_env(id: impl Into<String>) -> Self {
        Self::new(id, ChatConfig::from_env())
    }

    async fn tool_chat(&self, params: Value) -> Result<Value> {
        let message = params
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::InvalidParams {
                tool_name: "chat".into(),
                reason: "missing required string field `message`".into(),
            })?;

        let api_url = self
            .config
            .api_url
            .as_deref()
            .ok_or_else(|| AdapterError::config_missing([ENV_CHAT_API_URL]))?;

        // One fresh session per call; the backend owns any conversation
        // state keyed by it.
        let session_id = Uuid::new_v4().to_string();

        debug!(session_id = %session_id, "sending chat message");

        let reply = self
            .client
            .call(
                RemoteRequest::post(api_url)
                    .json(json!({
                        "sessionId": session_id,
                        "chatInput": message,
                    }))
                    .timeout(CHAT_TIMEOUT),
            )
            .await?;

        let response = reply
            .get("output")
            .and_then(Value::as_str)
            .unwrap_or(NO_RESPONSE);

        info!(session_id = %session_id, "chat reply received");

        Ok(json!({
            "session_id": session_id,
            "message": message,
            "response": response,
        }))
    }
}

#[async_trait]
impl Adapter for ChatAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messaging
    }

    async fn connect(&mut self) -> Result<()> {
        info!(id = %self.id, "chat adapter connected");
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "chat adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        Ok(if self.config.api_url.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        })
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "chat".into(),
            description: "Send a message to the chat backend and return its \
                          reply together with the generated session id."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The message to send"
                    }
                },
                "required": ["message"]
            }),
        }]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value> {
        if !self.connected {
            return Err(AdapterError::NotConnected {
                adapter_id: self.id.clone(),
            });
        }
        match name {
            "chat" => self.tool_chat(params).await,
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_config(&self) -> &'static [&'static str] {
        &[ENV_CHAT_API_URL]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_adapter_tools_list() {
        let adapter = ChatAdapter::new("chat-test", ChatConfig::default());
        let tools = adapter.tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "chat");
    }

    #[tokio::test]
    async fn chat_fails_fast_without_url() {
        let mut adapter = ChatAdapter::new("chat-test", ChatConfig::default());
        adapter.connect().await.unwrap();
        let err = adapter
            .execute_tool("chat", json!({"message": "hi"}))
            .await
            .unwrap_err();
        match err {
            AdapterError::ConfigMissing { names } => {
                assert_eq!(names, vec![ENV_CHAT_API_URL.to_string()]);
            }
            other => panic!("expected ConfigMissing, got {other}"),
        }
    }

    #[tokio::test]
    async fn chat_requires_message() {
        let mut adapter = ChatAdapter::new(
            "chat-test",
            ChatConfig {
                api_url: Some("https://chat.example.com/hook".into()),
            },
        );
        adapter.connect().await.unwrap();
        let err = adapter.execute_tool("chat", json!({})).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn chat_rejects_unknown_tool() {
        let mut adapter = ChatAdapter::new("chat-test", ChatConfig::default());
        adapter.connect().await.unwrap();
        let result = adapter.execute_tool("nonexistent", json!({})).await;
        assert!(matches!(result, Err(AdapterError::ToolNotFound { .. })));
    }
}
