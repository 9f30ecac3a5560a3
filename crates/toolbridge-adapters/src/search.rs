//! Exa web search adapter.
//!
//! Wraps the Exa Search API and reshapes result sets into compact
//! title/URL/content text blocks the agent can read directly.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::{RemoteClient, RemoteRequest};
use crate::config::env_var;
use crate::error::{AdapterError, Result};
use crate::traits::{Adapter, AdapterType, HealthStatus, ToolDefinition};

/// Environment variable holding the Exa API key.
pub const ENV_EXA_API_KEY: &str = "EXA_API_KEY";

/// Exa search endpoint.
const DEFAULT_BASE_URL: &str = "https://api.exa.ai";

/// Default number of results to return.
const DEFAULT_NUM_RESULTS: u64 = 5;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the search adapter.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Exa API key (`EXA_API_KEY`).
    pub api_key: Option<String>,
    /// Base URL of the search service; overridable for tests.
    pub base_url: String,
}

impl SearchConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            api_key: env_var(ENV_EXA_API_KEY),
            ..Self::default()
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Exa search service adapter.
pub struct SearchAdapter {
    id: String,
    connected: bool,
    config: SearchConfig,
    client: RemoteClient,
}

impl SearchAdapter {
    /// Create a new search adapter with an injected configuration.
    pub fn new(id: impl Into<String>, config: SearchConfig) -> Self {
        Self {
            id: id.into(),
            connected: false,
            config,
            client: RemoteClient::new(),
        }
    }

    /// Create a new search adapter configured from the environment.
    pub fn from_env(id: impl Into<String>) -> Self {
        Self::new(id, SearchConfig::from_env())
    }

    async fn tool_exa_search(&self, params: Value) -> Result<Value> {
        let query = params
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::InvalidParams {
                tool_name: "exa_search".into(),
                reason: "missing required string field `query`".into(),
            })?;

        let num_results = params
            .get("num_results")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_NUM_RESULTS);
        let category = params
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("web");
        let search_type = params
            .get("search_type")
            .and_then(Value::as_str)
            .unwrap_or("keyword");

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AdapterError::config_missing([ENV_EXA_API_KEY]))?;

        debug!(query, num_results, category, search_type, "searching");

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .call(
                RemoteRequest::post(url)
                    .header("x-api-key", api_key)
                    .json(json!({
                        "query": query,
                        "numResults": num_results,
                        "category": category,
                        "type": search_type,
                        "contents": {"text": true}
                    }))
                    .timeout(SEARCH_TIMEOUT),
            )
            .await?;

        let formatted = format_results(&response);
        info!(query, "search completed");
        Ok(Value::String(formatted))
    }
}

/// Format an Exa response into readable text blocks separated by `---`.
fn format_results(response: &Value) -> String {
    let results = match response.get("results").and_then(Value::as_array) {
        Some(results) if !results.is_empty() => results,
        _ => return "No search results.".to_string(),
    };

    let blocks: Vec<String> = results
        .iter()
        .map(|result| {
            let title = result
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("(untitled)");
            let url = result.get("url").and_then(Value::as_str).unwrap_or("-");
            let mut block = format!("Title: {title}\nURL: {url}\n");
            if let Some(text) = result.get("text").and_then(Value::as_str) {
                block.push_str("Content:\n");
                block.push_str(&strip_html_tags(text));
                block.push('\n');
            }
            block
        })
        .collect();

    blocks.join("\n---\n")
}

/// Remove HTML tags from result text.
fn strip_html_tags(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut inside_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => inside_tag = true,
            '>' => inside_tag = false,
            _ if !inside_tag => result.push(ch),
            _ => {}
        }
    }
    result
}

#[async_trait]
impl Adapter for SearchAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn connect(&mut self) -> Result<()> {
        info!(id = %self.id, "search adapter connected");
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "search adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        Ok(if self.config.api_key.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        })
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "exa_search".into(),
            description: "Search the web with the Exa Search API and return \
                          formatted results with title, URL, and page text."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "num_results": {
                        "type": "integer",
                        "description": "Number of results to return (default: 5)"
                    },
                    "category": {
                        "type": "string",
                        "description": "Search category: web, news, or academic (default: web)"
                    },
                    "search_type": {
                        "type": "string",
                        "description": "Search type, e.g. keyword or neural (default: keyword)"
                    }
                },
                "required": ["query"]
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
            "exa_search" => self.tool_exa_search(params).await,
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_config(&self) -> &'static [&'static str] {
        &[ENV_EXA_API_KEY]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_adapter_tools_list() {
        let adapter = SearchAdapter::new("search-test", SearchConfig::default());
        let tools = adapter.tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "exa_search");
    }

    #[tokio::test]
    async fn search_fails_fast_without_key() {
        let mut adapter = SearchAdapter::new("search-test", SearchConfig::default());
        adapter.connect().await.unwrap();
        let err = adapter
            .execute_tool("exa_search", json!({"query": "rust"}))
            .await
            .unwrap_err();
        match err {
            AdapterError::ConfigMissing { names } => {
                assert_eq!(names, vec![ENV_EXA_API_KEY.to_string()]);
            }
            other => panic!("expected ConfigMissing, got {other}"),
        }
    }

    #[tokio::test]
    async fn search_requires_query() {
        let mut adapter = SearchAdapter::new(
            "search-test",
            SearchConfig {
                api_key: Some("k".into()),
                ..SearchConfig::default()
            },
        );
        adapter.connect().await.unwrap();
        let err = adapter.execute_tool("exa_search", json!({})).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn search_rejects_when_not_connected() {
        let adapter = SearchAdapter::new("search-test", SearchConfig::default());
        let result = adapter.execute_tool("exa_search", json!({"query": "x"})).await;
        assert!(matches!(result, Err(AdapterError::NotConnected { .. })));
    }

    #[test]
    fn format_results_builds_blocks() {
        let response = json!({
            "results": [
                {"title": "One", "url": "https://a.com", "text": "<b>bold</b> text"},
                {"title": "Two", "url": "https://b.com"},
            ]
        });
        let out = format_results(&response);
        assert!(out.contains("Title: One"));
        assert!(out.contains("bold text"));
        assert!(!out.contains("<b>"));
        assert!(out.contains("\n---\n"));
        assert!(out.contains("Title: Two"));
    }

    #[test]
    fn format_results_handles_empty() {
        assert_eq!(format_results(&json!({"results": []})), "No search results.");
        assert_eq!(format_results(&json!({})), "No search results.");
    }

    #[test]
    fn strip_html_tags_removes_tags() {
        assert_eq!(strip_html_tags("<p>hello</p> world"), "hello world");
        assert_eq!(strip_html_tags("no tags"), "no tags");
    }
}
