//! Remote call client -- the single-request HTTP boundary used by all
//! adapters.
//!
//! [`RemoteClient::call`] issues exactly one outbound request with a bounded
//! timeout and returns parsed JSON or a typed failure.  Three failure kinds
//! are distinguished: network/connection errors, non-2xx statuses (carrying
//! the remote error body verbatim), and response bodies that are not valid
//! JSON.  No retries, no caching.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::error::{AdapterError, Result};

/// Maximum length of a raw (non-JSON) error body echoed into an error
/// message before truncation.
const MAX_DETAIL_BYTES: usize = 600;

/// Specification of a single outbound HTTP call.
pub struct RemoteRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl RemoteRequest {
    /// Start a GET request to `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Start a POST request to `url`.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Add a request header.
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Add a query-string parameter.
    pub fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Override the default 30-second timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Shared HTTP boundary for all adapters.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
}

impl RemoteClient {
    /// Create a new client with the crate's user agent.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("toolbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Issue a single HTTP request and parse the response body as JSON.
    pub async fn call(&self, request: RemoteRequest) -> Result<Value> {
        url::Url::parse(&request.url).map_err(|e| AdapterError::Network {
            url: request.url.clone(),
            reason: format!("invalid URL: {e}"),
        })?;

        let timeout_secs = request.timeout.as_secs();
        debug!(
            method = %request.method,
            url = %request.url,
            timeout_secs,
            "issuing remote call"
        );

        let mut builder = self
            .http
            .request(request.method, &request.url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AdapterError::Timeout {
                    seconds: timeout_secs,
                    url: request.url.clone(),
                }
            } else {
                AdapterError::Network {
                    url: request.url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AdapterError::Network {
            url: request.url.clone(),
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(AdapterError::RemoteStatus {
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| AdapterError::ResponseParse {
            url: request.url.clone(),
            reason: e.to_string(),
        })
    }
}

impl Default for RemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Surface a remote error body verbatim: structured JSON when parseable,
/// truncated raw text otherwise.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()),
        Err(_) => truncate(body, MAX_DETAIL_BYTES),
    }
}

/// Truncate to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
