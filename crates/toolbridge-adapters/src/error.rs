//! Adapter error types.
//!
//! All adapter subsystems surface errors through [`AdapterError`].  Each
//! variant carries enough context for callers to decide how to handle the
//! failure without inspecting opaque strings.

/// Unified error type for Toolbridge adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// One or more required environment variables are not set.  The
    /// operation fails before any network I/O is attempted.
    #[error("missing required environment variables: {}", names.join(", "))]
    ConfigMissing { names: Vec<String> },

    /// The requested tool does not exist on this adapter.
    #[error("tool not found: `{tool_name}` on adapter `{adapter_id}`")]
    ToolNotFound {
        adapter_id: String,
        tool_name: String,
    },

    /// The parameters supplied to a tool are invalid.
    #[error("invalid parameters for tool `{tool_name}`: {reason}")]
    InvalidParams { tool_name: String, reason: String },

    /// A tool was invoked on an adapter that has not been connected.
    #[error("adapter `{adapter_id}` is not connected")]
    NotConnected { adapter_id: String },

    /// The outbound request could not be completed (DNS, connection
    /// refused, TLS, etc.).
    #[error("network failure calling `{url}`: {reason}")]
    Network { url: String, reason: String },

    /// The outbound request exceeded its time limit.
    #[error("timeout after {seconds}s calling `{url}`")]
    Timeout { seconds: u64, url: String },

    /// The remote service answered with a non-2xx status.  `detail` is the
    /// remote error body, pretty-printed JSON when parseable, otherwise
    /// truncated raw text.
    #[error("remote service returned HTTP {status}: {detail}")]
    RemoteStatus { status: u16, detail: String },

    /// The response body was not valid JSON, or lacked an expected field.
    #[error("failed to parse response from `{url}`: {reason}")]
    ResponseParse { url: String, reason: String },

    /// The generated workflow text could not be interpreted as a
    /// structured document.
    #[error("malformed generated document: {reason}")]
    DocumentMalformed { reason: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdapterError {
    /// Build a [`AdapterError::ConfigMissing`] from any set of names.
    pub fn config_missing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ConfigMissing {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;
