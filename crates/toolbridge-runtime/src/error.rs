//! Runtime error types.

use thiserror::Error;

use toolbridge_adapters::AdapterError;

/// Errors produced by the registry and dispatch layer.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No registered adapter exposes the requested tool.
    #[error("unknown tool: {tool_name}")]
    ToolNotFound { tool_name: String },

    /// The requested adapter is not registered.
    #[error("adapter not found: {adapter_id}")]
    AdapterNotFound { adapter_id: String },

    /// Two adapters tried to claim the same tool name.
    #[error("tool '{tool_name}' already registered by adapter '{adapter_id}'")]
    DuplicateTool {
        tool_name: String,
        adapter_id: String,
    },

    /// An adapter failed while executing a tool.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Convenience alias used throughout the runtime crate.
pub type Result<T> = std::result::Result<T, RuntimeError>;
