//! Core adapter trait and supporting types.
//!
//! Every service adapter (search, weather, chat, image, workflow) implements
//! the [`Adapter`] trait, providing a uniform interface for an orchestrating
//! agent to discover and invoke tools.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// The category of service an adapter provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterType {
    /// Web and document search services.
    Search,
    /// Conversational backends.
    Messaging,
    /// Image and media generation services.
    Media,
    /// Workflow automation platforms.
    Automation,
    /// General information lookup (weather, reference data).
    Information,
}

impl std::fmt::Display for AdapterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search => write!(f, "search"),
            Self::Messaging => write!(f, "messaging"),
            Self::Media => write!(f, "media"),
            Self::Automation => write!(f, "automation"),
            Self::Information => write!(f, "information"),
        }
    }
}

/// The health status of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The adapter is fully operational.
    Healthy,
    /// The adapter is usable but some credentials are missing, so one or
    /// more of its tools will fail fast when invoked.
    Degraded,
    /// The adapter is not functional.
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// A tool exposed by an adapter that the agent can invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Machine-readable tool name (e.g. `exa_search`, `design_workflow`).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    pub parameters: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Core trait
// ---------------------------------------------------------------------------

/// The universal adapter interface.
///
/// Every service adapter must implement this trait.  The runtime discovers
/// available tools via [`Adapter::tools`] and executes them via
/// [`Adapter::execute_tool`].  Adapters hold no per-request state; concurrent
/// tool invocations are independent.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Return the unique identifier for this adapter instance.
    fn id(&self) -> &str;

    /// Return the category of service this adapter provides.
    fn adapter_type(&self) -> AdapterType;

    /// Mark the adapter as connected.  Adapters in this crate are thin HTTP
    /// callers, so this only flips state and logs; it never dials out.
    async fn connect(&mut self) -> Result<()>;

    /// Mark the adapter as disconnected.
    async fn disconnect(&mut self) -> Result<()>;

    /// Check whether the adapter is operational.  Missing credentials
    /// degrade rather than fail: the adapter stays usable and reports
    /// exactly what is missing when a tool is invoked.
    async fn health_check(&self) -> Result<HealthStatus>;

    /// Return the list of tools this adapter exposes.
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Execute a named tool with the given JSON parameters.
    ///
    /// Returns a JSON value representing the tool's output.
    async fn execute_tool(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Return the environment variable names this adapter reads.
    fn required_config(&self) -> &'static [&'static str];
}
