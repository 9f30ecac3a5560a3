//! Adapter registry and tool dispatch.
//!
//! The registry owns every adapter the process exposes, maintains a flat
//! tool-name index across them, and dispatches tool calls to the owning
//! adapter.
//!
//! Internally the registry is backed by [`DashMap`], which provides lock-free
//! concurrent reads and fine-grained write locking, making it safe to share
//! across tasks without a global `RwLock`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use toolbridge_adapters::{Adapter, AdapterType, HealthStatus, ToolDefinition};

use crate::error::{Result, RuntimeError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Metadata snapshot for a registered adapter.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterInfo {
    /// Unique identifier for this adapter (e.g. "workflow", "search").
    pub id: String,
    /// Category of service the adapter fronts.
    pub adapter_type: AdapterType,
    /// Names of the tools the adapter exposes.
    pub tools: Vec<String>,
    /// When the adapter was registered.
    pub registered_at: DateTime<Utc>,
    /// Result of the most recent health check (if any).
    pub last_health: Option<HealthStatus>,
}

struct Registered {
    adapter: Arc<dyn Adapter>,
    info: AdapterInfo,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Concurrent adapter registry with a flat tool-name index.
///
/// Cheaply cloneable (`Arc`-backed) and `Send + Sync`.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    adapters: Arc<DashMap<String, Registered>>,
    /// tool name -> owning adapter id
    tools: Arc<DashMap<String, String>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect an adapter and register it together with all of its tools.
    ///
    /// Tool names are a flat namespace across adapters; a collision fails the
    /// registration and leaves the registry unchanged.
    pub async fn register(&self, mut adapter: Box<dyn Adapter>) -> Result<()> {
        let id = adapter.id().to_string();
        let definitions = adapter.tools();

        for def in &definitions {
            if let Some(owner) = self.tools.get(&def.name) {
                return Err(RuntimeError::DuplicateTool {
                    tool_name: def.name.clone(),
                    adapter_id: owner.value().clone(),
                });
            }
        }

        adapter.connect().await?;

        let tool_names: Vec<String> = definitions.iter().map(|d| d.name.clone()).collect();
        for name in &tool_names {
            self.tools.insert(name.clone(), id.clone());
        }

        let info = AdapterInfo {
            id: id.clone(),
            adapter_type: adapter.adapter_type(),
            tools: tool_names,
            registered_at: Utc::now(),
            last_health: None,
        };

        info!(adapter_id = %id, tools = info.tools.len(), "adapter registered");

        self.adapters.insert(
            id,
            Registered {
                adapter: Arc::from(adapter),
                info,
            },
        );

        Ok(())
    }

    /// Remove an adapter and drop its tools from the index.
    pub fn unregister(&self, id: &str) -> Result<AdapterInfo> {
        let (_, removed) =
            self.adapters
                .remove(id)
                .ok_or_else(|| RuntimeError::AdapterNotFound {
                    adapter_id: id.to_string(),
                })?;
        for name in &removed.info.tools {
            self.tools.remove(name);
        }
        info!(adapter_id = %id, "adapter unregistered");
        Ok(removed.info)
    }

    /// Retrieve a metadata snapshot for one adapter.
    pub fn get_info(&self, id: &str) -> Result<AdapterInfo> {
        self.adapters
            .get(id)
            .map(|entry| entry.info.clone())
            .ok_or_else(|| RuntimeError::AdapterNotFound {
                adapter_id: id.to_string(),
            })
    }

    /// Snapshot of all registered adapters.
    pub fn list_adapters(&self) -> Vec<AdapterInfo> {
        self.adapters.iter().map(|e| e.info.clone()).collect()
    }

    /// Catalog of every tool across all adapters.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut all: Vec<ToolDefinition> = self
            .adapters
            .iter()
            .flat_map(|e| e.adapter.tools())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Total number of registered adapters.
    pub fn count(&self) -> usize {
        self.adapters.len()
    }

    /// Execute `tool_name` on whichever adapter owns it.
    pub async fn dispatch(&self, tool_name: &str, params: Value) -> Result<Value> {
        let adapter = {
            let owner = self
                .tools
                .get(tool_name)
                .ok_or_else(|| RuntimeError::ToolNotFound {
                    tool_name: tool_name.to_string(),
                })?;
            let entry =
                self.adapters
                    .get(owner.value())
                    .ok_or_else(|| RuntimeError::AdapterNotFound {
                        adapter_id: owner.value().clone(),
                    })?;
            entry.adapter.clone()
        };

        debug!(tool = %tool_name, adapter_id = %adapter.id(), "dispatching tool call");
        let result = adapter.execute_tool(tool_name, params).await?;
        Ok(result)
    }

    /// Run a health check on every adapter, record the results, and return
    /// them keyed by adapter id.
    pub async fn health_check_all(&self) -> Vec<(String, HealthStatus)> {
        let snapshot: Vec<(String, Arc<dyn Adapter>)> = self
            .adapters
            .iter()
            .map(|e| (e.key().clone(), e.adapter.clone()))
            .collect();

        let mut results = Vec::with_capacity(snapshot.len());
        for (id, adapter) in snapshot {
            let status = match adapter.health_check().await {
                Ok(status) => status,
                Err(err) => {
                    warn!(adapter_id = %id, error = %err, "health check failed");
                    HealthStatus::Unhealthy
                }
            };
            if let Some(mut entry) = self.adapters.get_mut(&id) {
                entry.info.last_health = Some(status);
            }
            results.push((id, status));
        }
        results
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
