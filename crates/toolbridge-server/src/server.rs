//! HTTP server setup and startup.
//!
//! Composes the Axum router over a shared [`ToolRegistry`] and starts the
//! listener.  The MCP surface lives at `POST /mcp`; `GET /health` reports
//! per-adapter health for monitoring.

use anyhow::Context;
use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use toolbridge_adapters::config::env_var;
use toolbridge_runtime::ToolRegistry;

use crate::mcp;

/// Environment variable holding the bind address.
pub const ENV_BIND: &str = "TOOLBRIDGE_BIND";
/// Environment variable holding the port.
pub const ENV_PORT: &str = "TOOLBRIDGE_PORT";

const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 7430;

/// Bind address and port configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl ServerConfig {
    /// Resolve the configuration from the process environment, falling back
    /// to `127.0.0.1:7430`.
    pub fn from_env() -> Self {
        let bind_addr = env_var(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let port = env_var(ENV_PORT)
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { bind_addr, port }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Build the Axum router with all routes registered.
pub fn router(registry: ToolRegistry) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/mcp", post(mcp::handle_mcp_request))
        .route("/health", get(health))
        .layer(cors)
        .with_state(registry)
}

/// Report per-adapter health.
async fn health(State(registry): State<ToolRegistry>) -> Json<Value> {
    let results = registry.health_check_all().await;
    let adapters: Vec<Value> = registry
        .list_adapters()
        .into_iter()
        .map(|info| {
            json!({
                "id": info.id,
                "type": info.adapter_type,
                "tools": info.tools,
                "health": info.last_health,
            })
        })
        .collect();

    let all_healthy = results
        .iter()
        .all(|(_, status)| *status == toolbridge_adapters::HealthStatus::Healthy);

    Json(json!({
        "status": if all_healthy { "ok" } else { "degraded" },
        "adapters": adapters,
    }))
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: ServerConfig, registry: ToolRegistry) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "MCP server listening");

    axum::serve(listener, router(registry))
        .await
        .context("server error")?;
    Ok(())
}
