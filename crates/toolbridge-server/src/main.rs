//! `toolbridge` binary: register the service adapters and serve MCP.

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use toolbridge_adapters::{
    ChatAdapter, HealthStatus, ImageAdapter, SearchAdapter, WeatherAdapter, WorkflowAdapter,
};
use toolbridge_runtime::ToolRegistry;
use toolbridge_server::{serve, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting toolbridge");

    let registry = ToolRegistry::new();
    registry
        .register(Box::new(SearchAdapter::from_env("search")))
        .await?;
    registry
        .register(Box::new(WeatherAdapter::from_env("weather")))
        .await?;
    registry
        .register(Box::new(ChatAdapter::from_env("chat")))
        .await?;
    registry
        .register(Box::new(ImageAdapter::from_env("image")))
        .await?;
    registry
        .register(Box::new(WorkflowAdapter::from_env("workflow")))
        .await?;

    for (id, status) in registry.health_check_all().await {
        match status {
            HealthStatus::Healthy => info!(adapter_id = %id, "adapter healthy"),
            status => warn!(adapter_id = %id, %status, "adapter not fully configured"),
        }
    }

    serve(ServerConfig::from_env(), registry).await
}
