//! Image generation adapter.
//!
//! Forwards a prompt to a Flux image-generation webhook and returns a
//! Markdown block linking the first generated image.  The webhook's
//! `image_urls` field is tolerated in several shapes: a JSON array, a
//! stringified JSON array, and entries that are either `{url}` objects or
//! bare URL strings.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::client::{RemoteClient, RemoteRequest};
use crate::config::env_var;
use crate::error::{AdapterError, Result};
use crate::traits::{Adapter, AdapterType, HealthStatus, ToolDefinition};

/// Environment variable holding the image webhook URL.
pub const ENV_IMAGE_WEBHOOK_URL: &str = "FLUX_IMAGE_WEBHOOK_URL";

const IMAGE_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_COUNT: u64 = 1;
const DEFAULT_FORMAT: &str = "png";
const DEFAULT_QUALITY: u64 = 100;
const DEFAULT_ASPECT_RATIO: &str = "1:1";
const DEFAULT_MODEL: &str = "flux-dev";

/// Configuration for the image adapter.
#[derive(Debug, Clone, Default)]
pub struct ImageConfig {
    /// Image generation webhook URL (`FLUX_IMAGE_WEBHOOK_URL`).
    pub webhook_url: Option<String>,
}

impl ImageConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            webhook_url: env_var(ENV_IMAGE_WEBHOOK_URL),
        }
    }
}

/// Image generation service adapter.
pub struct ImageAdapter {
    id: String,
    connected: bool,
    config: ImageConfig,
    client: RemoteClient,
}

impl ImageAdapter {
    /// Create a new image adapter with an injected configuration.
    pub fn new(id: impl Into<String>, config: ImageConfig) -> Self {
        Self {
            id: id.into(),
            connected: false,
            config,
            client: RemoteClient::new(),
        }
    }

    /// Create a new image adapter configured from the environment.
    pub fn from_env(id: impl Into<String>) -> Self {
        Self::new(id, ImageConfig::from_env())
    }

    async fn tool_generate_image(&self, params: Value) -> Result<Value> {
        let prompt = params
            .get("prompt")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::InvalidParams {
                tool_name: "generate_image".into(),
                reason: "missing required string field `prompt`".into(),
            })?;

        let webhook_url = self
            .config
            .webhook_url
            .as_deref()
            .ok_or_else(|| AdapterError::config_missing([ENV_IMAGE_WEBHOOK_URL]))?;

        let count = params.get("count").and_then(Value::as_u64).unwrap_or(DEFAULT_COUNT);
        let format = params
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_FORMAT);
        let quality = params
            .get("quality")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_QUALITY);
        let aspect_ratio = params
            .get("aspect_ratio")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ASPECT_RATIO);
        let model = params
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MODEL);

        debug!(prompt, count, format, quality, aspect_ratio, model, "generating image");

        let data = self
            .client
            .call(
                RemoteRequest::post(webhook_url)
                    .json(json!({
                        "prompt": prompt,
                        "count": count,
                        "format": format,
                        "quality": quality,
                        "aspect_ratio": aspect_ratio,
                        "model": model,
                    }))
                    .timeout(IMAGE_TIMEOUT),
            )
            .await?;

        let urls = extract_image_urls(&data);
        let first = urls.first().ok_or_else(|| AdapterError::ResponseParse {
            url: webhook_url.to_string(),
            reason: "webhook returned no image URLs".to_string(),
        })?;

        if !first.starts_with("http://") && !first.starts_with("https://") {
            warn!(url = %first, "webhook returned a non-http image URL");
            return Err(AdapterError::ResponseParse {
                url: webhook_url.to_string(),
                reason: format!("invalid image URL: {first}"),
            });
        }

        info!(image_url = %first, "image generated");

        Ok(Value::String(format!(
            "### Generated image\n\n![Generated Image]({first})\n\n[Open full size]({first})"
        )))
    }
}

/// Pull image URLs out of the webhook response, whatever shape they arrive
/// in.
fn extract_image_urls(data: &Value) -> Vec<String> {
    let raw = match data.get("image_urls") {
        Some(v) => v,
        None => return Vec::new(),
    };

    // The field is sometimes a JSON array serialized into a string.
    let parsed;
    let items = match raw {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(v) => {
                parsed = v;
                parsed.as_array().cloned().unwrap_or_default()
            }
            Err(_) => return Vec::new(),
        },
        Value::Array(items) => items.clone(),
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("url").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl Adapter for ImageAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Media
    }

    async fn connect(&mut self) -> Result<()> {
        info!(id = %self.id, "image adapter connected");
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "image adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        Ok(if self.config.webhook_url.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        })
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "generate_image".into(),
            description: "Generate an image from a text prompt via the Flux \
                          webhook and return a Markdown link to the result."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "The image prompt"
                    },
                    "count": {
                        "type": "integer",
                        "description": "Number of images to generate (default: 1)"
                    },
                    "format": {
                        "type": "string",
                        "description": "Image format (default: png)"
                    },
                    "quality": {
                        "type": "integer",
                        "description": "Image quality, 1-100 (default: 100)"
                    },
                    "aspect_ratio": {
                        "type": "string",
                        "description": "Aspect ratio (default: 1:1)"
                    },
                    "model": {
                        "type": "string",
                        "description": "Model name (default: flux-dev)"
                    }
                },
                "required": ["prompt"]
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
            "generate_image" => self.tool_generate_image(params).await,
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_config(&self) -> &'static [&'static str] {
        &[ENV_IMAGE_WEBHOOK_URL]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
