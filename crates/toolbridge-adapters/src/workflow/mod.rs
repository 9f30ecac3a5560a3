//! Workflow automation adapter -- the two-stage generate-then-submit
//! pipeline.
//!
//! `design_workflow` asks a generative text API to synthesize a workflow
//! document from a natural-language prompt and returns the normalized
//! document directly.  `create_workflow` submits a document to the
//! automation platform.  The two tools are intentionally decoupled: the
//! orchestrating agent (or a human) can inspect and edit the generated
//! document before committing it.

pub mod document;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::{RemoteClient, RemoteRequest};
use crate::config::env_var;
use crate::error::{AdapterError, Result};
use crate::traits::{Adapter, AdapterType, HealthStatus, ToolDefinition};
use document::WorkflowDocument;

/// Environment variable holding the generative API key.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Environment variable holding the automation platform base URL.
pub const ENV_N8N_API_URL: &str = "N8N_API_URL";
/// Environment variable holding the automation platform API key.
pub const ENV_N8N_API_KEY: &str = "N8N_API_KEY";

/// Default base URL of the generative endpoint.
const DEFAULT_GENERATION_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generative model.
const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash";

/// Generation is slow; give the model time.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Submission to the automation platform.
const SUBMISSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling temperature for workflow generation.
const GENERATION_TEMPERATURE: f64 = 0.7;

/// Fixed instructional framing prepended to every design prompt.
const SCHEMA_INSTRUCTIONS: &str = "\
You are an n8n workflow design expert. Design a complete n8n workflow for \
the user's requirement and answer with strict, valid n8n workflow JSON only.
The JSON must contain these top-level properties:
- \"name\" (string): the workflow name.
- \"nodes\" (array): one object per node, each with:
    - \"name\" (string): the node name.
    - \"type\" (string): the node type (e.g. \"n8n-nodes-base.webhook\").
    - \"position\" (array): two numbers, the node's [x, y] canvas \
coordinates, e.g. [100, 200].
    - \"parameters\" (object): the node's configuration.
    - any other properties the node requires.
- \"connections\" (object): the connections between nodes.
- \"active\" (boolean): whether the workflow is enabled.
- \"settings\" (object): workflow settings, at least {\"executionOrder\": \"v1\"}.

The JSON must be accepted by the n8n /workflows API as-is. Never include \
the top-level properties 'id', 'versionId', 'meta', 'pinData', 'createdAt', \
'updatedAt' or 'tags'; those are assigned by the platform.";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Credentials and endpoints for the workflow adapter, resolved once and
/// injected at construction.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Generative API key (`GEMINI_API_KEY`).
    pub gemini_api_key: Option<String>,
    /// Automation platform base URL (`N8N_API_URL`).
    pub n8n_api_url: Option<String>,
    /// Automation platform API key (`N8N_API_KEY`).
    pub n8n_api_key: Option<String>,
    /// Base URL of the generative endpoint; overridable for tests.
    pub generation_base_url: String,
    /// Model name used for generation.
    pub generation_model: String,
}

impl WorkflowConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: env_var(ENV_GEMINI_API_KEY),
            n8n_api_url: env_var(ENV_N8N_API_URL),
            n8n_api_key: env_var(ENV_N8N_API_KEY),
            ..Self::default()
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            n8n_api_url: None,
            n8n_api_key: None,
            generation_base_url: DEFAULT_GENERATION_BASE_URL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Workflow automation service adapter.
pub struct WorkflowAdapter {
    id: String,
    connected: bool,
    config: WorkflowConfig,
    client: RemoteClient,
}

impl WorkflowAdapter {
    /// Create a new workflow adapter with an injected configuration.
    pub fn new(id: impl Into<String>, config: WorkflowConfig) -> Self {
        Self {
            id: id.into(),
            connected: false,
            config,
            client: RemoteClient::new(),
        }
    }

    /// Create a new workflow adapter configured from the environment.
    pub fn from_env(id: impl Into<String>) -> Self {
        Self::new(id, WorkflowConfig::from_env())
    }

    /// Generate a workflow document from a natural-language prompt.
    async fn tool_design_workflow(&self, params: Value) -> Result<Value> {
        let prompt = params
            .get("prompt")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::InvalidParams {
                tool_name: "design_workflow".into(),
                reason: "missing required string field `prompt`".into(),
            })?;

        let api_key = self
            .config
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| AdapterError::config_missing([ENV_GEMINI_API_KEY]))?;

        debug!(prompt_len = prompt.len(), "designing workflow");

        let full_prompt = format!(
            "{SCHEMA_INSTRUCTIONS}\n\nUser requirement: {prompt}\n\
             Design a workflow for this requirement and answer with the \
             complete n8n workflow JSON."
        );

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.generation_base_url.trim_end_matches('/'),
            self.config.generation_model,
        );

        let response = self
            .client
            .call(
                RemoteRequest::post(&url)
                    .header("x-goog-api-key", api_key)
                    .json(json!({
                        "contents": [
                            {"role": "user", "parts": [{"text": full_prompt}]}
                        ],
                        "generationConfig": {"temperature": GENERATION_TEMPERATURE}
                    }))
                    .timeout(GENERATION_TIMEOUT),
            )
            .await?;

        let text = response
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::ResponseParse {
                url,
                reason: "no generation candidates in response".to_string(),
            })?;

        let document = WorkflowDocument::from_generated(text)?;
        info!(
            workflow = %document.name,
            nodes = document.nodes.len(),
            "workflow designed"
        );

        // The document itself is the result, not an envelope around it.
        Ok(serde_json::to_value(&document)?)
    }

    /// Submit a workflow document to the automation platform.
    async fn tool_create_workflow(&self, params: Value) -> Result<Value> {
        let workflow = params
            .get("workflow")
            .ok_or_else(|| AdapterError::InvalidParams {
                tool_name: "create_workflow".into(),
                reason: "missing required object field `workflow`".into(),
            })?;

        if !workflow.is_object() {
            return Err(AdapterError::InvalidParams {
                tool_name: "create_workflow".into(),
                reason: "`workflow` must be a JSON object".into(),
            });
        }

        let (base_url, api_key) = self.submission_config()?;

        // Defensive re-normalization: repairs node positions again and
        // guarantees the forbidden fields are stripped, whatever the caller
        // edited in between.
        let document = WorkflowDocument::from_value(workflow)?;
        let body = document.submission_body()?;

        debug!(workflow = %document.name, "submitting workflow");

        let ack = self
            .client
            .call(
                RemoteRequest::post(format!("{base_url}/workflows"))
                    .header("X-N8N-API-KEY", api_key)
                    .json(body)
                    .timeout(SUBMISSION_TIMEOUT),
            )
            .await?;

        info!(workflow = %document.name, "workflow created");

        Ok(json!({"status": "success", "data": ack}))
    }

    /// Resolve both submission credentials, naming every missing variable.
    fn submission_config(&self) -> Result<(&str, &str)> {
        match (&self.config.n8n_api_url, &self.config.n8n_api_key) {
            (Some(url), Some(key)) => Ok((url.trim_end_matches('/'), key.as_str())),
            (url, key) => {
                let mut names = Vec::new();
                if url.is_none() {
                    names.push(ENV_N8N_API_URL);
                }
                if key.is_none() {
                    names.push(ENV_N8N_API_KEY);
                }
                Err(AdapterError::config_missing(names))
            }
        }
    }
}

#[async_trait]
impl Adapter for WorkflowAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Automation
    }

    async fn connect(&mut self) -> Result<()> {
        info!(id = %self.id, "workflow adapter connected");
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "workflow adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        let complete = self.config.gemini_api_key.is_some()
            && self.config.n8n_api_url.is_some()
            && self.config.n8n_api_key.is_some();
        Ok(if complete {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        })
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "design_workflow".into(),
                description: "Design an n8n workflow from a natural-language \
                              requirement. Returns the complete workflow JSON \
                              document, ready for inspection or submission via \
                              create_workflow."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "prompt": {
                            "type": "string",
                            "description": "Description of the workflow to design"
                        }
                    },
                    "required": ["prompt"]
                }),
            },
            ToolDefinition {
                name: "create_workflow".into(),
                description: "Create a workflow on the n8n instance. Pass the \
                              full workflow JSON document (e.g. the output of \
                              design_workflow) as the `workflow` parameter."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "workflow": {
                            "type": "object",
                            "description": "The complete workflow document to create"
                        }
                    },
                    "required": ["workflow"]
                }),
            },
        ]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value> {
        if !self.connected {
            return Err(AdapterError::NotConnected {
                adapter_id: self.id.clone(),
            });
        }
        match name {
            "design_workflow" => self.tool_design_workflow(params).await,
            "create_workflow" => self.tool_create_workflow(params).await,
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_config(&self) -> &'static [&'static str] {
        &[ENV_GEMINI_API_KEY, ENV_N8N_API_URL, ENV_N8N_API_KEY]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
