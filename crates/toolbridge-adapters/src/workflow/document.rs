//! Workflow document schema and normalization.
//!
//! The generative API is untrusted free text, so this module is the sole
//! boundary enforcing the submission schema.  Every field's normalization
//! rule is declared once in [`WorkflowDocument::from_value`]; a malformed
//! field degrades to its default instead of failing the whole document.

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::{AdapterError, Result};

/// Top-level fields assigned by the remote system.  They must never be
/// client-supplied, so submission strips them unconditionally.
pub const FORBIDDEN_FIELDS: &[&str] = &[
    "id",
    "versionId",
    "meta",
    "pinData",
    "createdAt",
    "updatedAt",
    "active",
    "tags",
];

/// Placeholder used when the generated document has no usable `name`.
const DEFAULT_NAME: &str = "Generated Workflow";

/// Top-level keys owned by [`WorkflowDocument`]; everything else lands in
/// `extra`.
const DOCUMENT_KEYS: &[&str] = &["name", "nodes", "connections", "active", "settings"];

/// Node keys owned by [`Node`]; everything else lands in `extra`.
const NODE_KEYS: &[&str] = &["name", "type", "parameters", "position"];

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A node's canvas position, always an ordered pair of integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position(pub i64, pub i64);

impl Position {
    /// Normalize an arbitrary JSON value into a position.
    ///
    /// - array of exactly two numbers: coerced to integers;
    /// - string `"x,y"`: parsed, falling back to the origin;
    /// - single number: taken as the x coordinate;
    /// - anything else, or a missing field: the origin.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) if items.len() == 2 => {
                match (items[0].as_f64(), items[1].as_f64()) {
                    (Some(x), Some(y)) => Self(x as i64, y as i64),
                    _ => Self::default(),
                }
            }
            Some(Value::String(s)) => Self::parse_pair(s).unwrap_or_default(),
            Some(Value::Number(n)) => Self(n.as_f64().unwrap_or(0.0) as i64, 0),
            _ => Self::default(),
        }
    }

    fn parse_pair(s: &str) -> Option<Self> {
        let mut parts = s.split(',');
        let x: f64 = parts.next()?.trim().parse().ok()?;
        let y: f64 = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self(x as i64, y as i64))
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.0)?;
        seq.serialize_element(&self.1)?;
        seq.end()
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A single workflow node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parameters: Map<String, Value>,
    pub position: Position,
    /// Any additional node fields the generator produced, carried through
    /// untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    fn from_object(obj: &Map<String, Value>) -> Self {
        let extra = obj
            .iter()
            .filter(|(k, _)| !NODE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            name: string_field(obj, "name"),
            kind: string_field(obj, "type"),
            parameters: object_field(obj, "parameters").unwrap_or_default(),
            position: Position::from_value(obj.get("position")),
            extra,
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowDocument
// ---------------------------------------------------------------------------

/// A workflow automation definition: produced by generation, consumed by
/// submission.  Carries no identity or version fields of its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowDocument {
    pub name: String,
    pub nodes: Vec<Node>,
    pub connections: Map<String, Value>,
    pub active: bool,
    pub settings: Map<String, Value>,
    /// Top-level fields outside the schema, preserved so the caller sees
    /// exactly what was generated.  Forbidden fields among them are removed
    /// at submission time only.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDocument {
    /// Parse a generated text blob (optionally wrapped in a Markdown code
    /// fence) into a normalized document.
    pub fn from_generated(text: &str) -> Result<Self> {
        let stripped = strip_code_fence(text);
        let raw: Value =
            serde_json::from_str(stripped).map_err(|e| AdapterError::DocumentMalformed {
                reason: format!("generated text is not valid JSON: {e}"),
            })?;
        Self::from_value(&raw)
    }

    /// Normalize an arbitrary JSON value into a document, applying the
    /// defaulting pass field by field.  Re-normalizing an already-normalized
    /// document is a no-op.
    pub fn from_value(raw: &Value) -> Result<Self> {
        let obj = raw.as_object().ok_or_else(|| AdapterError::DocumentMalformed {
            reason: "expected a JSON object at the top level".to_string(),
        })?;

        let name = match obj.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                warn!(default = DEFAULT_NAME, "workflow has no usable `name`");
                DEFAULT_NAME.to_string()
            }
        };

        let nodes = match obj.get("nodes").and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(|item| match item.as_object() {
                    Some(node) => Some(Node::from_object(node)),
                    None => {
                        warn!("dropping non-object entry in `nodes`");
                        None
                    }
                })
                .collect(),
            None => {
                warn!("workflow has no `nodes` array, defaulting to empty");
                Vec::new()
            }
        };

        let connections = object_field(obj, "connections").unwrap_or_else(|| {
            warn!("workflow has no `connections` object, defaulting to empty");
            Map::new()
        });

        let active = obj.get("active").and_then(Value::as_bool).unwrap_or(false);

        let settings = object_field(obj, "settings").unwrap_or_else(|| {
            warn!("workflow has no `settings` object, applying default");
            default_settings()
        });

        let extra = obj
            .iter()
            .filter(|(k, _)| !DOCUMENT_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            name,
            nodes,
            connections,
            active,
            settings,
            extra,
        })
    }

    /// Serialize for submission, stripping every remote-assigned field from
    /// the top level.
    pub fn submission_body(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            for field in FORBIDDEN_FIELDS {
                obj.remove(*field);
            }
        }
        Ok(value)
    }
}

fn default_settings() -> Map<String, Value> {
    let mut settings = Map::new();
    settings.insert("executionOrder".to_string(), json!("v1"));
    settings
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn object_field(obj: &Map<String, Value>, key: &str) -> Option<Map<String, Value>> {
    obj.get(key).and_then(Value::as_object).cloned()
}

/// Strip a Markdown code fence (```json ... ``` or ``` ... ```) wrapping the
/// generated output, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
