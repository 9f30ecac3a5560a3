//! Uniform tool-call outcome reporting.
//!
//! Successful tool calls pass their payload through untouched; failures
//! collapse into a `{"status": "error", "message": ...}` envelope so callers
//! always receive well-formed JSON, whatever went wrong underneath.

use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::Result;

/// Flatten a dispatch result into the JSON the caller sees.
pub fn report(tool_name: &str, result: Result<Value>) -> Value {
    match result {
        Ok(payload) => {
            info!(tool = %tool_name, "tool call succeeded");
            payload
        }
        Err(err) => {
            error!(tool = %tool_name, error = %err, "tool call failed");
            json!({
                "status": "error",
                "message": err.to_string(),
            })
        }
    }
}

/// True if `value` is an error envelope produced by [`report`].
pub fn is_error(value: &Value) -> bool {
    value.get("status").and_then(Value::as_str) == Some("error")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::RuntimeError;

    #[test]
    fn success_passes_payload_through() {
        let out = report("echo", Ok(json!({"answer": 42})));
        assert_eq!(out, json!({"answer": 42}));
        assert!(!is_error(&out));
    }

    #[test]
    fn failure_becomes_error_envelope() {
        let out = report(
            "echo",
            Err(RuntimeError::ToolNotFound {
                tool_name: "echo".into(),
            }),
        );
        assert!(is_error(&out));
        assert_eq!(out["message"], "unknown tool: echo");
    }

    #[test]
    fn string_payloads_survive() {
        let out = report("search", Ok(Value::String("No search results.".into())));
        assert_eq!(out, json!("No search results."));
        assert!(!is_error(&out));
    }
}
