//! End-to-end tests for the two-stage workflow pipeline.
//!
//! These tests spin up **real** Axum servers on OS-assigned ephemeral ports
//! standing in for the generative endpoint and the automation platform, then
//! drive the adapter through actual HTTP round trips.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use toolbridge_adapters::workflow::{
    WorkflowAdapter, WorkflowConfig, ENV_GEMINI_API_KEY, ENV_N8N_API_KEY, ENV_N8N_API_URL,
};
use toolbridge_adapters::{Adapter, AdapterError};

// ── helpers ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct MockState {
    hits: Arc<AtomicUsize>,
    reply: Value,
    status: StatusCode,
}

/// Bind to 127.0.0.1:0, serve `reply` at `path`, return (base_url, hit counter).
async fn start_mock(path: &str, status: StatusCode, reply: Value) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = MockState {
        hits: hits.clone(),
        reply,
        status,
    };

    let app = Router::new()
        .route(
            path,
            post(
                |State(state): State<MockState>, _headers: HeaderMap, _body: Json<Value>| async move {
                    state.hits.fetch_add(1, Ordering::SeqCst);
                    (state.status, Json(state.reply.clone()))
                },
            ),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to port 0");
    let addr: SocketAddr = listener.local_addr().expect("get local addr");
    let base = format!("http://127.0.0.1:{}", addr.port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    // Small yield so the listener is ready.
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    (base, hits)
}

/// A generative reply wrapping `text` in the candidates envelope.
fn generation_reply(text: &str) -> Value {
    json!({
        "candidates": [
            {"content": {"parts": [{"text": text}], "role": "model"}}
        ]
    })
}

async fn connected(config: WorkflowConfig) -> WorkflowAdapter {
    let mut adapter = WorkflowAdapter::new("wf-e2e", config);
    adapter.connect().await.expect("connect");
    adapter
}

// ── design_workflow ──────────────────────────────────────────────────────────

#[tokio::test]
async fn design_strips_code_fence_and_applies_defaults() {
    let text = "```json\n{\"nodes\": [{\"name\": \"Hook\", \"type\": \
                \"n8n-nodes-base.webhook\", \"position\": \"120,240\", \
                \"parameters\": {}}]}\n```";
    let (base, hits) = start_mock(
        "/models/test-model:generateContent",
        StatusCode::OK,
        generation_reply(text),
    )
    .await;

    let adapter = connected(WorkflowConfig {
        gemini_api_key: Some("test-key".into()),
        generation_base_url: base,
        generation_model: "test-model".into(),
        ..WorkflowConfig::default()
    })
    .await;

    let document = adapter
        .execute_tool("design_workflow", json!({"prompt": "a webhook listener"}))
        .await
        .expect("design failed");

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(document["name"], "Generated Workflow");
    assert_eq!(document["active"], false);
    assert_eq!(document["settings"], json!({"executionOrder": "v1"}));
    assert_eq!(document["connections"], json!({}));
    // The string position is parsed into a numeric pair.
    assert_eq!(document["nodes"][0]["position"], json!([120, 240]));
}

#[tokio::test]
async fn design_surfaces_non_json_generation_as_malformed() {
    let (base, _hits) = start_mock(
        "/models/test-model:generateContent",
        StatusCode::OK,
        generation_reply("sorry, I cannot help with that"),
    )
    .await;

    let adapter = connected(WorkflowConfig {
        gemini_api_key: Some("test-key".into()),
        generation_base_url: base,
        generation_model: "test-model".into(),
        ..WorkflowConfig::default()
    })
    .await;

    let err = adapter
        .execute_tool("design_workflow", json!({"prompt": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::DocumentMalformed { .. }), "{err}");
}

#[tokio::test]
async fn design_reports_empty_candidate_list() {
    let (base, _hits) = start_mock(
        "/models/test-model:generateContent",
        StatusCode::OK,
        json!({"candidates": []}),
    )
    .await;

    let adapter = connected(WorkflowConfig {
        gemini_api_key: Some("test-key".into()),
        generation_base_url: base,
        generation_model: "test-model".into(),
        ..WorkflowConfig::default()
    })
    .await;

    let err = adapter
        .execute_tool("design_workflow", json!({"prompt": "x"}))
        .await
        .unwrap_err();
    match err {
        AdapterError::ResponseParse { reason, .. } => {
            assert!(reason.contains("no generation candidates"), "{reason}");
        }
        other => panic!("expected ResponseParse, got {other}"),
    }
}

// ── create_workflow ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_submits_and_wraps_acknowledgement() {
    let (base, hits) = start_mock(
        "/workflows",
        StatusCode::OK,
        json!({"id": "42", "name": "My Flow"}),
    )
    .await;

    let adapter = connected(WorkflowConfig {
        n8n_api_url: Some(base),
        n8n_api_key: Some("n8n-key".into()),
        ..WorkflowConfig::default()
    })
    .await;

    let result = adapter
        .execute_tool(
            "create_workflow",
            json!({"workflow": {
                "name": "My Flow",
                "nodes": [],
                "connections": {},
                "id": "client-assigned-should-be-stripped"
            }}),
        )
        .await
        .expect("create failed");

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(result["status"], "success");
    assert_eq!(result["data"]["id"], "42");
}

#[tokio::test]
async fn create_surfaces_platform_rejection_with_status_and_detail() {
    let (base, _hits) = start_mock(
        "/workflows",
        StatusCode::BAD_REQUEST,
        json!({"message": "request/body must have required property 'name'"}),
    )
    .await;

    let adapter = connected(WorkflowConfig {
        n8n_api_url: Some(base),
        n8n_api_key: Some("n8n-key".into()),
        ..WorkflowConfig::default()
    })
    .await;

    let err = adapter
        .execute_tool("create_workflow", json!({"workflow": {"nodes": []}}))
        .await
        .unwrap_err();
    match err {
        AdapterError::RemoteStatus { status, detail } => {
            assert_eq!(status, 400);
            assert!(detail.contains("required property"), "{detail}");
        }
        other => panic!("expected RemoteStatus, got {other}"),
    }
}

// ── full pipeline ────────────────────────────────────────────────────────────

#[tokio::test]
async fn design_then_create_round_trip() {
    let text = "{\"name\": \"Nightly Report\", \"nodes\": [{\"name\": \"Cron\", \
                \"type\": \"n8n-nodes-base.cron\", \"position\": [100, 200], \
                \"parameters\": {}}], \"connections\": {}}";
    let (gen_base, _gen_hits) = start_mock(
        "/models/test-model:generateContent",
        StatusCode::OK,
        generation_reply(text),
    )
    .await;
    let (n8n_base, n8n_hits) =
        start_mock("/workflows", StatusCode::OK, json!({"id": "42"})).await;

    let adapter = connected(WorkflowConfig {
        gemini_api_key: Some("test-key".into()),
        n8n_api_url: Some(n8n_base),
        n8n_api_key: Some("n8n-key".into()),
        generation_base_url: gen_base,
        generation_model: "test-model".into(),
    })
    .await;

    let document = adapter
        .execute_tool("design_workflow", json!({"prompt": "nightly report"}))
        .await
        .expect("design failed");
    assert_eq!(document["name"], "Nightly Report");

    let result = adapter
        .execute_tool("create_workflow", json!({"workflow": document}))
        .await
        .expect("create failed");

    assert_eq!(n8n_hits.load(Ordering::SeqCst), 1);
    assert_eq!(result["status"], "success");
    assert_eq!(result["data"]["id"], "42");
}

// ── fail-fast guarantees ─────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credentials_never_reach_the_network() {
    let (gen_base, gen_hits) = start_mock(
        "/models/test-model:generateContent",
        StatusCode::OK,
        generation_reply("{}"),
    )
    .await;
    let (n8n_base, n8n_hits) =
        start_mock("/workflows", StatusCode::OK, json!({"id": "42"})).await;

    // Endpoints resolvable, credentials absent.
    let adapter = connected(WorkflowConfig {
        generation_base_url: gen_base,
        generation_model: "test-model".into(),
        n8n_api_url: Some(n8n_base),
        ..WorkflowConfig::default()
    })
    .await;

    let err = adapter
        .execute_tool("design_workflow", json!({"prompt": "x"}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains(ENV_GEMINI_API_KEY), "{err}");

    let err = adapter
        .execute_tool("create_workflow", json!({"workflow": {}}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains(ENV_N8N_API_KEY), "{err}");
    assert!(!err.to_string().contains(ENV_N8N_API_URL), "{err}");

    assert_eq!(gen_hits.load(Ordering::SeqCst), 0);
    assert_eq!(n8n_hits.load(Ordering::SeqCst), 0);
}
