// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /score (happy path, schema error, malformed body)
// - GET /metrics
// - GET /debug/stats (only when enabled)

use axum::{
    body::{to_bytes, Body},
    http::Request,
    Router,
};
use http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt as _; // for `oneshot`

use potential_matrix::{app, ScoringEngine, ServerConfig};

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router(debug_routes: bool) -> Router {
    let server = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        debug_routes,
    };
    app(ScoringEngine::with_defaults(), &server)
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build POST")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, body) = send(test_router(false), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "ok");
}

#[tokio::test]
async fn score_returns_full_report() {
    let payload = json!({
        "blocks": {"blocks": [{"questions": [
            {"id": "q1", "type": "multi_select", "weight": 2.0, "column": "perception"}
        ]}]},
        "answers": {"respondent_id": "http-1", "answers": {"q1": ["ruby", "amber"]}}
    });
    let (status, body) = send(test_router(false), post_json("/score", &payload)).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");

    let v: Value = serde_json::from_str(&body).expect("json");
    assert_eq!(v["respondent_id"], "http-1");
    assert_eq!(v["scores"]["ruby"]["strength"], 1.0);
    assert_eq!(v["scores"]["ruby"]["name"], "Рубин");
    for row in ["row1_strengths", "row2_energy", "row3_weaknesses"] {
        assert_eq!(v["rows"][row].as_array().map(Vec::len), Some(3), "{row}");
        assert_eq!(v["matrix_3x3"][row].as_object().map(|m| m.len()), Some(3), "{row}");
    }
    assert_eq!(v["meta"]["answered"], 1);
}

#[tokio::test]
async fn duplicate_question_id_is_422() {
    let payload = json!({
        "blocks": {"blocks": [{"questions": [{"id": "dup"}, {"id": "dup"}]}]},
        "answers": {}
    });
    let (status, body) = send(test_router(false), post_json("/score", &payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let v: Value = serde_json::from_str(&body).expect("json");
    assert!(v["error"].as_str().unwrap_or_default().contains("dup"));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let req = Request::builder()
        .method("POST")
        .uri("/score")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("build POST");
    let (status, _) = send(test_router(false), req).await;
    assert!(status.is_client_error(), "got {status}");
}

#[tokio::test]
async fn metrics_endpoint_is_mounted() {
    let (status, _) = send(test_router(false), get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn debug_stats_only_when_enabled() {
    let (status, _) = send(test_router(false), get("/debug/stats")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(test_router(true), get("/debug/stats")).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).expect("json");
    assert!(v.get("total_runs").is_some());
}
