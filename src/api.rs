use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::engine::ScoringEngine;
use crate::error::SchemaError;
use crate::metrics::Metrics;
use crate::report::Report;

#[derive(Clone)]
pub struct AppState {
    pub engine: ScoringEngine,
}

#[derive(Deserialize)]
pub struct ScoreReq {
    pub blocks: Value,
    #[serde(default)]
    pub answers: Value,
}

/// Errors surfaced to HTTP clients as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Schema(SchemaError),
}

impl From<SchemaError> for ApiError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Schema(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

/// Core routes: `/health` and `POST /score`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/score", post(score))
        .with_state(state)
        .layer(CorsLayer::very_permissive())
}

/// Full service: core routes + `/metrics`, plus `/debug/stats` when enabled.
pub fn app(engine: ScoringEngine, server: &ServerConfig) -> Router {
    let metrics = Metrics::init();
    let mut router = create_router(AppState { engine }).merge(metrics.router());
    if server.debug_routes {
        router = router.merge(crate::debug::router());
    }
    router
}

async fn score(
    State(state): State<AppState>,
    Json(body): Json<ScoreReq>,
) -> Result<Json<Report>, ApiError> {
    let report = state.engine.score(&body.blocks, &body.answers)?;
    Ok(Json(report))
}
