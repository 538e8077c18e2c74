//! HTTP routes

pub mod ingest;
pub mod query;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Ingestion, query and status routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/ingest/upload",
            post(ingest::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query", post(query::query))
}

/// GET / - Liveness
async fn root() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /health - Backend reachability
///
/// 200 when the vector store answers, 503 otherwise. The LLM and the lazily
/// loaded embedding model are reported but do not affect the status.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store_ok = state.vector_store().health_check().await.unwrap_or(false);
    let llm_ok = state.synthesizer().llm().health_check().await.unwrap_or(false);

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if store_ok { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "vector_store": {
                "name": state.vector_store().name(),
                "healthy": store_ok,
            },
            "llm": {
                "model": state.synthesizer().llm().model(),
                "healthy": llm_ok,
            },
            "embeddings": {
                "dimension": state.embeddings().dimension(),
                "text_model_loaded": state.embeddings().text_backend_loaded(),
                "image_backend": state.embeddings().has_image_backend(),
            },
        })),
    )
}
