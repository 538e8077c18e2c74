//! Query endpoint with retrieval, synthesis and citations

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query - Answer a question from the indexed documents
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();
    tracing::info!(top_k = request.top_k, "Query: \"{}\"", request.q);

    let results = state.retriever().retrieve(&request.q, request.top_k).await?;
    let synthesis = state.synthesizer().synthesize(&request.q, &results).await;

    tracing::info!(
        hits = results.len(),
        cited = synthesis.citations.iter().filter(|c| c.cited).count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Query answered"
    );

    Ok(Json(QueryResponse {
        query: request.q,
        results,
        synthesis,
    }))
}
