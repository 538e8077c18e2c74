//! Document upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Utc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::IngestResponse;

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

/// POST /ingest/upload - Extract, chunk, embed and index one file
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or("upload")
            .to_string();
        let mimetype = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read file: {}", e)))?;

        tracing::info!(
            filename = %filename,
            mimetype = %mimetype,
            bytes = data.len(),
            "Processing upload"
        );

        let outcome = state.pipeline().ingest(&data, &mimetype, &filename).await?;

        tracing::info!(
            doc_id = %outcome.doc_id,
            chunks = outcome.chunks_indexed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Upload indexed"
        );

        return Ok(Json(IngestResponse {
            doc_id: outcome.doc_id,
            filename: outcome.filename,
            status: "indexed".to_string(),
            chunks_indexed: outcome.chunks_indexed,
            failed_chunks: outcome.failed_chunks,
            indexed_at: Utc::now(),
        }));
    }

    Err(Error::InvalidRequest(format!(
        "multipart body has no '{}' field",
        FILE_FIELD
    )))
}
