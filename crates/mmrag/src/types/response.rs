//! Response types for ingestion and queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::SpanRange;

/// Raw similarity hit from the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Record id
    pub id: String,
    /// Similarity score (higher is better)
    pub score: f32,
    /// Stored chunk text
    pub text: String,
    /// Stored payload, kept untyped so partial payloads still come back
    pub payload: serde_json::Value,
}

/// User-facing source reference for one hit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// Record id
    pub id: String,
    pub filename: Option<String>,
    pub page_range: Option<SpanRange>,
    pub page_number: Option<u32>,
    pub line_range: Option<SpanRange>,
    /// Locator of the stored original, as given by the document store
    pub file_path: Option<String>,
    pub audio_start: Option<f64>,
    pub audio_end: Option<f64>,
    /// Whether the answer references this source as `[n]`
    #[serde(default)]
    pub cited: bool,
}

/// Generated answer with its sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synthesis {
    pub answer: String,
    pub citations: Vec<Citation>,
    /// Prompt sent to the LLM
    pub prompt: String,
}

/// Response from `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub synthesis: Synthesis,
}

/// Response from `POST /ingest/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub doc_id: String,
    pub filename: String,
    pub status: String,
    /// Records written (text chunks plus the image vector, if any)
    pub chunks_indexed: usize,
    /// Chunk indices dropped because their embedding failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_chunks: Vec<u32>,
    pub indexed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_serialize_as_null() {
        let citation = Citation {
            id: "abc".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&citation).unwrap();
        assert!(json["page_range"].is_null());
        assert!(json["audio_start"].is_null());
        assert!(json["file_path"].is_null());
    }
}
