//! Citation reconstruction and linking
//!
//! Payloads come back from the vector store untyped. Anything missing or of
//! the wrong type becomes `None` so one odd record never fails a query.

use regex::Regex;
use serde_json::Value;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::providers::DocumentStore;
use crate::types::{Citation, SearchHit, SpanRange};

fn citation_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("Invalid regex"))
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn u32_field(payload: &Value, key: &str) -> Option<u32> {
    match payload.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn f64_field(payload: &Value, key: &str) -> Option<f64> {
    match payload.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `"3-7"`, `"3"` or a bare number
fn range_field(payload: &Value, key: &str) -> Option<SpanRange> {
    match payload.get(key)? {
        Value::String(s) => SpanRange::from_str(s).ok(),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(|n| SpanRange::new(n, n)),
        _ => None,
    }
}

/// Presentation-ready citation for one hit; `file_path` comes from the
/// store that holds the original
pub fn reconstruct_citation(hit: &SearchHit, documents: &dyn DocumentStore) -> Citation {
    let payload = &hit.payload;
    let filename = string_field(payload, "filename");
    let doc_id = string_field(payload, "doc_id");

    let file_path = match (&doc_id, &filename) {
        (Some(doc_id), Some(filename)) => Some(documents.locator(doc_id, filename)),
        _ => None,
    };

    Citation {
        id: hit.id.clone(),
        filename,
        page_range: range_field(payload, "page_range"),
        page_number: u32_field(payload, "page_number"),
        line_range: range_field(payload, "line_range"),
        file_path,
        audio_start: f64_field(payload, "audio_start"),
        audio_end: f64_field(payload, "audio_end"),
        cited: false,
    }
}

/// Citations for `hits`, in hit order
pub fn reconstruct_citations(hits: &[SearchHit], documents: &dyn DocumentStore) -> Vec<Citation> {
    hits.iter()
        .map(|hit| reconstruct_citation(hit, documents))
        .collect()
}

/// Flag every citation the answer references as `[n]` (1-based).
/// Out-of-range markers are ignored.
pub fn mark_cited(answer: &str, citations: &mut [Citation]) {
    for cap in citation_marker().captures_iter(answer) {
        let Some(n) = cap.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
            continue;
        };
        if let Some(citation) = n.checked_sub(1).and_then(|i| citations.get_mut(i)) {
            citation.cited = true;
        }
    }
}
