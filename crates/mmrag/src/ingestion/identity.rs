//! Deterministic record identity and payload assembly

use uuid::Uuid;

use crate::types::{ChunkIndex, IndexRecord, RecordPayload, SourceType};

use super::provenance::Provenance;

/// Record id for `(doc_id, chunk_index)`.
///
/// A UUID v5 in the `doc_id` namespace, so re-ingesting a document with the
/// same chunking overwrites its records. A malformed `doc_id` falls back to a
/// random id (logged) instead of failing the ingestion.
pub fn record_id(doc_id: &str, chunk_index: ChunkIndex) -> Uuid {
    match Uuid::parse_str(doc_id) {
        Ok(namespace) => Uuid::new_v5(&namespace, chunk_index.key().as_bytes()),
        Err(e) => {
            let fallback = Uuid::new_v4();
            tracing::warn!(
                doc_id = %doc_id,
                chunk_index = %chunk_index,
                fallback = %fallback,
                "doc_id is not a UUID ({}), using random record id",
                e
            );
            fallback
        }
    }
}

/// Assemble the stored payload for one record
pub fn build_payload(
    doc_id: &str,
    chunk_index: ChunkIndex,
    text: &str,
    provenance: &Provenance,
    filename: &str,
    source_type: SourceType,
) -> RecordPayload {
    RecordPayload {
        text: text.to_string(),
        filename: filename.to_string(),
        doc_id: doc_id.to_string(),
        chunk_index,
        source_type,
        page_range: provenance.page_range,
        line_range: provenance.line_range,
        page_number: provenance.page_number,
        audio_start: provenance.audio_start,
        audio_end: provenance.audio_end,
    }
}

/// Builds the records of one document
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    doc_id: String,
    filename: String,
}

impl RecordBuilder {
    pub fn new(doc_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            filename: filename.into(),
        }
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Record for a text chunk
    pub fn chunk_record(
        &self,
        index: u32,
        text: &str,
        provenance: &Provenance,
        source_type: SourceType,
        vector: Vec<f32>,
    ) -> IndexRecord {
        let chunk_index = ChunkIndex::Position(index);
        IndexRecord {
            id: record_id(&self.doc_id, chunk_index),
            vector,
            payload: build_payload(
                &self.doc_id,
                chunk_index,
                text,
                provenance,
                &self.filename,
                source_type,
            ),
        }
    }

    /// Whole-image record carrying the full OCR text
    pub fn image_record(&self, ocr_text: &str, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: record_id(&self.doc_id, ChunkIndex::Image),
            vector,
            payload: build_payload(
                &self.doc_id,
                ChunkIndex::Image,
                ocr_text,
                &Provenance::default(),
                &self.filename,
                SourceType::Image,
            ),
        }
    }
}
