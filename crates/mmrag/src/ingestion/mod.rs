//! Document ingestion: extraction, chunking, provenance and indexing

mod chunker;
mod extractor;
mod identity;
mod pipeline;
mod provenance;

pub use chunker::WordChunker;
pub use extractor::{
    DocumentExtractor, Extraction, Extractor, FileKind, OcrEngine, OllamaVisionOcr, Transcriber,
    Transcript, WhisperClient,
};
pub use identity::{build_payload, record_id, RecordBuilder};
pub use pipeline::{IngestOutcome, IngestPipeline};
pub use provenance::{sentence_fragments, Provenance, ProvenanceCorrelator};
