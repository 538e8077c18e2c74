//! mmrag: multi-modal retrieval-augmented generation
//!
//! Ingests PDF, DOCX, plain text, images and audio; splits extracted text into
//! overlapping word windows; records where each window came from (pages,
//! lines, audio time); embeds and upserts the windows into a vector store
//! under deterministic ids; answers questions from the nearest windows with
//! numbered citations.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, ErrorKind, Result};
pub use ingestion::{IngestOutcome, IngestPipeline};
pub use retrieval::{IndexWriter, Retriever};
pub use types::{
    Citation, ExtractedDocument, IndexRecord, QueryRequest, QueryResponse, SearchHit, SourceType,
};
