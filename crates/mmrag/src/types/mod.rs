//! Core types shared by the ingestion and query paths

pub mod document;
pub mod query;
pub mod record;
pub mod response;

pub use document::{AudioSegment, Chunk, ExtractedDocument, Line, Page, SourceType};
pub use query::QueryRequest;
pub use record::{ChunkIndex, IndexRecord, RecordPayload, SpanRange};
pub use response::{Citation, IngestResponse, QueryResponse, SearchHit, Synthesis};
