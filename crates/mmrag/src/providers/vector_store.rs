//! Vector store provider trait

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{IndexRecord, SearchHit};

/// Similarity index the pipeline writes to and searches
///
/// Implementations:
/// - `QdrantStore`: Qdrant over its REST API
/// - `MemoryVectorStore`: brute-force cosine search, for tests and local runs
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection with cosine distance if it does not exist yet
    async fn ensure_collection(&self, dimension: usize) -> Result<()>;

    /// Insert or replace records by id
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()>;

    /// `top_k` nearest records, best first
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
