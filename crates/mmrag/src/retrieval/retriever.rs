//! Query-time similarity retrieval

use std::sync::Arc;

use crate::embeddings::EmbeddingDispatcher;
use crate::error::Result;
use crate::types::SearchHit;

use super::writer::IndexWriter;

/// Embeds a query and asks the vector store for its nearest records
pub struct Retriever {
    embeddings: Arc<EmbeddingDispatcher>,
    writer: Arc<IndexWriter>,
}

impl Retriever {
    pub fn new(embeddings: Arc<EmbeddingDispatcher>, writer: Arc<IndexWriter>) -> Self {
        Self { embeddings, writer }
    }

    /// Top `top_k` hits for `query`, best first
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        // A fresh deployment has no collection yet; searching it should be empty, not an error.
        self.writer.ensure_collection().await?;

        let vector = self.embeddings.embed_text(query).await?;
        let hits = self.writer.store().search(&vector, top_k).await?;

        tracing::info!(top_k, hits = hits.len(), "Retrieved context");
        Ok(hits)
    }
}
