//! Index writer
//!
//! Thin layer over a [`VectorStore`] that creates the collection once per
//! process and sends each document's records in a single upsert.

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::providers::VectorStore;
use crate::types::IndexRecord;

pub struct IndexWriter {
    store: Arc<dyn VectorStore>,
    dimension: usize,
    collection_ready: OnceCell<()>,
}

impl IndexWriter {
    pub fn new(store: Arc<dyn VectorStore>, dimension: usize) -> Self {
        Self {
            store,
            dimension,
            collection_ready: OnceCell::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Create the collection if it does not exist yet.
    ///
    /// A failure is not remembered, the next call tries again.
    pub async fn ensure_collection(&self) -> Result<()> {
        self.collection_ready
            .get_or_try_init(|| async {
                tracing::info!(
                    store = self.store.name(),
                    dimension = self.dimension,
                    "Ensuring vector collection"
                );
                self.store.ensure_collection(self.dimension).await
            })
            .await?;
        Ok(())
    }

    /// Upsert `records`, replacing any record with the same id.
    /// Returns the number of records sent.
    pub async fn write(&self, records: &[IndexRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        self.ensure_collection().await?;
        self.store.upsert(records).await?;
        Ok(records.len())
    }
}
