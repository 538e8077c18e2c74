//! In-memory vector store
//!
//! Brute-force cosine search over a map keyed by record id. Upserting an
//! existing id replaces the record, matching the external store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{IndexRecord, SearchHit};

use super::vector_store::VectorStore;

/// Vector store kept in process memory
#[derive(Default)]
pub struct MemoryVectorStore {
    dimension: RwLock<Option<usize>>,
    records: RwLock<HashMap<Uuid, IndexRecord>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Stored record by id
    pub fn get(&self, id: &Uuid) -> Option<IndexRecord> {
        self.records.read().get(id).cloned()
    }

    /// All stored records, sorted by id
    pub fn records(&self) -> Vec<IndexRecord> {
        let mut records: Vec<IndexRecord> = self.records.read().values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let mut current = self.dimension.write();
        if current.is_none() {
            *current = Some(dimension);
            tracing::debug!(dimension, "MemoryVectorStore collection created");
        }
        Ok(())
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        if let Some(dim) = *self.dimension.read() {
            if let Some(bad) = records.iter().find(|r| r.vector.len() != dim) {
                return Err(Error::index_write(format!(
                    "record {} has {} dimensions, collection expects {}",
                    bad.id,
                    bad.vector.len(),
                    dim
                )));
            }
        }

        let mut store = self.records.write();
        for record in records {
            store.insert(record.id, record.clone());
        }
        tracing::debug!("Upserted {} records", records.len());
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let store = self.records.read();
        let mut scored: Vec<(f32, &IndexRecord)> = store
            .values()
            .map(|r| (Self::cosine_similarity(vector, &r.vector), r))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, record)| -> Result<SearchHit> {
                Ok(SearchHit {
                    id: record.id.to_string(),
                    score,
                    text: record.payload.text.clone(),
                    payload: serde_json::to_value(&record.payload)?,
                })
            })
            .collect()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
