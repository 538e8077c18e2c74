//! Ingestion entry point
//!
//! bytes -> extract -> chunk -> correlate provenance -> embed -> build
//! records -> upsert. Chunk embeddings run concurrently but come back in
//! chunk order, and a chunk that fails to embed is dropped on its own; only a
//! document with no embedded unit at all fails as a whole.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::embeddings::EmbeddingDispatcher;
use crate::error::{Error, Result};
use crate::providers::DocumentStore;
use crate::retrieval::IndexWriter;
use crate::types::{ExtractedDocument, IndexRecord, SourceType};

use super::chunker::WordChunker;
use super::extractor::Extractor;
use super::identity::RecordBuilder;
use super::provenance::ProvenanceCorrelator;

/// Result of indexing one document
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub doc_id: String,
    pub filename: String,
    pub source_type: SourceType,
    /// Records written, including the image vector if any
    pub chunks_indexed: usize,
    /// Chunks dropped because their embedding failed
    pub failed_chunks: Vec<u32>,
}

/// Per-chunk embedding result
enum ChunkOutcome {
    Embedded(IndexRecord),
    Failed { index: u32, error: Error },
}

/// Ingestion pipeline shared by all upload requests
pub struct IngestPipeline {
    chunker: WordChunker,
    extractor: Arc<dyn Extractor>,
    embeddings: Arc<EmbeddingDispatcher>,
    writer: Arc<IndexWriter>,
    documents: Arc<dyn DocumentStore>,
    concurrency: usize,
}

impl IngestPipeline {
    pub fn new(
        chunker: WordChunker,
        extractor: Arc<dyn Extractor>,
        embeddings: Arc<EmbeddingDispatcher>,
        writer: Arc<IndexWriter>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            chunker,
            extractor,
            embeddings,
            writer,
            documents,
            concurrency: 1,
        }
    }

    /// Pipeline with chunking and concurrency taken from `config`.
    /// Rejects invalid chunking parameters before anything runs.
    pub fn from_config(
        config: &RagConfig,
        extractor: Arc<dyn Extractor>,
        embeddings: Arc<EmbeddingDispatcher>,
        writer: Arc<IndexWriter>,
        documents: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        let chunker = WordChunker::from_config(&config.chunking)?;
        Ok(Self::new(chunker, extractor, embeddings, writer, documents)
            .with_concurrency(config.processing.embedding_concurrency()))
    }

    /// Maximum concurrent embedding calls per document
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn chunker(&self) -> &WordChunker {
        &self.chunker
    }

    /// Ingest an upload under a fresh `doc_id`.
    ///
    /// The original is stored only once extraction produced text, and removed
    /// again if indexing fails, so rejected uploads never reach storage.
    pub async fn ingest(&self, bytes: &[u8], mimetype: &str, filename: &str) -> Result<IngestOutcome> {
        let extraction = self.extractor.extract(bytes, mimetype, filename).await?;
        if extraction.document.is_empty() {
            return Err(Error::NoContent(filename.to_string()));
        }

        let doc_id = Uuid::new_v4().to_string();
        tracing::debug!(
            doc_id = %doc_id,
            chars = extraction.document.full_text.len(),
            pages = extraction.document.pages.len(),
            lines = extraction.document.line_count(),
            "Extracted text"
        );

        let stored = self.documents.save(&doc_id, filename, bytes).await?;
        tracing::info!(doc_id = %doc_id, filename, path = %stored, "Stored original");

        let image_bytes = (extraction.source_type == SourceType::Image).then_some(bytes);
        let indexed = self
            .index_extracted(
                &doc_id,
                filename,
                extraction.source_type,
                &extraction.document,
                image_bytes,
            )
            .await;

        if indexed.is_err() {
            if let Err(e) = self.documents.remove(&doc_id, filename).await {
                tracing::warn!(doc_id = %doc_id, "Failed to remove original after indexing error: {}", e);
            }
        }
        indexed
    }

    /// Index an already extracted document under `doc_id`.
    ///
    /// Record ids depend only on `(doc_id, chunk_index)`, so calling this again
    /// with the same inputs overwrites the same records.
    pub async fn index_extracted(
        &self,
        doc_id: &str,
        filename: &str,
        source_type: SourceType,
        document: &ExtractedDocument,
        image_bytes: Option<&[u8]>,
    ) -> Result<IngestOutcome> {
        let texts = self.chunker.chunk(&document.full_text);
        let correlated = ProvenanceCorrelator::correlate_all(document, &texts);
        tracing::info!(doc_id, filename, chunks = correlated.len(), "Chunked document");

        let chunk_source = if document.has_segments() {
            SourceType::Audio
        } else {
            SourceType::Text
        };
        let builder = Arc::new(RecordBuilder::new(doc_id, filename));

        // buffered() keeps chunk order
        let outcomes: Vec<ChunkOutcome> = stream::iter(correlated)
            .map(|(chunk, provenance)| {
                let embeddings = Arc::clone(&self.embeddings);
                let builder = Arc::clone(&builder);
                async move {
                    match embeddings.embed_text(&chunk.text).await {
                        Ok(vector) => ChunkOutcome::Embedded(builder.chunk_record(
                            chunk.index,
                            &chunk.text,
                            &provenance,
                            chunk_source,
                            vector,
                        )),
                        Err(error) => ChunkOutcome::Failed {
                            index: chunk.index,
                            error,
                        },
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut records = Vec::with_capacity(outcomes.len() + 1);
        let mut failed_chunks = Vec::new();
        for outcome in outcomes {
            match outcome {
                ChunkOutcome::Embedded(record) => records.push(record),
                ChunkOutcome::Failed { index, error } => {
                    tracing::warn!(doc_id, chunk_index = index, "Embedding failed, dropping chunk: {}", error);
                    failed_chunks.push(index);
                }
            }
        }

        if let Some(bytes) = image_bytes {
            if self.embeddings.has_image_backend() {
                match self.embeddings.embed_image(bytes).await {
                    Ok(vector) => records.push(builder.image_record(&document.full_text, vector)),
                    Err(e) => tracing::warn!(doc_id, "Image embedding failed: {}", e),
                }
            } else {
                tracing::debug!(doc_id, "No image backend, skipping image vector");
            }
        }

        if records.is_empty() {
            return Err(Error::NoEmbeddedUnits(filename.to_string()));
        }

        let written = self.writer.write(&records).await?;
        tracing::info!(
            doc_id,
            filename,
            indexed = written,
            failed = failed_chunks.len(),
            "Indexed document"
        );

        Ok(IngestOutcome {
            doc_id: doc_id.to_string(),
            filename: filename.to_string(),
            source_type,
            chunks_indexed: written,
            failed_chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbeddingBackend, LazyBackend};
    use crate::ingestion::DocumentExtractor;
    use crate::providers::{LocalDocumentStore, MemoryVectorStore, VectorStore};
    use async_trait::async_trait;
    use std::time::Duration;

    struct WordCountBackend;

    #[async_trait]
    impl EmbeddingBackend for WordCountBackend {
        async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.split_whitespace().count() as f32, 1.0])
        }

        fn name(&self) -> &str {
            "word-count"
        }
    }

    fn pipeline(store: Arc<MemoryVectorStore>, dir: &std::path::Path) -> IngestPipeline {
        let embeddings = Arc::new(EmbeddingDispatcher::new(
            LazyBackend::ready(Arc::new(WordCountBackend)),
            None,
            4,
            Duration::from_secs(5),
        ));
        let writer = Arc::new(IndexWriter::new(store as Arc<dyn VectorStore>, 4));
        let documents = Arc::new(LocalDocumentStore::new(dir, "http://localhost/storage").unwrap());

        IngestPipeline::new(
            WordChunker::new(3, 1).unwrap(),
            Arc::new(DocumentExtractor::text_only()),
            embeddings,
            writer,
            documents,
        )
        .with_concurrency(4)
    }

    #[tokio::test]
    async fn test_ingest_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryVectorStore::new());
        let pipeline = pipeline(Arc::clone(&store), dir.path());

        let outcome = pipeline
            .ingest(b"a b c d e f g h", "text/plain", "letters.txt")
            .await
            .unwrap();

        assert_eq!(outcome.chunks_indexed, 4);
        assert!(outcome.failed_chunks.is_empty());
        assert_eq!(outcome.source_type, SourceType::Text);
        assert!(dir.path().join(format!("{}.txt", outcome.doc_id)).exists());

        let mut texts: Vec<(u32, String)> = store
            .records()
            .into_iter()
            .map(|r| match r.payload.chunk_index {
                crate::types::ChunkIndex::Position(i) => (i, r.payload.text),
                crate::types::ChunkIndex::Image => (u32::MAX, r.payload.text),
            })
            .collect();
        texts.sort();
        let texts: Vec<String> = texts.into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["a b c", "c d e", "e f g", "g h"]);
    }

    #[tokio::test]
    async fn test_whitespace_document_is_no_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryVectorStore::new());
        let pipeline = pipeline(Arc::clone(&store), dir.path());

        let result = pipeline.ingest(b" \n\t\n", "text/plain", "blank.txt").await;
        assert!(matches!(result, Err(Error::NoContent(_))));
        assert!(store.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_upload_is_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryVectorStore::new());
        let pipeline = pipeline(Arc::clone(&store), dir.path());

        let result = pipeline
            .ingest(b"<script>alert(1)</script>", "text/html", "evil.html")
            .await;
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ingest_runs_on_spawned_task() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryVectorStore::new());
        let pipeline = Arc::new(pipeline(Arc::clone(&store), dir.path()));

        let handle = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.ingest(b"a b c d e", "text/plain", "a.txt").await }
        });

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.chunks_indexed, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_image_without_image_backend_still_indexes_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryVectorStore::new());
        let pipeline = pipeline(Arc::clone(&store), dir.path());

        let doc = ExtractedDocument::from_page_texts(["EXIT only"]);
        let outcome = pipeline
            .index_extracted(
                "6f1d2a3c-8a5e-4e8b-9c61-2f7d0c4b9a10",
                "sign.png",
                SourceType::Image,
                &doc,
                Some(b"\x89PNG".as_slice()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.chunks_indexed, 1);
        assert_eq!(store.records()[0].payload.source_type, SourceType::Text);
    }
}
