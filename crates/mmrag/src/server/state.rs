//! Application state for the HTTP server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::embeddings::EmbeddingDispatcher;
use crate::error::Result;
use crate::generation::Synthesizer;
use crate::ingestion::{DocumentExtractor, IngestPipeline};
use crate::providers::{DocumentStore, LocalDocumentStore, OllamaLlm, QdrantStore, VectorStore};
use crate::retrieval::{IndexWriter, Retriever};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    pipeline: IngestPipeline,
    retriever: Retriever,
    synthesizer: Synthesizer,
    embeddings: Arc<EmbeddingDispatcher>,
    vector_store: Arc<dyn VectorStore>,
}

impl AppState {
    /// Wire up the production components: Ollama, Qdrant, local storage.
    ///
    /// Nothing here contacts a backend; embedding models load on first use.
    pub fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            collection = %config.vector_db.collection,
            dimension = config.embeddings.vector_dim,
            "Initializing application state"
        );

        let embeddings = Arc::new(EmbeddingDispatcher::from_config(&config.embeddings));
        let vector_store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.vector_db)?);
        let documents: Arc<dyn DocumentStore> = Arc::new(LocalDocumentStore::from_config(&config.storage)?);
        let extractor = Arc::new(DocumentExtractor::from_config(&config)?);
        let llm = Arc::new(OllamaLlm::new(&config.llm)?);

        tracing::info!(
            text_model = %config.embeddings.text_model,
            image_backend = embeddings.has_image_backend(),
            llm = %config.llm.model,
            storage = %config.storage.dir.display(),
            "Providers configured"
        );

        let writer = Arc::new(IndexWriter::new(
            Arc::clone(&vector_store),
            config.embeddings.vector_dim,
        ));
        let pipeline = IngestPipeline::from_config(
            &config,
            extractor,
            Arc::clone(&embeddings),
            Arc::clone(&writer),
            Arc::clone(&documents),
        )?;
        let retriever = Retriever::new(Arc::clone(&embeddings), writer);
        let synthesizer = Synthesizer::new(llm, documents);

        Ok(Self::from_parts(
            config,
            pipeline,
            retriever,
            synthesizer,
            embeddings,
            vector_store,
        ))
    }

    /// Assemble state from already built components
    pub fn from_parts(
        config: RagConfig,
        pipeline: IngestPipeline,
        retriever: Retriever,
        synthesizer: Synthesizer,
        embeddings: Arc<EmbeddingDispatcher>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                retriever,
                synthesizer,
                embeddings,
                vector_store,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.inner.synthesizer
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingDispatcher> {
        &self.inner.embeddings
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.inner.vector_store
    }
}
