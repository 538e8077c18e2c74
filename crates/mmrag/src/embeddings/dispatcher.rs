//! Routes text and images to their backend, with timeout and vector checks

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::backend::{normalize_dimensions, EmbeddingBackend};
use super::clip::ClipImageEmbedder;
use super::handle::ModelHandle;
use super::ollama::OllamaTextEmbedder;

type Loader = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn EmbeddingBackend>>> + Send + Sync>;

/// A backend that is loaded on first use and then shared
pub struct LazyBackend {
    handle: ModelHandle<dyn EmbeddingBackend>,
    loader: Loader,
}

impl LazyBackend {
    /// Backend built by `loader` the first time it is needed
    pub fn new<F, Fut>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn EmbeddingBackend>>> + Send + 'static,
    {
        Self {
            handle: ModelHandle::new(name),
            loader: Box::new(move || loader().boxed()),
        }
    }

    /// Backend that is already loaded
    pub fn ready(backend: Arc<dyn EmbeddingBackend>) -> Self {
        let name = backend.name().to_string();
        let handle = ModelHandle::ready(name, Arc::clone(&backend));
        Self {
            handle,
            loader: Box::new(move || futures::future::ready(Ok(Arc::clone(&backend))).boxed()),
        }
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_initialized()
    }

    /// Shared backend, loading it if needed
    pub async fn get(&self) -> Result<Arc<dyn EmbeddingBackend>> {
        self.handle.get_or_init(|| (self.loader)()).await
    }
}

/// Embedding entry point for the ingestion and query paths
pub struct EmbeddingDispatcher {
    text: LazyBackend,
    image: Option<LazyBackend>,
    dimension: usize,
    timeout: Duration,
}

impl EmbeddingDispatcher {
    pub fn new(
        text: LazyBackend,
        image: Option<LazyBackend>,
        dimension: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            text,
            image,
            dimension,
            timeout,
        }
    }

    /// Ollama text backend plus the CLIP image backend when an endpoint is set.
    /// Nothing is contacted until the first embedding call.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);

        let text_config = config.clone();
        let text = LazyBackend::new(format!("ollama:{}", config.text_model), move || {
            let config = text_config.clone();
            async move {
                OllamaTextEmbedder::connect(&config)
                    .await
                    .map(|backend| Arc::new(backend) as Arc<dyn EmbeddingBackend>)
            }
        });

        let image = config.image_endpoint.clone().map(|endpoint| {
            let model = config.image_model.clone();
            LazyBackend::new(format!("clip:{}", model), move || {
                let endpoint = endpoint.clone();
                let model = model.clone();
                async move {
                    ClipImageEmbedder::new(endpoint, model, timeout)
                        .map(|backend| Arc::new(backend) as Arc<dyn EmbeddingBackend>)
                }
            })
        });

        Self::new(text, image, config.vector_dim, timeout)
    }

    /// Length of every returned vector
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn has_image_backend(&self) -> bool {
        self.image.is_some()
    }

    pub fn text_backend_loaded(&self) -> bool {
        self.text.is_loaded()
    }

    /// Embed text (chunks and queries)
    pub async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self
            .with_timeout("text", async {
                let backend = self.text.get().await?;
                backend.embed_text(text).await
            })
            .await?;
        self.validate(vector)
    }

    /// Embed a whole image
    pub async fn embed_image(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let Some(image) = &self.image else {
            return Err(Error::model_unavailable(
                "no image embedding backend configured",
            ));
        };

        let vector = self
            .with_timeout("image", async {
                let backend = image.get().await?;
                backend.embed_image(bytes).await
            })
            .await?;
        self.validate(vector)
    }

    async fn with_timeout<F>(&self, modality: &str, call: F) -> Result<Vec<f32>>
    where
        F: Future<Output = Result<Vec<f32>>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::embedding(format!(
                "{} embedding timed out after {:?}",
                modality, self.timeout
            ))),
        }
    }

    fn validate(&self, vector: Vec<f32>) -> Result<Vec<f32>> {
        if vector.is_empty() {
            return Err(Error::embedding("backend returned an empty vector"));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::embedding("backend returned non-finite values"));
        }
        if vector.len() != self.dimension {
            tracing::debug!(
                native = vector.len(),
                target = self.dimension,
                "Normalizing embedding dimension"
            );
        }
        Ok(normalize_dimensions(vector, self.dimension))
    }
}
