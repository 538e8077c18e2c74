//! Embedding backend trait

use async_trait::async_trait;

use crate::error::{Error, Result};

/// A model that turns text or image bytes into a vector
///
/// Implementations:
/// - `OllamaTextEmbedder`: text via Ollama `/api/embeddings`
/// - `ClipImageEmbedder`: images via a CLIP HTTP service
///
/// A backend only has to support its own modality; the other one reports
/// `ModelUnavailable`.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a piece of text
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let _ = text;
        Err(Error::model_unavailable(format!(
            "{} does not embed text",
            self.name()
        )))
    }

    /// Embed raw image bytes
    async fn embed_image(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let _ = bytes;
        Err(Error::model_unavailable(format!(
            "{} does not embed images",
            self.name()
        )))
    }

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Zero-pad or truncate `vector` to exactly `dim` values
pub fn normalize_dimensions(mut vector: Vec<f32>, dim: usize) -> Vec<f32> {
    vector.resize(dim, 0.0);
    vector
}
