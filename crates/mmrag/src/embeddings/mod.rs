//! Embedding backends and the dispatcher that routes chunks and images to them
//!
//! Text and images are embedded by different models with different native
//! widths. Every vector leaving this module is normalized to the configured
//! dimension with [`normalize_dimensions`] so both modalities fit one index.
//! Cross-modal scores are therefore only nominally comparable.

mod backend;
mod clip;
mod dispatcher;
mod handle;
mod ollama;

pub use backend::{normalize_dimensions, EmbeddingBackend};
pub use clip::ClipImageEmbedder;
pub use dispatcher::{EmbeddingDispatcher, LazyBackend};
pub use handle::ModelHandle;
pub use ollama::OllamaTextEmbedder;
