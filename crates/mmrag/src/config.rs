//! Configuration for the ingestion and query pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Word-window chunking
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding backends
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Answer synthesis (Ollama)
    #[serde(default)]
    pub llm: LlmConfig,
    /// External vector store
    #[serde(default)]
    pub vector_db: VectorDbConfig,
    /// Uploaded originals
    #[serde(default)]
    pub storage: StorageConfig,
    /// Extraction backends for images and audio
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Concurrency knobs
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl RagConfig {
    /// Load from a TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str::<RagConfig>(&raw).map_err(|e| {
                    Error::Config(format!("Invalid config file {}: {}", path.display(), e))
                })?
            }
            None => RagConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides using the deployment's environment variable names
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_db.url = url;
        }
        if let Some(collection) = lookup("QDRANT_COLLECTION") {
            self.vector_db.collection = collection;
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.storage.dir = PathBuf::from(dir);
        }
        if let Some(dim) = lookup("VECTOR_DIM") {
            self.embeddings.vector_dim = parse_env("VECTOR_DIM", &dim)?;
        }
        if let Some(size) = lookup("CHUNK_SIZE") {
            self.chunking.window_size = parse_env("CHUNK_SIZE", &size)?;
        }
        if let Some(overlap) = lookup("CHUNK_OVERLAP") {
            self.chunking.overlap = parse_env("CHUNK_OVERLAP", &overlap)?;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.llm.base_url = url.clone();
            self.embeddings.ollama_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = lookup("TEXT_EMBED_MODEL") {
            self.embeddings.text_model = model;
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.embeddings.vector_dim == 0 {
            return Err(Error::Config("vector_dim must be greater than 0".to_string()));
        }
        if self.vector_db.collection.trim().is_empty() {
            return Err(Error::Config("vector_db.collection must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_env(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Word-window chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Words per window
    pub window_size: usize,
    /// Words shared by consecutive windows
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_size: 150,
            overlap: 50,
        }
    }
}

impl ChunkingConfig {
    /// `window_size > overlap >= 0`, otherwise the window loop never advances
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::Config("chunk window_size must be greater than 0".to_string()));
        }
        if self.overlap >= self.window_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than window_size ({})",
                self.overlap, self.window_size
            )));
        }
        Ok(())
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Dimension every stored vector is padded/truncated to
    pub vector_dim: usize,
    /// Ollama base URL for text embeddings
    pub ollama_url: String,
    /// Text embedding model served by Ollama
    pub text_model: String,
    /// CLIP-style image embedding endpoint (None disables image vectors)
    pub image_endpoint: Option<String>,
    /// Image model name sent to the endpoint
    pub image_model: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            vector_dim: 512,
            ollama_url: "http://localhost:11434".to_string(),
            text_model: "nomic-embed-text".to_string(),
            image_endpoint: Some("http://localhost:51000/embed/image".to_string()),
            image_model: "ViT-B-32".to_string(),
            timeout_secs: 60,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            timeout_secs: 90,
        }
    }
}

/// Vector store (Qdrant) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Qdrant REST URL
    pub url: String,
    /// Collection name
    pub collection: String,
    /// Optional API key
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: "documents".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Storage for uploaded originals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `{doc_id}{ext}` files
    pub dir: PathBuf,
    /// Public URL prefix the directory is served under
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("storage"),
            public_base_url: "http://127.0.0.1:8000/storage".to_string(),
        }
    }
}

/// OCR / transcription backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Ollama vision model used for OCR (None disables image text extraction)
    pub ocr_model: Option<String>,
    /// Whisper-compatible transcription server (None disables audio)
    pub whisper_url: Option<String>,
    /// Whisper model name
    pub whisper_model: String,
    /// Transcription task: "transcribe" or "translate"
    pub whisper_task: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_model: Some("llava".to_string()),
            whisper_url: Some("http://localhost:9000".to_string()),
            whisper_model: "small".to_string(),
            whisper_task: "translate".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Concurrent embedding calls per document (None = CPU count, max 8)
    pub parallel_embeddings: Option<usize>,
}

impl ProcessingConfig {
    /// Effective embedding concurrency
    pub fn embedding_concurrency(&self) -> usize {
        self.parallel_embeddings
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}
