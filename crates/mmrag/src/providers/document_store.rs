//! Storage for uploaded originals
//!
//! Files are stored as `{doc_id}{ext}` so a citation can point back at the
//! original from nothing more than the payload's `doc_id` and `filename`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::Result;

/// Trait for storing the raw bytes of ingested documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `data`; returns the stored path or URI
    async fn save(&self, doc_id: &str, filename: &str, data: &[u8]) -> Result<String>;

    /// Delete a stored original; a missing file is not an error
    async fn remove(&self, doc_id: &str, filename: &str) -> Result<()>;

    /// Public locator for a stored original
    fn locator(&self, doc_id: &str, filename: &str) -> String;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Extension of `filename` including the dot, or empty
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Stored file name for a document
pub fn stored_name(doc_id: &str, filename: &str) -> String {
    format!("{}{}", doc_id, file_extension(filename))
}

/// `{base_url}/{doc_id}{ext}`
pub fn storage_locator(base_url: &str, doc_id: &str, filename: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), stored_name(doc_id, filename))
}

/// Local filesystem document store
pub struct LocalDocumentStore {
    /// Directory holding the originals
    storage_dir: PathBuf,
    /// URL prefix the directory is served under
    public_base_url: String,
}

impl LocalDocumentStore {
    /// Create the store, creating the directory if needed
    pub fn new(storage_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self {
            storage_dir,
            public_base_url: public_base_url.into(),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new(&config.dir, &config.public_base_url)
    }

    pub fn dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Path of a stored original
    pub fn path_for(&self, doc_id: &str, filename: &str) -> PathBuf {
        self.storage_dir.join(stored_name(doc_id, filename))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn save(&self, doc_id: &str, filename: &str, data: &[u8]) -> Result<String> {
        let path = self.path_for(doc_id, filename);
        tokio::fs::write(&path, data).await?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "Stored original");
        Ok(path.to_string_lossy().to_string())
    }

    async fn remove(&self, doc_id: &str, filename: &str) -> Result<()> {
        let path = self.path_for(doc_id, filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed original");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn locator(&self, doc_id: &str, filename: &str) -> String {
        storage_locator(&self.public_base_url, doc_id, filename)
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}
