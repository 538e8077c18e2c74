//! Text embeddings through a local Ollama server

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::backend::EmbeddingBackend;

/// Ollama `/api/embeddings` client (nomic-embed-text or similar)
pub struct OllamaTextEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaTextEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::model_unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            &config.ollama_url,
            &config.text_model,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build the client and check that the server answers
    pub async fn connect(config: &EmbeddingConfig) -> Result<Self> {
        let embedder = Self::from_config(config)?;
        embedder.check_reachable().await?;
        tracing::info!(
            url = %embedder.base_url,
            model = %embedder.model,
            "Ollama text embedder ready"
        );
        Ok(embedder)
    }

    async fn check_reachable(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            Error::model_unavailable(format!("Ollama not reachable at {}: {}", self.base_url, e))
        })?;

        if !response.status().is_success() {
            return Err(Error::model_unavailable(format!(
                "Ollama health check failed: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaTextEmbedder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::model_unavailable(format!("Ollama not reachable: {}", e))
                } else {
                    Error::embedding(format!("Embedding request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Embedding failed: HTTP {} - {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        Ok(parsed.embedding)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let embedder =
            OllamaTextEmbedder::new("http://localhost:11434/", "nomic-embed-text", Duration::from_secs(1))
                .unwrap();
        assert_eq!(embedder.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(EmbedRequest {
            model: "nomic-embed-text",
            prompt: "hello",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "nomic-embed-text", "prompt": "hello"}));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_model_unavailable() {
        // Port 9 (discard) is not an Ollama server
        let config = EmbeddingConfig {
            ollama_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let result = OllamaTextEmbedder::connect(&config).await;
        assert!(matches!(result, Err(Error::ModelUnavailable(_))));
    }
}
