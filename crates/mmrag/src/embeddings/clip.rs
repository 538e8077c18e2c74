//! Whole-image embeddings through a CLIP HTTP service

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

use super::backend::EmbeddingBackend;

/// Client for a CLIP image embedding endpoint.
///
/// Sends `{"model", "image": <base64>}` and reads back `{"embedding": [...]}`.
pub struct ClipImageEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    image: String,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(alias = "vector")]
    embedding: Vec<f32>,
}

impl ClipImageEmbedder {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::model_unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl EmbeddingBackend for ClipImageEmbedder {
    async fn embed_image(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let request = ImageRequest {
            model: &self.model,
            image: STANDARD.encode(bytes),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::model_unavailable(format!("CLIP service not reachable: {}", e))
                } else {
                    Error::embedding(format!("Image embedding request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Image embedding failed: HTTP {} - {}",
                status, body
            )));
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse image embedding: {}", e)))?;

        Ok(parsed.embedding)
    }

    fn name(&self) -> &str {
        "clip"
    }
}
