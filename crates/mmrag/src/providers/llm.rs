//! LLM provider for answer synthesis

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Trait for prompt completion
///
/// Implementations:
/// - `OllamaLlm`: local Ollama server (llama3.2:3b by default)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Ollama `/api/generate` client, non-streaming
pub struct OllamaLlm {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

impl OllamaLlm {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

/// Answer text from an Ollama response body.
///
/// Newer servers return `response`; some versions return `generations[0].text`.
fn answer_text(body: &Value) -> String {
    if let Some(text) = body.get("response").and_then(Value::as_str) {
        return text.trim().to_string();
    }
    if let Some(text) = body
        .get("generations")
        .and_then(|g| g.get(0))
        .and_then(|g| g.get("text"))
        .and_then(Value::as_str)
    {
        return text.trim().to_string();
    }
    "LLM returned no text.".to_string()
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        tracing::info!("Generating answer with model: {}", self.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Generation failed: HTTP {} - {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e)))?;

        Ok(answer_text(&body))
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
