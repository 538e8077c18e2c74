//! Qdrant vector store over the REST API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{IndexRecord, SearchHit};

use super::vector_store::VectorStore;

/// Long-lived Qdrant client shared by every request
pub struct QdrantStore {
    client: Client,
    base_url: String,
    collection: String,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: Vec<PointStruct<'a>>,
}

#[derive(Serialize)]
struct PointStruct<'a> {
    id: String,
    vector: &'a [f32],
    payload: Value,
}

impl<'a> PointStruct<'a> {
    fn from_record(record: &'a IndexRecord) -> Result<Self> {
        Ok(Self {
            id: record.id.to_string(),
            vector: &record.vector,
            payload: serde_json::to_value(&record.payload)?,
        })
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Value>,
}

impl ScoredPoint {
    fn into_hit(self) -> SearchHit {
        let id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let payload = self.payload.unwrap_or(Value::Null);
        let text = payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        SearchHit {
            id,
            score: self.score,
            text,
            payload,
        }
    }
}

impl QdrantStore {
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            let value = HeaderValue::from_str(api_key.trim())
                .map_err(|e| Error::Config(format!("Invalid Qdrant API key: {}", e)))?;
            headers.insert("api-key", value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::index_write(format!("Failed to build Qdrant HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::index_write(format!(
            "Qdrant {} failed: HTTP {} - {}",
            action, status, body
        )))
    }
}

fn request_failed(e: reqwest::Error) -> Error {
    Error::index_write(format!("Qdrant request failed: {}", e))
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let url = self.collection_url();
        let response = self.client.get(&url).send().await.map_err(request_failed)?;

        match response.status() {
            status if status.is_success() => {
                tracing::debug!(collection = %self.collection, "Collection exists");
                return Ok(());
            }
            StatusCode::NOT_FOUND => {}
            _ => {
                Self::check(response, "collection lookup").await?;
            }
        }

        let body = CreateCollection {
            vectors: VectorParams {
                size: dimension,
                distance: "Cosine",
            },
        };
        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(request_failed)?;
        Self::check(response, "collection create").await?;

        tracing::info!(
            collection = %self.collection,
            dimension,
            "Created Qdrant collection"
        );
        Ok(())
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points = records
            .iter()
            .map(PointStruct::from_record)
            .collect::<Result<Vec<_>>>()?;

        let url = format!("{}/points?wait=true", self.collection_url());
        let response = self
            .client
            .put(&url)
            .json(&UpsertPoints { points })
            .send()
            .await
            .map_err(request_failed)?;
        Self::check(response, "upsert").await?;

        tracing::debug!(count = records.len(), collection = %self.collection, "Upserted points");
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}/points/search", self.collection_url());
        let request = SearchRequest {
            vector,
            limit: top_k,
            with_payload: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(request_failed)?;
        let response = Self::check(response, "search").await?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::index_write(format!("Failed to parse Qdrant search response: {}", e)))?;

        Ok(parsed.result.into_iter().map(ScoredPoint::into_hit).collect())
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/collections", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
