//! Azure OpenAI embedding client implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::EmbeddingProvider;
use crate::config::AzureConfig;
use crate::embeddings::EmbeddingVector;
use crate::error::{RagError, Result};

/// Async embeddings client for an Azure OpenAI embedding deployment.
#[derive(Clone)]
pub struct AzureEmbedder {
    client: Client,
    endpoint: url::Url,
    model: String,
    dimensions: Option<usize>,
}

impl AzureEmbedder {
    /// Builds a new client from the shared Azure settings.
    pub fn new(config: &AzureConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(config.api_key())
                .map_err(|_| RagError::InvalidInput("invalid Azure OpenAI API key".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|err| {
                RagError::Transport(format!("failed to build embedding HTTP client: {err}"))
            })?;
        let endpoint = config.deployment_url(config.embedding_deployment(), "embeddings")?;
        Ok(Self {
            client,
            endpoint,
            model: config.embedding_model().to_string(),
            dimensions: config.dimensions(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for AzureEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        if text.is_empty() {
            return Err(RagError::InvalidInput("embedding input is empty".into()));
        }
        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
        };
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            warn!(status = status.as_u16(), "embedding request rejected");
            return Err(RagError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        let payload: Value = resp.json().await?;
        let vector = extract_embedding(&payload, self.dimensions)?;
        debug!(dimensions = vector.dimensions(), "embedded text");
        Ok(vector)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

/// Pulls `data[0].embedding` out of a provider response and validates it.
fn extract_embedding(payload: &Value, expected: Option<usize>) -> Result<EmbeddingVector> {
    let raw = payload
        .get("data")
        .and_then(|data| data.get(0))
        .and_then(|entry| entry.get("embedding"))
        .ok_or_else(|| RagError::InvalidEmbedding("response missing data[0].embedding".into()))?;
    let items = raw
        .as_array()
        .ok_or_else(|| RagError::InvalidEmbedding("embedding is not an array".into()))?;
    let mut values = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let value = item.as_f64().ok_or_else(|| {
            RagError::InvalidEmbedding(format!("component {idx} is not a number"))
        })?;
        values.push(value);
    }
    let vector = EmbeddingVector::from_f64s(&values)?;
    if let Some(expected) = expected {
        if vector.dimensions() != expected {
            return Err(RagError::InvalidEmbedding(format!(
                "expected {expected} dimensions, got {}",
                vector.dimensions()
            )));
        }
    }
    Ok(vector)
}
