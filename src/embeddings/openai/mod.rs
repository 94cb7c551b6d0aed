#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Embedder, Embedding};
use crate::config::OpenAiConfig;
use crate::{RagError, Result, provider_error_message};

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
    expected_dimension: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    #[inline]
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self> {
        let base_url = config
            .api_url()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RagError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
            model: config.embedding_model.clone(),
            expected_dimension: None,
        })
    }

    /// Fail fast when the model's vectors do not fit the index
    #[inline]
    pub fn with_expected_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        if text.trim().is_empty() {
            return Err(RagError::Embedding(
                "cannot embed empty text".to_string(),
            ));
        }

        let url = self
            .base_url
            .join("embeddings")
            .map_err(|e| RagError::Config(format!("Failed to build embedding URL: {}", e)))?;

        debug!(
            "Generating embedding with {} for text (length: {})",
            self.model,
            text.len()
        );

        let request = EmbedRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Network(format!("Failed to reach embedding provider: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            RagError::Network(format!("Failed to read embedding response: {}", e))
        })?;

        if !status.is_success() {
            return Err(RagError::Embedding(provider_error_message(status, &body)));
        }

        let parsed: EmbedResponse = serde_json::from_str(&body).map_err(|e| {
            RagError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|vector| !vector.is_empty())
            .ok_or_else(|| RagError::Embedding("provider returned no embedding".to_string()))?;

        if let Some(expected) = self.expected_dimension.filter(|&d| d != vector.len()) {
            return Err(RagError::Embedding(format!(
                "model {} returned {} dimensions but the index expects {}",
                self.model,
                vector.len(),
                expected
            )));
        }

        debug!("Generated embedding with {} dimensions", vector.len());
        Ok(Embedding { vector })
    }
}
