
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use super::{IndexDescriptor, ProfessorMetadata, RetrievedMatch, VectorIndex};
use crate::config::PineconeConfig;
use crate::{RagError, Result, provider_error_message};

const API_VERSION: &str = "2024-07";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// HTTP client for a Pinecone project: control plane for provisioning, data plane for queries
#[derive(Debug)]
pub struct PineconeClient {
    http: reqwest::Client,
    controller_url: Url,
    api_key: String,
    index_name: String,
    namespace: String,
    data_plane_url: OnceCell<Url>,
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    #[serde(default)]
    host: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u32,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Debug, Deserialize)]
struct ScoredVector {
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeClient {
    #[inline]
    pub fn new(config: &PineconeConfig, api_key: impl Into<String>) -> Result<Self> {
        let controller_url = config
            .controller_api_url()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| RagError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            controller_url,
            api_key: api_key.into(),
            index_name: config.index_name.clone(),
            namespace: config.namespace.clone(),
            data_plane_url: OnceCell::new(),
        })
    }

    /// Skip the describe call by pinning the data plane host
    #[cfg(test)]
    pub(crate) fn with_data_plane_host(self, host: &str) -> Result<Self> {
        let url = host_url(host)?;
        Ok(Self {
            data_plane_url: OnceCell::new_with(Some(url)),
            ..self
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn controller_endpoint(&self, path: &str) -> Result<Url> {
        self.controller_url
            .join(path)
            .map_err(|e| RagError::Config(format!("Failed to build index URL: {}", e)))
    }

    /// Resolve (once) the host serving queries for the configured index
    async fn data_plane_url(&self) -> Result<&Url> {
        self.data_plane_url
            .get_or_try_init(|| async {
                let url = self.controller_endpoint(&format!("indexes/{}", self.index_name))?;
                debug!("Describing index {} at {}", self.index_name, url);

                let response = self
                    .request(reqwest::Method::GET, url)
                    .send()
                    .await
                    .map_err(|e| RagError::Network(format!("Failed to describe index: {}", e)))?;
                let model: IndexModel = read_json(response, "describe index").await?;

                let host = model.host.filter(|h| !h.trim().is_empty()).ok_or_else(|| {
                    RagError::Index(format!("Index {} has no host yet", model.name))
                })?;
                debug!("Index {} is served from {}", model.name, host);
                host_url(&host)
            })
            .await
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn list_indexes(&self) -> Result<Vec<String>> {
        let url = self.controller_endpoint("indexes")?;
        debug!("Listing indexes at {}", url);

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| RagError::Network(format!("Failed to list indexes: {}", e)))?;
        let list: IndexList = read_json(response, "list indexes").await?;

        Ok(list.indexes.into_iter().map(|index| index.name).collect())
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<()> {
        let url = self.controller_endpoint("indexes")?;
        let body = CreateIndexRequest {
            name: &descriptor.name,
            dimension: descriptor.dimension,
            metric: descriptor.metric.as_str(),
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &descriptor.cloud,
                    region: &descriptor.region,
                },
            },
        };

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::Network(format!("Failed to create index: {}", e)))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(RagError::IndexAlreadyExists(descriptor.name.clone()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|e| {
                debug!("Failed to read create index error body: {}", e);
                String::new()
            });
            return Err(RagError::Index(format!(
                "create index failed: {}",
                provider_error_message(status, &text)
            )));
        }

        info!("Created index {}", descriptor.name);
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedMatch>> {
        let url = self
            .data_plane_url()
            .await?
            .join("query")
            .map_err(|e| RagError::Config(format!("Failed to build query URL: {}", e)))?;

        let body = QueryRequest {
            namespace: &self.namespace,
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        debug!(
            "Querying {} for top {} matches in namespace {:?}",
            self.index_name, top_k, self.namespace
        );

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::Network(format!("Failed to query index: {}", e)))?;
        let result: QueryResponse = read_json(response, "query").await?;

        let matches: Vec<RetrievedMatch> = result
            .matches
            .into_iter()
            .take(top_k)
            .map(|scored| {
                let metadata = scored
                    .metadata
                    .as_ref()
                    .map(ProfessorMetadata::from_map)
                    .unwrap_or_default();
                RetrievedMatch {
                    id: scored.id,
                    score: scored.score,
                    metadata,
                }
            })
            .collect();

        debug!("Query returned {} matches", matches.len());
        Ok(matches)
    }
}

async fn read_json<T>(response: reqwest::Response, operation: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| RagError::Network(format!("Failed to read {} response: {}", operation, e)))?;

    if !status.is_success() {
        return Err(RagError::Index(format!(
            "{} failed: {}",
            operation,
            provider_error_message(status, &text)
        )));
    }

    serde_json::from_str(&text)
        .map_err(|e| RagError::Index(format!("Failed to parse {} response: {}", operation, e)))
}

/// Index hosts are reported without a scheme; accept full URLs too
fn host_url(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    let raw = if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}/", host)
    } else {
        format!("https://{}/", host)
    };
    Url::parse(&raw).map_err(|e| RagError::Index(format!("Invalid index host {}: {}", host, e)))
}
