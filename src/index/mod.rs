// Vector index module
// Provisioning and nearest-neighbour queries against the hosted professor index


pub mod pinecone;

pub use pinecone::PineconeClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

use crate::{RagError, Result};

/// Number of professors retrieved for every question
pub const TOP_K: usize = 3;

/// Similarity metric the index is created with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Dotproduct,
}

impl Metric {
    pub const ALL: [Self; 3] = [Self::Cosine, Self::Euclidean, Self::Dotproduct];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dotproduct => "dotproduct",
        }
    }
}

impl fmt::Display for Metric {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provisioning parameters for the index, fixed for the lifetime of the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub dimension: u32,
    pub metric: Metric,
    pub cloud: String,
    pub region: String,
    /// Namespace queried inside the index
    pub namespace: String,
}

impl Default for IndexDescriptor {
    fn default() -> Self {
        Self {
            name: "rag".to_string(),
            dimension: 1536,
            metric: Metric::Cosine,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            namespace: "ns1".to_string(),
        }
    }
}

/// Known professor fields stored alongside each vector.
///
/// Every field is optional; entries written by older loaders may lack a review
/// or carry the rating as a string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfessorMetadata {
    pub subject: Option<String>,
    pub stars: Option<f64>,
    pub review: Option<String>,
}

impl ProfessorMetadata {
    /// Pick the known fields out of an arbitrary metadata object
    #[inline]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let stars = map.get("stars").and_then(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        Self {
            subject: text("subject"),
            stars,
            review: text("review"),
        }
    }
}

/// One professor returned by a similarity query
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedMatch {
    pub id: String,
    pub score: Option<f32>,
    pub metadata: ProfessorMetadata,
}

/// Outcome of [`ensure_index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    Existing,
}

/// Vector index service consumed by the pipeline
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Names of every index visible to the account
    async fn list_indexes(&self) -> Result<Vec<String>>;

    /// Create an index; fails with [`RagError::IndexAlreadyExists`] when the name is taken
    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<()>;

    /// Up to `top_k` nearest entries, most similar first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedMatch>>;
}

/// Make sure the index named by `descriptor` exists, creating it if needed.
///
/// Check-then-create is not atomic, so a concurrent creator winning the race is
/// reported as [`Provisioned::Existing`] rather than an error.
#[inline]
pub async fn ensure_index(
    index: &dyn VectorIndex,
    descriptor: &IndexDescriptor,
) -> Result<Provisioned> {
    let names = index.list_indexes().await?;

    if names.iter().any(|name| name == &descriptor.name) {
        debug!("Index {} already exists", descriptor.name);
        return Ok(Provisioned::Existing);
    }

    info!(
        "Creating index {} ({} dimensions, {} metric, {}/{})",
        descriptor.name, descriptor.dimension, descriptor.metric, descriptor.cloud, descriptor.region
    );

    match index.create_index(descriptor).await {
        Ok(()) => Ok(Provisioned::Created),
        Err(RagError::IndexAlreadyExists(name)) => {
            warn!("Index {} was created concurrently, using it", name);
            Ok(Provisioned::Existing)
        }
        Err(e) => Err(e),
    }
}
