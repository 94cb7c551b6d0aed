// Embeddings module
// Turns the latest user message into a query vector

pub mod openai;

pub use openai::OpenAiEmbedder;

use async_trait::async_trait;

use crate::Result;

/// Query vector produced fresh for each request
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
}

impl Embedding {
    #[inline]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Embedding provider consumed by the pipeline
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed non-empty text; blank input is rejected
    async fn embed(&self, text: &str) -> Result<Embedding>;
}
