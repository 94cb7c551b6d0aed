//! The retrieval-augmented answer pipeline.
//!
//! Stages run strictly in order for each request: ensure the index exists, embed
//! the latest message, fetch the nearest professors, compose the prompt, then
//! open the completion stream. A request that had to create the index skips the
//! lookup and answers from an empty result set. Nothing is cached or retried.


use std::sync::Arc;
use tracing::{debug, info};

use crate::chat::Message;
use crate::completion::{ChatModel, OpenAiChatModel, Relay};
use crate::config::{Config, Credentials};
use crate::embeddings::{Embedder, OpenAiEmbedder};
use crate::index::{
    IndexDescriptor, PineconeClient, Provisioned, TOP_K, VectorIndex, ensure_index,
};
use crate::prompt::compose_messages;
use crate::{RagError, Result};

/// One request's worth of providers wired into the pipeline
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatModel>,
    descriptor: IndexDescriptor,
}

impl RagPipeline {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatModel>,
        descriptor: IndexDescriptor,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
            descriptor,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// Run every stage up to the opened completion stream
    #[inline]
    pub async fn answer(&self, messages: &[Message]) -> Result<Relay> {
        let last = messages
            .last()
            .ok_or_else(|| RagError::BadRequest("message list is empty".to_string()))?;

        let provisioned = ensure_index(self.index.as_ref(), &self.descriptor).await?;
        debug!("Index {} ready ({:?})", self.descriptor.name, provisioned);

        let embedding = self.embedder.embed(&last.content).await?;
        debug!("Query embedding has {} dimensions", embedding.dimension());

        // A freshly created index holds no records and may not accept queries yet
        let matches = match provisioned {
            Provisioned::Created => Vec::new(),
            Provisioned::Existing => self.index.query(&embedding.vector, TOP_K).await?,
        };
        info!(
            "Retrieved {} professors: {:?}",
            matches.len(),
            matches.iter().map(|m| m.id.as_str()).collect::<Vec<_>>()
        );

        let composed = compose_messages(messages, &matches);
        let upstream = self.chat.stream_chat(&composed).await?;

        Ok(Relay::new(upstream))
    }
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Builds the pipeline for a request; the seam where tests inject fakes
pub trait ProviderFactory: Send + Sync {
    fn pipeline(&self) -> Result<RagPipeline>;
}

/// Real providers built from configuration, with credentials read at call time
#[derive(Debug, Clone)]
pub struct ConfiguredProviders {
    config: Arc<Config>,
}

impl ConfiguredProviders {
    #[inline]
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Build the pipeline with explicit credentials
    #[inline]
    pub fn pipeline_with(&self, credentials: &Credentials) -> Result<RagPipeline> {
        let descriptor = self.config.pinecone.descriptor();

        let embedder = OpenAiEmbedder::new(&self.config.openai, &credentials.openai_api_key)?
            .with_expected_dimension(descriptor.dimension as usize);
        let index = PineconeClient::new(&self.config.pinecone, &credentials.pinecone_api_key)?;
        let chat = OpenAiChatModel::new(&self.config.openai, &credentials.openai_api_key)?;

        Ok(RagPipeline::new(
            Arc::new(embedder),
            Arc::new(index),
            Arc::new(chat),
            descriptor,
        ))
    }
}

impl ProviderFactory for ConfiguredProviders {
    #[inline]
    fn pipeline(&self) -> Result<RagPipeline> {
        let credentials = Credentials::from_env()?;
        self.pipeline_with(&credentials)
    }
}
