//! In-memory providers for exercising the pipeline without network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::chat::Message;
use crate::completion::{ChatModel, TokenStream};
use crate::embeddings::{Embedder, Embedding};
use crate::index::{IndexDescriptor, ProfessorMetadata, RetrievedMatch, VectorIndex};
use crate::pipeline::{ProviderFactory, RagPipeline};
use crate::{RagError, Result};

/// Returns a constant vector, or the configured error
#[derive(Default)]
pub struct FakeEmbedder {
    pub seen: Mutex<Vec<String>>,
    pub failure: Option<String>,
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        if let Some(message) = &self.failure {
            return Err(RagError::Embedding(message.clone()));
        }
        self.seen.lock().expect("lock").push(text.to_string());
        Ok(Embedding {
            vector: vec![0.25; 4],
        })
    }
}

#[derive(Default)]
pub struct FakeIndex {
    pub names: Mutex<Vec<String>>,
    pub matches: Vec<RetrievedMatch>,
    pub queries: Mutex<Vec<(usize, usize)>>,
}

impl FakeIndex {
    /// An already provisioned default index holding `matches`
    pub fn with_matches(matches: Vec<RetrievedMatch>) -> Self {
        Self {
            names: Mutex::new(vec![IndexDescriptor::default().name]),
            matches,
            ..Self::default()
        }
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn list_indexes(&self) -> Result<Vec<String>> {
        Ok(self.names.lock().expect("lock").clone())
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<()> {
        self.names.lock().expect("lock").push(descriptor.name.clone());
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedMatch>> {
        self.queries.lock().expect("lock").push((vector.len(), top_k));
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}

/// Streams fixed fragments, optionally followed by an error, and records the prompt
#[derive(Default)]
pub struct FakeChat {
    pub fragments: Vec<&'static str>,
    pub fail_after: bool,
    pub composed: Mutex<Option<Vec<Message>>>,
}

impl FakeChat {
    pub fn composed(&self) -> Vec<Message> {
        self.composed
            .lock()
            .expect("lock")
            .clone()
            .expect("chat model was called")
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn stream_chat(&self, messages: &[Message]) -> Result<TokenStream> {
        *self.composed.lock().expect("lock") = Some(messages.to_vec());
        let mut items: Vec<Result<String>> = self
            .fragments
            .iter()
            .map(|fragment| Ok((*fragment).to_string()))
            .collect();
        if self.fail_after {
            items.push(Err(RagError::Completion("stream interrupted".to_string())));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

pub fn calculus_match() -> RetrievedMatch {
    RetrievedMatch {
        id: "J.Smith".to_string(),
        score: Some(0.9),
        metadata: ProfessorMetadata {
            subject: Some("Calculus".to_string()),
            stars: Some(4.8),
            review: None,
        },
    }
}

/// Hands out pipelines over shared fakes, or a fixed error
pub struct FakeFactory {
    pub embedder: Arc<FakeEmbedder>,
    pub index: Arc<FakeIndex>,
    pub chat: Arc<FakeChat>,
    pub failure: Option<fn() -> RagError>,
}

impl FakeFactory {
    pub fn new(embedder: FakeEmbedder, index: FakeIndex, chat: FakeChat) -> Self {
        Self {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
            chat: Arc::new(chat),
            failure: None,
        }
    }
}

impl ProviderFactory for FakeFactory {
    fn pipeline(&self) -> Result<RagPipeline> {
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        Ok(RagPipeline::new(
            self.embedder.clone(),
            self.index.clone(),
            self.chat.clone(),
            IndexDescriptor::default(),
        ))
    }
}
