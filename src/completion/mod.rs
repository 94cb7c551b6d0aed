//! Streaming chat completion and the relay that forwards it to the caller.


pub mod openai;

pub use openai::OpenAiChatModel;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, error};

use crate::Result;
use crate::chat::Message;

/// Live sequence of generated text fragments, ending when the provider signals completion
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Chat completion provider consumed by the pipeline
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start generation for `messages`.
    ///
    /// Errors that happen before the first fragment (authentication, quota, unknown
    /// model) are returned here; later failures arrive as an `Err` item on the stream.
    async fn stream_chat(&self, messages: &[Message]) -> Result<TokenStream>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Streaming,
    Completed,
    Errored,
}

impl RelayState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }
}

/// Forwards provider fragments to the consumer one at a time.
///
/// Single pass: after the upstream ends or fails nothing more is yielded. Dropping
/// the relay drops the upstream stream, which closes the provider connection and
/// stops generation.
pub struct Relay {
    upstream: TokenStream,
    state: RelayState,
    forwarded: usize,
}

impl Relay {
    #[inline]
    pub fn new(upstream: TokenStream) -> Self {
        Self {
            upstream,
            state: RelayState::Idle,
            forwarded: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Number of fragments handed to the consumer so far
    #[inline]
    pub fn forwarded(&self) -> usize {
        self.forwarded
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("state", &self.state)
            .field("forwarded", &self.forwarded)
            .finish_non_exhaustive()
    }
}

impl Stream for Relay {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.state.is_terminal() {
                return Poll::Ready(None);
            }

            match self.upstream.poll_next_unpin(cx) {
                Poll::Pending => {
                    if self.state == RelayState::Idle {
                        self.state = RelayState::Streaming;
                    }
                    return Poll::Pending;
                }
                Poll::Ready(Some(Ok(fragment))) => {
                    self.state = RelayState::Streaming;
                    if fragment.is_empty() {
                        continue;
                    }
                    self.forwarded += 1;
                    return Poll::Ready(Some(Ok(fragment)));
                }
                Poll::Ready(Some(Err(e))) => {
                    error!(
                        "Completion stream failed after {} fragments: {}",
                        self.forwarded, e
                    );
                    self.state = RelayState::Errored;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    debug!("Completion stream finished after {} fragments", self.forwarded);
                    self.state = RelayState::Completed;
                    return Poll::Ready(None);
                }
            }
        }
    }
}
