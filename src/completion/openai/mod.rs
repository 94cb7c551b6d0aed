
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{ChatModel, TokenStream};
use crate::chat::Message;
use crate::config::OpenAiConfig;
use crate::{RagError, Result, provider_error_message};

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
}

/// What a single `data:` payload means for the relay
#[derive(Debug, PartialEq, Eq)]
enum StreamEvent {
    Fragment(String),
    /// Role announcements, finish reasons and other content-free chunks
    Skip,
    Done,
}

/// Splits a server-sent event byte stream into `data:` payloads.
///
/// Bytes are buffered until a full line is available, so chunk boundaries may fall
/// anywhere, including inside a multi-byte character.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Payload of a trailing line that was never newline-terminated
    fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    Some(payload.to_string())
}

fn interpret(payload: &str) -> Result<StreamEvent> {
    if payload.trim() == DONE_MARKER {
        return Ok(StreamEvent::Done);
    }

    let chunk: ChatChunk = serde_json::from_str(payload)
        .map_err(|e| RagError::Completion(format!("malformed stream chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(RagError::Completion(format!(
            "provider error mid-stream: {}",
            error.message
        )));
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty());

    Ok(content.map_or(StreamEvent::Skip, StreamEvent::Fragment))
}

impl OpenAiChatModel {
    #[inline]
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self> {
        let base_url = config
            .api_url()
            .map_err(|e| RagError::Config(e.to_string()))?;

        // Only connecting is bounded; a completion streams for as long as it generates
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RagError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
            model: config.chat_model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn stream_chat(&self, messages: &[Message]) -> Result<TokenStream> {
        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|e| RagError::Config(format!("Failed to build completion URL: {}", e)))?;

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        debug!(
            "Requesting streamed completion from {} with {} messages",
            self.model,
            messages.len()
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Network(format!("Failed to reach completion provider: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                debug!("Failed to read completion error body: {}", e);
                String::new()
            });
            return Err(RagError::Completion(provider_error_message(status, &body)));
        }

        info!("Completion stream opened with {}", self.model);

        let mut bytes = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            loop {
                let (payloads, ended) = match bytes.next().await {
                    Some(Ok(chunk)) => (decoder.push(&chunk), false),
                    Some(Err(e)) => {
                        yield Err(RagError::Completion(format!("stream interrupted: {}", e)));
                        return;
                    }
                    None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
                };

                for payload in payloads {
                    match interpret(&payload) {
                        Ok(StreamEvent::Fragment(text)) => yield Ok(text),
                        Ok(StreamEvent::Skip) => {}
                        Ok(StreamEvent::Done) => return,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }

                if ended {
                    yield Err(RagError::Completion(
                        "stream ended before the completion signal".to_string(),
                    ));
                    return;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
