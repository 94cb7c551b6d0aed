//! Chat messages as they arrive in the request body and as they are sent to the model.


use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RagError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Parse the request body into the ordered conversation history.
///
/// The body must be a JSON array of messages. The last message is the one used
/// for retrieval, so it has to carry some text.
#[inline]
pub fn parse_messages(body: &[u8]) -> Result<Vec<Message>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RagError::BadRequest("request body is empty".to_string()));
    }

    let messages: Vec<Message> = serde_json::from_slice(body)
        .map_err(|e| RagError::BadRequest(format!("invalid message list: {}", e)))?;

    let last = messages
        .last()
        .ok_or_else(|| RagError::BadRequest("message list is empty".to_string()))?;

    if last.content.trim().is_empty() {
        return Err(RagError::BadRequest(
            "last message has no content".to_string(),
        ));
    }

    debug!("Parsed {} messages from request body", messages.len());
    Ok(messages)
}
