//! Conversation state
//!
//! What a chat front end keeps between turns: the message list, the history
//! sent with the next request, and the reply being streamed in.

use serde::{Deserialize, Serialize};

use crate::llm::{ChatRequest, Content, Part, Role};
use crate::utils::{Attachment, word_count};

/// Greeting shown before the first query.
pub const GREETING: &str = "System Initialized. I am the SSDEL-G Tax AI Agent. My analysis is grounded in the provided NTA 2025 Augmented Knowledge Core. Please state your query for a Strategic Intelligence Briefing.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    /// `data:` URI of an attached image, for display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

impl Message {
    pub fn greeting() -> Self {
        Self {
            id: "init-message".to_string(),
            role: Role::Model,
            text: GREETING.to_string(),
            image: None,
            word_count: None,
        }
    }

    pub fn user(id: impl Into<String>, text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
            text: text.into(),
            image,
            word_count: None,
        }
    }
}

/// Prior messages as text-only history. Images are not re-sent.
pub fn build_history(messages: &[Message]) -> Vec<Content> {
    messages
        .iter()
        .map(|msg| Content {
            role: msg.role,
            parts: vec![Part::text(msg.text.clone())],
        })
        .collect()
}

/// Request for a new turn: history from `messages`, then the query and the
/// optional image.
pub fn build_request(
    messages: &[Message],
    query: &str,
    attachment: Option<&Attachment>,
) -> ChatRequest {
    let mut parts = vec![Part::text(query)];
    if let Some(att) = attachment {
        parts.push(att.to_part());
    }

    ChatRequest {
        history: build_history(messages),
        message: parts,
        system_instruction: None,
    }
}

/// Reply being streamed in.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    text: String,
    word_count: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and recount words over the whole text.
    pub fn push_chunk(&mut self, chunk: &str) -> usize {
        self.text.push_str(chunk);
        self.word_count = word_count(&self.text);
        self.word_count
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn into_message(self, id: impl Into<String>) -> Message {
        Message {
            id: id.into(),
            role: Role::Model,
            text: self.text,
            image: None,
            word_count: Some(self.word_count),
        }
    }
}
