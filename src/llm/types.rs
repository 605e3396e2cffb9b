//! Chat wire types
//!
//! These mirror the Gemini `Content` / `Part` JSON shape so the browser can
//! post history in the same form the model API accepts it.

use serde::{Deserialize, Deserializer, Serialize};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Base64-encoded binary payload attached to a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One piece of a turn: either text or inline data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(text)],
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "deserialize_history")]
    pub history: Vec<Content>,
    #[serde(default, deserialize_with = "deserialize_message")]
    pub message: Vec<Part>,
    #[serde(
        default,
        rename = "systemInstruction",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<String>,
}

impl ChatRequest {
    /// True when the new turn carries nothing to send.
    pub fn is_empty_message(&self) -> bool {
        self.message.iter().all(|part| match part {
            Part::Text { text } => text.trim().is_empty(),
            Part::InlineData { inline_data } => inline_data.data.is_empty(),
        })
    }
}

/// A `null` history is treated as an empty one.
fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<Content>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Content>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The message may be a bare string, a single part, or a list of parts.
fn deserialize_message<'de, D>(deserializer: D) -> Result<Vec<Part>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MessageInput {
        Text(String),
        Parts(Vec<Part>),
        Part(Part),
    }

    Ok(match Option::<MessageInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(MessageInput::Text(text)) => vec![Part::text(text)],
        Some(MessageInput::Parts(parts)) => parts,
        Some(MessageInput::Part(part)) => vec![part],
    })
}
