//! Model backends
//!
//! `ChatBackend` is the seam between the HTTP layer and the hosted model:
//! the proxy only needs "open a streaming chat, give me text chunks".

mod gemini;
pub mod types;

pub use gemini::{GeminiClient, extract_chunk_text, extract_error_message};
pub use types::{ChatRequest, Content, InlineData, Part, Role};

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::errors::Result;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Stream of text chunks in arrival order. Empty chunks are never yielded.
pub type TextStream = BoxStream<'static, Result<String>>;

/// A hosted chat model that can stream its reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Model identifier, for logging and health output
    fn model(&self) -> &str;

    /// Open a streaming chat seeded with `request.history` and
    /// `request.system_instruction`, then send `request.message`.
    ///
    /// Connection and status errors may surface either here or as the
    /// first item of the returned stream.
    async fn stream_chat(&self, request: ChatRequest) -> Result<TextStream>;
}
