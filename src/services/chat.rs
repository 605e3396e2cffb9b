//! Chat relay service
//!
//! Resolves the system instruction and opens the upstream stream. The HTTP
//! layer calls this directly; it owns no per-request state.

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, info};

use crate::errors::{Result, TaxbriefError};
use crate::llm::{ChatBackend, ChatRequest, TextStream};
use crate::services::KnowledgeService;

/// First chunk already pulled from the upstream, plus the rest.
pub struct OpenedStream {
    pub first: Option<String>,
    pub rest: TextStream,
}

pub struct ChatService {
    backend: Arc<dyn ChatBackend>,
    knowledge: Arc<KnowledgeService>,
    api_key_configured: bool,
}

impl ChatService {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        knowledge: Arc<KnowledgeService>,
        api_key_configured: bool,
    ) -> Self {
        Self {
            backend,
            knowledge,
            api_key_configured,
        }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    pub fn api_key_configured(&self) -> bool {
        self.api_key_configured
    }

    pub fn knowledge(&self) -> &KnowledgeService {
        &self.knowledge
    }

    /// Fill in the system instruction from the knowledge core unless the
    /// caller supplied one.
    pub async fn prepare(&self, mut request: ChatRequest) -> Result<ChatRequest> {
        if request.system_instruction.is_none() {
            request.system_instruction = Some(self.knowledge.system_instruction().await?);
        }
        Ok(request)
    }

    /// Open the upstream stream and wait for its first chunk, so failures
    /// before any output can still be reported as a normal error response.
    pub async fn open(&self, request: ChatRequest) -> Result<OpenedStream> {
        if !self.api_key_configured {
            return Err(TaxbriefError::configuration("API Key missing"));
        }
        if request.is_empty_message() {
            return Err(TaxbriefError::validation("message must not be empty"));
        }

        let request = self.prepare(request).await?;
        info!(
            model = %self.backend.model(),
            history = request.history.len(),
            "Relaying chat request"
        );

        let mut rest = self.backend.stream_chat(request).await?;
        let first = match rest.next().await {
            Some(Ok(chunk)) => Some(chunk),
            Some(Err(e)) => return Err(e),
            None => {
                debug!("Upstream stream closed without text");
                None
            }
        };

        Ok(OpenedStream { first, rest })
    }
}
