//! Shared fixtures: a scripted model backend and knowledge core files.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use tempfile::TempDir;

use taxbrief::errors::{Result, TaxbriefError};
use taxbrief::llm::{ChatBackend, ChatRequest, TextStream};
use taxbrief::services::{ChatService, KnowledgeService};

pub const TEST_PROTOCOL: &str = "PROTOCOL: answer briefly.";

/// Backend that replays a fixed script instead of calling the model.
pub struct MockBackend {
    open_error: Option<TaxbriefError>,
    items: Vec<Result<String>>,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockBackend {
    pub fn chunks(chunks: &[&str]) -> Self {
        Self::script(chunks.iter().map(|c| Ok(c.to_string())).collect())
    }

    pub fn script(items: Vec<Result<String>>) -> Self {
        Self {
            open_error: None,
            items,
            last_request: Mutex::new(None),
        }
    }

    pub fn failing_open(err: TaxbriefError) -> Self {
        Self {
            open_error: Some(err),
            items: Vec::new(),
            last_request: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TextStream> {
        *self.last_request.lock().unwrap() = Some(request);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(stream::iter(self.items.clone()).boxed())
    }
}

/// Write a small knowledge core into `dir`.
pub fn write_knowledge(dir: &Path) -> Arc<KnowledgeService> {
    let json_path = dir.join("core.json");
    let text_path = dir.join("core.txt");
    std::fs::write(&json_path, r#"{"act":"Nigeria Tax Act, 2025","sections":[1,2]}"#).unwrap();
    std::fs::write(&text_path, "Section 1. Short title.").unwrap();
    Arc::new(KnowledgeService::new(json_path, text_path, TEST_PROTOCOL))
}

/// Knowledge service pointing at files that do not exist.
pub fn missing_knowledge(dir: &Path) -> Arc<KnowledgeService> {
    Arc::new(KnowledgeService::new(
        dir.join("missing.json"),
        dir.join("missing.txt"),
        TEST_PROTOCOL,
    ))
}

pub struct Fixture {
    pub dir: TempDir,
    pub backend: Arc<MockBackend>,
    pub service: Arc<ChatService>,
}

pub fn fixture(backend: MockBackend, api_key_configured: bool) -> Fixture {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(backend);
    let knowledge = write_knowledge(dir.path());
    let service = Arc::new(ChatService::new(
        backend.clone(),
        knowledge,
        api_key_configured,
    ));
    Fixture {
        dir,
        backend,
        service,
    }
}
