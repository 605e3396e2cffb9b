use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::StaticConfig;
use crate::llm::{ChatBackend, GeminiClient};
use crate::services::{ChatService, KnowledgeService};

pub struct StartupContext {
    pub chat_service: Arc<ChatService>,
}

/// 根据配置组装聊天服务（模型后端 + 知识库）
pub fn build_chat_service(config: &StaticConfig) -> Result<Arc<ChatService>> {
    let backend: Arc<dyn ChatBackend> = Arc::new(
        GeminiClient::from_config(&config.llm).context("Failed to create Gemini client")?,
    );
    let knowledge = Arc::new(
        KnowledgeService::from_config(&config.knowledge)
            .context("Failed to prepare knowledge core")?,
    );

    Ok(Arc::new(ChatService::new(
        backend,
        knowledge,
        config.llm.has_api_key(),
    )))
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    if !config.llm.has_api_key() {
        warn!(
            "No API key configured (llm.api_key / GEMINI_API_KEY). \
             Chat requests will be answered with a configuration error."
        );
    }

    let chat_service = build_chat_service(config)?;
    info!("Using model: {}", chat_service.model());

    // 后台预热知识库，失败时首个请求会再次尝试
    let warmup = chat_service.clone();
    tokio::spawn(async move {
        match warmup.knowledge().context().await {
            Ok(context) => info!("Knowledge core loaded ({} bytes)", context.len()),
            Err(e) => warn!("Knowledge core preload failed: {}", e),
        }
    });

    debug!("Pre-startup completed in {:?}", start_time.elapsed());
    Ok(StartupContext { chat_service })
}
