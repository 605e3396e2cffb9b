//! Augmented knowledge core
//!
//! The model is grounded on two documents: a structured JSON rendition and the
//! raw text of the same act. Both are read from disk, wrapped in marker tags
//! and appended to the protocol prompt as the system instruction.

use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::errors::{Result, TaxbriefError};

/// Built-in analysis protocol sent as the head of every system instruction.
pub const SSDEL_PROTOCOL: &str = include_str!("protocol.md");

/// Heading that introduces the knowledge core inside the system instruction.
const CONTEXT_PREAMBLE: &str = "CONTEXT DOCUMENTS: Here is the structured JSON and unstructured Text of the \"Nigeria Tax Act, 2025\" (your Augmented Knowledge Core). All your analysis, reasoning, and citations must be based exclusively on this combined schema:";

/// Client-facing message for any load failure.
const LOAD_FAILED: &str = "Failed to load Knowledge Core files";

/// Both documents, loaded.
#[derive(Debug, Clone)]
pub struct KnowledgeCore {
    json: serde_json::Value,
    text: String,
}

impl KnowledgeCore {
    pub fn new(json: serde_json::Value, text: impl Into<String>) -> Self {
        Self {
            json,
            text: text.into(),
        }
    }

    /// Read both documents. Either one failing fails the whole load; the
    /// paths and OS error are logged, the returned message stays generic.
    pub async fn load(json_path: &Path, text_path: &Path) -> Result<Self> {
        let (json_raw, text) = tokio::join!(
            tokio::fs::read_to_string(json_path),
            tokio::fs::read_to_string(text_path)
        );

        let (json_raw, text) = match (json_raw, text) {
            (Ok(json_raw), Ok(text)) => (json_raw, text),
            (json_res, text_res) => {
                let reason = json_res
                    .err()
                    .map(|e| format!("{}: {}", json_path.display(), e))
                    .or_else(|| {
                        text_res
                            .err()
                            .map(|e| format!("{}: {}", text_path.display(), e))
                    })
                    .unwrap_or_default();
                error!("Failed to read knowledge core: {}", reason);
                return Err(TaxbriefError::knowledge_core(LOAD_FAILED));
            }
        };

        let json = serde_json::from_str(&json_raw).map_err(|e| {
            error!("Invalid knowledge core JSON {}: {}", json_path.display(), e);
            TaxbriefError::knowledge_core(LOAD_FAILED)
        })?;

        Ok(Self::new(json, text))
    }

    /// The tagged context block. JSON is re-serialized compactly.
    pub fn render(&self) -> String {
        format!(
            "\n<JSON_KNOWLEDGE_CORE>\n{}\n</JSON_KNOWLEDGE_CORE>\n\n<TEXT_KNOWLEDGE_CORE_FOR_VERIFICATION>\n{}\n</TEXT_KNOWLEDGE_CORE_FOR_VERIFICATION>\n",
            self.json, self.text
        )
    }
}

/// Join the protocol and the rendered knowledge core.
pub fn compose_system_instruction(protocol: &str, context: &str) -> String {
    format!("{protocol}\n\n{CONTEXT_PREAMBLE}\n\n{context}")
}

/// Loads the knowledge core on first use and keeps the rendered context for
/// the lifetime of the process. Failed loads are not remembered.
pub struct KnowledgeService {
    json_path: PathBuf,
    text_path: PathBuf,
    protocol: String,
    context: OnceCell<String>,
}

impl KnowledgeService {
    pub fn new(
        json_path: impl Into<PathBuf>,
        text_path: impl Into<PathBuf>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            json_path: json_path.into(),
            text_path: text_path.into(),
            protocol: protocol.into(),
            context: OnceCell::new(),
        }
    }

    /// Build from config, reading the protocol override file if one is set.
    pub fn from_config(config: &crate::config::KnowledgeConfig) -> Result<Self> {
        let protocol = match config.protocol_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                TaxbriefError::file_operation(format!("Failed to read protocol {}: {}", path, e))
            })?,
            None => SSDEL_PROTOCOL.to_string(),
        };
        Ok(Self::new(&config.json_path, &config.text_path, protocol))
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn is_loaded(&self) -> bool {
        self.context.initialized()
    }

    /// Rendered knowledge core, loading it if needed.
    pub async fn context(&self) -> Result<&str> {
        self.context
            .get_or_try_init(|| async {
                debug!(
                    "Loading knowledge core from {} and {}",
                    self.json_path.display(),
                    self.text_path.display()
                );
                let core = KnowledgeCore::load(&self.json_path, &self.text_path)
                    .await
                    .inspect_err(|e| error!("Error loading knowledge core: {}", e))?;
                let rendered = core.render();
                info!("Knowledge core loaded ({} bytes)", rendered.len());
                Ok::<_, TaxbriefError>(rendered)
            })
            .await
            .map(String::as_str)
    }

    /// Full system instruction: protocol plus knowledge core.
    pub async fn system_instruction(&self) -> Result<String> {
        let context = self.context().await?;
        Ok(compose_system_instruction(&self.protocol, context))
    }
}
