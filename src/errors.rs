use std::fmt;

#[derive(Debug, Clone)]
pub enum TaxbriefError {
    Configuration(String),
    FileOperation(String),
    KnowledgeCore(String),
    Validation(String),
    Serialization(String),
    Upstream(String),
    Transport(String),
    AttachmentTooLarge(String),
}

impl TaxbriefError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            TaxbriefError::Configuration(_) => "E001",
            TaxbriefError::FileOperation(_) => "E002",
            TaxbriefError::KnowledgeCore(_) => "E003",
            TaxbriefError::Validation(_) => "E004",
            TaxbriefError::Serialization(_) => "E005",
            TaxbriefError::Upstream(_) => "E006",
            TaxbriefError::Transport(_) => "E007",
            TaxbriefError::AttachmentTooLarge(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            TaxbriefError::Configuration(_) => "Server Configuration Error",
            TaxbriefError::FileOperation(_) => "File Operation Error",
            TaxbriefError::KnowledgeCore(_) => "Knowledge Core Error",
            TaxbriefError::Validation(_) => "Validation Error",
            TaxbriefError::Serialization(_) => "Serialization Error",
            TaxbriefError::Upstream(_) => "Upstream Model Error",
            TaxbriefError::Transport(_) => "Transport Error",
            TaxbriefError::AttachmentTooLarge(_) => "Attachment Too Large",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            TaxbriefError::Configuration(msg)
            | TaxbriefError::FileOperation(msg)
            | TaxbriefError::KnowledgeCore(msg)
            | TaxbriefError::Validation(msg)
            | TaxbriefError::Serialization(msg)
            | TaxbriefError::Upstream(msg)
            | TaxbriefError::Transport(msg)
            | TaxbriefError::AttachmentTooLarge(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TaxbriefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TaxbriefError {}

// 便捷的构造函数
impl TaxbriefError {
    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        TaxbriefError::Configuration(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        TaxbriefError::FileOperation(msg.into())
    }

    pub fn knowledge_core<T: Into<String>>(msg: T) -> Self {
        TaxbriefError::KnowledgeCore(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        TaxbriefError::Validation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        TaxbriefError::Serialization(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        TaxbriefError::Upstream(msg.into())
    }

    pub fn transport<T: Into<String>>(msg: T) -> Self {
        TaxbriefError::Transport(msg.into())
    }

    pub fn attachment_too_large<T: Into<String>>(msg: T) -> Self {
        TaxbriefError::AttachmentTooLarge(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for TaxbriefError {
    fn from(err: std::io::Error) -> Self {
        TaxbriefError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TaxbriefError {
    fn from(err: serde_json::Error) -> Self {
        TaxbriefError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for TaxbriefError {
    fn from(err: reqwest::Error) -> Self {
        TaxbriefError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TaxbriefError>;
