pub mod chat;
pub mod conversation;
pub mod knowledge;

pub use chat::{ChatService, OpenedStream};
pub use conversation::{Message, Transcript, build_history, build_request};
pub use knowledge::{KnowledgeCore, KnowledgeService, SSDEL_PROTOCOL, compose_system_instruction};
