//! Taxbrief - streaming chat relay for executive tax briefings
//!
//! Serves a chat page, forwards each query (with the knowledge core as the
//! system instruction) to Gemini and relays the reply as a plain-text
//! stream. Replies are rendered to HTML by a small line-oriented markdown
//! renderer.
//!
//! # Features
//! - **cli**: one-shot commands (`ask`, `render`, `config generate`)
//!
//! # Architecture
//! - `llm`: Gemini wire types and the streaming backend
//! - `services`: chat relay, knowledge core and conversation state
//! - `markdown`: markdown to HTML
//! - `api`: HTTP services and middleware
//! - `interfaces`: command-line interface
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: logging and signal handling

pub mod api;
pub mod cli;
#[cfg(feature = "cli")]
pub mod client;
pub mod config;
pub mod errors;
#[cfg(feature = "cli")]
pub mod interfaces;
pub mod llm;
pub mod markdown;
pub mod runtime;
pub mod services;
pub mod system;
pub mod utils;
