//! Command-line interface definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default server address used by `ask`
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Taxbrief - streaming tax briefing chat relay
#[derive(Parser)]
#[command(name = "taxbrief")]
#[command(version)]
#[command(about = "Streaming chat relay for tax briefings", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Send a query to a running server and stream the reply to stdout
    Ask {
        /// The question to ask
        query: String,

        /// Attach an image (max 5MB)
        #[arg(long)]
        image: Option<PathBuf>,

        /// Server base URL
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        server: String,

        /// Print the reply rendered as HTML after streaming
        #[arg(long)]
        render: bool,
    },

    /// Render markdown to HTML (reads stdin when no file is given)
    Render {
        /// Input markdown file
        file_path: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}
