//! CLI interface module

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use commands::{ask, config_generate, render_file};

#[derive(Debug)]
pub enum CliError {
    RequestError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::RequestError(msg) => format!("Request error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::RequestError(msg) => {
                format!("{} {}", "Request error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::TaxbriefError> for CliError {
    fn from(err: crate::errors::TaxbriefError) -> Self {
        use crate::errors::TaxbriefError;
        match err {
            TaxbriefError::Upstream(_) | TaxbriefError::Transport(_) => {
                CliError::RequestError(err.message().to_string())
            }
            TaxbriefError::Validation(_) | TaxbriefError::Serialization(_) => {
                CliError::ParseError(err.message().to_string())
            }
            other => CliError::CommandError(other.format_simple()),
        }
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Ask {
            query,
            image,
            server,
            render,
        } => ask(query, image, server, render).await,

        Commands::Render { file_path } => render_file(file_path).await,

        Commands::Config { action } => match action {
            ConfigCommands::Generate { output_path, force } => {
                config_generate(output_path, force).await
            }
        },

        Commands::Serve => Err(CliError::CommandError(
            "serve is handled by server mode".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaxbriefError;

    #[test]
    fn test_from_taxbrief_error() {
        let err: CliError = TaxbriefError::transport("connection refused").into();
        assert_eq!(err.format_simple(), "Request error: connection refused");

        let err: CliError = TaxbriefError::attachment_too_large("too big").into();
        assert!(matches!(err, CliError::CommandError(_)));
        assert!(err.to_string().contains("too big"));
    }
}
