//! Mode routing
//!
//! - Server mode (HTTP server, the default)
//! - CLI mode (one-shot commands such as `ask` and `render`)

pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

pub use server::run_server;

#[cfg(feature = "cli")]
pub use cli::run_cli;

use crate::cli::Commands;

/// Mode detection result
#[derive(Debug, PartialEq)]
pub enum Mode {
    Server,
    #[cfg(feature = "cli")]
    Cli,
    Unknown,
}

/// Detect which mode to run based on the parsed subcommand
///
/// No subcommand, or `serve`, starts the server.
pub fn detect_mode(command: Option<&Commands>) -> Mode {
    match command {
        None | Some(Commands::Serve) => Mode::Server,
        #[cfg(feature = "cli")]
        Some(_) => Mode::Cli,
        #[cfg(not(feature = "cli"))]
        Some(_) => Mode::Unknown,
    }
}
