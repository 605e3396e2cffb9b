//! Render command - markdown file or stdin to HTML

use std::path::PathBuf;

use tokio::io::AsyncReadExt;

use crate::interfaces::cli::CliError;
use crate::markdown::render_markdown_as_html;

pub async fn render_file(file_path: Option<PathBuf>) -> Result<(), CliError> {
    let markdown = match file_path {
        Some(path) => tokio::fs::read_to_string(&path).await.map_err(|e| {
            CliError::CommandError(format!("Failed to read {}: {}", path.display(), e))
        })?,
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .map_err(|e| CliError::CommandError(format!("Failed to read stdin: {}", e)))?;
            input
        }
    };

    println!("{}", render_markdown_as_html(&markdown));
    Ok(())
}
