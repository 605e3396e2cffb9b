//! Ask command - stream one query through a running server

use std::path::PathBuf;

use colored::Colorize;
use futures_util::StreamExt;
use tokio::io::{AsyncWriteExt, stdout};

use crate::client::ChatClient;
use crate::interfaces::cli::CliError;
use crate::markdown::render_markdown_as_html;
use crate::services::{Message, Transcript, build_request};
use crate::utils::Attachment;

/// Send `query` (and an optional image) and print the reply as it arrives.
pub async fn ask(
    query: String,
    image: Option<PathBuf>,
    server: String,
    render: bool,
) -> Result<(), CliError> {
    if query.trim().is_empty() && image.is_none() {
        return Err(CliError::ParseError("query must not be empty".to_string()));
    }

    let attachment = image.as_deref().map(Attachment::from_path).transpose()?;

    // 与网页端一致：新会话从问候语开始
    let messages = vec![Message::greeting()];
    let request = build_request(&messages, &query, attachment.as_ref());

    let client = ChatClient::new(server)?;
    let mut reply = client.stream_chat(&request).await?;

    let mut out = stdout();
    let mut transcript = Transcript::new();
    while let Some(chunk) = reply.next().await {
        let chunk = chunk?;
        transcript.push_chunk(&chunk);
        out.write_all(chunk.as_bytes())
            .await
            .map_err(|e| CliError::CommandError(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| CliError::CommandError(e.to_string()))?;
    }
    println!();

    eprintln!(
        "{} {}",
        "Words:".dimmed(),
        transcript.word_count().to_string().cyan()
    );

    if render {
        println!("{}", render_markdown_as_html(transcript.text()));
    }

    Ok(())
}
