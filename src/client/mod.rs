//! HTTP client for a running taxbrief server
//!
//! Used by `taxbrief ask`. Talks to `/api/chat` the same way the browser
//! page does and yields the reply text as it streams in.

use std::time::Duration;

use futures_util::{StreamExt, stream};
use reqwest::Client;
use tracing::debug;

use crate::api::ErrorBody;
use crate::errors::{Result, TaxbriefError};
use crate::llm::{ChatRequest, TextStream};

pub struct ChatClient {
    http: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// POST the request and stream the plain-text reply.
    ///
    /// Non-2xx answers carry `{"error": "..."}` and become an
    /// `Upstream` error with that message.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<TextStream> {
        let url = self.chat_url();
        debug!("POST {}", url);

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TaxbriefError::upstream(format!(
                "{}: {}",
                status,
                error_message_from_body(&body)
            )));
        }

        let chunks = Box::pin(response.bytes_stream());
        let text = stream::unfold(
            (chunks, Vec::<u8>::new()),
            |(mut chunks, mut pending)| async move {
                loop {
                    match chunks.next().await {
                        Some(Ok(bytes)) => {
                            let text = decode_utf8_chunk(&mut pending, &bytes);
                            if !text.is_empty() {
                                return Some((Ok(text), (chunks, pending)));
                            }
                        }
                        Some(Err(e)) => {
                            return Some((Err(TaxbriefError::from(e)), (chunks, Vec::new())));
                        }
                        None if !pending.is_empty() => {
                            let rest = String::from_utf8_lossy(&pending).into_owned();
                            return Some((Ok(rest), (chunks, Vec::new())));
                        }
                        None => return None,
                    }
                }
            },
        );

        Ok(text.boxed())
    }
}

/// Error text from a JSON error body, or the raw body when it is not one.
fn error_message_from_body(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Append `bytes` to `pending` and take out the longest valid UTF-8 prefix.
/// A multi-byte character split across network chunks stays in `pending`
/// until the rest arrives.
fn decode_utf8_chunk(pending: &mut Vec<u8>, bytes: &[u8]) -> String {
    pending.extend_from_slice(bytes);
    let valid = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        // 真正的非法字节：整段按有损方式解码
        Err(_) => {
            let text = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            return text;
        }
    };

    let rest = pending.split_off(valid);
    String::from_utf8(std::mem::replace(pending, rest)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_split_multibyte_char() {
        let naira = "₦".as_bytes();
        let mut pending = Vec::new();

        let first = decode_utf8_chunk(&mut pending, &[b'a', naira[0]]);
        assert_eq!(first, "a");
        assert_eq!(pending, vec![naira[0]]);

        let second = decode_utf8_chunk(&mut pending, &naira[1..]);
        assert_eq!(second, "₦");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_decode_invalid_bytes_are_lossy() {
        let mut pending = Vec::new();
        let text = decode_utf8_chunk(&mut pending, &[b'o', b'k', 0xff, b'!']);
        assert_eq!(text, "ok\u{fffd}!");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message_from_body(r#"{"error":"Method Not Allowed"}"#),
            "Method Not Allowed"
        );
        assert_eq!(error_message_from_body("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message_from_body(""), "no response body");
    }

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        let client = ChatClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.chat_url(), "http://localhost:8080/api/chat");
    }
}
