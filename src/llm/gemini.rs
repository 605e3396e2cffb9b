// Gemini streaming client using reqwest-eventsource.
//
// Calls `models/{model}:streamGenerateContent?alt=sse` and turns every SSE
// frame into the text it carries.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use super::{ChatBackend, ChatRequest, Content, TextStream};
use crate::errors::{Result, TaxbriefError};

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Low-level Gemini API streaming client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &crate::config::LlmConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    /// Build the `generateContent` body: history followed by the new user turn.
    pub(crate) fn build_body(request: &ChatRequest) -> Value {
        let mut contents = request.history.clone();
        contents.push(Content::user(request.message.clone()));

        let mut body = json!({ "contents": contents });
        if let Some(system) = request
            .system_instruction
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        body
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TextStream> {
        if self.api_key.is_empty() {
            return Err(TaxbriefError::configuration("API Key missing"));
        }

        let body = Self::build_body(&request);
        debug!(
            model = %self.model,
            history = request.history.len(),
            parts = request.message.len(),
            "Opening Gemini stream"
        );

        let mut es = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .eventsource()
            .map_err(|e| TaxbriefError::transport(format!("Failed to create event source: {e}")))?;
        es.set_retry_policy(Box::new(reqwest_eventsource::retry::Never));

        Ok(frames_to_text(es))
    }
}

/// Drive the event source until it ends, yielding only non-empty text.
/// The first error terminates the stream.
fn frames_to_text(es: EventSource) -> TextStream {
    futures_util::stream::unfold(Some(es), |state| async move {
        let mut es = state?;
        loop {
            match es.next().await {
                None => return None,
                Some(Ok(Event::Open)) => {
                    debug!("SSE connection opened");
                }
                Some(Ok(Event::Message(msg))) => match parse_frame(&msg.data) {
                    Ok(Some(text)) => return Some((Ok(text), Some(es))),
                    Ok(None) => {
                        trace!("SSE frame without text");
                    }
                    Err(e) => {
                        es.close();
                        return Some((Err(e), None));
                    }
                },
                Some(Err(reqwest_eventsource::Error::StreamEnded)) => {
                    debug!("SSE stream ended");
                    es.close();
                    return None;
                }
                Some(Err(err)) => {
                    warn!(?err, "SSE stream error");
                    es.close();
                    let message = extract_error_message(err).await;
                    return Some((Err(TaxbriefError::upstream(message)), None));
                }
            }
        }
    })
    .boxed()
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// Parse one SSE data frame. `Err` when the frame is a vendor error object.
fn parse_frame(data: &str) -> Result<Option<String>> {
    let v: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            warn!("Skipping unparseable SSE frame: {}", e);
            return Ok(None);
        }
    };

    if let Some(message) = error_object_message(&v) {
        return Err(TaxbriefError::upstream(message));
    }

    Ok(extract_chunk_text(&v))
}

/// Concatenate the text parts of the first candidate.
///
/// Expected shape:
/// `{ "candidates": [ { "content": { "parts": [ { "text": "..." } ] } } ] }`
pub fn extract_chunk_text(v: &Value) -> Option<String> {
    let parts = v
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() { None } else { Some(text) }
}

/// `{ "error": { "message": "..." } }`
fn error_object_message(v: &Value) -> Option<String> {
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract a human-readable error message from an SSE error, reading the
/// response body for status failures.
pub async fn extract_error_message(err: reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(error_object_message)
            {
                Some(message) => format!("API returned status {status}: {message}"),
                None => format!("API returned status {status}"),
            }
        }
        reqwest_eventsource::Error::Transport(e) => format!("Network error: {e}"),
        other => format!("Stream error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Part, Role};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    /// Accept one connection, answer it with `response` and hand back the
    /// request head that was received.
    async fn serve_once(response: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = read_request(&mut socket).await;
            let _ = tx.send(head);
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{addr}/v1beta"), rx)
    }

    /// Read headers plus a `Content-Length` body; returns the lowercased head.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::from_utf8_lossy(&buf).to_lowercase();
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    return head;
                }
            }
        }
    }

    fn sse_response(frames: &[&str]) -> String {
        let mut body = String::new();
        for frame in frames {
            body.push_str("data: ");
            body.push_str(frame);
            body.push_str("\n\n");
        }
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n{body}"
        )
    }

    fn client_for(base_url: &str) -> GeminiClient {
        GeminiClient::new("test-key", "gemini-2.5-pro", base_url, Duration::from_secs(5)).unwrap()
    }

    fn hello_request() -> ChatRequest {
        ChatRequest {
            message: vec![Part::text("hello")],
            ..Default::default()
        }
    }

    async fn collect(stream: TextStream) -> Vec<Result<String>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn stream_yields_frames_in_order() {
        let (base_url, head) = serve_once(sse_response(&[
            r###"{"candidates":[{"content":{"role":"model","parts":[{"text":"## Brief"}]}}]}"###,
            r#"{"usageMetadata":{"totalTokenCount":12}}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":"planning","thought":true},{"text":"ing\n"}]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":"CIT is 30%."}]},"finishReason":"STOP"}]}"#,
        ]))
        .await;

        let stream = client_for(&base_url).stream_chat(hello_request()).await.unwrap();
        let chunks: Vec<String> = collect(stream)
            .await
            .into_iter()
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(chunks, vec!["## Brief", "ing\n", "CIT is 30%."]);

        let head = head.await.unwrap();
        assert!(head.starts_with(
            "post /v1beta/models/gemini-2.5-pro:streamgeneratecontent?alt=sse"
        ));
        assert!(head.contains("x-goog-api-key: test-key"));
    }

    #[tokio::test]
    async fn error_status_becomes_upstream_error() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let response = format!(
            "HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base_url, _head) = serve_once(response).await;

        let stream = client_for(&base_url).stream_chat(hello_request()).await.unwrap();
        let items = collect(stream).await;
        assert_eq!(items.len(), 1);

        let err = items.into_iter().next().unwrap().unwrap_err();
        assert!(matches!(err, TaxbriefError::Upstream(_)));
        assert!(err.message().contains("400"));
        assert!(err.message().contains("API key not valid"));
    }

    #[tokio::test]
    async fn error_frame_ends_stream() {
        let (base_url, _head) = serve_once(sse_response(&[
            r#"{"candidates":[{"content":{"parts":[{"text":"Partial"}]}}]}"#,
            r#"{"error":{"code":429,"message":"quota exceeded"}}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":"never"}]}}]}"#,
        ]))
        .await;

        let stream = client_for(&base_url).stream_chat(hello_request()).await.unwrap();
        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Partial");
        let err = items[1].as_ref().unwrap_err();
        assert!(matches!(err, TaxbriefError::Upstream(_)));
        assert_eq!(err.message(), "quota exceeded");
    }

    #[test]
    fn chunk_text_single_part() {
        let v: Value = serde_json::from_str(
            r#"{ "candidates": [ { "content": { "role": "model", "parts": [ { "text": "Hello" } ] } } ] }"#,
        )
        .unwrap();
        assert_eq!(extract_chunk_text(&v), Some("Hello".to_string()));
    }

    #[test]
    fn chunk_text_joins_parts_and_skips_thoughts() {
        let v: Value = serde_json::from_str(
            r#"{ "candidates": [ { "content": { "parts": [
                { "text": "thinking...", "thought": true },
                { "text": "Hel" },
                { "text": "lo" }
            ] } } ] }"#,
        )
        .unwrap();
        assert_eq!(extract_chunk_text(&v), Some("Hello".to_string()));
    }

    #[test]
    fn chunk_text_missing_or_empty() {
        let v: Value =
            serde_json::from_str(r#"{ "usageMetadata": { "totalTokenCount": 3 } }"#).unwrap();
        assert_eq!(extract_chunk_text(&v), None);

        let v: Value = serde_json::from_str(
            r#"{ "candidates": [ { "content": { "parts": [ { "text": "" } ] }, "finishReason": "STOP" } ] }"#,
        )
        .unwrap();
        assert_eq!(extract_chunk_text(&v), None);
    }

    #[test]
    fn frame_with_error_object() {
        let err = parse_frame(r#"{ "error": { "code": 429, "message": "quota exceeded" } }"#)
            .unwrap_err();
        assert!(matches!(err, TaxbriefError::Upstream(_)));
        assert_eq!(err.message(), "quota exceeded");
    }

    #[test]
    fn frame_invalid_json_is_skipped() {
        assert!(parse_frame("{broken").unwrap().is_none());
    }

    #[test]
    fn body_appends_user_turn_and_system_instruction() {
        let request = ChatRequest {
            history: vec![Content::model_text("System Initialized.")],
            message: vec![Part::text("hi"), Part::inline_data("image/png", "AAAA")],
            system_instruction: Some("protocol".to_string()),
        };

        let body = GeminiClient::build_body(&request);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1]["role"], "user");
        assert_eq!(contents[1]["parts"][0]["text"], "hi");
        assert_eq!(contents[1]["parts"][1]["inlineData"]["data"], "AAAA");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "protocol");

        let parsed: Content = serde_json::from_value(contents[0].clone()).unwrap();
        assert_eq!(parsed.role, Role::Model);
    }

    #[test]
    fn body_without_system_instruction() {
        let request = ChatRequest {
            message: vec![Part::text("hi")],
            ..Default::default()
        };
        let body = GeminiClient::build_body(&request);
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn endpoint_uses_model_and_sse() {
        let client = GeminiClient::new(
            "key",
            "gemini-2.5-pro",
            "https://example.test/v1beta/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-pro:streamGenerateContent?alt=sse"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_request() {
        let client =
            GeminiClient::new("", "gemini-2.5-pro", "http://127.0.0.1:1", Duration::from_secs(1))
                .unwrap();
        let err = match client.stream_chat(ChatRequest::default()).await {
            Err(e) => e,
            Ok(_) => panic!("expected configuration error"),
        };
        assert!(matches!(err, TaxbriefError::Configuration(_)));
    }
}
