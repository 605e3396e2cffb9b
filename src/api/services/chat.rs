//! `/api/chat` - streaming relay to the model

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, ContentEncoding};
use actix_web::{HttpResponse, web};
use bytes::Bytes;
use futures_util::{StreamExt, future::ready, stream};
use tracing::{error, warn};

use crate::api::{error_response, json_error};
use crate::errors::TaxbriefError;
use crate::llm::ChatRequest;
use crate::services::{ChatService, OpenedStream};

pub struct ChatHandler;

impl ChatHandler {
    pub async fn chat(body: web::Bytes, service: web::Data<Arc<ChatService>>) -> HttpResponse {
        if !service.api_key_configured() {
            error!("API Key missing");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server Configuration Error: API Key missing",
            );
        }

        let request: ChatRequest = match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected chat request body: {}", e);
                return json_error(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"));
            }
        };

        match service.open(request).await {
            Ok(opened) => Self::stream_response(opened),
            Err(e) => {
                error!("Gemini API Error: {}", e);
                error_response(&e)
            }
        }
    }

    pub async fn method_not_allowed() -> HttpResponse {
        json_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    /// Relay chunks as they arrive. An error after the first byte can only
    /// end the body, so it is logged and the stream stops there.
    fn stream_response(opened: OpenedStream) -> HttpResponse {
        let OpenedStream { first, rest } = opened;

        let head = stream::iter(first.map(Ok::<String, TaxbriefError>));
        let body = head
            .chain(rest)
            .take_while(|item| {
                if let Err(e) = item {
                    error!("Gemini stream aborted after start: {}", e);
                }
                ready(item.is_ok())
            })
            .filter_map(|item| {
                ready(
                    item.ok()
                        .filter(|chunk| !chunk.is_empty())
                        .map(|chunk| Ok::<Bytes, actix_web::Error>(Bytes::from(chunk))),
                )
            });

        HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .insert_header((CACHE_CONTROL, "no-cache"))
            // 跳过 Compress 中间件，保证分块即时下发
            .insert_header(ContentEncoding::Identity)
            .streaming(body)
    }
}

/// Chat 路由配置
pub fn chat_routes() -> actix_web::Resource {
    web::resource("/chat")
        .route(web::post().to(ChatHandler::chat))
        .default_service(web::to(ChatHandler::method_not_allowed))
}
