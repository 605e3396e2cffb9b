//! `/api/render` - markdown to HTML

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::markdown::render_markdown_as_html;
use crate::utils::word_count;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub markdown: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub html: String,
    pub word_count: usize,
}

pub struct RenderHandler;

impl RenderHandler {
    pub async fn render(body: web::Json<RenderRequest>) -> HttpResponse {
        let markdown = body.into_inner().markdown;
        trace!("Rendering {} bytes of markdown", markdown.len());

        HttpResponse::Ok().json(RenderResponse {
            html: render_markdown_as_html(&markdown),
            word_count: word_count(&markdown),
        })
    }
}

pub fn render_routes() -> actix_web::Resource {
    web::resource("/render").route(web::post().to(RenderHandler::render))
}
