pub mod chat;
pub mod frontend;
pub mod health;
pub mod render;

pub use chat::{ChatHandler, chat_routes};
pub use frontend::{FrontendService, frontend_routes};
pub use health::{AppStartTime, HealthService, health_routes};
pub use render::{RenderHandler, RenderRequest, RenderResponse, render_routes};

use actix_web::web;

/// `/api` 路由：聊天中转与 Markdown 渲染
pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .service(chat_routes())
        .service(render_routes())
}
