use actix_web::{HttpRequest, HttpResponse, Result, web};
use rust_embed::Embed;
use tracing::{debug, trace};

use crate::config::get_config;

// 使用 RustEmbed 自动嵌入聊天页面
#[derive(Embed)]
#[folder = "frontend/"]
struct FrontendAssets;

pub struct FrontendService;

impl FrontendService {
    /// 聊天页面首页
    pub async fn handle_index(_req: HttpRequest) -> Result<HttpResponse> {
        trace!("Serving chat page");

        match FrontendAssets::get("index.html") {
            Some(content) => {
                let html = String::from_utf8_lossy(&content.data);
                let processed_html = Self::fill_placeholders(&html);

                Ok(HttpResponse::Ok()
                    .content_type("text/html; charset=utf-8")
                    .body(processed_html))
            }
            None => {
                debug!("index.html missing from embedded assets");
                Ok(HttpResponse::NotFound().body("File not found"))
            }
        }
    }

    /// 处理静态资源文件
    pub async fn handle_static(req: HttpRequest) -> Result<HttpResponse> {
        let path = req.match_info().query("path");
        trace!("Serving static file: {}", path);

        let asset_path = format!("assets/{}", path);

        match FrontendAssets::get(&asset_path) {
            Some(content) => Ok(HttpResponse::Ok()
                .content_type(Self::get_content_type(path))
                .body(content.data.into_owned())),
            None => {
                debug!("Static file not found: {}", path);
                Ok(HttpResponse::NotFound().body("File not found"))
            }
        }
    }

    /// 处理 favicon.ico 请求，没有图标时返回空内容
    pub async fn handle_favicon(_req: HttpRequest) -> Result<HttpResponse> {
        match FrontendAssets::get("favicon.ico") {
            Some(favicon_data) => Ok(HttpResponse::Ok()
                .content_type("image/x-icon")
                .body(favicon_data.data.into_owned())),
            None => Ok(HttpResponse::Ok().content_type("image/x-icon").body(vec![])),
        }
    }

    fn fill_placeholders(html: &str) -> String {
        let config = get_config();
        html.replace("%TAXBRIEF_VERSION%", env!("CARGO_PKG_VERSION"))
            .replace("%MODEL_NAME%", &config.llm.model)
    }

    /// 根据文件扩展名确定 Content-Type
    fn get_content_type(path: &str) -> &'static str {
        match path.split('.').next_back() {
            Some("css") => "text/css",
            Some("js") => "application/javascript",
            Some("json") => "application/json",
            Some("png") => "image/png",
            Some("svg") => "image/svg+xml",
            Some("ico") => "image/x-icon",
            Some("woff2") => "font/woff2",
            _ => "application/octet-stream",
        }
    }
}

/// 前端路由配置
pub fn frontend_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(FrontendService::handle_index))
        .route("/favicon.ico", web::get().to(FrontendService::handle_favicon))
        .route(
            "/assets/{path:.*}",
            web::get().to(FrontendService::handle_static),
        );
}
