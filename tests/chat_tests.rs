//! Chat relay tests
//!
//! `/api/chat` end to end against a scripted backend: streaming, method
//! handling, and the error responses before and after the first byte.

mod common;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::json;

use common::{MockBackend, TEST_PROTOCOL, fixture};
use taxbrief::api::ErrorBody;
use taxbrief::api::services::api_routes;
use taxbrief::errors::TaxbriefError;
use taxbrief::llm::{Part, Role};
use taxbrief::services::ChatService;

macro_rules! chat_app {
    ($service:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($service.clone()))
                .service(api_routes()),
        )
        .await
    };
}

fn chat_body() -> serde_json::Value {
    json!({
        "history": [
            { "role": "model", "parts": [{ "text": "System Initialized." }] }
        ],
        "message": [{ "text": "What is the new CIT rate?" }]
    })
}

#[actix_rt::test]
async fn test_chat_streams_chunks_in_order() {
    let fx = fixture(MockBackend::chunks(&["## Brief", "ing\n", "Rate is **30%**."]), true);
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(resp.headers().get(CACHE_CONTROL).unwrap(), "no-cache");

    let body = test::read_body(resp).await;
    assert_eq!(body, "## Briefing\nRate is **30%**.");
}

#[actix_rt::test]
async fn test_chat_skips_empty_chunks() {
    for (chunks, expected) in [(&["a", "", "b"][..], "ab"), (&["", "x", ""][..], "x")] {
        let fx = fixture(MockBackend::chunks(chunks), true);
        let app = chat_app!(fx.service);

        let req = TestRequest::post()
            .uri("/api/chat")
            .set_json(chat_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert_eq!(body, expected, "chunks: {chunks:?}");
    }
}

#[actix_rt::test]
async fn test_chat_forwards_history_and_system_instruction() {
    let fx = fixture(MockBackend::chunks(&["ok"]), true);
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let _ = test::read_body(resp).await;

    let sent = fx.backend.last_request().expect("backend was called");
    assert_eq!(sent.history.len(), 1);
    assert_eq!(sent.history[0].role, Role::Model);
    assert_eq!(sent.message, vec![Part::text("What is the new CIT rate?")]);

    let instruction = sent.system_instruction.unwrap();
    assert!(instruction.starts_with(TEST_PROTOCOL));
    assert!(instruction.contains("Nigeria Tax Act, 2025"));
    assert!(instruction.contains("Section 1. Short title."));
}

#[actix_rt::test]
async fn test_chat_keeps_client_system_instruction() {
    let fx = fixture(MockBackend::chunks(&["ok"]), true);
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({
            "history": null,
            "message": "hello",
            "systemInstruction": "client supplied"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let _ = test::read_body(resp).await;

    let sent = fx.backend.last_request().unwrap();
    assert!(sent.history.is_empty());
    assert_eq!(sent.system_instruction.as_deref(), Some("client supplied"));
}

#[actix_rt::test]
async fn test_chat_rejects_other_methods() {
    let fx = fixture(MockBackend::chunks(&["unused"]), true);
    let app = chat_app!(fx.service);

    for req in [
        TestRequest::get().uri("/api/chat").to_request(),
        TestRequest::put().uri("/api/chat").to_request(),
        TestRequest::delete().uri("/api/chat").to_request(),
    ] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "Method Not Allowed");
    }
    assert!(fx.backend.last_request().is_none());
}

#[actix_rt::test]
async fn test_chat_missing_api_key() {
    let fx = fixture(MockBackend::chunks(&["unused"]), false);
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error, "Server Configuration Error: API Key missing");
    assert!(fx.backend.last_request().is_none());
}

#[actix_rt::test]
async fn test_chat_invalid_json_body() {
    let fx = fixture(MockBackend::chunks(&["unused"]), true);
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert!(body.error.starts_with("Invalid request body"));
}

#[actix_rt::test]
async fn test_chat_empty_message() {
    let fx = fixture(MockBackend::chunks(&["unused"]), true);
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({ "history": [], "message": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(fx.backend.last_request().is_none());
}

#[actix_rt::test]
async fn test_chat_upstream_error_before_stream() {
    let fx = fixture(
        MockBackend::failing_open(TaxbriefError::upstream("API key not valid")),
        true,
    );
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error, "API key not valid");
}

#[actix_rt::test]
async fn test_chat_error_as_first_chunk_is_json() {
    let fx = fixture(
        MockBackend::script(vec![Err(TaxbriefError::upstream("quota exceeded"))]),
        true,
    );
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error, "quota exceeded");
}

#[actix_rt::test]
async fn test_chat_error_mid_stream_truncates_body() {
    let fx = fixture(
        MockBackend::script(vec![
            Ok("Partial ".to_string()),
            Ok("answer".to_string()),
            Err(TaxbriefError::transport("connection reset")),
            Ok("never sent".to_string()),
        ]),
        true,
    );
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, "Partial answer");
}

#[actix_rt::test]
async fn test_chat_empty_upstream_gives_empty_body() {
    let fx = fixture(MockBackend::chunks(&[]), true);
    let app = chat_app!(fx.service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
}

#[actix_rt::test]
async fn test_chat_knowledge_core_missing() {
    let dir = tempfile::TempDir::new().unwrap();
    let backend = std::sync::Arc::new(MockBackend::chunks(&["unused"]));
    let service = std::sync::Arc::new(ChatService::new(
        backend.clone(),
        common::missing_knowledge(dir.path()),
        true,
    ));
    let app = chat_app!(service);

    let req = TestRequest::post()
        .uri("/api/chat")
        .set_json(chat_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert!(body.error.contains("Failed to load Knowledge Core files"));
    assert!(backend.last_request().is_none());
}
