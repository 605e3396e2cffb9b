//! HTTP layer: routes, handlers and middleware.

pub mod middleware;
pub mod services;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::errors::TaxbriefError;

/// Error body returned by every JSON endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `{"error": message}` with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    let mut message = message.into();
    if message.is_empty() {
        message = "Internal Server Error".to_string();
    }
    HttpResponse::build(status).json(ErrorBody { error: message })
}

/// Map a service error to its HTTP status and body.
pub fn error_response(err: &TaxbriefError) -> HttpResponse {
    match err {
        TaxbriefError::Configuration(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, err.format_simple())
        }
        TaxbriefError::Validation(_) | TaxbriefError::Serialization(_) => {
            json_error(StatusCode::BAD_REQUEST, err.message())
        }
        TaxbriefError::AttachmentTooLarge(_) => {
            json_error(StatusCode::PAYLOAD_TOO_LARGE, err.message())
        }
        _ => json_error(StatusCode::INTERNAL_SERVER_ERROR, err.message()),
    }
}
