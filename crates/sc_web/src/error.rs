use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sc_core::Error;
use serde_json::json;

pub const NO_ARTICLES: &str = "No articles found.";

/// An error rendered as `{"error": "..."}` with its status code.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn no_articles() -> Self {
        Self::new(StatusCode::NOT_FOUND, NO_ARTICLES)
    }

    /// Search failures: caller mistakes are 400, everything else is 500.
    pub fn from_search(error: Error) -> Self {
        match error {
            Error::InvalidRequest(message) => Self::new(StatusCode::BAD_REQUEST, message),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }

    /// Detail failures: caller mistakes are 400, upstream trouble is 502.
    pub fn from_detail(error: Error) -> Self {
        match error {
            Error::InvalidRequest(message) => Self::new(StatusCode::BAD_REQUEST, message),
            e @ (Error::SourceUnavailable { .. } | Error::Http(_) | Error::Parse(_)) => {
                Self::new(StatusCode::BAD_GATEWAY, e.to_string())
            }
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
