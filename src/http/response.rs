//! Error responses.
//!
//! Middleware and handlers fail with [`ApiError`], which renders as a JSON
//! body `{"error": "..."}` with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Client-facing request errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body was not valid JSON, or its top level was not an object or array.
    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),

    /// Body exceeded the configured limit.
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// A JSON body declared a charset other than UTF-8.
    #[error("Unsupported charset \"{0}\"")]
    UnsupportedCharset(String),

    /// A JSON body arrived in a content coding that is not inflated here.
    #[error("Unsupported content encoding \"{0}\"")]
    UnsupportedEncoding(String),

    /// The body stream failed while being read.
    #[error("Failed to read request body: {0}")]
    BodyRead(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedJson(_) | ApiError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedCharset(_) | ApiError::UnsupportedEncoding(_) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
