//! API error handling
//!
//! Every failure is reported in-band: the HTTP status stays 200 and the body
//! carries `error: true` with the raw error text. This mirrors the behavior
//! existing chat widgets depend on. Note the raw text can expose upstream
//! details (URLs, provider messages) to callers.
//!
//! Author: hephaex@gmail.com

use crate::handlers::chat::{ChatRequest, ChatResponse};
use axum::{
    body::Bytes,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docchat_core::{ChatOutcome, DocchatError};

/// Decode a `/chat` body, turning every problem into an invalid-request error
pub fn parse_chat_request(
    body: Result<Bytes, BytesRejection>,
) -> Result<ChatRequest, DocchatError> {
    let bytes = body.map_err(|rejection| DocchatError::InvalidRequest(rejection.body_text()))?;
    serde_json::from_slice(&bytes).map_err(|e| DocchatError::InvalidRequest(e.to_string()))
}

impl ChatResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
            error: None,
        }
    }

    pub fn failure(message: impl std::fmt::Display) -> Self {
        Self {
            response: format!("Error: {message}"),
            error: Some(true),
        }
    }
}

impl From<ChatOutcome> for ChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        match outcome {
            ChatOutcome::Success(text) => ChatResponse::success(text),
            ChatOutcome::Failure { message, .. } => ChatResponse::failure(message),
        }
    }
}

impl IntoResponse for ChatResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
