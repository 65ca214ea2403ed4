//! Chat handler
//!
//! Author: hephaex@gmail.com

use crate::error::parse_chat_request;
use crate::state::AppState;
use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State};
use docchat_core::ChatOutcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Chat request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// User's message
    #[schema(example = "What is the refund policy?")]
    pub message: String,
}

/// Chat response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    /// Model reply, or `Error: <message>` on failure
    #[schema(example = "Refunds are processed within 5 days.")]
    pub response: String,

    /// Present and true only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

/// Handle a chat message
///
/// The body is read raw so that unreadable or malformed input still gets
/// the in-band error payload instead of an extractor rejection.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply or in-band error", body = ChatResponse)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> ChatResponse {
    let request_no = state.increment_requests();
    tracing::debug!(request_no, "Chat request received");

    let outcome = match parse_chat_request(body) {
        Ok(req) => state.chat.respond(&req.message).await,
        Err(err) => {
            tracing::error!(kind = %err.kind(), "Error in chat request: {}", err);
            ChatOutcome::from_error(&err)
        }
    };

    ChatResponse::from(outcome)
}
