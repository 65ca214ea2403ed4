//! docchat API - HTTP chat endpoint
//!
//! Serves `POST /chat`, forwarding each message through a [`docchat_rag::ChatService`]
//! and always answering 200 with an in-band result.
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod handlers;
pub mod state;

use axum::{routing::post, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use handlers::chat::{ChatRequest, ChatResponse};

/// OpenAPI description of the chat endpoint
#[derive(OpenApi)]
#[openapi(
    paths(handlers::chat::chat_handler),
    components(schemas(ChatRequest, ChatResponse)),
    tags((name = "chat", description = "Chat with the document assistant"))
)]
pub struct ApiDoc;

/// Any origin, method and header, with credentials.
///
/// Mirroring the request is required because browsers reject `*` when
/// credentials are allowed.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat::chat_handler))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router backed by a completer that echoes the user's question
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    use docchat_rag::ChatService;

    let service = ChatService::new(Arc::new(testing::EchoCompleter));
    let state = Arc::new(AppState::new(service));
    create_router(state)
}

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use async_trait::async_trait;
    use docchat_core::{Completer, Prompt, Result};

    /// Replies with the text after `Users questions: ` in the last message
    pub struct EchoCompleter;

    #[async_trait]
    impl Completer for EchoCompleter {
        async fn complete(&self, prompt: &Prompt) -> Result<String> {
            let last = prompt
                .messages
                .last()
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            let question = last
                .rsplit_once("Users questions: ")
                .map(|(_, q)| q)
                .unwrap_or(last);
            Ok(format!("Received message: {question}"))
        }

        fn model(&self) -> &str {
            "echo"
        }
    }
}
