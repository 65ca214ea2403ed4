//! API Integration Tests
//!
//! Drive the router in-process with stub completers and retrievers.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use docchat_api::{create_router, create_router_for_testing, state::AppState, ApiDoc};
use docchat_core::{Completer, DocchatError, Prompt, Result, Retriever, Snippet};
use docchat_rag::ChatService;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use utoipa::OpenApi;

// =============================================================================
// Helpers
// =============================================================================

/// Completer returning a fixed reply and recording prompts
struct FixedCompleter {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<Prompt>>,
}

impl FixedCompleter {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for FixedCompleter {
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.reply.clone().map_err(DocchatError::LlmError)
    }

    fn model(&self) -> &str {
        "gpt-4"
    }
}

struct FixedRetriever(std::result::Result<Vec<Snippet>, String>);

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Snippet>> {
        self.0.clone().map_err(DocchatError::RetrievalError)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn router_with(service: ChatService) -> Router {
    create_router(Arc::new(AppState::new(service)))
}

fn chat_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

// =============================================================================
// Success Path
// =============================================================================

#[tokio::test]
async fn test_chat_success() {
    let completer = FixedCompleter::replying("Refunds are processed within 5 days.");
    let app = router_with(ChatService::new(completer.clone()));

    let (status, json) = send(
        app,
        chat_request(json!({"message": "What is the refund policy?"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"response": "Refunds are processed within 5 days."})
    );
    assert!(json.get("error").is_none());
    assert_eq!(completer.prompts().len(), 1);
}

#[tokio::test]
async fn test_chat_with_retrieved_context() {
    let completer = FixedCompleter::replying("5 days.");
    let retriever = Arc::new(FixedRetriever(Ok(vec![Snippet::new(
        "Refunds are processed within 5 days.",
        "static_pages/faq.html",
        0.87,
    )])));
    let app = router_with(ChatService::new(completer.clone()).with_retriever(retriever));

    let (status, json) = send(
        app,
        chat_request(json!({"message": "How long do refunds take?"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "5 days.");

    let prompts = completer.prompts();
    let user = &prompts[0].messages[1].content;
    assert!(user.starts_with("Context: [1] (source: static_pages/faq.html"));
    assert!(user.contains("Refunds are processed within 5 days."));
    assert!(user.ends_with("\n\nUsers questions: How long do refunds take?"));
}

#[tokio::test]
async fn test_chat_without_content_type() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .body(Body::from(r#"{"message": "hello"}"#))
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "Received message: hello");
}

// =============================================================================
// In-band Errors
// =============================================================================

#[tokio::test]
async fn test_chat_missing_message() {
    let completer = FixedCompleter::replying("unused");
    let app = router_with(ChatService::new(completer.clone()));

    let (status, json) = send(app, chat_request("{}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"], true);
    let text = json["response"].as_str().unwrap();
    assert!(text.starts_with("Error:"));
    assert!(text.contains("message"));
    assert!(completer.prompts().is_empty());
}

#[tokio::test]
async fn test_chat_malformed_json() {
    let app = create_router_for_testing();

    for body in ["{not json", "", "[1, 2]", r#"{"message": 42}"#] {
        let (status, json) = send(app.clone(), chat_request(body)).await;
        assert_eq!(status, StatusCode::OK, "body {body:?}");
        assert_eq!(json["error"], true, "body {body:?}");
        assert!(json["response"].as_str().unwrap().starts_with("Error:"));
    }
}

#[tokio::test]
async fn test_chat_completion_timeout() {
    let app = router_with(ChatService::new(FixedCompleter::failing(
        "Request failed: operation timed out",
    )));

    let (status, json) = send(app, chat_request(r#"{"message": "hi"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "response": "Error: LLM error: Request failed: operation timed out",
            "error": true
        })
    );
}

#[tokio::test]
async fn test_chat_retrieval_failure() {
    let completer = FixedCompleter::replying("unused");
    let retriever = Arc::new(FixedRetriever(Err("embedding service unreachable".into())));
    let app = router_with(ChatService::new(completer.clone()).with_retriever(retriever));

    let (status, json) = send(app, chat_request(r#"{"message": "hi"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"], true);
    assert_eq!(
        json["response"],
        "Error: Retrieval error: embedding service unreachable"
    );
    assert!(completer.prompts().is_empty());
}

// =============================================================================
// Routing and CORS
// =============================================================================

#[tokio::test]
async fn test_unknown_route() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_allows_credentials() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/chat")
                .header(header::ORIGIN, "http://localhost:5500")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(
                    header::ACCESS_CONTROL_REQUEST_HEADERS,
                    "content-type,authorization",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5500"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "content-type,authorization"
    );
}

#[tokio::test]
async fn test_cors_on_simple_request() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::ORIGIN, "https://techcorp.example")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"message": "hi"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://techcorp.example"
    );
}

// =============================================================================
// OpenAPI
// =============================================================================

#[test]
fn test_openapi_describes_chat() {
    let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
    assert!(doc["paths"]["/chat"]["post"].is_object());
    assert!(doc["components"]["schemas"]["ChatRequest"].is_object());
    assert!(doc["components"]["schemas"]["ChatResponse"].is_object());
}
