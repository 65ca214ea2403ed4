//! docchat Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout docchat:
//! - Chat messages, prompts and the fixed system instruction
//! - Retrieved context snippets
//! - Common error types and the tagged chat outcome
//! - Capability traits for completion and retrieval services
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;

pub use config::{
    AppConfig, ConfigError, IndexConfig, LlmConfig, LlmProvider, LoggingConfig, ServerConfig,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fixed instruction prepended to every completion request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that can answer questions and help with tasks. You are only allowed to answer questions using the context provided to you. In case you are not sure about the answer just reply back by saying 'I don't know";

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for docchat operations
#[derive(Error, Debug)]
pub enum DocchatError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Document load error: {0}")]
    LoadError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DocchatError {
    /// Classify the error for logging and the chat outcome
    pub fn kind(&self) -> FailureKind {
        match self {
            DocchatError::InvalidRequest(_) => FailureKind::InvalidRequest,
            DocchatError::RetrievalError(_) | DocchatError::EmbeddingError(_) => {
                FailureKind::Retrieval
            }
            DocchatError::LlmError(_) => FailureKind::Completion,
            DocchatError::LoadError(_) | DocchatError::ConfigError(_) => FailureKind::Internal,
        }
    }
}

impl From<ConfigError> for DocchatError {
    fn from(err: ConfigError) -> Self {
        DocchatError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocchatError>;

// ============================================================================
// Chat Outcome
// ============================================================================

/// Failure classification at the handler boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Body unreadable, not JSON, or `message` missing
    InvalidRequest,
    /// The context lookup failed
    Retrieval,
    /// The completion service failed or replied with an unexpected shape
    Completion,
    /// Anything else
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::Retrieval => write!(f, "retrieval"),
            Self::Completion => write!(f, "completion"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Result of handling one chat request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Success(String),
    Failure { kind: FailureKind, message: String },
}

impl ChatOutcome {
    /// Build a failure outcome from an error, keeping its raw message
    pub fn from_error(err: &DocchatError) -> Self {
        ChatOutcome::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<Result<String>> for ChatOutcome {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(text) => ChatOutcome::Success(text),
            Err(err) => ChatOutcome::from_error(&err),
        }
    }
}

// ============================================================================
// Prompt Types
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message sent to a completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// An ordered conversation handed to a [`Completer`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    pub messages: Vec<ChatMessage>,
}

impl Prompt {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    /// Total content length in characters
    pub fn char_len(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }
}

// ============================================================================
// Retrieval Types
// ============================================================================

/// A snippet of indexed text returned for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Chunk text
    pub text: String,

    /// Originating document
    pub source: PathBuf,

    /// Similarity score (higher is more relevant)
    pub score: f32,
}

impl Snippet {
    pub fn new(text: impl Into<String>, source: impl Into<PathBuf>, score: f32) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            score,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Capability to turn a prompt into generated text
#[async_trait::async_trait]
pub trait Completer: Send + Sync {
    /// Generate a reply for the prompt
    async fn complete(&self, prompt: &Prompt) -> Result<String>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// Capability to look up context for a query
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Return snippets ordered from most to least relevant
    async fn retrieve(&self, query: &str) -> Result<Vec<Snippet>>;

    /// Get retriever name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            DocchatError::InvalidRequest("x".into()).kind(),
            FailureKind::InvalidRequest
        );
        assert_eq!(
            DocchatError::EmbeddingError("x".into()).kind(),
            FailureKind::Retrieval
        );
        assert_eq!(
            DocchatError::LlmError("x".into()).kind(),
            FailureKind::Completion
        );
        assert_eq!(
            DocchatError::ConfigError("x".into()).kind(),
            FailureKind::Internal
        );
    }

    #[test]
    fn test_invalid_request_message_is_raw() {
        let err = DocchatError::InvalidRequest("missing field `message`".into());
        assert_eq!(err.to_string(), "missing field `message`");
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Result<String> = Ok("hello".to_string());
        assert_eq!(ChatOutcome::from(ok), ChatOutcome::Success("hello".into()));

        let err: Result<String> = Err(DocchatError::LlmError("operation timed out".into()));
        match ChatOutcome::from(err) {
            ChatOutcome::Failure { kind, message } => {
                assert_eq!(kind, FailureKind::Completion);
                assert_eq!(message, "LLM error: operation timed out");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_role_serialization() {
        let msg = ChatMessage::system("be brief");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be brief");
    }

    #[test]
    fn test_prompt_char_len() {
        let prompt = Prompt::new(vec![ChatMessage::system("ab"), ChatMessage::user("čd")]);
        assert_eq!(prompt.char_len(), 4);
    }

    #[test]
    fn test_system_prompt_refusal_policy() {
        assert!(SYSTEM_PROMPT.contains("using the context provided"));
        assert!(SYSTEM_PROMPT.ends_with("'I don't know"));
    }
}
