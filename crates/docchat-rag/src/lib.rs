//! docchat RAG - Retrieval-augmented chat orchestration
//!
//! [`ChatService`] runs one chat turn:
//! 1. Optionally retrieve context snippets for the message
//! 2. Build the system + user prompt
//! 3. Ask the completer for a reply
//!
//! Failures are returned as errors from [`ChatService::answer`] and folded
//! into a [`ChatOutcome`] by [`ChatService::respond`].
//!
//! Author: hephaex@gmail.com

pub mod bootstrap;
pub mod llm;
pub mod prompt;

pub use bootstrap::{build_chat_service, build_retriever};
pub use llm::{create_completer, OllamaCompleter, OpenAiCompleter};
pub use prompt::{build_prompt, render_context, user_content};

use docchat_core::{ChatOutcome, Completer, Result, Retriever};
use std::sync::Arc;
use std::time::Instant;

/// Chat orchestrator
#[derive(Clone)]
pub struct ChatService {
    /// Completion service
    completer: Arc<dyn Completer>,

    /// Context lookup (absent when retrieval is disabled)
    retriever: Option<Arc<dyn Retriever>>,
}

impl ChatService {
    /// Create a service that sends prompts without retrieved context
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            retriever: None,
        }
    }

    /// Enrich prompts with context from `retriever`
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn has_retriever(&self) -> bool {
        self.retriever.is_some()
    }

    pub fn model(&self) -> &str {
        self.completer.model()
    }

    /// Run one chat turn and return the model's reply
    pub async fn answer(&self, message: &str) -> Result<String> {
        let start_time = Instant::now();

        let snippets = match &self.retriever {
            Some(retriever) => {
                let snippets = retriever.retrieve(message).await?;
                tracing::debug!(
                    retriever = retriever.name(),
                    "Retrieved context: {}",
                    render_context(&snippets)
                );
                snippets
            }
            None => Vec::new(),
        };

        let prompt = build_prompt(&snippets, message);
        tracing::info!(
            model = self.completer.model(),
            "Calling LLM with prompt length: {} chars",
            prompt.char_len()
        );

        let answer = self.completer.complete(&prompt).await?;
        tracing::info!(
            "LLM response received: {} chars in {} ms",
            answer.len(),
            start_time.elapsed().as_millis()
        );

        Ok(answer)
    }

    /// Run one chat turn and fold the result into a [`ChatOutcome`]
    pub async fn respond(&self, message: &str) -> ChatOutcome {
        let outcome = ChatOutcome::from(self.answer(message).await);
        if let ChatOutcome::Failure { kind, message } = &outcome {
            tracing::error!(%kind, "Error in chat completion: {}", message);
        }
        outcome
    }
}

// ============================================================================
// Tests
// ============================================================================
