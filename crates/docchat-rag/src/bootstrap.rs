//! Startup wiring from configuration
//!
//! Builds the completer and, when enabled, the document index once before
//! any request is served.

use crate::{create_completer, ChatService};
use docchat_core::{AppConfig, Result};
use docchat_index::{create_embedding_client, IndexRetriever, VectorIndex};
use std::sync::Arc;

/// Build the document retriever described by `config.index`
pub async fn build_retriever(config: &AppConfig) -> Result<IndexRetriever> {
    let embedder: Arc<dyn docchat_index::EmbeddingClient> =
        Arc::from(create_embedding_client(&config.llm, &config.index)?);

    tracing::info!(
        "Building document index from {}",
        config.index.documents_dir.display()
    );
    let index =
        VectorIndex::from_directory(&config.index.documents_dir, embedder.as_ref(), &config.index)
            .await?;

    Ok(IndexRetriever::new(
        Arc::new(index),
        embedder,
        config.index.top_k,
    ))
}

/// Build a ready-to-serve [`ChatService`]
pub async fn build_chat_service(config: &AppConfig) -> Result<ChatService> {
    let completer = Arc::from(create_completer(&config.llm)?);
    let service = ChatService::new(completer);

    if !config.index.enabled {
        tracing::info!("Retrieval disabled; prompts carry no context");
        return Ok(service);
    }

    let retriever = build_retriever(config).await?;
    Ok(service.with_retriever(Arc::new(retriever)))
}
