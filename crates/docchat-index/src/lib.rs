//! docchat Index - Startup-time document index
//!
//! Loads a directory of documents once, chunks and embeds them, and keeps
//! the result in an immutable in-memory vector index. [`IndexRetriever`]
//! exposes the index through the core `Retriever` capability.
//!
//! Author: hephaex@gmail.com

pub mod chunk;
pub mod embedding;
pub mod loader;

pub use chunk::{chunk_document, chunk_text, ChunkConfig, TextChunk};
pub use embedding::{create_embedding_client, EmbeddingClient, OllamaEmbedding, OpenAiEmbedding};
pub use loader::{load_directory, load_file, Document, FileType, LoadError};

use async_trait::async_trait;
use docchat_core::{DocchatError, IndexConfig, Result, Retriever, Snippet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

impl From<LoadError> for DocchatError {
    fn from(err: LoadError) -> Self {
        DocchatError::LoadError(err.to_string())
    }
}

/// A chunk with its embedding
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub source: PathBuf,
    pub chunk_index: u32,
    pub content: String,
    pub vector: Vec<f32>,
}

/// Read-only in-memory vector index
#[derive(Debug, Default)]
pub struct VectorIndex {
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Build an index from loaded documents
    pub async fn build(
        documents: &[Document],
        embedder: &dyn EmbeddingClient,
        chunk_config: &ChunkConfig,
        batch_size: usize,
    ) -> Result<Self> {
        let mut pending: Vec<(PathBuf, TextChunk)> = Vec::new();
        for doc in documents {
            for chunk in chunk_document(doc, chunk_config) {
                pending.push((doc.path.clone(), chunk));
            }
        }

        tracing::info!(
            "Embedding {} chunks from {} documents",
            pending.len(),
            documents.len()
        );

        let mut chunks = Vec::with_capacity(pending.len());
        for batch in pending.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|(_, c)| c.content.clone()).collect();
            let vectors = embedder.embed_batch(&texts).await?;

            if vectors.len() != batch.len() {
                return Err(DocchatError::EmbeddingError(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for ((source, chunk), vector) in batch.iter().zip(vectors) {
                chunks.push(IndexedChunk {
                    source: source.clone(),
                    chunk_index: chunk.index,
                    content: chunk.content.clone(),
                    vector,
                });
            }
        }

        Ok(Self { chunks })
    }

    /// Load, chunk and embed a documents directory
    pub async fn from_directory(
        dir: &Path,
        embedder: &dyn EmbeddingClient,
        config: &IndexConfig,
    ) -> Result<Self> {
        let documents = load_directory(dir)?;
        let chunk_config = ChunkConfig::new(config.chunk_size, config.chunk_overlap);
        let index = Self::build(&documents, embedder, &chunk_config, config.embed_batch_size).await?;
        tracing::info!("Index ready with {} chunks", index.len());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    /// Rank chunks by cosine similarity to `query`, best first.
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], limit: usize) -> Vec<Snippet> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|c| (cosine_similarity(query, &c.vector), c))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(limit)
            .map(|(score, c)| Snippet::new(c.content.clone(), c.source.clone(), score))
            .collect()
    }
}

/// Cosine similarity; zero when either vector has zero norm or lengths differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Retriever backed by a [`VectorIndex`]
pub struct IndexRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingClient>,
    top_k: usize,
}

impl IndexRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingClient>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Snippet>> {
        let vector = self.embedder.embed(query).await?;
        let snippets = self.index.search(&vector, self.top_k);
        tracing::debug!("Retrieved {} snippets", snippets.len());
        Ok(snippets)
    }

    fn name(&self) -> &str {
        "vector-index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bag-of-letters embedder: one dimension per ASCII letter
    struct LetterEmbedding;

    #[async_trait]
    impl EmbeddingClient for LetterEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0; 26];
            for c in text.to_lowercase().chars() {
                if c.is_ascii_lowercase() {
                    v[(c as u8 - b'a') as usize] += 1.0;
                }
            }
            Ok(v)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }
    }

    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingClient for FailingEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(DocchatError::EmbeddingError("connection refused".into()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(DocchatError::EmbeddingError("connection refused".into()))
        }
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::new("refunds.txt", FileType::PlainText, "refund refund refund"),
            Document::new("shipping.txt", FileType::PlainText, "zzz shipping xyz"),
            Document::new("empty.txt", FileType::PlainText, "   "),
        ]
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_build_skips_blank_documents() {
        let index = VectorIndex::build(&docs(), &LetterEmbedding, &ChunkConfig::default(), 1)
            .await
            .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.chunks()[0].source, PathBuf::from("refunds.txt"));
    }

    #[tokio::test]
    async fn test_retriever_ranks_by_similarity() {
        let index = VectorIndex::build(&docs(), &LetterEmbedding, &ChunkConfig::default(), 8)
            .await
            .unwrap();
        let retriever = IndexRetriever::new(Arc::new(index), Arc::new(LetterEmbedding), 1);

        let snippets = retriever.retrieve("What is the refund policy?").await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].source, PathBuf::from("refunds.txt"));
        assert!(snippets[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_search_respects_limit_and_order() {
        let index = VectorIndex::build(&docs(), &LetterEmbedding, &ChunkConfig::default(), 8)
            .await
            .unwrap();
        let query = LetterEmbedding.embed("shipping").await.unwrap();

        let results = index.search(&query, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, PathBuf::from("shipping.txt"));
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_search_ties_keep_insertion_order() {
        let docs = vec![
            Document::new("zeta.txt", FileType::PlainText, "refund policy"),
            Document::new("alpha.txt", FileType::PlainText, "refund policy"),
            Document::new("other.txt", FileType::PlainText, "shipping"),
        ];
        let index = VectorIndex::build(&docs, &LetterEmbedding, &ChunkConfig::default(), 8)
            .await
            .unwrap();
        let query = LetterEmbedding.embed("refund policy").await.unwrap();

        let results = index.search(&query, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, results[1].score);
        assert_eq!(results[0].source, PathBuf::from("zeta.txt"));
        assert_eq!(results[1].source, PathBuf::from("alpha.txt"));
    }

    #[tokio::test]
    async fn test_embedding_failure_surfaces() {
        let err = VectorIndex::build(&docs(), &FailingEmbedding, &ChunkConfig::default(), 8)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), docchat_core::FailureKind::Retrieval);

        let retriever = IndexRetriever::new(
            Arc::new(VectorIndex::default()),
            Arc::new(FailingEmbedding),
            2,
        );
        assert!(retriever.retrieve("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("faq.html"), "<p>Refunds take five days.</p>").unwrap();

        let index = VectorIndex::from_directory(dir.path(), &LetterEmbedding, &IndexConfig::default())
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.chunks()[0].content, "Refunds take five days.");
    }
}
