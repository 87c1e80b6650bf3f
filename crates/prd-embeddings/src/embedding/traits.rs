//! Trait abstractions for embedding generation (§6 Embedding Generator).
//!
//! Abstracts `embed`/`embed_batch` so the codebase indexer (§4.2) and the
//! RAG retriever (§4.3) can share one embedding model without caring whether
//! it is the deterministic default provider or a remote API-backed one.

use crate::EmbeddingResult;
use async_trait::async_trait;

/// A collaborator that turns text into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of texts, one vector per input.
    ///
    /// # Errors
    /// Returns an error if the underlying provider fails to embed any input.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    ///
    /// # Errors
    /// Returns an error if the underlying provider fails to embed the input.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let mut batch = self.embed_batch(&[text]).await?;
        Ok(batch.pop().unwrap_or_default())
    }

    /// Dimensionality of embeddings produced by this provider (1536 per §3 `CodeEmbedding.vector`).
    fn embedding_dimension(&self) -> usize;

    /// Maximum number of tokens this provider can embed in one call.
    fn max_tokens(&self) -> usize;

    /// Name of the underlying model, stored on `CodeEmbedding.model`.
    fn model_name(&self) -> &str;

    /// Whether the provider is ready to accept requests.
    async fn is_ready(&self) -> bool;

    /// Ensure the provider is ready (load weights, warm a connection, etc).
    ///
    /// # Errors
    /// Returns an error if readiness cannot be established.
    async fn ensure_ready(&self) -> EmbeddingResult<()>;
}

/// Coordinates embedding generation across batches and tracks statistics.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generate embeddings for a set of texts, batching internally.
    ///
    /// # Errors
    /// Returns an error if the underlying provider fails.
    async fn generate_embeddings(&self, texts: Vec<&str>) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// The embedding provider backing this service.
    fn provider(&self) -> &dyn EmbeddingProvider;

    /// Snapshot of accumulated statistics.
    async fn get_stats(&self) -> EmbeddingStats;
}

/// Accumulated statistics about embedding generation.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStats {
    pub total_embeddings: usize,
    pub total_batches: usize,
    pub avg_batch_time_ms: f64,
    pub model_name: String,
    pub embedding_dimension: usize,
}
