//! Closed error taxonomy for the RAG Retriever (§4.1, §7).

use prd_common::{Classified, CorrelationId, ErrorKind};
use thiserror::Error;

/// Errors surfaced by [`crate::RagRetriever`].
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("embedding generation failed for query '{query}' (correlation: {correlation_id})")]
    EmbeddingFailed { query: String, correlation_id: CorrelationId },

    #[error("search timed out after {timeout_ms}ms for query '{query}' (correlation: {correlation_id})")]
    SearchTimeout { query: String, timeout_ms: u64, correlation_id: CorrelationId },

    #[error("embedding provider error: {0}")]
    Embedding(#[from] prd_embeddings::EmbeddingError),

    #[error("vector storage error: {0}")]
    VectorStorage(#[from] prd_vector_data::VectorDataError),

    #[error("store error: {0}")]
    Store(#[from] prd_store::StoreError),
}

impl Classified for SearchError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::EmbeddingFailed { .. } | Self::Embedding(_) => ErrorKind::ProcessingFailed,
            Self::SearchTimeout { .. } => ErrorKind::Timeout,
            Self::VectorStorage(_) => ErrorKind::ProcessingFailed,
            Self::Store(err) => err.kind(),
        }
    }
}

/// Result alias used throughout `prd-search`.
pub type SearchResult<T> = Result<T, SearchError>;
