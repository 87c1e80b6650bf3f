//! Test double for [`RagRetriever`].

use async_trait::async_trait;
use prd_common::CorrelationId;
use uuid::Uuid;

use super::search::{RetrievalResult, RetrievedChunk, SearchResult};
use super::service::RagRetriever;

/// A retriever that returns a fixed, pre-built result regardless of input.
pub struct MockSearch {
    result: RetrievalResult,
}

impl MockSearch {
    /// A mock that returns the given chunks, with `mean_similarity` derived from them.
    #[must_use]
    pub fn with_chunks(chunks: Vec<RetrievedChunk>) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let mean_similarity = if chunks.is_empty() {
            0.0
        } else {
            chunks.iter().map(|c| c.similarity).sum::<f32>() / chunks.len() as f32
        };
        Self { result: RetrievalResult { chunks, mean_similarity } }
    }

    /// A mock that returns an empty retrieval result.
    #[must_use]
    pub fn empty() -> Self {
        Self { result: RetrievalResult::default() }
    }
}

#[async_trait]
impl RagRetriever for MockSearch {
    async fn search(
        &self,
        _project_id: Uuid,
        _prd_title: &str,
        _prd_description: &str,
        max_chunks: usize,
        _similarity_threshold: f32,
        _correlation_id: &CorrelationId,
    ) -> SearchResult<RetrievalResult> {
        let chunks = self.result.chunks.iter().take(max_chunks).cloned().collect();
        Ok(RetrievalResult { chunks, mean_similarity: self.result.mean_similarity })
    }
}
