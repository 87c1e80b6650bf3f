//! RAG retrieval contract (§4.3).

use async_trait::async_trait;
use prd_common::CorrelationId;
use uuid::Uuid;

use super::search::{RetrievalResult, SearchResult};

/// Retrieves code chunks relevant to a PRD request from an indexed codebase.
#[async_trait]
pub trait RagRetriever: Send + Sync {
    /// Embed `(prdTitle, prdDescription)` and return up to `max_chunks` chunks
    /// from `project_id` whose similarity exceeds `similarity_threshold`.
    async fn search(
        &self,
        project_id: Uuid,
        prd_title: &str,
        prd_description: &str,
        max_chunks: usize,
        similarity_threshold: f32,
        correlation_id: &CorrelationId,
    ) -> SearchResult<RetrievalResult>;
}
