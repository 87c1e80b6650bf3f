//! Default [`RagRetriever`] implementation (§4.3).

use async_trait::async_trait;
use prd_common::CorrelationId;
use prd_embeddings::EmbeddingService;
use prd_vector_data::VectorStorage;
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use uuid::Uuid;

use super::service::RagRetriever;
use crate::error::SearchError;

/// Result type for retrieval operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// The closed technical-keyword vocabulary used to augment the retrieval
/// query built from a PRD's title and description (§4.3 step 1).
const TECHNICAL_KEYWORDS: &[&str] = &[
    "api",
    "authentication",
    "database",
    "cache",
    "queue",
    "service",
    "repository",
    "controller",
    "model",
    "view",
    "async",
    "sync",
    "real-time",
    "webhook",
    "rest",
    "graphql",
    "storage",
    "persistence",
    "validation",
    "security",
    "encryption",
    "performance",
    "optimization",
    "scalability",
    "architecture",
];

const MAX_QUERY_TOKENS: usize = 50;

/// A chunk surfaced by [`RagRetriever::search`] (§4.3 step 4).
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub file_path: String,
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub chunk_type: String,
    pub language: String,
    pub first_symbol: Option<String>,
    pub similarity: f32,
}

/// The full response of a retrieval call, including the mean similarity as a
/// context-quality signal.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub chunks: Vec<RetrievedChunk>,
    pub mean_similarity: f32,
}

/// Build the focused retrieval query: title, augmented with any technical
/// keywords found in the title or description, truncated to 50 whitespace
/// tokens (§4.3 step 1).
#[must_use]
pub fn build_query(title: &str, description: &str) -> String {
    let haystack = format!("{title} {description}").to_lowercase();
    let matched: Vec<&str> = TECHNICAL_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| haystack.contains(kw))
        .collect();
    let mut tokens: Vec<&str> = title.split_whitespace().chain(matched).collect();
    tokens.truncate(MAX_QUERY_TOKENS);
    tokens.join(" ")
}

/// Default retriever: embed the query, search the vector store, filter by
/// similarity threshold, order by descending similarity with `(filePath,
/// startLine)` tie-breaks. Retries transient failures with exponential
/// backoff and caches recent results per `(project, query, limit)`.
pub struct Search {
    embedding_service: Arc<dyn EmbeddingService>,
    vector_storage: Arc<dyn VectorStorage>,
    max_retries: usize,
    retry_delay: Duration,
    search_timeout: Duration,
    cache: Arc<std::sync::Mutex<lru::LruCache<String, RetrievalResult>>>,
}

impl Search {
    #[must_use]
    pub fn new(embedding_service: Arc<dyn EmbeddingService>, vector_storage: Arc<dyn VectorStorage>) -> Self {
        Self::with_retry_config(
            embedding_service,
            vector_storage,
            3,
            Duration::from_millis(100),
            Duration::from_secs(30),
        )
    }

    #[must_use]
    pub fn with_retry_config(
        embedding_service: Arc<dyn EmbeddingService>,
        vector_storage: Arc<dyn VectorStorage>,
        max_retries: usize,
        retry_delay: Duration,
        search_timeout: Duration,
    ) -> Self {
        Self {
            embedding_service,
            vector_storage,
            max_retries,
            retry_delay,
            search_timeout,
            cache: Arc::new(std::sync::Mutex::new(lru::LruCache::new(
                std::num::NonZeroUsize::new(100).unwrap_or(std::num::NonZeroUsize::MIN),
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(project_id = %project_id, correlation_id))]
    async fn try_search(
        &self,
        project_id: Uuid,
        query: &str,
        max_chunks: usize,
        similarity_threshold: f32,
        correlation_id: &CorrelationId,
    ) -> SearchResult<RetrievalResult> {
        tracing::Span::current().record("correlation_id", correlation_id.to_string());

        tokio::time::timeout(self.search_timeout, async {
            let embeddings = self.embedding_service.generate_embeddings(vec![query]).await?;
            let query_embedding = embeddings.into_iter().next().ok_or_else(|| {
                SearchError::EmbeddingFailed {
                    query: query.to_string(),
                    correlation_id: correlation_id.clone(),
                }
            })?;

            let mut matches = self
                .vector_storage
                .search(project_id, query_embedding, max_chunks, similarity_threshold, correlation_id)
                .await?;

            matches.sort_by(|a, b| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.file_path.cmp(&b.file_path))
                    .then_with(|| a.start_line.cmp(&b.start_line))
            });

            let mean_similarity = if matches.is_empty() {
                0.0
            } else {
                #[allow(clippy::cast_precision_loss)]
                let count = matches.len() as f32;
                matches.iter().map(|m| m.similarity).sum::<f32>() / count
            };

            let chunks = matches
                .into_iter()
                .map(|m| RetrievedChunk {
                    file_path: m.file_path,
                    content: m.content,
                    start_line: m.start_line,
                    end_line: m.end_line,
                    chunk_type: m.chunk_type,
                    language: m.language,
                    first_symbol: m.first_symbol,
                    similarity: m.similarity,
                })
                .collect();

            Ok(RetrievalResult { chunks, mean_similarity })
        })
        .await
        .map_err(|_| SearchError::SearchTimeout {
            query: query.to_string(),
            timeout_ms: u64::try_from(self.search_timeout.as_millis()).unwrap_or(u64::MAX),
            correlation_id: correlation_id.clone(),
        })?
    }
}

#[async_trait]
impl RagRetriever for Search {
    #[tracing::instrument(skip(self), fields(project_id = %project_id, correlation_id, cached = false))]
    async fn search(
        &self,
        project_id: Uuid,
        prd_title: &str,
        prd_description: &str,
        max_chunks: usize,
        similarity_threshold: f32,
        correlation_id: &CorrelationId,
    ) -> SearchResult<RetrievalResult> {
        tracing::Span::current().record("correlation_id", correlation_id.to_string());
        let query = build_query(prd_title, prd_description);
        let cache_key = format!("{project_id}:{query}:{max_chunks}");

        if let Ok(mut cache) = self.cache.lock()
            && let Some(cached) = cache.get(&cache_key)
        {
            tracing::Span::current().record("cached", true);
            return Ok(cached.clone());
        }

        for attempt in 0..=self.max_retries {
            match self.try_search(project_id, &query, max_chunks, similarity_threshold, correlation_id).await {
                Ok(result) => {
                    if let Ok(mut cache) = self.cache.lock() {
                        cache.put(cache_key, result.clone());
                    }
                    return Ok(result);
                }
                Err(err) if attempt < self.max_retries => {
                    let delay = self.retry_delay * 2_u32.pow(u32::try_from(attempt).unwrap_or(0));
                    tracing::warn!(attempt, ?delay, error = %err, "retrieval attempt failed, retrying");
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
        unreachable!("loop always returns on the final attempt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_augments_title_with_matched_keywords() {
        let query = build_query("Realtime cache service", "Needs a queue and rest API");
        assert!(query.contains("cache"));
        assert!(query.contains("service"));
        assert!(query.contains("rest"));
        assert!(query.contains("queue"));
        assert!(query.contains("api"));
    }

    #[test]
    fn query_truncates_to_fifty_tokens() {
        let title = (0..100).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let query = build_query(&title, "");
        assert!(query.split_whitespace().count() <= MAX_QUERY_TOKENS);
    }
}
