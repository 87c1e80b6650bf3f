//! Default embedding provider and batching service (§6 Embedding Generator).
//!
//! `DefaultEmbeddingProvider` is deterministic and hash-based: the same text
//! always yields the same vector, with no network or model weights involved,
//! suitable for tests and offline operation. A provider backed by a remote
//! API sits behind the same [`EmbeddingProvider`] trait and can be swapped in
//! without touching callers.

use super::traits::{EmbeddingProvider, EmbeddingService, EmbeddingStats};
use crate::EmbeddingResult;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Dimensionality mandated by §3 `CodeEmbedding.vector[1536]`.
pub const DEFAULT_DIMENSION: usize = 1536;

/// Deterministic hash-based embedding provider.
///
/// Expands a SHA-256 digest of the input into `dimension` floats via a
/// splitmix64-style stream, then L2-normalizes so cosine similarity behaves
/// sensibly for identical and near-identical inputs.
pub struct DefaultEmbeddingProvider {
    model_name: String,
    dimension: usize,
    max_tokens: usize,
}

impl DefaultEmbeddingProvider {
    #[must_use]
    pub fn new(model_name: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            model_name: model_name.into(),
            dimension: DEFAULT_DIMENSION,
            max_tokens,
        }
    }

    #[must_use]
    pub fn text_embedding_3_small() -> Self {
        Self::new("text-embedding-3-small", 8191)
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut digest = Sha256::digest(text.as_bytes());
        let mut state = u64::from_le_bytes(digest[0..8].try_into().unwrap_or_default());
        let mut out = Vec::with_capacity(self.dimension);
        while out.len() < self.dimension {
            for chunk in digest.chunks_exact(8) {
                if out.len() >= self.dimension {
                    break;
                }
                let seed = u64::from_le_bytes(chunk.try_into().unwrap_or_default()) ^ state;
                state = splitmix64(seed);
                // map to [-1, 1]
                #[allow(clippy::cast_precision_loss)]
                let value = (state >> 11) as f64 * (1.0 / (1u64 << 53) as f64);
                #[allow(clippy::cast_possible_truncation)]
                out.push((value * 2.0 - 1.0) as f32);
            }
            state = splitmix64(state);
            digest = Sha256::digest(state.to_le_bytes());
        }
        out.truncate(self.dimension);
        normalize(&mut out);
        out
    }
}

const fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[async_trait]
impl EmbeddingProvider for DefaultEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn ensure_ready(&self) -> EmbeddingResult<()> {
        Ok(())
    }
}

/// Batches calls to an [`EmbeddingProvider`] and tracks running statistics.
pub struct DefaultEmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    stats: Arc<RwLock<EmbeddingStats>>,
    batch_size: usize,
}

impl DefaultEmbeddingService {
    #[must_use]
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        let stats = Arc::new(RwLock::new(EmbeddingStats {
            model_name: provider.model_name().to_string(),
            embedding_dimension: provider.embedding_dimension(),
            ..Default::default()
        }));
        Self {
            provider,
            stats,
            batch_size,
        }
    }
}

#[async_trait]
impl EmbeddingService for DefaultEmbeddingService {
    async fn generate_embeddings(&self, texts: Vec<&str>) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.provider.ensure_ready().await?;

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            let start = Instant::now();
            let embeddings = self.provider.embed_batch(batch).await?;
            all_embeddings.extend(embeddings);

            #[allow(clippy::cast_precision_loss)]
            let elapsed = start.elapsed().as_millis() as f64;
            let mut stats = self.stats.write().await;
            stats.total_embeddings += batch.len();
            stats.total_batches += 1;

            let prev_avg = stats.avg_batch_time_ms;
            #[allow(clippy::cast_precision_loss)]
            let count = stats.total_batches as f64;
            stats.avg_batch_time_ms = (prev_avg * (count - 1.0) + elapsed) / count;
        }

        Ok(all_embeddings)
    }

    fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    async fn get_stats(&self) -> EmbeddingStats {
        self.stats.read().await.clone()
    }
}

/// Deterministic, non-failing-by-default test double for [`EmbeddingProvider`].
pub struct MockEmbeddingProvider {
    dimension: usize,
    fail: bool,
}

impl MockEmbeddingProvider {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
        }
    }

    #[must_use]
    pub const fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if self.fail {
            return Err(crate::EmbeddingError::Other(
                "mock embedding failure".into(),
            ));
        }
        Ok(texts.iter().map(|_| vec![0.1; self.dimension]).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        8192
    }

    fn model_name(&self) -> &str {
        "mock-embedding-model"
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn ensure_ready(&self) -> EmbeddingResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_provider_is_deterministic() {
        let provider = DefaultEmbeddingProvider::text_embedding_3_small();
        let a = provider.embed("hello world").await.unwrap();
        let b = provider.embed("hello world").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn default_provider_differs_for_different_text() {
        let provider = DefaultEmbeddingProvider::text_embedding_3_small();
        let a = provider.embed("hello world").await.unwrap();
        let b = provider.embed("goodbye world").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn embedding_service_batches_and_tracks_stats() {
        let provider = Arc::new(MockEmbeddingProvider::new(768));
        let service = DefaultEmbeddingService::with_provider(provider, 2);

        let texts = vec!["text1", "text2", "text3", "text4", "text5"];
        let embeddings = service.generate_embeddings(texts).await.unwrap();
        assert_eq!(embeddings.len(), 5);
        assert_eq!(embeddings[0].len(), 768);

        let stats = service.get_stats().await;
        assert_eq!(stats.total_embeddings, 5);
        assert_eq!(stats.total_batches, 3);
    }

    #[tokio::test]
    async fn embedding_service_propagates_provider_errors() {
        let provider = Arc::new(MockEmbeddingProvider::new(768).with_failure());
        let service = DefaultEmbeddingService::with_provider(provider, 2);

        let result = service.generate_embeddings(vec!["text1"]).await;
        assert!(result.is_err());
    }
}
