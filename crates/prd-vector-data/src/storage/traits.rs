//! `VectorStorage` port (§6 `Document Store`'s `similarChunks`): a
//! project-scoped nearest-neighbor index over `CodeEmbedding` vectors.

use crate::VectorDataResult;
use async_trait::async_trait;
use prd_common::CorrelationId;
use uuid::Uuid;

/// One point stored in the vector index: a chunk's embedding plus the
/// denormalized fields needed to render a [`SimilarChunk`] without a
/// round-trip to the store (§3 `CodeChunk`/`CodeEmbedding`).
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub chunk_id: Uuid,
    pub project_id: Uuid,
    pub file_path: String,
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub chunk_type: String,
    pub language: String,
    pub first_symbol: Option<String>,
    pub embedding: Vec<f32>,
}

/// A chunk returned by [`VectorStorage::search`], ordered by descending
/// similarity per §4.3.
#[derive(Debug, Clone)]
pub struct SimilarChunk {
    pub chunk_id: Uuid,
    pub file_path: String,
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub chunk_type: String,
    pub language: String,
    pub first_symbol: Option<String>,
    pub similarity: f32,
}

/// Statistics about the vector storage.
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub vector_count: usize,
    pub storage_bytes: Option<u64>,
    pub collection_name: String,
    pub storage_type: String,
}

/// Vector database backend abstraction, so Qdrant can be swapped for Pinecone,
/// Weaviate, or an in-memory double without touching callers.
#[async_trait]
pub trait VectorStorage: Send + Sync {
    /// Upsert a batch of chunk embeddings. Returns the chunk IDs stored.
    ///
    /// # Errors
    /// Returns an error if the storage backend is unreachable or rejects the batch.
    async fn upsert(
        &self,
        points: &[ChunkPoint],
        correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<Uuid>>;

    /// `similarChunks(projectId, queryVec, limit, threshold)` per §4.3: returns
    /// up to `limit` chunks scoped to `project_id`, ordered by descending
    /// cosine similarity, keeping only rows with `similarity > threshold`.
    ///
    /// # Errors
    /// Returns an error if the storage backend is unreachable or the query
    /// vector's dimensionality does not match the collection.
    async fn search(
        &self,
        project_id: Uuid,
        query_embedding: Vec<f32>,
        limit: usize,
        threshold: f32,
        correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<SimilarChunk>>;

    /// Delete chunks by ID. Used for atomic replacement on file re-index.
    ///
    /// # Errors
    /// Returns an error if the storage backend is unreachable.
    async fn delete_chunks(&self, chunk_ids: &[Uuid]) -> VectorDataResult<()>;

    /// Delete every chunk belonging to a project (cascades when a project is removed).
    ///
    /// # Errors
    /// Returns an error if the storage backend is unreachable.
    async fn delete_project(&self, project_id: Uuid) -> VectorDataResult<()>;

    /// Whether the backing collection exists.
    ///
    /// # Errors
    /// Returns an error if the check itself fails.
    async fn collection_exists(&self) -> VectorDataResult<bool>;

    /// Create the backing collection if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if collection creation fails.
    async fn ensure_collection(&self) -> VectorDataResult<()>;

    /// Drop the entire collection. Returns `true` if it existed.
    ///
    /// # Errors
    /// Returns an error if the drop fails for a reason other than non-existence.
    async fn drop_collection(&self) -> VectorDataResult<bool>;

    /// Snapshot of storage statistics.
    ///
    /// # Errors
    /// Returns an error if statistics cannot be retrieved.
    async fn get_stats(&self) -> VectorDataResult<StorageStats>;
}
