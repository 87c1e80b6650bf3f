//! In-memory [`VectorStorage`] double for tests and offline development.

use crate::storage::{ChunkPoint, SimilarChunk, StorageStats, VectorStorage};
use crate::{VectorDataError, VectorDataResult};
use async_trait::async_trait;
use prd_common::CorrelationId;
use std::sync::Mutex;
use uuid::Uuid;

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// In-memory storage backend used by tests across the workspace.
#[derive(Default)]
pub struct MockStorage {
    points: Mutex<Vec<ChunkPoint>>,
    fail_on_upsert: bool,
    fail_on_search: bool,
}

impl MockStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_upsert_failure(mut self) -> Self {
        self.fail_on_upsert = true;
        self
    }

    #[must_use]
    pub const fn with_search_failure(mut self) -> Self {
        self.fail_on_search = true;
        self
    }

    /// Snapshot of every point currently stored (for test assertions).
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn points(&self) -> Vec<ChunkPoint> {
        self.points.lock().expect("mock storage lock poisoned").clone()
    }
}

#[async_trait]
impl VectorStorage for MockStorage {
    async fn upsert(
        &self,
        points: &[ChunkPoint],
        _correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<Uuid>> {
        if self.fail_on_upsert {
            return Err(VectorDataError::Storage("mock upsert failure".into()));
        }

        let mut store = self.points.lock().expect("mock storage lock poisoned");
        let mut ids = Vec::with_capacity(points.len());
        for point in points {
            store.retain(|p| p.chunk_id != point.chunk_id);
            store.push(point.clone());
            ids.push(point.chunk_id);
        }
        Ok(ids)
    }

    async fn search(
        &self,
        project_id: Uuid,
        query_embedding: Vec<f32>,
        limit: usize,
        threshold: f32,
        _correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<SimilarChunk>> {
        if self.fail_on_search {
            return Err(VectorDataError::Storage("mock search failure".into()));
        }

        let store = self.points.lock().expect("mock storage lock poisoned");
        let mut results: Vec<SimilarChunk> = store
            .iter()
            .filter(|p| p.project_id == project_id)
            .map(|p| SimilarChunk {
                chunk_id: p.chunk_id,
                file_path: p.file_path.clone(),
                content: p.content.clone(),
                start_line: p.start_line,
                end_line: p.end_line,
                chunk_type: p.chunk_type.clone(),
                language: p.language.clone(),
                first_symbol: p.first_symbol.clone(),
                similarity: cosine_similarity(&query_embedding, &p.embedding),
            })
            .filter(|c| c.similarity > threshold)
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.file_path.cmp(&b.file_path))
                .then_with(|| a.start_line.cmp(&b.start_line))
        });
        results.truncate(limit);
        Ok(results)
    }

    async fn delete_chunks(&self, chunk_ids: &[Uuid]) -> VectorDataResult<()> {
        let mut store = self.points.lock().expect("mock storage lock poisoned");
        store.retain(|p| !chunk_ids.contains(&p.chunk_id));
        Ok(())
    }

    async fn delete_project(&self, project_id: Uuid) -> VectorDataResult<()> {
        let mut store = self.points.lock().expect("mock storage lock poisoned");
        store.retain(|p| p.project_id != project_id);
        Ok(())
    }

    async fn collection_exists(&self) -> VectorDataResult<bool> {
        Ok(true)
    }

    async fn ensure_collection(&self) -> VectorDataResult<()> {
        Ok(())
    }

    async fn drop_collection(&self) -> VectorDataResult<bool> {
        let mut store = self.points.lock().expect("mock storage lock poisoned");
        let had_data = !store.is_empty();
        store.clear();
        Ok(had_data)
    }

    async fn get_stats(&self) -> VectorDataResult<StorageStats> {
        let store = self.points.lock().expect("mock storage lock poisoned");
        Ok(StorageStats {
            vector_count: store.len(),
            storage_bytes: None,
            collection_name: "mock".to_string(),
            storage_type: "mock".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(project: Uuid, path: &str, embedding: Vec<f32>) -> ChunkPoint {
        ChunkPoint {
            chunk_id: Uuid::new_v4(),
            project_id: project,
            file_path: path.to_string(),
            content: "fn f() {}".to_string(),
            start_line: 1,
            end_line: 1,
            chunk_type: "function".to_string(),
            language: "rust".to_string(),
            first_symbol: Some("f".to_string()),
            embedding,
        }
    }

    #[tokio::test]
    async fn search_filters_by_project_and_threshold() {
        let storage = MockStorage::new();
        let correlation_id = CorrelationId::new();
        let project = Uuid::new_v4();
        let other_project = Uuid::new_v4();

        storage
            .upsert(
                &[
                    point(project, "a.rs", vec![1.0, 0.0]),
                    point(other_project, "b.rs", vec![1.0, 0.0]),
                ],
                &correlation_id,
            )
            .await
            .unwrap();

        let results = storage
            .search(project, vec![1.0, 0.0], 10, 0.5, &correlation_id)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_path, "a.rs");
    }

    #[tokio::test]
    async fn delete_project_removes_only_its_chunks() {
        let storage = MockStorage::new();
        let correlation_id = CorrelationId::new();
        let project = Uuid::new_v4();
        let other = Uuid::new_v4();

        storage
            .upsert(
                &[point(project, "a.rs", vec![1.0]), point(other, "b.rs", vec![1.0])],
                &correlation_id,
            )
            .await
            .unwrap();

        storage.delete_project(project).await.unwrap();
        assert_eq!(storage.points().len(), 1);
        assert_eq!(storage.points()[0].project_id, other);
    }
}
