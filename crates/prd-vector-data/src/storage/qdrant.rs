//! Qdrant-backed [`VectorStorage`] for semantic code search (§6 `similarChunks`).
//!
//! Stores one point per `CodeChunk`/`CodeEmbedding` pair, keyed by the
//! chunk's deterministic UUID, with enough payload fields to render a
//! [`SimilarChunk`] straight off a search hit.

use crate::storage::{ChunkPoint, SimilarChunk, StorageStats, VectorStorage};
use crate::{VectorDataError, VectorDataResult};
use anyhow::Context;
use async_trait::async_trait;
use prd_common::CorrelationId;
use qdrant_client::qdrant::{
    CollectionExistsRequest, Condition, CreateCollection, DeleteCollection, DeletePoints,
    Distance, Filter, GetCollectionInfoRequest, PointId, PointStruct, PointsIdsList,
    PointsSelector, SearchPoints, UpsertPoints, Value, VectorParams, points_selector,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use uuid::Uuid;

/// Dimensionality of the default embedding model (§3 `CodeEmbedding.vector[1536]`).
pub const VECTOR_SIZE: u64 = 1536;

/// Vector database client for storing and searching code embeddings using Qdrant.
#[derive(Clone)]
pub struct QdrantStorage {
    client: Qdrant,
    collection_name: String,
}

impl QdrantStorage {
    /// Connects to Qdrant and ensures the collection exists.
    ///
    /// # Errors
    /// Returns an error if the client cannot be built or the collection
    /// cannot be created.
    pub async fn new(url: String, collection_name: String) -> VectorDataResult<Self> {
        let mut builder = Qdrant::from_url(&url);
        if let Ok(api_key) = std::env::var("QDRANT_API_KEY") {
            builder = builder.api_key(api_key);
        }

        let client = builder
            .build()
            .map_err(|e| VectorDataError::Storage(format!("failed to create Qdrant client: {e}")))?;

        let storage = Self {
            client,
            collection_name,
        };
        storage.ensure_collection().await?;
        Ok(storage)
    }
}

#[async_trait]
impl VectorStorage for QdrantStorage {
    #[tracing::instrument(skip(self))]
    async fn collection_exists(&self) -> VectorDataResult<bool> {
        let request = CollectionExistsRequest {
            collection_name: self.collection_name.clone(),
        };
        self.client
            .collection_exists(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("failed to check collection: {e}")))
    }

    async fn ensure_collection(&self) -> VectorDataResult<()> {
        if self.collection_exists().await? {
            return Ok(());
        }

        let request = CreateCollection {
            collection_name: self.collection_name.clone(),
            vectors_config: Some(
                VectorParams {
                    size: VECTOR_SIZE,
                    distance: Distance::Cosine as i32,
                    ..Default::default()
                }
                .into(),
            ),
            ..Default::default()
        };

        match self.client.create_collection(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("already exists") => Ok(()),
            Err(e) => Err(VectorDataError::Storage(format!(
                "failed to create collection '{}': {e}",
                self.collection_name
            ))),
        }
    }

    async fn drop_collection(&self) -> VectorDataResult<bool> {
        if !self.collection_exists().await? {
            return Ok(false);
        }

        let request = DeleteCollection {
            collection_name: self.collection_name.clone(),
            ..Default::default()
        };

        self.client
            .delete_collection(request)
            .await
            .map(|_| true)
            .map_err(|e| {
                VectorDataError::Storage(format!(
                    "failed to drop collection '{}': {e}",
                    self.collection_name
                ))
            })
    }

    #[tracing::instrument(skip(self, points), fields(count = points.len()))]
    async fn upsert(
        &self,
        points: &[ChunkPoint],
        correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<Uuid>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(correlation_id = %correlation_id, count = points.len(), "upserting chunk vectors");

        let mut qdrant_points = Vec::with_capacity(points.len());
        let mut ids = Vec::with_capacity(points.len());

        for point in points {
            let mut payload = HashMap::new();
            payload.insert(
                "project_id".to_string(),
                Value::from(point.project_id.to_string()),
            );
            payload.insert(
                "file_path".to_string(),
                Value::from(point.file_path.clone()),
            );
            payload.insert("content".to_string(), Value::from(point.content.clone()));
            payload.insert(
                "start_line".to_string(),
                Value::from(i64::from(point.start_line)),
            );
            payload.insert(
                "end_line".to_string(),
                Value::from(i64::from(point.end_line)),
            );
            payload.insert(
                "chunk_type".to_string(),
                Value::from(point.chunk_type.clone()),
            );
            payload.insert("language".to_string(), Value::from(point.language.clone()));
            if let Some(ref symbol) = point.first_symbol {
                payload.insert("first_symbol".to_string(), Value::from(symbol.clone()));
            }

            qdrant_points.push(PointStruct::new(
                point.chunk_id.to_string(),
                point.embedding.clone(),
                Payload::from(payload),
            ));
            ids.push(point.chunk_id);
        }

        let request = UpsertPoints {
            collection_name: self.collection_name.clone(),
            points: qdrant_points,
            ..Default::default()
        };

        self.client
            .upsert_points(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("failed to upsert chunks: {e}")))?;

        Ok(ids)
    }

    #[tracing::instrument(skip(self, query_embedding), fields(project_id = %project_id, limit, threshold))]
    async fn search(
        &self,
        project_id: Uuid,
        query_embedding: Vec<f32>,
        limit: usize,
        threshold: f32,
        correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<SimilarChunk>> {
        tracing::info!(
            correlation_id = %correlation_id,
            project_id = %project_id,
            limit,
            threshold,
            "searching similar chunks"
        );

        let request = SearchPoints {
            collection_name: self.collection_name.clone(),
            vector: query_embedding,
            limit: limit as u64,
            with_payload: Some(true.into()),
            filter: Some(Filter::must([Condition::matches(
                "project_id",
                project_id.to_string(),
            )])),
            score_threshold: Some(threshold),
            ..Default::default()
        };

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("search failed: {e}")))?;

        let mut results: Vec<SimilarChunk> = response
            .result
            .into_iter()
            .filter_map(|scored| {
                let chunk_id = scored.id.as_ref().and_then(point_id_to_uuid)?;
                let payload = &scored.payload;
                Some(SimilarChunk {
                    chunk_id,
                    file_path: payload_str(payload, "file_path"),
                    content: payload_str(payload, "content"),
                    start_line: payload_int(payload, "start_line") as u32,
                    end_line: payload_int(payload, "end_line") as u32,
                    chunk_type: payload_str(payload, "chunk_type"),
                    language: payload_str(payload, "language"),
                    first_symbol: payload
                        .get("first_symbol")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    similarity: scored.score,
                })
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
        if chunk_ids.is_empty() {
            return Ok(());
        }

        let point_ids: Vec<PointId> = chunk_ids
            .iter()
            .map(|id| PointId::from(id.to_string()))
            .collect();

        let request = DeletePoints {
            collection_name: self.collection_name.clone(),
            points: Some(PointsSelector {
                points_selector_one_of: Some(points_selector::PointsSelectorOneOf::Points(
                    PointsIdsList { ids: point_ids },
                )),
            }),
            ..Default::default()
        };

        self.client
            .delete_points(request)
            .await
            .context("failed to delete chunks from Qdrant")?;

        Ok(())
    }

    async fn delete_project(&self, project_id: Uuid) -> VectorDataResult<()> {
        let request = DeletePoints {
            collection_name: self.collection_name.clone(),
            points: Some(PointsSelector {
                points_selector_one_of: Some(points_selector::PointsSelectorOneOf::Filter(
                    Filter::must([Condition::matches("project_id", project_id.to_string())]),
                )),
            }),
            ..Default::default()
        };

        self.client
            .delete_points(request)
            .await
            .context("failed to delete project chunks from Qdrant")?;

        Ok(())
    }

    async fn get_stats(&self) -> VectorDataResult<StorageStats> {
        let request = GetCollectionInfoRequest {
            collection_name: self.collection_name.clone(),
        };

        let info = self
            .client
            .collection_info(request)
            .await
            .context("failed to get collection info")?;

        let result = info
            .result
            .ok_or_else(|| VectorDataError::Other("missing collection info result".into()))?;

        Ok(StorageStats {
            vector_count: result.vectors_count.unwrap_or(0) as usize,
            storage_bytes: None,
            collection_name: self.collection_name.clone(),
            storage_type: "qdrant".to_string(),
        })
    }
}

fn point_id_to_uuid(id: &PointId) -> Option<Uuid> {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match &id.point_id_options {
        Some(PointIdOptions::Uuid(s)) => Uuid::parse_str(s).ok(),
        Some(PointIdOptions::Num(_)) | None => None,
    }
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_default()
}

fn payload_int(payload: &HashMap<String, Value>, key: &str) -> i64 {
    payload.get(key).and_then(Value::as_integer).unwrap_or(0)
}
