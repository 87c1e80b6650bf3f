//! Repository ports for the Request/Document Store (§3, §4.1-§4.2).
//!
//! Every trait here is implemented twice: [`crate::repository`] (Postgres,
//! via `sqlx`) for production, and [`crate::mock`] (in-memory) for
//! `SKIP_DATABASE` mode and unit tests elsewhere in the workspace.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
    CodeChunkRecord, CodeFile, CodebaseLink, CodebaseProject, IndexingJob, MerkleNode,
    MockupUpload, PRDDocument, PRDRequest, RequestStatus,
};

/// Filters accepted by [`PRDRequestRepository::list`] (§4.1 request listing).
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub requester_id: Option<Uuid>,
    pub status_code: Option<&'static str>,
}

/// Persistence for §3 `PRDRequest`.
#[async_trait]
pub trait PRDRequestRepository: Send + Sync {
    async fn create(&self, request: PRDRequest) -> StoreResult<PRDRequest>;
    async fn get(&self, id: Uuid) -> StoreResult<PRDRequest>;
    async fn list(&self, filter: &RequestFilter) -> StoreResult<Vec<PRDRequest>>;

    /// Transition `status`, enforcing [`RequestStatus::can_transition_to`].
    ///
    /// # Errors
    /// Returns [`crate::error::StoreError::BusinessRule`] if the transition is
    /// illegal per §4.1's state machine.
    async fn update_status(&self, id: Uuid, status: RequestStatus) -> StoreResult<PRDRequest>;

    /// Attach the generated document id and mark the request `completed`.
    async fn complete(&self, id: Uuid, document_id: Uuid) -> StoreResult<PRDRequest>;
}

/// Persistence for §3 `PRDDocument`.
#[async_trait]
pub trait PRDDocumentRepository: Send + Sync {
    async fn create(&self, document: PRDDocument) -> StoreResult<PRDDocument>;
    async fn get(&self, id: Uuid) -> StoreResult<PRDDocument>;
    async fn get_by_request(&self, request_id: Uuid) -> StoreResult<PRDDocument>;

    /// Persist a revised document as a new version (§4.7 export/versioning).
    async fn create_revision(&self, document: PRDDocument) -> StoreResult<PRDDocument>;
}

/// Persistence for §3 `MockupUpload`.
#[async_trait]
pub trait MockupRepository: Send + Sync {
    async fn create(&self, upload: MockupUpload) -> StoreResult<MockupUpload>;
    async fn get(&self, id: Uuid) -> StoreResult<MockupUpload>;
    async fn get_for_request(&self, request_id: Uuid) -> StoreResult<Vec<MockupUpload>>;
    async fn mark_processed(
        &self,
        id: Uuid,
        analysis_result: serde_json::Value,
        confidence: f64,
    ) -> StoreResult<MockupUpload>;

    /// Delete uploads whose `expiresAt` has passed (§3 retention).
    async fn delete_expired(&self) -> StoreResult<u64>;
}

/// Persistence for §3 `CodebaseProject`, `CodeFile`, `CodeChunk`, `MerkleNode`.
#[async_trait]
pub trait CodebaseProjectRepository: Send + Sync {
    async fn create(&self, project: CodebaseProject) -> StoreResult<CodebaseProject>;
    async fn get(&self, id: Uuid) -> StoreResult<CodebaseProject>;
    async fn get_by_repository(
        &self,
        repository_url: &str,
        branch: &str,
    ) -> StoreResult<Option<CodebaseProject>>;
    async fn update(&self, project: CodebaseProject) -> StoreResult<CodebaseProject>;
}

/// Persistence for file/chunk content and the Merkle index (§4.2).
#[async_trait]
pub trait CodeIndexRepository: Send + Sync {
    async fn upsert_file(&self, file: CodeFile) -> StoreResult<CodeFile>;
    async fn get_file(&self, project_id: Uuid, file_path: &str) -> StoreResult<Option<CodeFile>>;
    async fn list_files(&self, project_id: Uuid) -> StoreResult<Vec<CodeFile>>;
    async fn delete_file(&self, project_id: Uuid, file_path: &str) -> StoreResult<()>;

    async fn replace_chunks(
        &self,
        project_id: Uuid,
        file_path: &str,
        chunks: Vec<CodeChunkRecord>,
    ) -> StoreResult<Vec<Uuid>>;
    async fn get_chunks(&self, project_id: Uuid, file_path: &str) -> StoreResult<Vec<CodeChunkRecord>>;
    async fn chunk_count(&self, project_id: Uuid) -> StoreResult<u64>;

    async fn upsert_merkle_node(&self, node: MerkleNode) -> StoreResult<()>;
    async fn get_merkle_root(&self, project_id: Uuid) -> StoreResult<Option<MerkleNode>>;
    async fn get_merkle_leaves(&self, project_id: Uuid) -> StoreResult<Vec<MerkleNode>>;
}

/// Persistence for §3 `IndexingJob`.
#[async_trait]
pub trait IndexingJobRepository: Send + Sync {
    async fn create(&self, job: IndexingJob) -> StoreResult<IndexingJob>;
    async fn get(&self, id: Uuid) -> StoreResult<IndexingJob>;
    async fn update(&self, job: IndexingJob) -> StoreResult<IndexingJob>;
    async fn latest_for_project(&self, project_id: Uuid) -> StoreResult<Option<IndexingJob>>;

    /// True when a job for this project is `queued` or `running` (§4.7 gate:
    /// a generation request must not race an in-flight re-index).
    async fn has_active_job(&self, project_id: Uuid) -> StoreResult<bool>;
}

/// Persistence for the many-to-many §3 PRD↔Codebase link.
#[async_trait]
pub trait CodebaseLinkRepository: Send + Sync {
    /// # Errors
    /// Returns [`crate::error::StoreError::Conflict`] if the pair is already linked.
    async fn link(&self, prd_request_id: Uuid, codebase_project_id: Uuid) -> StoreResult<CodebaseLink>;
    async fn unlink(&self, prd_request_id: Uuid, codebase_project_id: Uuid) -> StoreResult<()>;
    async fn projects_for_request(&self, prd_request_id: Uuid) -> StoreResult<Vec<Uuid>>;
}
