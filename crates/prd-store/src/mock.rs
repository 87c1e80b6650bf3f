//! In-memory store for `SKIP_DATABASE` mode and cross-crate unit tests.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    CodeChunkRecord, CodeFile, CodebaseLink, CodebaseProject, IndexingJob, JobStatus, MerkleNode,
    MockupUpload, PRDDocument, PRDRequest, RequestStatus,
};
use crate::traits::{
    CodeIndexRepository, CodebaseLinkRepository, CodebaseProjectRepository, IndexingJobRepository,
    MockupRepository, PRDDocumentRepository, PRDRequestRepository, RequestFilter,
};

/// Single in-memory backend implementing every repository port in this crate.
#[derive(Default)]
pub struct MockStore {
    requests: DashMap<Uuid, PRDRequest>,
    documents: DashMap<Uuid, PRDDocument>,
    document_revisions: DashMap<Uuid, Vec<PRDDocument>>,
    mockups: DashMap<Uuid, MockupUpload>,
    projects: DashMap<Uuid, CodebaseProject>,
    files: DashMap<(Uuid, String), CodeFile>,
    chunks: DashMap<(Uuid, String), Vec<CodeChunkRecord>>,
    merkle_nodes: DashMap<(Uuid, String), MerkleNode>,
    jobs: DashMap<Uuid, IndexingJob>,
    links: DashMap<(Uuid, Uuid), CodebaseLink>,
}

impl MockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PRDRequestRepository for MockStore {
    async fn create(&self, request: PRDRequest) -> StoreResult<PRDRequest> {
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> StoreResult<PRDRequest> {
        self.requests
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(format!("PRDRequest {id}")))
    }

    async fn list(&self, filter: &RequestFilter) -> StoreResult<Vec<PRDRequest>> {
        Ok(self
            .requests
            .iter()
            .map(|r| r.clone())
            .filter(|r| filter.requester_id.is_none_or(|id| id == r.requester.id))
            .filter(|r| filter.status_code.is_none_or(|code| code == r.status.code()))
            .collect())
    }

    async fn update_status(&self, id: Uuid, status: RequestStatus) -> StoreResult<PRDRequest> {
        let mut entry = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("PRDRequest {id}")))?;
        if !entry.status.can_transition_to(&status) {
            return Err(StoreError::BusinessRule(format!(
                "cannot transition request {id} from {:?} to {status:?}",
                entry.status
            )));
        }
        entry.status = status;
        entry.updated_at = chrono::Utc::now();
        Ok(entry.clone())
    }

    async fn complete(&self, id: Uuid, document_id: Uuid) -> StoreResult<PRDRequest> {
        let mut entry = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("PRDRequest {id}")))?;
        if !entry.status.can_transition_to(&RequestStatus::Completed) {
            return Err(StoreError::BusinessRule(format!(
                "cannot complete request {id} from {:?}",
                entry.status
            )));
        }
        entry.status = RequestStatus::Completed;
        entry.generated_document_id = Some(document_id);
        let now = chrono::Utc::now();
        entry.updated_at = now;
        entry.completed_at = Some(now);
        Ok(entry.clone())
    }
}

#[async_trait]
impl PRDDocumentRepository for MockStore {
    async fn create(&self, document: PRDDocument) -> StoreResult<PRDDocument> {
        self.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get(&self, id: Uuid) -> StoreResult<PRDDocument> {
        self.documents
            .get(&id)
            .map(|d| d.clone())
            .ok_or_else(|| StoreError::NotFound(format!("PRDDocument {id}")))
    }

    async fn get_by_request(&self, request_id: Uuid) -> StoreResult<PRDDocument> {
        self.documents
            .iter()
            .map(|d| d.clone())
            .find(|d| d.request_id == request_id)
            .ok_or_else(|| StoreError::NotFound(format!("PRDDocument for request {request_id}")))
    }

    async fn create_revision(&self, mut document: PRDDocument) -> StoreResult<PRDDocument> {
        let previous = self.get(document.id).await?;
        document.version = previous.version.saturating_add(1);
        self.document_revisions
            .entry(document.id)
            .or_default()
            .push(previous);
        self.documents.insert(document.id, document.clone());
        Ok(document)
    }
}

#[async_trait]
impl MockupRepository for MockStore {
    async fn create(&self, upload: MockupUpload) -> StoreResult<MockupUpload> {
        self.mockups.insert(upload.id, upload.clone());
        Ok(upload)
    }

    async fn get(&self, id: Uuid) -> StoreResult<MockupUpload> {
        self.mockups
            .get(&id)
            .map(|m| m.clone())
            .ok_or_else(|| StoreError::NotFound(format!("MockupUpload {id}")))
    }

    async fn get_for_request(&self, request_id: Uuid) -> StoreResult<Vec<MockupUpload>> {
        Ok(self
            .mockups
            .iter()
            .map(|m| m.clone())
            .filter(|m| m.request_id == request_id)
            .collect())
    }

    async fn mark_processed(
        &self,
        id: Uuid,
        analysis_result: serde_json::Value,
        confidence: f64,
    ) -> StoreResult<MockupUpload> {
        let mut entry = self
            .mockups
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("MockupUpload {id}")))?;
        entry.mark_processed(analysis_result, confidence);
        Ok(entry.clone())
    }

    async fn delete_expired(&self) -> StoreResult<u64> {
        let now = chrono::Utc::now();
        let expired: Vec<Uuid> = self
            .mockups
            .iter()
            .filter(|m| m.expires_at < now)
            .map(|m| m.id)
            .collect();
        let count = expired.len();
        for id in expired {
            self.mockups.remove(&id);
        }
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl CodebaseProjectRepository for MockStore {
    async fn create(&self, project: CodebaseProject) -> StoreResult<CodebaseProject> {
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get(&self, id: Uuid) -> StoreResult<CodebaseProject> {
        self.projects
            .get(&id)
            .map(|p| p.clone())
            .ok_or_else(|| StoreError::NotFound(format!("CodebaseProject {id}")))
    }

    async fn get_by_repository(
        &self,
        repository_url: &str,
        branch: &str,
    ) -> StoreResult<Option<CodebaseProject>> {
        Ok(self
            .projects
            .iter()
            .map(|p| p.clone())
            .find(|p| p.repository_url == repository_url && p.repository_branch == branch))
    }

    async fn update(&self, project: CodebaseProject) -> StoreResult<CodebaseProject> {
        if !self.projects.contains_key(&project.id) {
            return Err(StoreError::NotFound(format!("CodebaseProject {}", project.id)));
        }
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }
}

#[async_trait]
impl CodeIndexRepository for MockStore {
    async fn upsert_file(&self, file: CodeFile) -> StoreResult<CodeFile> {
        self.files
            .insert((file.project_id, file.file_path.clone()), file.clone());
        Ok(file)
    }

    async fn get_file(&self, project_id: Uuid, file_path: &str) -> StoreResult<Option<CodeFile>> {
        Ok(self
            .files
            .get(&(project_id, file_path.to_string()))
            .map(|f| f.clone()))
    }

    async fn list_files(&self, project_id: Uuid) -> StoreResult<Vec<CodeFile>> {
        Ok(self
            .files
            .iter()
            .map(|e| e.value().clone())
            .filter(|f| f.project_id == project_id)
            .collect())
    }

    async fn delete_file(&self, project_id: Uuid, file_path: &str) -> StoreResult<()> {
        self.files.remove(&(project_id, file_path.to_string()));
        self.chunks.remove(&(project_id, file_path.to_string()));
        Ok(())
    }

    async fn replace_chunks(
        &self,
        project_id: Uuid,
        file_path: &str,
        chunks: Vec<CodeChunkRecord>,
    ) -> StoreResult<Vec<Uuid>> {
        let key = (project_id, file_path.to_string());
        let removed = self
            .chunks
            .get(&key)
            .map(|v| v.iter().map(|c| c.id).collect())
            .unwrap_or_default();
        self.chunks.insert(key, chunks);
        Ok(removed)
    }

    async fn get_chunks(&self, project_id: Uuid, file_path: &str) -> StoreResult<Vec<CodeChunkRecord>> {
        Ok(self
            .chunks
            .get(&(project_id, file_path.to_string()))
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    async fn chunk_count(&self, project_id: Uuid) -> StoreResult<u64> {
        let count: usize = self
            .chunks
            .iter()
            .filter(|e| e.key().0 == project_id)
            .map(|e| e.value().len())
            .sum();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn upsert_merkle_node(&self, node: MerkleNode) -> StoreResult<()> {
        self.merkle_nodes
            .insert((node.project_id, node.node_path.clone()), node);
        Ok(())
    }

    async fn get_merkle_root(&self, project_id: Uuid) -> StoreResult<Option<MerkleNode>> {
        Ok(self
            .merkle_nodes
            .iter()
            .map(|e| e.value().clone())
            .find(|n| n.project_id == project_id && n.parent_hash.is_none()))
    }

    async fn get_merkle_leaves(&self, project_id: Uuid) -> StoreResult<Vec<MerkleNode>> {
        Ok(self
            .merkle_nodes
            .iter()
            .map(|e| e.value().clone())
            .filter(|n| n.project_id == project_id && n.is_leaf)
            .collect())
    }
}

#[async_trait]
impl IndexingJobRepository for MockStore {
    async fn create(&self, job: IndexingJob) -> StoreResult<IndexingJob> {
        self.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: Uuid) -> StoreResult<IndexingJob> {
        self.jobs
            .get(&id)
            .map(|j| j.clone())
            .ok_or_else(|| StoreError::NotFound(format!("IndexingJob {id}")))
    }

    async fn update(&self, job: IndexingJob) -> StoreResult<IndexingJob> {
        if !self.jobs.contains_key(&job.id) {
            return Err(StoreError::NotFound(format!("IndexingJob {}", job.id)));
        }
        self.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn latest_for_project(&self, project_id: Uuid) -> StoreResult<Option<IndexingJob>> {
        Ok(self
            .jobs
            .iter()
            .map(|j| j.clone())
            .filter(|j| j.project_id == project_id)
            .max_by_key(|j| j.created_at))
    }

    async fn has_active_job(&self, project_id: Uuid) -> StoreResult<bool> {
        Ok(self.jobs.iter().any(|j| {
            j.project_id == project_id
                && matches!(j.status, JobStatus::Queued | JobStatus::Running)
        }))
    }
}

#[async_trait]
impl CodebaseLinkRepository for MockStore {
    async fn link(&self, prd_request_id: Uuid, codebase_project_id: Uuid) -> StoreResult<CodebaseLink> {
        let key = (prd_request_id, codebase_project_id);
        if self.links.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "request {prd_request_id} is already linked to project {codebase_project_id}"
            )));
        }
        let link = CodebaseLink {
            prd_request_id,
            codebase_project_id,
            linked_at: chrono::Utc::now(),
        };
        self.links.insert(key, link.clone());
        Ok(link)
    }

    async fn unlink(&self, prd_request_id: Uuid, codebase_project_id: Uuid) -> StoreResult<()> {
        self.links.remove(&(prd_request_id, codebase_project_id));
        Ok(())
    }

    async fn projects_for_request(&self, prd_request_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .links
            .iter()
            .filter(|e| e.key().0 == prd_request_id)
            .map(|e| e.key().1)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Requester};

    fn requester() -> Requester {
        Requester { id: Uuid::new_v4(), email: Some("pm@example.com".into()) }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MockStore::new();
        let request = PRDRequest::new(
            "Checkout revamp".into(),
            "Redesign the checkout flow".into(),
            Priority::Medium,
            requester(),
            Vec::new(),
            None,
        )
        .expect("valid request");
        let id = request.id;
        store.create(request).await.expect("create");
        let fetched = PRDRequestRepository::get(&store, id).await.expect("get");
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn update_status_rejects_illegal_transition() {
        let store = MockStore::new();
        let request = PRDRequest::new(
            "X".into(),
            "Y".into(),
            Priority::Low,
            requester(),
            Vec::new(),
            None,
        )
        .expect("valid request");
        let id = request.id;
        store.create(request).await.expect("create");
        store
            .update_status(id, RequestStatus::Completed)
            .await
            .expect_err("pending -> completed is illegal");
    }

    #[tokio::test]
    async fn linking_the_same_pair_twice_conflicts() {
        let store = MockStore::new();
        let req = Uuid::new_v4();
        let proj = Uuid::new_v4();
        store.link(req, proj).await.expect("first link");
        store.link(req, proj).await.expect_err("duplicate link");
    }
}
