//! Job Queue port (§6) over [`prd_store::IndexingJobRepository`]: persistent,
//! at-least-once tracking of indexing jobs.

use async_trait::async_trait;
use prd_store::{IndexingJob, IndexingJobRepository, JobStatus, JobType};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::IndexerResult;

/// Enqueues and advances [`IndexingJob`] rows for a project.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Create a new queued job for `project_id`.
    ///
    /// # Errors
    /// Returns an error if the job cannot be persisted.
    async fn enqueue(&self, project_id: Uuid, job_type: JobType, max_retries: u32) -> IndexerResult<IndexingJob>;

    /// True if `project_id` already has a `queued` or `running` job (§4.7
    /// gate: a generation request must not race an in-flight re-index).
    ///
    /// # Errors
    /// Returns an error if the check itself fails.
    async fn has_active_job(&self, project_id: Uuid) -> IndexerResult<bool>;

    /// Mark a job `running`.
    ///
    /// # Errors
    /// Returns an error if the job cannot be persisted.
    async fn start(&self, job: IndexingJob) -> IndexerResult<IndexingJob>;

    /// Persist updated progress counters without changing status.
    ///
    /// # Errors
    /// Returns an error if the job cannot be persisted.
    async fn save_progress(&self, job: IndexingJob) -> IndexerResult<IndexingJob>;

    /// Mark a job `completed`.
    ///
    /// # Errors
    /// Returns an error if the job cannot be persisted.
    async fn complete(&self, job: IndexingJob) -> IndexerResult<IndexingJob>;

    /// Mark a job `failed` with `reason`, recording it as a terminal state.
    ///
    /// # Errors
    /// Returns an error if the job cannot be persisted.
    async fn fail(&self, job: IndexingJob, reason: String) -> IndexerResult<IndexingJob>;
}

/// Default [`JobQueue`] backed by any [`IndexingJobRepository`] implementation
/// (Postgres in production, the in-memory double in tests).
pub struct RepositoryJobQueue {
    repository: Arc<dyn IndexingJobRepository>,
}

impl RepositoryJobQueue {
    #[must_use]
    pub fn new(repository: Arc<dyn IndexingJobRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl JobQueue for RepositoryJobQueue {
    async fn enqueue(&self, project_id: Uuid, job_type: JobType, max_retries: u32) -> IndexerResult<IndexingJob> {
        let job = IndexingJob::new(project_id, job_type, max_retries);
        Ok(self.repository.create(job).await?)
    }

    async fn has_active_job(&self, project_id: Uuid) -> IndexerResult<bool> {
        Ok(self.repository.has_active_job(project_id).await?)
    }

    async fn start(&self, mut job: IndexingJob) -> IndexerResult<IndexingJob> {
        job.status = JobStatus::Running;
        job.started_at = Some(chrono::Utc::now());
        Ok(self.repository.update(job).await?)
    }

    async fn save_progress(&self, job: IndexingJob) -> IndexerResult<IndexingJob> {
        Ok(self.repository.update(job).await?)
    }

    async fn complete(&self, mut job: IndexingJob) -> IndexerResult<IndexingJob> {
        job.status = JobStatus::Completed;
        job.completed_at = Some(chrono::Utc::now());
        Ok(self.repository.update(job).await?)
    }

    async fn fail(&self, mut job: IndexingJob, reason: String) -> IndexerResult<IndexingJob> {
        job.status = JobStatus::Failed;
        job.completed_at = Some(chrono::Utc::now());
        job.error = Some(reason);
        Ok(self.repository.update(job).await?)
    }
}
