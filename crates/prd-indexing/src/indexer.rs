//! Codebase Indexer entry point (§4.2): deduplication, project creation, and
//! job enqueueing. The actual fetch/chunk/embed/persist work happens in
//! [`crate::worker`].

use async_trait::async_trait;
use prd_store::{CodebaseProject, CodebaseProjectRepository, JobType};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{IndexerError, IndexerResult};
use crate::github::parse_repository_url;
use crate::queue::JobQueue;

/// Outcome of [`CodebaseIndexer::index_repository`].
#[derive(Debug, Clone)]
pub enum IndexOutcome {
    /// `(repositoryUrl, branch)` was already known; returned unmodified, no
    /// job scheduled (§4.2 "Deduplication").
    AlreadyIndexed(CodebaseProject),
    /// A fresh project was created and a job enqueued.
    Scheduled { project: CodebaseProject, job_id: Uuid },
}

/// Materializes a [`CodebaseProject`] for `(repositoryUrl, branch)`, either
/// by returning an existing one or by creating one and scheduling indexing.
#[async_trait]
pub trait CodebaseIndexer: Send + Sync {
    /// # Errors
    /// Returns [`IndexerError::InvalidRepositoryUrl`] if `repository_url`
    /// doesn't match the supported GitHub forms, or a store error if
    /// persistence fails.
    async fn index_repository(
        &self,
        repository_url: String,
        branch: String,
        access_token: Option<String>,
    ) -> IndexerResult<IndexOutcome>;
}

/// Default [`CodebaseIndexer`] wiring the project repository to the job queue.
pub struct DefaultCodebaseIndexer {
    projects: Arc<dyn CodebaseProjectRepository>,
    jobs: Arc<dyn JobQueue>,
    max_retries: u32,
}

impl DefaultCodebaseIndexer {
    #[must_use]
    pub fn new(projects: Arc<dyn CodebaseProjectRepository>, jobs: Arc<dyn JobQueue>, max_retries: u32) -> Self {
        Self { projects, jobs, max_retries }
    }
}

#[async_trait]
impl CodebaseIndexer for DefaultCodebaseIndexer {
    #[tracing::instrument(skip(self, access_token), fields(repository_url, branch))]
    async fn index_repository(
        &self,
        repository_url: String,
        branch: String,
        access_token: Option<String>,
    ) -> IndexerResult<IndexOutcome> {
        let _ = access_token;
        // Validate the URL up front even though the project key is the raw
        // string: a malformed URL must never reach the store.
        parse_repository_url(&repository_url).map_err(|_| IndexerError::InvalidRepositoryUrl(repository_url.clone()))?;

        if let Some(existing) = self.projects.get_by_repository(&repository_url, &branch).await? {
            return Ok(IndexOutcome::AlreadyIndexed(existing));
        }

        let project = CodebaseProject::new(repository_url, branch, "github".to_string());
        let project = self.projects.create(project).await?;
        let job = self.jobs.enqueue(project.id, JobType::InitialIndex, self.max_retries).await?;

        Ok(IndexOutcome::Scheduled { project, job_id: job.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::RepositoryJobQueue;
    use prd_store::MockStore;

    fn indexer() -> DefaultCodebaseIndexer {
        let store = Arc::new(MockStore::new());
        DefaultCodebaseIndexer::new(store.clone(), Arc::new(RepositoryJobQueue::new(store)), 3)
    }

    #[tokio::test]
    async fn rejects_non_github_url() {
        let indexer = indexer();
        let err = indexer
            .index_repository("https://gitlab.com/acme/widgets".to_string(), "main".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexerError::InvalidRepositoryUrl(_)));
    }

    #[tokio::test]
    async fn second_call_for_same_repo_and_branch_is_deduplicated() {
        let indexer = indexer();
        let first = indexer
            .index_repository("https://github.com/acme/widgets".to_string(), "main".to_string(), None)
            .await
            .unwrap();
        let second = indexer
            .index_repository("https://github.com/acme/widgets".to_string(), "main".to_string(), None)
            .await
            .unwrap();

        let first_id = match first {
            IndexOutcome::Scheduled { project, .. } => project.id,
            IndexOutcome::AlreadyIndexed(_) => panic!("expected a fresh project on first call"),
        };
        match second {
            IndexOutcome::AlreadyIndexed(project) => assert_eq!(project.id, first_id),
            IndexOutcome::Scheduled { .. } => panic!("expected dedup on second call"),
        }
    }

    #[tokio::test]
    async fn distinct_branches_are_not_deduplicated() {
        let indexer = indexer();
        indexer
            .index_repository("https://github.com/acme/widgets".to_string(), "main".to_string(), None)
            .await
            .unwrap();
        let second = indexer
            .index_repository("https://github.com/acme/widgets".to_string(), "develop".to_string(), None)
            .await
            .unwrap();
        assert!(matches!(second, IndexOutcome::Scheduled { .. }));
    }
}
