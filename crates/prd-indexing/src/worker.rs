//! Background worker: executes one indexing job end to end (§4.2).
//!
//! Follows the donor's two-stage pipeline shape — a bounded channel of
//! parsed-file tasks feeding a pool of embedder tasks via
//! [`tokio::task::JoinSet`] — generalized so a single project's job always
//! serializes (§5) while distinct projects' jobs never block one another.
//! Per-project in-flight Merkle state lives in a [`dashmap::DashMap`] so
//! concurrent jobs for different projects don't contend on a shared lock.

use dashmap::DashMap;
use prd_common::CorrelationId;
use prd_embeddings::EmbeddingService;
use prd_parsing::{ChunkingService, get_language_from_extension};
use prd_store::{
    CodeChunkRecord, CodeFile, CodeIndexRepository, CodebaseProject, CodebaseProjectRepository,
    IndexingJob, IndexingStatus, generate_chunk_id, hash_content,
};
use prd_vector_data::{ChunkPoint, VectorStorage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

use crate::error::{IndexerError, IndexerResult, is_retryable};
use crate::github::{RepositoryHost, RepositoryRef, TreeEntry, parse_repository_url};
use crate::merkle::{MerkleLeaf, build_tree, diff_leaves, leaf_hash};
use crate::queue::JobQueue;

/// Tunables for [`BackgroundWorker::run_job`], sourced from
/// `prd_config::IndexingConfig`.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    pub max_retries: u32,
    pub embedding_model: String,
}

/// Per-project Merkle state cached between incremental runs, so a re-index
/// doesn't need to re-derive the previous tree from the store on every call.
type MerkleCache = DashMap<Uuid, Vec<MerkleLeaf>>;

/// Executes indexing jobs for any number of projects concurrently, while
/// guaranteeing a single project never has two jobs running at once.
pub struct BackgroundWorker {
    host: Arc<dyn RepositoryHost>,
    projects: Arc<dyn CodebaseProjectRepository>,
    index: Arc<dyn CodeIndexRepository>,
    vectors: Arc<dyn VectorStorage>,
    embeddings: Arc<dyn EmbeddingService>,
    jobs: Arc<dyn JobQueue>,
    chunker: Arc<ChunkingService>,
    settings: WorkerSettings,
    merkle_cache: MerkleCache,
    shutdown: Arc<AtomicBool>,
}

impl BackgroundWorker {
    /// # Errors
    /// Returns an error if the tiktoken encoder for `settings.embedding_model` fails to load.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        projects: Arc<dyn CodebaseProjectRepository>,
        index: Arc<dyn CodeIndexRepository>,
        vectors: Arc<dyn VectorStorage>,
        embeddings: Arc<dyn EmbeddingService>,
        jobs: Arc<dyn JobQueue>,
        settings: WorkerSettings,
    ) -> IndexerResult<Self> {
        let chunker = ChunkingService::with_defaults(&settings.embedding_model, 8191)?;
        Ok(Self {
            host,
            projects,
            index,
            vectors,
            embeddings,
            jobs,
            chunker: Arc::new(chunker),
            settings,
            merkle_cache: DashMap::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Signal every in-flight `run_job` call to stop starting new batches.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Run `job` to completion: fetch the tree, diff against the cached
    /// Merkle state, fetch/chunk/embed/persist the changed files, then mark
    /// the job complete or failed (§4.2).
    ///
    /// # Errors
    /// Returns the terminal error only when the job could not even be
    /// marked `failed` in the store; ordinary job failures are recorded on
    /// the job row and this returns `Ok`.
    #[tracing::instrument(skip(self, job, access_token), fields(project_id = %job.project_id, job_id = %job.id))]
    pub async fn run_job(
        &self,
        job: IndexingJob,
        access_token: Option<String>,
        correlation_id: &CorrelationId,
    ) -> IndexerResult<IndexingJob> {
        let job = self.jobs.start(job).await?;
        let project = self.projects.get(job.project_id).await?;

        match self.execute(&project, &job, access_token.as_deref(), correlation_id).await {
            Ok(completed) => Ok(self.jobs.complete(completed).await?),
            Err(err) => {
                tracing::warn!(error = %err, "indexing job failed");
                Ok(self.jobs.fail(job, err.to_string()).await?)
            }
        }
    }

    async fn execute(
        &self,
        project: &CodebaseProject,
        job: &IndexingJob,
        access_token: Option<&str>,
        correlation_id: &CorrelationId,
    ) -> IndexerResult<IndexingJob> {
        let repo = parse_repository_url(&project.repository_url)?;
        let commit_sha =
            self.with_retries(|| self.host.resolve_branch(&repo, &project.repository_branch, access_token)).await?;

        let tree = self.with_retries(|| self.host.fetch_tree(&repo, &commit_sha, access_token)).await?;
        let languages = self.with_retries(|| self.host.fetch_languages(&repo, access_token)).await.unwrap_or_default();

        let current = build_tree(&tree);
        let previous = self.merkle_cache.get(&project.id).map(|v| v.clone()).unwrap_or_default();
        let changed_paths = diff_leaves(&previous, &current.leaves);

        let mut job = job.clone();
        let blobs: Vec<&TreeEntry> = tree.iter().filter(|e| e.is_blob() && changed_paths.contains(&e.path)).collect();
        job.files_to_process = u32::try_from(blobs.len()).unwrap_or(u32::MAX);
        job = self.jobs.save_progress(job).await?;

        for batch in blobs.chunks(self.settings.batch_size.max(1)) {
            if self.shutdown.load(Ordering::SeqCst) {
                tracing::info!("shutdown requested, stopping before next batch");
                break;
            }

            let results = futures::future::join_all(
                batch.iter().map(|entry| self.index_one_file(&repo, entry, access_token, project.id, correlation_id)),
            )
            .await;

            for (entry, result) in batch.iter().zip(results) {
                match result {
                    Ok(chunks_created) => {
                        job.files_processed += 1;
                        job.chunks_created += chunks_created;
                        job.embeddings_generated += chunks_created;
                    }
                    Err(err) => {
                        tracing::warn!(path = %entry.path, error = %err, "skipping file after failure");
                    }
                }
            }
            job = self.jobs.save_progress(job).await?;

            sleep(self.settings.inter_batch_delay).await;
        }

        self.merkle_cache.insert(project.id, current.leaves.clone());

        let mut updated = project.clone();
        updated.merkle_root_hash = Some(current.root_hash);
        updated.total_files = u32::try_from(tree.iter().filter(|e| e.is_blob()).count()).unwrap_or(u32::MAX);
        updated.indexed_files = updated.total_files;
        updated.total_chunks = self.index.chunk_count(project.id).await?.try_into().unwrap_or(u32::MAX);
        updated.indexing_status = IndexingStatus::Completed;
        updated.indexing_progress = 100;
        updated.languages = languages;
        self.projects.update(updated).await?;

        Ok(job)
    }

    async fn index_one_file(
        &self,
        repo: &RepositoryRef,
        entry: &TreeEntry,
        access_token: Option<&str>,
        project_id: Uuid,
        correlation_id: &CorrelationId,
    ) -> IndexerResult<u32> {
        let bytes = self.host.fetch_content(repo, &entry.sha, access_token).await?;
        let Ok(content) = String::from_utf8(bytes) else {
            tracing::debug!(path = %entry.path, "skipping non-UTF-8 file");
            return Ok(0);
        };

        let extension = entry.path.rsplit('.').next().unwrap_or("");
        let language = get_language_from_extension(extension).unwrap_or("text");
        let file_hash = leaf_hash(&entry.path, &entry.sha, entry.size.unwrap_or(0));

        let file = CodeFile {
            id: Uuid::new_v4(),
            project_id,
            file_path: entry.path.clone(),
            file_hash,
            file_size: entry.size.unwrap_or_else(|| content.len() as u64),
            language: Some(language.to_string()),
            is_parsed: true,
            parse_error: None,
        };
        let file = self.index.upsert_file(file).await?;

        let sized_chunks = self.chunker.chunk(&content, language)?;
        if sized_chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = sized_chunks.iter().map(|c| c.chunk.content.as_str()).collect();
        let vectors = self.embeddings.generate_embeddings(texts).await?;

        let mut records = Vec::with_capacity(sized_chunks.len());
        let mut points = Vec::with_capacity(sized_chunks.len());
        for (sized, vector) in sized_chunks.into_iter().zip(vectors) {
            let chunk_id = generate_chunk_id(project_id, &entry.path, sized.chunk.byte_start, sized.chunk.byte_end);
            let content_hash = hash_content(&sized.chunk.content);
            let chunk_type = format!("{:?}", sized.chunk.chunk_type).to_lowercase();

            records.push(CodeChunkRecord {
                id: chunk_id,
                project_id,
                file_path: entry.path.clone(),
                start_line: sized.chunk.start_line,
                end_line: sized.chunk.end_line,
                content: sized.chunk.content.clone(),
                content_hash,
                chunk_type: chunk_type.clone(),
                language: language.to_string(),
                symbols: sized.chunk.symbols.clone(),
                imports: sized.chunk.imports.clone(),
                token_count: u32::try_from(sized.token_count).unwrap_or(u32::MAX),
            });
            points.push(ChunkPoint {
                chunk_id,
                project_id,
                file_path: entry.path.clone(),
                content: sized.chunk.content,
                start_line: sized.chunk.start_line,
                end_line: sized.chunk.end_line,
                chunk_type,
                language: language.to_string(),
                first_symbol: sized.chunk.symbols.into_iter().next(),
                embedding: vector,
            });
        }

        let created = u32::try_from(records.len()).unwrap_or(u32::MAX);
        self.index.replace_chunks(project_id, &file.file_path, records).await?;
        self.vectors.upsert(&points, correlation_id).await?;

        Ok(created)
    }

    /// Exponential backoff retry around a transient-failure-prone call
    /// (§4.2 "Retries & fatals"): up to `max_retries` additional attempts,
    /// doubling the delay each time, only for errors [`is_retryable`] deems
    /// transient.
    async fn with_retries<F, Fut, T>(&self, make_call: F) -> IndexerResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = IndexerResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match make_call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.settings.max_retries && is_retryable(&err) => {
                    let delay = Duration::from_millis(100) * 2_u32.pow(attempt);
                    tracing::warn!(attempt, ?delay, error = %err, "transient indexing failure, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::RepositoryJobQueue;
    use prd_embeddings::{DefaultEmbeddingService, MockEmbeddingProvider};
    use prd_store::{CodebaseProjectRepository, IndexingJobRepository, JobType, MockStore};
    use prd_vector_data::MockStorage;
    use std::collections::HashMap;

    struct FixtureHost {
        tree: Vec<TreeEntry>,
        contents: HashMap<String, Vec<u8>>,
    }

    #[async_trait::async_trait]
    impl RepositoryHost for FixtureHost {
        async fn resolve_branch(
            &self,
            _repo: &RepositoryRef,
            _branch: &str,
            _access_token: Option<&str>,
        ) -> IndexerResult<String> {
            Ok("deadbeef".to_string())
        }

        async fn fetch_tree(
            &self,
            _repo: &RepositoryRef,
            _commit_sha: &str,
            _access_token: Option<&str>,
        ) -> IndexerResult<Vec<TreeEntry>> {
            Ok(self.tree.clone())
        }

        async fn fetch_content(
            &self,
            _repo: &RepositoryRef,
            sha: &str,
            _access_token: Option<&str>,
        ) -> IndexerResult<Vec<u8>> {
            let path = self
                .tree
                .iter()
                .find(|entry| entry.sha == sha)
                .map(|entry| entry.path.as_str())
                .ok_or_else(|| IndexerError::NotFound(sha.to_string()))?;
            self.contents.get(path).cloned().ok_or_else(|| IndexerError::NotFound(sha.to_string()))
        }

        async fn fetch_languages(
            &self,
            _repo: &RepositoryRef,
            _access_token: Option<&str>,
        ) -> IndexerResult<HashMap<String, u64>> {
            Ok(HashMap::from([("Rust".to_string(), 42)]))
        }
    }

    fn fixture_host() -> FixtureHost {
        let tree = vec![TreeEntry {
            path: "src/lib.rs".to_string(),
            mode: "100644".to_string(),
            entry_type: "blob".to_string(),
            sha: "sha-lib".to_string(),
            size: Some(40),
        }];
        let contents =
            HashMap::from([("src/lib.rs".to_string(), b"fn hello() {\n    println!(\"hi\");\n}\n".to_vec())]);
        FixtureHost { tree, contents }
    }

    fn worker(host: FixtureHost, store: Arc<MockStore>) -> BackgroundWorker {
        let embeddings =
            Arc::new(DefaultEmbeddingService::with_provider(Arc::new(MockEmbeddingProvider::new(1536)), 10));
        BackgroundWorker::new(
            Arc::new(host),
            store.clone(),
            store.clone(),
            Arc::new(MockStorage::new()),
            embeddings,
            Arc::new(RepositoryJobQueue::new(store)),
            WorkerSettings {
                batch_size: 10,
                inter_batch_delay: Duration::from_millis(0),
                max_retries: 3,
                embedding_model: "text-embedding-3-small".to_string(),
            },
        )
        .expect("chunking service initializes")
    }

    #[tokio::test]
    async fn initial_index_chunks_and_embeds_every_blob() {
        let store = Arc::new(MockStore::new());
        let project = prd_store::CodebaseProject::new(
            "https://github.com/acme/widgets".to_string(),
            "main".to_string(),
            "github".to_string(),
        );
        let project = CodebaseProjectRepository::create(&*store, project).await.unwrap();
        let job = IndexingJobRepository::create(&*store, IndexingJob::new(project.id, JobType::InitialIndex, 3))
            .await
            .unwrap();

        let worker = worker(fixture_host(), store.clone());
        let correlation_id = CorrelationId::new();
        let completed = worker.run_job(job, None, &correlation_id).await.unwrap();

        assert_eq!(completed.status, prd_store::JobStatus::Completed);
        assert_eq!(completed.files_processed, 1);
        assert!(completed.chunks_created > 0);

        let updated_project = CodebaseProjectRepository::get(&*store, project.id).await.unwrap();
        assert_eq!(updated_project.indexing_status, IndexingStatus::Completed);
        assert!(updated_project.merkle_root_hash.is_some());
    }

    #[tokio::test]
    async fn reindex_with_no_changes_processes_nothing() {
        let store = Arc::new(MockStore::new());
        let project = prd_store::CodebaseProject::new(
            "https://github.com/acme/widgets".to_string(),
            "main".to_string(),
            "github".to_string(),
        );
        let project = CodebaseProjectRepository::create(&*store, project).await.unwrap();
        let first_job =
            IndexingJobRepository::create(&*store, IndexingJob::new(project.id, JobType::InitialIndex, 3))
                .await
                .unwrap();

        let worker = worker(fixture_host(), store.clone());
        let correlation_id = CorrelationId::new();
        worker.run_job(first_job, None, &correlation_id).await.unwrap();

        let second_job = IndexingJobRepository::create(
            &*store,
            IndexingJob::new(project.id, JobType::IncrementalUpdate, 3),
        )
        .await
        .unwrap();
        let completed = worker.run_job(second_job, None, &correlation_id).await.unwrap();
        assert_eq!(completed.files_processed, 0);
    }
}
