//! The composition root: builds every domain crate's concrete collaborator
//! and wires them into the ports `prd-engine`, `prd-indexing`, and
//! `prd-session` depend on. This is the one place in the workspace allowed to
//! name a concrete adapter type directly.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use prd_config::ApplicationConfig;
use prd_embeddings::{DefaultEmbeddingProvider, DefaultEmbeddingService, EmbeddingService, MockEmbeddingProvider};
use prd_engine::ClarificationEngine;
use prd_indexing::{
    BackgroundWorker, CodebaseIndexer, DefaultCodebaseIndexer, GitHubRepositoryHost, JobQueue,
    RepositoryJobQueue, WorkerSettings,
};
use prd_mockup::{MockMockupStorage, MockupAnalyzer, MockupStorage};
use prd_providers::{LLMProvider, Orchestrator};
use prd_search::{RagRetriever, Search};
use prd_store::{
    CodeIndexRepository, CodebaseLinkRepository, CodebaseProjectRepository, IndexingJobRepository,
    MockStore, MockupRepository, PRDDocumentRepository, PRDRequestRepository, PgStore, PoolConfig,
    PoolManager,
};
use prd_vector_data::{MockStorage, QdrantStorage, VectorStorage};

use crate::provider::{HttpLlmProvider, HttpProviderSettings};

/// Every collaborator a command handler needs, built once at startup.
pub struct Collaborators {
    pub requests: Arc<dyn PRDRequestRepository>,
    pub documents: Arc<dyn PRDDocumentRepository>,
    pub mockups: Arc<dyn MockupRepository>,
    pub codebase_links: Arc<dyn CodebaseLinkRepository>,
    pub codebase_projects: Arc<dyn CodebaseProjectRepository>,
    pub code_index: Arc<dyn CodeIndexRepository>,
    pub jobs: Arc<dyn IndexingJobRepository>,
    pub engine: Arc<ClarificationEngine>,
    pub indexer: Arc<dyn CodebaseIndexer>,
    pub worker: Arc<BackgroundWorker>,
}

/// Build every collaborator from `config`, branching on
/// `config.database.skip_database` for the storage backends.
///
/// # Errors
/// Returns an error if a Postgres pool or the Qdrant client cannot be built.
pub async fn build(config: &ApplicationConfig) -> anyhow::Result<Collaborators> {
    let (requests, documents, mockups, codebase_links, codebase_projects, code_index, jobs) =
        build_repositories(config).await?;

    let vector_storage = build_vector_storage(config).await?;
    let embedding_service = build_embedding_service(config);
    let retriever: Arc<dyn RagRetriever> = Arc::new(Search::new(embedding_service.clone(), vector_storage.clone()));

    let llm_providers = build_llm_providers(config);
    let mockup_llm_provider = llm_providers.first().cloned().unwrap_or_else(fallback_llm_provider);
    let orchestrator = Arc::new(Orchestrator::new(llm_providers, config.providers.clone()));

    let mockup_storage: Arc<dyn MockupStorage> = Arc::new(MockMockupStorage::new());
    let mockup_analyzer = Arc::new(MockupAnalyzer::new(
        requests.clone(),
        mockups.clone(),
        mockup_storage,
        mockup_llm_provider,
    ));

    let engine = Arc::new(ClarificationEngine::new(
        requests.clone(),
        documents.clone(),
        mockups.clone(),
        codebase_links.clone(),
        codebase_projects.clone(),
        mockup_analyzer,
        retriever,
        orchestrator,
        config.clarification.clone(),
        config.context.clone(),
    ));

    let job_queue = Arc::new(RepositoryJobQueue::new(jobs.clone()));
    let indexer: Arc<dyn CodebaseIndexer> = Arc::new(DefaultCodebaseIndexer::new(
        codebase_projects.clone(),
        job_queue.clone(),
        config.indexing.max_retries,
    ));

    let worker = Arc::new(
        BackgroundWorker::new(
            Arc::new(GitHubRepositoryHost::new()),
            codebase_projects.clone(),
            code_index.clone(),
            vector_storage,
            embedding_service,
            job_queue,
            WorkerSettings {
                batch_size: config.indexing.batch_size,
                inter_batch_delay: Duration::from_millis(config.indexing.inter_batch_delay_ms),
                max_retries: config.indexing.max_retries,
                embedding_model: config.indexing.embedding_model.clone(),
            },
        )
        .context("building background indexing worker")?,
    );

    Ok(Collaborators {
        requests,
        documents,
        mockups,
        codebase_links,
        codebase_projects,
        code_index,
        jobs,
        engine,
        indexer,
        worker,
    })
}

type Repositories = (
    Arc<dyn PRDRequestRepository>,
    Arc<dyn PRDDocumentRepository>,
    Arc<dyn MockupRepository>,
    Arc<dyn CodebaseLinkRepository>,
    Arc<dyn CodebaseProjectRepository>,
    Arc<dyn CodeIndexRepository>,
    Arc<dyn IndexingJobRepository>,
);

async fn build_repositories(config: &ApplicationConfig) -> anyhow::Result<Repositories> {
    if config.database.skip_database {
        let store = Arc::new(MockStore::new());
        return Ok((
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        ));
    }

    let pools = PoolManager::new(&config.database, PoolConfig::default())
        .await
        .context("connecting to postgres")?;
    let store = Arc::new(PgStore::new(pools));
    Ok((
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    ))
}

async fn build_vector_storage(config: &ApplicationConfig) -> anyhow::Result<Arc<dyn VectorStorage>> {
    if config.database.skip_database {
        return Ok(Arc::new(MockStorage::new()));
    }
    let url = std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());
    let storage = QdrantStorage::new(url, "prd_builder_chunks".to_string())
        .await
        .context("connecting to qdrant")?;
    Ok(Arc::new(storage))
}

fn build_embedding_service(config: &ApplicationConfig) -> Arc<dyn EmbeddingService> {
    if config.database.skip_database {
        let provider = Arc::new(MockEmbeddingProvider::new(config.indexing.embedding_dimensions));
        return Arc::new(DefaultEmbeddingService::with_provider(provider, config.indexing.batch_size));
    }
    let provider = Arc::new(DefaultEmbeddingProvider::new(config.indexing.embedding_model.clone(), 8191));
    Arc::new(DefaultEmbeddingService::with_provider(provider, config.indexing.batch_size))
}

/// One `HttpLlmProvider` per configured API key (§6 "Provider configuration").
/// `config.providers.api_keys` is keyed by the lower-cased env-var prefix
/// (e.g. `anthropic` from `ANTHROPIC_API_KEY`); `{PREFIX}_API_BASE` and
/// `{PREFIX}_MODEL` customize the endpoint and model per provider.
fn build_llm_providers(config: &ApplicationConfig) -> Vec<Arc<dyn LLMProvider>> {
    config
        .providers
        .api_keys
        .iter()
        .map(|(name, api_key)| {
            let upper = name.to_uppercase();
            let api_base = std::env::var(format!("{upper}_API_BASE"))
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
            let model = std::env::var(format!("{upper}_MODEL")).unwrap_or_else(|_| "gpt-4o-mini".to_string());
            let settings = HttpProviderSettings {
                name: name.clone(),
                priority: 50,
                max_privacy_level: config.providers.max_privacy_level,
                api_base,
                model,
                api_key: api_key.clone(),
            };
            Arc::new(HttpLlmProvider::new(settings)) as Arc<dyn LLMProvider>
        })
        .collect()
}

fn fallback_llm_provider() -> Arc<dyn LLMProvider> {
    let settings = HttpProviderSettings {
        name: std::env::var("LLM_PROVIDER_NAME").unwrap_or_else(|_| "default".to_string()),
        priority: 50,
        max_privacy_level: prd_config::PrivacyLevel::External,
        api_base: std::env::var("LLM_API_BASE").unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        api_key: std::env::var("LLM_API_KEY").unwrap_or_default(),
    };
    Arc::new(HttpLlmProvider::new(settings))
}
