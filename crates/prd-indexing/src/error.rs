//! Closed error taxonomy for the Codebase Indexer (§4.2, §7).

use prd_common::{Classified, ErrorKind};
use thiserror::Error;

/// Errors surfaced by [`crate::CodebaseIndexer`] and the background worker.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// A repository URL didn't match `https://github.com/<owner>/<repo>[.git]`
    /// or `git@github.com:<owner>/<repo>.git` (§4.2 "Repository fetch").
    #[error("invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    /// The branch does not exist, or the repository itself was not found.
    #[error("branch or repository not found: {0}")]
    NotFound(String),

    /// The repository host rejected the credential (missing/expired token).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A transient failure from the repository host (network, 5xx, rate-limit)
    /// that has exhausted its retry budget.
    #[error("repository host unavailable: {0}")]
    HostUnavailable(String),

    /// The embedding collaborator failed.
    #[error("embedding error: {0}")]
    Embedding(#[from] prd_embeddings::EmbeddingError),

    /// The vector storage collaborator failed.
    #[error("vector storage error: {0}")]
    VectorStorage(#[from] prd_vector_data::VectorDataError),

    /// The parsing/chunking collaborator failed.
    #[error("parsing error: {0}")]
    Parsing(#[from] prd_parsing::ParsingError),

    /// The request/document store failed.
    #[error("store error: {0}")]
    Store(#[from] prd_store::StoreError),

    /// An HTTP transport failure talking to the repository host.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A job's retry budget (`maxRetries`, default 3) was exhausted.
    #[error("job {job_id} failed permanently after {retries} retries: {reason}")]
    RetriesExhausted {
        job_id: uuid::Uuid,
        retries: u32,
        reason: String,
    },

    /// Anything else, preserved for diagnostics.
    #[error("indexing error: {0}")]
    Other(String),
}

impl Classified for IndexerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRepositoryUrl(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::HostUnavailable(_) | Self::Transport(_) | Self::Other(_) => {
                ErrorKind::ProcessingFailed
            }
            Self::Embedding(e) => e.kind(),
            Self::VectorStorage(e) => e.kind(),
            Self::Parsing(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::RetriesExhausted { .. } => ErrorKind::ProcessingFailed,
        }
    }
}

/// Whether a failure is worth retrying with backoff (§4.2 "Retries & fatals").
#[must_use]
pub fn is_retryable(err: &IndexerError) -> bool {
    matches!(
        err,
        IndexerError::HostUnavailable(_) | IndexerError::Transport(_)
    )
}

/// Result alias used throughout `prd-indexing`.
pub type IndexerResult<T> = Result<T, IndexerError>;
