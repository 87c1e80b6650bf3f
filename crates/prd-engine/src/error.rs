//! Closed error taxonomy for the Clarification & Generation Engine (§4.7, §7).

use prd_common::{Classified, ErrorKind};
use thiserror::Error;

/// Errors surfaced by [`crate::ClarificationEngine::run`] and
/// [`crate::ClarificationEngine::resume`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request/document store failed.
    #[error("store error: {0}")]
    Store(#[from] prd_store::StoreError),

    /// The provider orchestrator exhausted its fallback chain.
    #[error("provider error: {0}")]
    Provider(#[from] prd_providers::ProviderError),

    /// The mockup analyzer failed.
    #[error("mockup error: {0}")]
    Mockup(#[from] prd_mockup::MockupError),

    /// The RAG retriever failed.
    #[error("search error: {0}")]
    Search(#[from] prd_search::SearchError),
}

impl Classified for EngineError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(err) => err.kind(),
            Self::Provider(err) => err.kind(),
            Self::Mockup(err) => err.kind(),
            Self::Search(err) => err.kind(),
        }
    }
}

/// Result alias used throughout `prd-engine`.
pub type EngineResult<T> = Result<T, EngineError>;
