//! Closed error taxonomy for the Mockup Analyzer (§4.4, §7).

use prd_common::{Classified, ErrorKind};
use thiserror::Error;

/// Errors surfaced by [`crate::MockupAnalyzer`] and its [`crate::MockupStorage`] port.
#[derive(Debug, Error)]
pub enum MockupError {
    /// The linked PRD request does not exist (§4.4 "strict prerequisite").
    #[error("request not found: {0}")]
    RequestNotFound(uuid::Uuid),

    /// The mockup upload itself does not exist.
    #[error("mockup upload not found: {0}")]
    UploadNotFound(uuid::Uuid),

    /// The storage backend rejected or failed the operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// The vision-capable provider failed to analyze the image.
    #[error("provider error: {0}")]
    Provider(#[from] prd_providers::ProviderError),

    /// The request/document store failed.
    #[error("store error: {0}")]
    Store(#[from] prd_store::StoreError),

    /// A previously stored `analysisResult` could not be parsed back into a
    /// [`prd_providers::MockupAnalysis`] for consolidation or context-building.
    #[error("malformed stored analysis: {0}")]
    MalformedAnalysis(#[from] serde_json::Error),
}

impl Classified for MockupError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestNotFound(_) | Self::UploadNotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::ProcessingFailed,
            Self::Provider(err) => err.kind(),
            Self::Store(err) => err.kind(),
            Self::MalformedAnalysis(_) => ErrorKind::ProcessingFailed,
        }
    }
}

/// Result alias used throughout `prd-mockup`.
pub type MockupResult<T> = Result<T, MockupError>;
