//! Closed error taxonomy for the Request/Document Store (§4.1, §7).

use prd_common::{Classified, ErrorKind};
use thiserror::Error;

/// Errors surfaced by every repository trait in this crate.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input failed an invariant (missing title, bad priority, oversize upload, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested request/document/upload/project does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A domain rule was violated (e.g. attaching a document without the review tag
    /// while confidence is below threshold).
    #[error("business rule violated: {0}")]
    BusinessRule(String),

    /// Optimistic-concurrency conflict, or a duplicate `(prd, codebase)` link.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The underlying storage backend failed for a reason the caller can retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A `sqlx` driver error that doesn't map to a more specific kind above.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl Classified for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::BusinessRule(_) => ErrorKind::BusinessRule,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unavailable(_) | Self::Sqlx(_) => ErrorKind::ProcessingFailed,
        }
    }
}

/// Result alias used throughout `prd-store`.
pub type StoreResult<T> = Result<T, StoreError>;
