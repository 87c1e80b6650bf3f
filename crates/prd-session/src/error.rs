//! Closed error taxonomy for the Interactive Session (§4.8, §7).

use prd_common::{Classified, ErrorKind};
use thiserror::Error;

/// Errors surfaced by [`crate::SessionActor`] construction or dispatch.
#[derive(Debug, Error)]
pub enum SessionError {
    /// §4.8 "concurrent sessions for the same request are rejected".
    #[error("a session is already active for request {0}")]
    AlreadyActive(uuid::Uuid),

    /// The driven generation ran and failed.
    #[error("engine error: {0}")]
    Engine(#[from] prd_engine::EngineError),

    /// The store rejected a status transition outside the active generation
    /// (e.g. cancelling a request that already reached a terminal state).
    #[error("store error: {0}")]
    Store(#[from] prd_store::StoreError),
}

impl Classified for SessionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyActive(_) => ErrorKind::Conflict,
            Self::Engine(err) => err.kind(),
            Self::Store(err) => err.kind(),
        }
    }
}

/// Result alias used throughout `prd-session`.
pub type SessionResult<T> = Result<T, SessionError>;
