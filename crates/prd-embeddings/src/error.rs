//! Error types for the embedding generator (§6).

use prd_common::{Classified, ErrorKind};
use thiserror::Error;

/// Result type alias for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors produced by an [`crate::EmbeddingProvider`] or [`crate::EmbeddingService`].
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Configuration and environment errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding generation specific errors.
    #[error("embedding generation failed: {0}")]
    Embedding(String),

    /// Network and remote-provider errors.
    #[error("network error: {0}")]
    Network(String),

    /// General I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases.
    #[error("other error: {0}")]
    Other(String),
}

impl EmbeddingError {
    #[must_use]
    pub fn config_error(msg: &str) -> Self {
        Self::Config(msg.to_string())
    }

    #[must_use]
    pub fn generation_error(msg: &str) -> Self {
        Self::Embedding(msg.to_string())
    }
}

impl Classified for EmbeddingError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Validation,
            Self::Embedding(_) | Self::Io(_) | Self::Other(_) => ErrorKind::ProcessingFailed,
            Self::Network(_) => ErrorKind::ProcessingFailed,
        }
    }
}

impl From<anyhow::Error> for EmbeddingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
