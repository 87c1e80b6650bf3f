//! Embedding Generator port (§6): turns text into fixed-dimension vectors.
//!
//! Ships a deterministic hash-based [`DefaultEmbeddingProvider`] suitable for
//! tests and offline operation, behind the same [`EmbeddingProvider`] trait a
//! remote API-backed adapter would implement.

pub mod embedding;
pub mod error;

pub use embedding::{
    DEFAULT_DIMENSION, DefaultEmbeddingProvider, DefaultEmbeddingService, EmbeddingProvider,
    EmbeddingService, EmbeddingStats, MockEmbeddingProvider,
};
pub use error::{EmbeddingError, EmbeddingResult};
