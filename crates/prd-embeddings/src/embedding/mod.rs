pub mod service;
pub mod traits;

pub use service::{DefaultEmbeddingProvider, DefaultEmbeddingService, MockEmbeddingProvider, DEFAULT_DIMENSION};
pub use traits::{EmbeddingProvider, EmbeddingService, EmbeddingStats};
