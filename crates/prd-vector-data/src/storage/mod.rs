pub mod mock;
pub mod qdrant;
pub mod traits;

pub use mock::MockStorage;
pub use qdrant::QdrantStorage;
pub use traits::{ChunkPoint, SimilarChunk, StorageStats, VectorStorage};
