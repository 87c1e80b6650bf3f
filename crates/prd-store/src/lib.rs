//! Request/Document Store: persistence for PRD requests, generated
//! documents, mockup uploads, and the codebase index (§3, §4.1-§4.2).

pub mod chunk_id;
pub mod error;
pub mod migrations;
pub mod mock;
pub mod models;
pub mod pool;
pub mod pool_builder;
pub mod pool_manager;
pub mod repository;
pub mod traits;

pub use chunk_id::{generate_chunk_id, hash_content};
pub use error::{StoreError, StoreResult};
pub use mock::MockStore;
pub use models::*;
pub use pool::{create_pool, initialize_database};
pub use pool_builder::PoolConfigBuilder;
pub use pool_manager::{PoolConfig, PoolManager};
pub use prd_config::DatabaseConfig;
pub use repository::PgStore;
pub use traits::{
    CodeIndexRepository, CodebaseLinkRepository, CodebaseProjectRepository, IndexingJobRepository,
    MockupRepository, PRDDocumentRepository, PRDRequestRepository, RequestFilter,
};
