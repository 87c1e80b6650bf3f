//! Codebase Indexer (§4.2): fetches a GitHub repository, builds a Merkle
//! tree of its blobs, chunks and embeds changed files, and persists the
//! result via `prd-store`/`prd-vector-data`.

pub mod error;
pub mod github;
pub mod indexer;
pub mod merkle;
pub mod queue;
pub mod worker;

pub use error::{IndexerError, IndexerResult, is_retryable};
pub use github::{GitHubRepositoryHost, RepositoryHost, RepositoryRef, TreeEntry, parse_repository_url};
pub use indexer::{CodebaseIndexer, DefaultCodebaseIndexer, IndexOutcome};
pub use merkle::{MerkleLeaf, MerkleTree, build_tree, diff_leaves, leaf_hash, root_from_leaves};
pub use queue::{JobQueue, RepositoryJobQueue};
pub use worker::{BackgroundWorker, WorkerSettings};
