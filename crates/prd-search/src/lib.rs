//! RAG Retriever: embeds a PRD's title/description and searches an indexed
//! codebase for relevant chunks (§4.3).

pub mod error;
pub mod searching;

pub use error::SearchError;
pub use searching::{RagRetriever, RetrievalResult, RetrievedChunk, Search, build_query};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_mocks {
    pub use crate::searching::test_utils::MockSearch;
}
