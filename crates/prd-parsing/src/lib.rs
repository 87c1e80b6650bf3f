//! Tree-sitter based source parsing and token-budgeted chunking.
//!
//! Feeds the codebase indexer (§4.2): turns raw file content into
//! [`parsing::CodeChunk`] values whose `chunk_type` reflects the surrounding
//! declaration, then [`chunking::ChunkingService`] attaches a token count to
//! each one.

pub mod chunking;
pub mod error;
pub mod parsing;

pub use chunking::{
    ChunkingService, CodeSpan, SizedChunk, TokenBudget, TokenCounter, TokenCounterRegistry,
};
pub use error::{ParsingError, ParsingResult};
pub use parsing::{ChunkType, CodeChunk, CodeParser, ContentParser, get_language_from_extension};
