//! Chunking service: wires [`crate::parsing::ContentParser`] to a
//! [`TokenCounter`] so every emitted chunk carries a `token_count` (§3
//! `CodeChunk.tokenCount`).

mod tiktoken_counter;
mod traits;

pub use tiktoken_counter::TiktokenCounter;
pub use traits::{CodeSpan, TokenBudget, TokenCounter};

use crate::ParsingResult;
use crate::parsing::{CodeParser, ContentParser};
use std::collections::HashMap;
use std::sync::Arc;

/// A parsed, token-counted chunk ready for persistence as a `CodeChunk` row.
#[derive(Debug, Clone)]
pub struct SizedChunk {
    pub chunk: crate::parsing::CodeChunk,
    pub token_count: usize,
}

/// Registry of [`TokenCounter`]s keyed by model name, so the chunking service
/// can select the counter matching the active embedding model.
#[derive(Default)]
pub struct TokenCounterRegistry {
    counters: HashMap<String, Arc<dyn TokenCounter>>,
}

impl TokenCounterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
        }
    }

    pub fn register(&mut self, counter: Arc<dyn TokenCounter>) {
        self.counters.insert(counter.name().to_string(), counter);
    }

    #[must_use]
    pub fn get(&self, model_name: &str) -> Option<Arc<dyn TokenCounter>> {
        self.counters.get(model_name).cloned()
    }
}

/// Parses file content and attaches a token count to each chunk.
pub struct ChunkingService {
    parser: Arc<dyn CodeParser>,
    counter: Arc<dyn TokenCounter>,
}

impl ChunkingService {
    #[must_use]
    pub fn new(parser: Arc<dyn CodeParser>, counter: Arc<dyn TokenCounter>) -> Self {
        Self { parser, counter }
    }

    /// Build a service backed by the default tree-sitter parser and a
    /// tiktoken counter for `embedding_model`.
    ///
    /// # Errors
    /// Returns an error if the tiktoken encoder for `embedding_model` fails to load.
    pub fn with_defaults(embedding_model: &str, max_tokens: usize) -> ParsingResult<Self> {
        let counter = TiktokenCounter::new(embedding_model, max_tokens)
            .map_err(|e| crate::ParsingError::TokenCountingError(e.to_string()))?;
        Ok(Self::new(Arc::new(ContentParser::new()), Arc::new(counter)))
    }

    /// Chunk `content` and attach a token count to each resulting chunk.
    ///
    /// # Errors
    /// Returns a [`crate::ParsingError`] if the underlying parser fails.
    pub fn chunk(&self, content: &str, language: &str) -> ParsingResult<Vec<SizedChunk>> {
        let chunks = self.parser.parse(content, language)?;
        Ok(chunks
            .into_iter()
            .map(|chunk| {
                let token_count = self.counter.count(&chunk.content);
                SizedChunk { chunk, token_count }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_attaches_token_counts() {
        let service = ChunkingService::with_defaults("text-embedding-3-small", 8191).unwrap();
        let chunks = service
            .chunk("fn hello() {\n    println!(\"hi\");\n}\n", "rust")
            .unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.token_count > 0));
    }
}
