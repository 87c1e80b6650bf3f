//! Tree-sitter backed source chunking.
//!
//! Produces [`CodeChunk`] values whose `chunk_type` reflects the surrounding
//! syntactic declaration (§3 `CodeChunk`). When a language has no tree-sitter
//! query (or a unit can't be matched), chunking falls back to size-based
//! windows with overlap, per §4.2 "Chunking".

mod languages;

pub use languages::{LanguageConfig, get_language_config, get_language_from_extension};

use crate::{ParsingError, ParsingResult};
use tree_sitter::{Parser, Query, QueryCursor, StreamingIterator};

/// The closed chunk-type enum from §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Function,
    Class,
    Struct,
    Enum,
    Module,
    Interface,
    Comment,
    Other,
}

impl ChunkType {
    /// Map a tree-sitter capture name (e.g. `@function`, `@struct`) to the closed enum.
    #[must_use]
    pub fn from_capture_name(name: &str) -> Self {
        match name {
            "function" | "method" => Self::Function,
            "class" => Self::Class,
            "struct" => Self::Struct,
            "enum" => Self::Enum,
            "module" | "namespace" => Self::Module,
            "interface" | "trait" | "impl" => Self::Interface,
            "comment" => Self::Comment,
            _ => Self::Other,
        }
    }
}

/// A single chunk of source produced by [`ContentParser`].
///
/// Byte offsets are kept alongside line numbers so a caller (the indexer) can
/// derive a deterministic content hash and a stable chunk identity without
/// re-scanning the file.
#[derive(Debug, Clone)]
pub struct CodeChunk {
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub byte_start: usize,
    pub byte_end: usize,
    pub chunk_type: ChunkType,
    pub language: String,
    /// Declared names found in this chunk (function/struct/class names, etc).
    pub symbols: Vec<String>,
    /// Module/import references found in this chunk.
    pub imports: Vec<String>,
}

/// Parses file content into chunks. One implementation per parsing strategy
/// (tree-sitter-backed, or plain size-based fallback).
pub trait CodeParser: Send + Sync {
    /// Parse `content` (the full file body) for `language` into chunks.
    ///
    /// # Errors
    /// Returns [`ParsingError::TreeSitterError`] if the grammar fails to load.
    fn parse(&self, content: &str, language: &str) -> ParsingResult<Vec<CodeChunk>>;
}

/// Default parser: tree-sitter when a grammar + query are registered for the
/// language, size-based windows with overlap otherwise.
#[derive(Debug, Default)]
pub struct ContentParser {
    /// Target window size (in bytes) for size-based fallback chunking.
    pub fallback_window_bytes: usize,
    /// Overlap (in bytes) between consecutive fallback windows.
    pub fallback_overlap_bytes: usize,
}

impl ContentParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fallback_window_bytes: 2000,
            fallback_overlap_bytes: 200,
        }
    }

    fn parse_with_tree_sitter(
        &self,
        content: &str,
        language: &str,
        config: &LanguageConfig,
    ) -> ParsingResult<Option<Vec<CodeChunk>>> {
        let (Some(ts_language), Some(query_src)) =
            (config.tree_sitter_language.clone(), config.tree_sitter_query)
        else {
            return Ok(None);
        };

        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ParsingError::TreeSitterError(e.to_string()))?;

        let Some(tree) = parser.parse(content, None) else {
            return Ok(None);
        };

        let query = Query::new(&ts_language, query_src)
            .map_err(|e| ParsingError::QueryCompilationError(e.to_string()))?;

        let mut cursor = QueryCursor::new();
        let mut chunks = Vec::new();
        let bytes = content.as_bytes();
        let mut matches = cursor.matches(&query, tree.root_node(), bytes);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                let capture_name = &query.capture_names()[capture.index as usize];
                let byte_start = node.start_byte();
                let byte_end = node.end_byte();
                let Some(text) = content.get(byte_start..byte_end) else {
                    continue;
                };
                chunks.push(CodeChunk {
                    content: text.to_string(),
                    start_line: u32::try_from(node.start_position().row).unwrap_or(u32::MAX) + 1,
                    end_line: u32::try_from(node.end_position().row).unwrap_or(u32::MAX) + 1,
                    byte_start,
                    byte_end,
                    chunk_type: ChunkType::from_capture_name(capture_name),
                    language: language.to_string(),
                    symbols: extract_symbols(text, config),
                    imports: extract_imports(content, config),
                });
            }
        }

        chunks.sort_by_key(|c| c.byte_start);
        chunks.dedup_by_key(|c| (c.byte_start, c.byte_end));
        Ok(Some(chunks))
    }

    fn parse_size_based(&self, content: &str, language: &str) -> Vec<CodeChunk> {
        if content.is_empty() {
            return Vec::new();
        }
        let bytes = content.as_bytes();
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let step = self
            .fallback_window_bytes
            .saturating_sub(self.fallback_overlap_bytes)
            .max(1);

        while start < bytes.len() {
            let end = (start + self.fallback_window_bytes).min(bytes.len());
            let slice_end = find_char_boundary(content, end);
            let slice_start = find_char_boundary(content, start);
            if slice_start >= slice_end {
                break;
            }
            let text = &content[slice_start..slice_end];
            chunks.push(CodeChunk {
                content: text.to_string(),
                start_line: count_lines(content, slice_start) + 1,
                end_line: count_lines(content, slice_end) + 1,
                byte_start: slice_start,
                byte_end: slice_end,
                chunk_type: ChunkType::Other,
                language: language.to_string(),
                symbols: Vec::new(),
                imports: Vec::new(),
            });
            if slice_end >= bytes.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

impl CodeParser for ContentParser {
    fn parse(&self, content: &str, language: &str) -> ParsingResult<Vec<CodeChunk>> {
        if let Some(config) = get_language_config(language) {
            if let Some(chunks) = self.parse_with_tree_sitter(content, language, config)? {
                if !chunks.is_empty() {
                    return Ok(chunks);
                }
            }
        }
        Ok(self.parse_size_based(content, language))
    }
}

fn find_char_boundary(content: &str, mut idx: usize) -> usize {
    idx = idx.min(content.len());
    while idx < content.len() && !content.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

fn count_lines(content: &str, upto_byte: usize) -> u32 {
    u32::try_from(content.as_bytes()[..upto_byte].iter().filter(|&&b| b == b'\n').count())
        .unwrap_or(u32::MAX)
}

/// Pull a declared name out of a captured declaration using the language's
/// recognized declaration keywords. Best-effort: returns an empty vec rather
/// than failing when nothing is inferable, matching §4.2's "when inferable".
fn extract_symbols(text: &str, config: &LanguageConfig) -> Vec<String> {
    let first_line = text.lines().next().unwrap_or_default();
    let mut symbols = Vec::new();
    for keyword in config.function_keywords.iter().chain(config.class_keywords) {
        if let Some(pos) = first_line.find(keyword) {
            let rest = &first_line[pos + keyword.len()..];
            let name: String = rest
                .trim_start()
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if !name.is_empty() {
                symbols.push(name);
            }
        }
    }
    symbols
}

/// Best-effort import/module-reference extraction for the whole file, scoped
/// to lines that look like import statements for the language family.
fn extract_imports(content: &str, config: &LanguageConfig) -> Vec<String> {
    let markers: &[&str] = if config.uses_indentation {
        &["import ", "from "]
    } else {
        &["use ", "import ", "#include", "require("]
    };
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            markers.iter().any(|m| trimmed.starts_with(m))
        })
        .map(str::trim)
        .map(ToString::to_string)
        .take(50)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_based_fallback_covers_whole_content() {
        let parser = ContentParser::new();
        let content = "a".repeat(5000);
        let chunks = parser.parse(&content, "unknown-language").unwrap();
        assert!(!chunks.is_empty());
        assert_eq!(chunks.last().unwrap().byte_end, content.len());
    }

    #[test]
    fn rust_function_is_chunked_as_function() {
        let parser = ContentParser::new();
        let content = "fn hello() {\n    println!(\"hi\");\n}\n";
        let chunks = parser.parse(content, "rust").unwrap();
        assert!(chunks.iter().any(|c| c.chunk_type == ChunkType::Function));
    }
}
