//! The Context Pipeline (§4.5): a pure function of its inputs and the
//! `ApplicationConfig`-sourced budget constants. No I/O, no suspension
//! points — mirrors the donor's stateless `ChunkingService`/`TokenCounter`
//! split from the stateful subsystems around it.

use prd_config::ContextBudgetConfig;

use crate::chunk::{
    Chunk, ChunkKind, code_file_chunks, clarification_chunks, codebase_overview_chunk, core_chunk,
    mockup_chunks,
};
use crate::condense::condense;
use crate::inputs::ContextInputs;
use crate::multi_turn::{Turn, build_turns};
use crate::strategy::{ContextStrategy, select_strategy};

/// The pipeline's output: the strategy it chose, plus the delivery payload
/// that strategy implies.
#[derive(Debug, Clone)]
pub enum BuiltContext {
    /// One Markdown block, chunks concatenated in priority order.
    SinglePass(String),
    /// A turn sequence to be injected sequentially (§4.5.a).
    MultiTurn(Vec<Turn>),
    /// One condensed Markdown block (§4.5.b).
    Summarized(String),
}

impl BuiltContext {
    #[must_use]
    pub const fn strategy(&self) -> ContextStrategy {
        match self {
            Self::SinglePass(_) => ContextStrategy::SinglePass,
            Self::MultiTurn(_) => ContextStrategy::MultiTurn,
            Self::Summarized(_) => ContextStrategy::Summarized,
        }
    }
}

/// Build the priority-ordered chunk sequence for `inputs` (§4.5 "Chunking").
/// Exposed separately from [`build_context`] so callers (and tests) can
/// inspect the chunk breakdown the strategy decision was based on.
#[must_use]
pub fn build_chunks(inputs: &ContextInputs, cfg: &ContextBudgetConfig) -> Vec<Chunk> {
    let mut chunks = vec![core_chunk(&inputs.title, &inputs.description)];
    chunks.extend(clarification_chunks(&inputs.clarifications, cfg));
    for (index, analysis) in inputs.mockup_analyses.iter().enumerate() {
        chunks.extend(mockup_chunks(index, analysis, cfg));
    }
    if let Some(overview) = &inputs.codebase_overview {
        chunks.push(codebase_overview_chunk(overview));
    }
    chunks.extend(code_file_chunks(&inputs.code_files, cfg));
    chunks
}

/// Build the full context for one generation call: chunk, select a
/// strategy, then render the strategy's delivery payload (§4.5).
#[must_use]
pub fn build_context(inputs: &ContextInputs, cfg: &ContextBudgetConfig) -> BuiltContext {
    let chunks = build_chunks(inputs, cfg);
    match select_strategy(&chunks, cfg) {
        ContextStrategy::SinglePass => {
            let joined = chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join("\n\n");
            BuiltContext::SinglePass(joined)
        }
        ContextStrategy::MultiTurn => BuiltContext::MultiTurn(build_turns(&chunks)),
        ContextStrategy::Summarized => BuiltContext::Summarized(condense(&chunks)),
    }
}

/// Whether a chunk kind survives condensation verbatim (§4.5.b) — exposed so
/// callers can reason about what condensation can and can't discard.
#[must_use]
pub const fn is_preserved_verbatim(kind: ChunkKind) -> bool {
    !kind.summarizable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prd_providers::{ClarificationAnswer, MockupAnalysis, RelevantFile};

    fn cfg() -> ContextBudgetConfig {
        ContextBudgetConfig {
            context_window_tokens: 4096,
            system_reserve_tokens: 500,
            per_chunk_target_tokens: 2500,
            multi_turn_max_chunks: 10,
            code_excerpt_chars: 800,
        }
    }

    #[test]
    fn small_input_resolves_to_single_pass() {
        let inputs = ContextInputs {
            title: "Login flow".into(),
            description: "Add OAuth login.".into(),
            ..Default::default()
        };
        let built = build_context(&inputs, &cfg());
        assert_eq!(built.strategy(), ContextStrategy::SinglePass);
        if let BuiltContext::SinglePass(text) = built {
            assert!(text.contains("Login flow"));
        } else {
            panic!("expected single pass");
        }
    }

    #[test]
    fn many_clarifications_and_files_summarize() {
        let clarifications = (0..5)
            .map(|i| ClarificationAnswer { question: format!("Q{i}"), answer: "x".repeat(3000) })
            .collect();
        let code_files = (0..20)
            .map(|i| RelevantFile { file_path: format!("src/f{i}.rs"), excerpt: "y".repeat(1000) })
            .collect();
        let mockup_analyses = (0..5).map(|_| MockupAnalysis { confidence: 0.8, ..Default::default() }).collect();
        let inputs = ContextInputs {
            title: "Big feature".into(),
            description: "z".repeat(200),
            clarifications,
            mockup_analyses,
            codebase_overview: None,
            code_files,
        };
        let built = build_context(&inputs, &cfg());
        assert_eq!(built.strategy(), ContextStrategy::Summarized);
        if let BuiltContext::Summarized(text) = built {
            assert!(text.contains("Integrate the above"));
        } else {
            panic!("expected summarized");
        }
    }
}
