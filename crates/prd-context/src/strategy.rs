//! Strategy selection (§4.5 "Strategy selection").

use prd_config::ContextBudgetConfig;

use crate::chunk::Chunk;

/// Which delivery strategy the pipeline picked for a set of chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStrategy {
    /// Total estimated tokens fit inside the usable window: concatenate in
    /// priority order.
    SinglePass,
    /// Chunk count is small enough for sequential injection even though the
    /// concatenated total doesn't fit.
    MultiTurn,
    /// Too many chunks (or none of the above applies): condense.
    Summarized,
}

/// Pick a strategy for `chunks` given the configured budget (§4.5).
#[must_use]
pub fn select_strategy(chunks: &[Chunk], cfg: &ContextBudgetConfig) -> ContextStrategy {
    let total_tokens: usize = chunks.iter().map(|c| c.tokens).sum();
    let usable = cfg.usable_tokens();

    if total_tokens <= usable {
        ContextStrategy::SinglePass
    } else if chunks.len() <= cfg.multi_turn_max_chunks {
        ContextStrategy::MultiTurn
    } else {
        ContextStrategy::Summarized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkKind;

    fn chunk(tokens: usize) -> Chunk {
        Chunk { kind: ChunkKind::Core, content: String::new(), tokens }
    }

    fn budget() -> ContextBudgetConfig {
        ContextBudgetConfig {
            context_window_tokens: 100,
            system_reserve_tokens: 20,
            per_chunk_target_tokens: 50,
            multi_turn_max_chunks: 3,
            code_excerpt_chars: 800,
        }
    }

    #[test]
    fn fits_in_one_pass() {
        let cfg = budget();
        let chunks = vec![chunk(10), chunk(20)];
        assert_eq!(select_strategy(&chunks, &cfg), ContextStrategy::SinglePass);
    }

    #[test]
    fn few_large_chunks_go_multi_turn() {
        let cfg = budget();
        let chunks = vec![chunk(50), chunk(50)];
        assert_eq!(select_strategy(&chunks, &cfg), ContextStrategy::MultiTurn);
    }

    #[test]
    fn many_chunks_are_summarized() {
        let cfg = budget();
        let chunks = vec![chunk(50), chunk(50), chunk(50), chunk(50)];
        assert_eq!(select_strategy(&chunks, &cfg), ContextStrategy::Summarized);
    }
}
