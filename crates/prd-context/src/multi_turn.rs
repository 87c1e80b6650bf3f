//! Multi-turn injection (§4.5.a): chunks delivered as a series of messages,
//! each soliciting a deterministic acknowledgment, with the final turn
//! carrying the generation instruction.

use crate::chunk::{Chunk, ChunkKind};

const GENERATION_INSTRUCTION: &str =
    "\n\nGenerate the PRD now, integrating every turn above.";

/// One exchange in a multi-turn delivery: the chunk content sent, and the
/// templated acknowledgment the session records as the provider's reply.
#[derive(Debug, Clone)]
pub struct Turn {
    pub content: String,
    pub acknowledgment: String,
}

/// Build the turn sequence for `chunks`, already in priority order. The
/// final turn's content carries [`GENERATION_INSTRUCTION`].
#[must_use]
pub fn build_turns(chunks: &[Chunk]) -> Vec<Turn> {
    let last_index = chunks.len().saturating_sub(1);
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut content = chunk.content.clone();
            if i == last_index {
                content.push_str(GENERATION_INSTRUCTION);
            }
            Turn { content, acknowledgment: acknowledgment_for(chunk.kind) }
        })
        .collect()
}

fn acknowledgment_for(kind: ChunkKind) -> String {
    match kind {
        ChunkKind::Core => "Understood the core requirements.".to_string(),
        ChunkKind::Clarifications => "Understood the clarifications.".to_string(),
        ChunkKind::MockupAnalysis => "Understood the mockup analysis.".to_string(),
        ChunkKind::CodebaseOverview => "Understood the codebase overview.".to_string(),
        ChunkKind::CodeFiles => "Understood the relevant code.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_turn_carries_generation_instruction() {
        let chunks = vec![
            Chunk { kind: ChunkKind::Core, content: "a".into(), tokens: 1 },
            Chunk { kind: ChunkKind::Clarifications, content: "b".into(), tokens: 1 },
        ];
        let turns = build_turns(&chunks);
        assert_eq!(turns.len(), 2);
        assert!(!turns[0].content.contains("Generate the PRD"));
        assert!(turns[1].content.contains("Generate the PRD"));
    }
}
