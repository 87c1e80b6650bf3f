//! Chunk construction (§4.5 "Chunking"): the pipeline always emits a
//! priority-ordered sequence of these before strategy selection decides how
//! they get delivered.

use prd_providers::{ClarificationAnswer, MockupAnalysis, RelevantFile};
use prd_config::ContextBudgetConfig;

use crate::inputs::CodebaseOverview;
use crate::tokens::estimate_tokens;

/// The five chunk kinds §4.5 names, in their fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChunkKind {
    Core = 1,
    Clarifications = 2,
    MockupAnalysis = 3,
    CodebaseOverview = 4,
    CodeFiles = 5,
}

impl ChunkKind {
    /// Whether condensation (§4.5.b) may reduce this kind's content.
    #[must_use]
    pub const fn summarizable(self) -> bool {
        matches!(self, Self::MockupAnalysis | Self::CodeFiles)
    }
}

/// One unit of context, already token-estimated.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub content: String,
    pub tokens: usize,
}

impl Chunk {
    fn new(kind: ChunkKind, content: String) -> Self {
        let is_code = matches!(kind, ChunkKind::CodeFiles);
        let tokens = estimate_tokens(&content, is_code);
        Self { kind, content, tokens }
    }
}

/// Build the `core` chunk: title + description, never split (§4.5).
#[must_use]
pub fn core_chunk(title: &str, description: &str) -> Chunk {
    Chunk::new(ChunkKind::Core, format!("# {title}\n\n{description}"))
}

/// Build the `clarifications` chunk(s), splitting into multiple parts when a
/// single batch would exceed `per_chunk_target_tokens` (§4.5).
#[must_use]
pub fn clarification_chunks(
    answers: &[ClarificationAnswer],
    cfg: &ContextBudgetConfig,
) -> Vec<Chunk> {
    if answers.is_empty() {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut current = String::from("## Clarifications\n\n");
    for answer in answers {
        let entry = format!("**Q:** {}\n**A:** {}\n\n", answer.question, answer.answer);
        if estimate_tokens(&current, false) + estimate_tokens(&entry, false)
            > cfg.per_chunk_target_tokens
            && current.trim() != "## Clarifications"
        {
            chunks.push(Chunk::new(ChunkKind::Clarifications, std::mem::take(&mut current)));
            current = String::from("## Clarifications (cont.)\n\n");
        }
        current.push_str(&entry);
    }
    chunks.push(Chunk::new(ChunkKind::Clarifications, current));
    chunks
}

/// Build chunk(s) for one mockup's analysis: UI components → flows →
/// business logic, split into a UI-only part and a flows+logic part when the
/// combined text exceeds the per-chunk target (§4.5).
#[must_use]
pub fn mockup_chunks(index: usize, analysis: &MockupAnalysis, cfg: &ContextBudgetConfig) -> Vec<Chunk> {
    let ui_section = render_ui_components(analysis);
    let flows_logic_section = render_flows_and_logic(analysis);
    let combined = format!("## Mockup {} Analysis\n\n{ui_section}{flows_logic_section}", index + 1);

    if estimate_tokens(&combined, false) <= cfg.per_chunk_target_tokens {
        return vec![Chunk::new(ChunkKind::MockupAnalysis, combined)];
    }

    vec![
        Chunk::new(
            ChunkKind::MockupAnalysis,
            format!("## Mockup {} Analysis (UI)\n\n{ui_section}", index + 1),
        ),
        Chunk::new(
            ChunkKind::MockupAnalysis,
            format!("## Mockup {} Analysis (Flows & Logic)\n\n{flows_logic_section}", index + 1),
        ),
    ]
}

fn render_ui_components(analysis: &MockupAnalysis) -> String {
    let mut out = String::from("**UI Components:**\n");
    for element in &analysis.ui_elements {
        let label = element.label.as_deref().unwrap_or("unlabeled");
        out.push_str(&format!("- {:?}: {label}\n", element.element_type));
    }
    out.push('\n');
    out
}

fn render_flows_and_logic(analysis: &MockupAnalysis) -> String {
    let mut out = String::from("**User Flows:**\n");
    for flow in &analysis.user_flows {
        out.push_str(&format!("- {flow}\n"));
    }
    out.push_str("\n**Business Logic:**\n");
    for inference in &analysis.business_logic {
        out.push_str(&format!("- {} (confidence {:.2})\n", inference.description, inference.confidence));
    }
    out.push('\n');
    out
}

/// Build the `codebaseOverview` chunk, never split or summarized (§4.5).
#[must_use]
pub fn codebase_overview_chunk(overview: &CodebaseOverview) -> Chunk {
    let mut content = format!(
        "## Codebase Overview\n\nRepository: {} ({})\n\n**Languages:**\n",
        overview.repository_url, overview.repository_branch
    );
    for (language, bytes) in &overview.top_languages {
        content.push_str(&format!("- {language}: {bytes} bytes\n"));
    }
    content.push_str("\n**Frameworks:**\n");
    for framework in &overview.frameworks {
        content.push_str(&format!("- {framework}\n"));
    }
    content.push_str("\n**Architecture Patterns:**\n");
    for pattern in &overview.architecture_patterns {
        content.push_str(&format!("- {pattern}\n"));
    }
    Chunk::new(ChunkKind::CodebaseOverview, content)
}

/// Build `codeFiles` chunk(s): each excerpt truncated to
/// `code_excerpt_chars`, batched so no single chunk exceeds the per-chunk
/// target (§4.5).
#[must_use]
pub fn code_file_chunks(files: &[RelevantFile], cfg: &ContextBudgetConfig) -> Vec<Chunk> {
    if files.is_empty() {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut current = String::from("## Relevant Code\n\n");
    for file in files {
        let excerpt: String = file.excerpt.chars().take(cfg.code_excerpt_chars).collect();
        let entry = format!("### {}\n```\n{excerpt}\n```\n\n", file.file_path);
        if estimate_tokens(&current, true) + estimate_tokens(&entry, true)
            > cfg.per_chunk_target_tokens
            && current.trim() != "## Relevant Code"
        {
            chunks.push(Chunk::new(ChunkKind::CodeFiles, std::mem::take(&mut current)));
            current = String::from("## Relevant Code (cont.)\n\n");
        }
        current.push_str(&entry);
    }
    chunks.push(Chunk::new(ChunkKind::CodeFiles, current));
    chunks
}
