//! Condensation (§4.5.b): collapses the `summarized` strategy's chunks down
//! to bounded bullet lists, leaving `core`/`clarifications`/`codebaseOverview`
//! untouched.

use crate::chunk::{Chunk, ChunkKind};

const MAX_UI_BULLETS: usize = 20;
const MAX_FLOW_BULLETS: usize = 10;
const MAX_BUSINESS_LOGIC_BULLETS: usize = 15;
const MAX_CODE_FILE_ENTRIES: usize = 25;

const TRAILING_INSTRUCTION: &str =
    "\nIntegrate the above with the existing architecture rather than proposing a parallel one.\n";

/// Condense a priority-ordered chunk sequence into one Markdown block.
#[must_use]
pub fn condense(chunks: &[Chunk]) -> String {
    let mut ui_bullets = Vec::new();
    let mut flow_bullets = Vec::new();
    let mut logic_bullets = Vec::new();
    let mut code_entries = Vec::new();
    let mut out = String::new();

    for chunk in chunks {
        match chunk.kind {
            ChunkKind::Core | ChunkKind::Clarifications | ChunkKind::CodebaseOverview => {
                out.push_str(&chunk.content);
                out.push_str("\n\n");
            }
            ChunkKind::MockupAnalysis => {
                ui_bullets.extend(parse_bullets(&chunk.content, "**UI Components:**"));
                flow_bullets.extend(parse_bullets(&chunk.content, "**User Flows:**"));
                logic_bullets.extend(parse_bullets(&chunk.content, "**Business Logic:**"));
            }
            ChunkKind::CodeFiles => {
                code_entries.extend(parse_code_entries(&chunk.content));
            }
        }
    }

    if !ui_bullets.is_empty() || !flow_bullets.is_empty() || !logic_bullets.is_empty() {
        out.push_str("## Mockup Analysis (condensed)\n\n");
        append_capped_section(&mut out, "UI Components", &ui_bullets, MAX_UI_BULLETS);
        append_capped_section(&mut out, "User Flows", &flow_bullets, MAX_FLOW_BULLETS);
        append_capped_section(&mut out, "Business Logic", &logic_bullets, MAX_BUSINESS_LOGIC_BULLETS);
    }

    if !code_entries.is_empty() {
        out.push_str("## Relevant Code (condensed)\n\n");
        for entry in code_entries.into_iter().take(MAX_CODE_FILE_ENTRIES) {
            out.push_str(&format!("- {entry}\n"));
        }
        out.push('\n');
    }

    out.push_str(TRAILING_INSTRUCTION);
    out
}

fn append_capped_section(out: &mut String, title: &str, bullets: &[String], cap: usize) {
    if bullets.is_empty() {
        return;
    }
    out.push_str(&format!("**{title}:**\n"));
    for bullet in bullets.iter().take(cap) {
        out.push_str(&format!("- {bullet}\n"));
    }
    out.push('\n');
}

/// Pull bullet lines following `header` up to the next `**`-prefixed header
/// or blank separator (§4.5.b "drawn by parsing the section headers").
fn parse_bullets(content: &str, header: &str) -> Vec<String> {
    let mut bullets = Vec::new();
    let mut in_section = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == header {
            in_section = true;
            continue;
        }
        if in_section {
            if trimmed.starts_with("**") {
                break;
            }
            if let Some(bullet) = trimmed.strip_prefix("- ") {
                bullets.push(bullet.to_string());
            } else if trimmed.is_empty() {
                break;
            }
        }
    }
    bullets
}

/// Collapse `### path` / fenced-excerpt blocks into `path — Purpose: …`
/// entries (§4.5.b).
fn parse_code_entries(content: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();
    while let Some(line) = lines.next() {
        let Some(path) = line.trim().strip_prefix("### ") else { continue };
        // Skip the opening ``` fence, then read the excerpt's first line.
        if lines.peek().is_some_and(|l| l.trim() == "```") {
            lines.next();
        }
        let purpose = lines
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("code excerpt");
        let purpose: String = purpose.chars().take(80).collect();
        entries.push(format!("{path} — Purpose: {purpose}"));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_mockup_bullets_per_section() {
        let mut content = String::from("## Mockup 1 Analysis\n\n**UI Components:**\n");
        for i in 0..30 {
            content.push_str(&format!("- Button: b{i}\n"));
        }
        content.push_str("\n**User Flows:**\n- flow a\n\n**Business Logic:**\n- rule a\n\n");
        let chunk = Chunk { kind: ChunkKind::MockupAnalysis, content, tokens: 0 };
        let condensed = condense(&[chunk]);
        assert_eq!(condensed.matches("Button:").count(), MAX_UI_BULLETS);
        assert!(condensed.contains("Integrate the above"));
    }

    #[test]
    fn collapses_code_files_to_path_purpose_pairs() {
        let content = "## Relevant Code\n\n### src/lib.rs\n```\nfn run() {}\nmore\n```\n\n".to_string();
        let chunk = Chunk { kind: ChunkKind::CodeFiles, content, tokens: 0 };
        let condensed = condense(&[chunk]);
        assert!(condensed.contains("src/lib.rs — Purpose: fn run() {}"));
    }
}
