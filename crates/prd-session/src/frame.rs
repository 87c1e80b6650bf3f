//! Wire frames for the Interactive Session (§4.8): JSON messages tagged by
//! `type`, `snake_case` keys per §6's wire protocol.

use prd_engine::clarify::RankedQuestion;
use prd_providers::ClarificationAnswer;
use prd_store::models::{PRDDocument, PRDSection};
use serde::{Deserialize, Serialize};

/// One ranked clarification question as it crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQuestion {
    pub question: String,
    pub priority: &'static str,
}

impl From<&RankedQuestion> for WireQuestion {
    fn from(q: &RankedQuestion) -> Self {
        use prd_engine::clarify::ClarificationPriority;
        let priority = match q.priority {
            ClarificationPriority::High => "high",
            ClarificationPriority::Medium => "medium",
            ClarificationPriority::Low => "low",
        };
        Self { question: q.question.clone(), priority }
    }
}

/// A finalized section frame (§4.8: "each with a stable `id = slug(title)`").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSection {
    pub id: String,
    pub title: String,
    pub content: String,
    pub order: i32,
}

impl From<&PRDSection> for WireSection {
    fn from(section: &PRDSection) -> Self {
        Self {
            id: slugify(&section.title),
            title: section.title.clone(),
            content: section.content.clone(),
            order: section.order,
        }
    }
}

/// Lowercase, hyphen-joined slug of a section title (§4.8 `id = slug(title)`).
/// Runs of non-alphanumeric characters collapse to a single `-`; leading and
/// trailing `-` are trimmed.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Server→client frames (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A coarse status update, e.g. on session open or generation start.
    Status { message: String },
    /// One engine checkpoint (analyze, retrieve, provider-selected, section-n).
    Progress { message: String },
    /// One finalized section, streamed as soon as Phase 5 parses it.
    Section(WireSection),
    /// Phase 2 gated: the caller must answer before generation proceeds.
    ClarificationNeeded { questions: Vec<WireQuestion> },
    /// Phase 5 completed and persisted.
    GenerationComplete { document: PRDDocument },
    /// A terminal failure for this session's in-flight generation.
    Error { message: String },
}

/// Client→server frames (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Start (or resume, if the request is already `clarificationNeeded`)
    /// generation for the session's request.
    StartGeneration { command: StartGenerationCommand },
    /// Answers to a prior `clarification_needed` frame.
    ClarificationAnswers { answers: Vec<WireClarificationAnswer> },
    /// A free-form answer to a mid-generation provider question (§6
    /// `ContextRequestPort`); currently observed but not yet threaded into a
    /// live provider round-trip (the provider trait models one call, per
    /// `prd-engine`'s context-rendering note).
    Response { value: String },
}

/// One accepted clarification Q/A pair, as it crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireClarificationAnswer {
    pub question: String,
    pub answer: String,
}

impl From<WireClarificationAnswer> for ClarificationAnswer {
    fn from(a: WireClarificationAnswer) -> Self {
        Self { question: a.question, answer: a.answer }
    }
}

/// The `start_generation` client frame's payload. Empty today: the session
/// already knows its `request_id` from construction; this exists so the
/// wire frame has somewhere to grow (e.g. a per-session override) without a
/// breaking shape change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGenerationCommand {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_non_alphanumeric_runs() {
        assert_eq!(slugify("Executive Summary"), "executive-summary");
        assert_eq!(slugify("Non-Functional Requirements!"), "non-functional-requirements");
        assert_eq!(slugify("  leading/trailing  "), "leading-trailing");
    }

    #[test]
    fn server_frame_tags_by_type_snake_case() {
        let frame = ServerFrame::Progress { message: "analyze".to_string() };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["message"], "analyze");
    }

    #[test]
    fn client_frame_round_trips_clarification_answers() {
        let frame = ClientFrame::ClarificationAnswers {
            answers: vec![WireClarificationAnswer { question: "q".into(), answer: "a".into() }],
        };
        let json = serde_json::to_string(&frame).unwrap();
        let back: ClientFrame = serde_json::from_str(&json).unwrap();
        match back {
            ClientFrame::ClarificationAnswers { answers } => assert_eq!(answers.len(), 1),
            _ => panic!("wrong variant"),
        }
    }
}
