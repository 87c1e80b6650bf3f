//! Phase 1/2 helpers: confidence combination and clarification ranking
//! (§4.7 "Analyze", "Gate").

use std::collections::HashSet;

use prd_providers::MockupExtraction;

/// Cap on the mockup confidence bonus added to the textual confidence (§4.7).
const MOCKUP_BONUS_CAP: f64 = 0.35;

/// `conf' = min(1, textConf + mockupBonus)` with `mockupBonus =
/// 0.03*min(5,|features|) + 0.02*min(5,|flows|) + 0.01*min(10,|components|)`,
/// capped at 0.35 (§4.7 Phase 1).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn combine_confidence(text_confidence: f64, features: usize, flows: usize, components: usize) -> f64 {
    let bonus = 0.03 * features.min(5) as f64 + 0.02 * flows.min(5) as f64 + 0.01 * components.min(10) as f64;
    (text_confidence + bonus.min(MOCKUP_BONUS_CAP)).min(1.0)
}

/// Three-tier clarification priority (§4.7 Phase 1). Declared high-to-low so
/// the derived `Ord` sorts the highest tier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClarificationPriority {
    High,
    Medium,
    Low,
}

/// One ranked clarification question, carried through §4.7 Phase 2's
/// `needsClarification` outcome.
#[derive(Debug, Clone)]
pub struct RankedQuestion {
    pub question: String,
    pub priority: ClarificationPriority,
}

/// Classify a question into the three-tier priority by substring match
/// against its text (§4.7 Phase 1: "high (business logic | data | security),
/// medium (user flow | requirement), low (other)").
#[must_use]
pub fn classify_priority(question: &str) -> ClarificationPriority {
    let q = question.to_lowercase();
    if ["business logic", "data", "security"].iter().any(|k| q.contains(k)) {
        ClarificationPriority::High
    } else if ["user flow", "requirement"].iter().any(|k| q.contains(k)) {
        ClarificationPriority::Medium
    } else {
        ClarificationPriority::Low
    }
}

/// Derive mockup-based clarifications from a text-level feature extraction
/// (§4.7 Phase 1 "rules"): missing business logic for known features → ask;
/// flows fewer than features → ask for complete flows; no form/input
/// components → ask about data.
#[must_use]
pub fn derive_mockup_clarifications(extraction: &MockupExtraction) -> Vec<String> {
    let mut questions = Vec::new();

    if !extraction.features.is_empty() && extraction.business_logic.is_empty() {
        questions.push(
            "What business logic governs the detected features (validation, permissions, workflows)?"
                .to_string(),
        );
    }

    if extraction.flows.len() < extraction.features.len() {
        questions.push("Can you describe the complete user flow for each detected feature?".to_string());
    }

    let has_input_component = extraction.components.iter().any(|c| {
        let c = c.to_lowercase();
        c.contains("form") || c.contains("input") || c.contains("field")
    });
    if !has_input_component {
        questions.push("What data does this feature need to capture, validate, or persist?".to_string());
    }

    questions
}

/// Merge text and mockup-derived clarifications (deduplicated
/// case-insensitively by trimmed text), then rank by tier, preserving
/// relative order within a tier (§4.7 Phase 1 "Deduplicate, then rank").
#[must_use]
pub fn merge_and_rank(text_clarifications: &[String], mockup_clarifications: &[String]) -> Vec<RankedQuestion> {
    let mut seen = HashSet::new();
    let mut merged: Vec<RankedQuestion> = text_clarifications
        .iter()
        .chain(mockup_clarifications.iter())
        .filter(|q| seen.insert(q.trim().to_lowercase()))
        .map(|q| RankedQuestion { question: q.clone(), priority: classify_priority(q) })
        .collect();
    merged.sort_by_key(|r| r.priority);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_bonus_is_capped() {
        let confidence = combine_confidence(0.5, 100, 100, 100);
        assert!((confidence - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_never_exceeds_one() {
        let confidence = combine_confidence(0.99, 100, 100, 100);
        assert!((confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dedup_and_rank_orders_high_tier_first() {
        let ranked = merge_and_rank(
            &["What is the expected timeline?".to_string()],
            &["What business logic governs X?".to_string(), "what is the expected timeline?".to_string()],
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].priority, ClarificationPriority::High);
        assert_eq!(ranked[1].priority, ClarificationPriority::Low);
    }

    #[test]
    fn derives_clarifications_from_extraction_gaps() {
        let extraction = MockupExtraction {
            features: vec!["login".into(), "checkout".into()],
            flows: vec!["login flow".into()],
            components: vec!["button".into(), "label".into()],
            business_logic: vec![],
        };
        let derived = derive_mockup_clarifications(&extraction);
        assert_eq!(derived.len(), 3);
    }
}
