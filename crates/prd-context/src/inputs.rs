//! The context pipeline's inputs (§4.5): everything the Clarification &
//! Generation Engine (§4.7 Phase 3) gathers before building one or more
//! context blocks.

use prd_providers::{ClarificationAnswer, MockupAnalysis, RelevantFile};
use prd_store::models::CodebaseProject;

/// A `codebaseOverview` chunk's raw material, distilled from a
/// [`CodebaseProject`] (§4.5 "tech stack: top 10 languages by byte count, up
/// to 10 frameworks, architecture patterns").
#[derive(Debug, Clone)]
pub struct CodebaseOverview {
    pub repository_url: String,
    pub repository_branch: String,
    pub top_languages: Vec<(String, u64)>,
    pub frameworks: Vec<String>,
    pub architecture_patterns: Vec<String>,
}

impl From<&CodebaseProject> for CodebaseOverview {
    fn from(project: &CodebaseProject) -> Self {
        let mut languages: Vec<(String, u64)> =
            project.languages.iter().map(|(k, v)| (k.clone(), *v)).collect();
        languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        languages.truncate(10);

        let mut frameworks = project.frameworks.clone();
        frameworks.truncate(10);

        Self {
            repository_url: project.repository_url.clone(),
            repository_branch: project.repository_branch.clone(),
            top_languages: languages,
            frameworks,
            architecture_patterns: project.architecture_patterns.clone(),
        }
    }
}

/// Everything the pipeline needs to build context for one generation call.
#[derive(Debug, Clone, Default)]
pub struct ContextInputs {
    pub title: String,
    pub description: String,
    pub clarifications: Vec<ClarificationAnswer>,
    /// One entry per mockup upload (§4.5 "per mockup"), not the
    /// cross-mockup consolidation `prd-mockup` also produces.
    pub mockup_analyses: Vec<MockupAnalysis>,
    pub codebase_overview: Option<CodebaseOverview>,
    pub code_files: Vec<RelevantFile>,
}
