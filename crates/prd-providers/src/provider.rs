//! The `LLMProvider` and `Context Request Port` collaborators (§6, §9
//! "Polymorphism over providers").

use async_trait::async_trait;
use prd_config::PrivacyLevel;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ProviderResult;
use crate::vision::{MockupAnalysis, MockupAnalysisContext, MockupExtraction};

/// What a provider can be asked to do. Selection (§4.6) filters on privacy
/// and availability only; capabilities document intent for callers that
/// care (e.g. only route mockup analysis to a vision-capable provider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    TextGeneration,
    RequirementsAnalysis,
    VisionAnalysis,
}

/// One accepted clarification Q/A pair, threaded into [`GenerateCommand`].
#[derive(Debug, Clone)]
pub struct ClarificationAnswer {
    pub question: String,
    pub answer: String,
}

/// The instruction passed to [`LLMProvider::generate_prd`] (§4.7 Phase 4).
#[derive(Debug, Clone)]
pub struct GenerateCommand {
    pub title: String,
    pub description: String,
    /// The context pipeline's (§4.5) optimized Markdown context block(s),
    /// already budgeted to the provider's window.
    pub context: String,
    pub clarifications: Vec<ClarificationAnswer>,
}

/// `generatePRD`'s response shape (§6).
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub content: String,
    pub confidence: f64,
    pub metadata: HashMap<String, String>,
}

/// `analyzeRequirements`'s response shape (§6, §4.7 Phase 1).
#[derive(Debug, Clone, Default)]
pub struct RequirementsAnalysis {
    pub confidence: f64,
    pub clarifications_needed: Vec<String>,
    pub assumptions: Vec<String>,
    pub gaps: Vec<String>,
}

/// A collaborator exposing text generation, requirements analysis, and
/// mockup vision analysis behind one capability-advertising interface.
/// Adapters (one per upstream model) convert their native errors into the
/// §7 taxonomy; nothing above this trait ever sees a provider-specific idiom.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Stable identifier, also recorded on `PRDDocument.generatedBy`.
    fn name(&self) -> &str;

    /// Higher is more preferred (§4.6 "Selection").
    fn priority(&self) -> u32;

    fn capabilities(&self) -> &[Capability];

    /// The strictest privacy ceiling this provider satisfies.
    fn max_privacy_level(&self) -> PrivacyLevel;

    /// Whether the provider is currently reachable (credentials present,
    /// endpoint healthy). Orchestrator-level health tracking (§4.6) is
    /// layered on top of this self-report, not a replacement for it.
    async fn is_available(&self) -> bool;

    /// # Errors
    /// Returns a [`crate::error::ProviderError`] mapped from whatever the
    /// upstream call produced.
    async fn generate_prd(
        &self,
        command: &GenerateCommand,
        context_request: Option<Arc<dyn ContextRequestPort>>,
    ) -> ProviderResult<GenerationOutput>;

    /// # Errors
    /// See [`LLMProvider::generate_prd`].
    async fn analyze_requirements(&self, text: &str) -> ProviderResult<RequirementsAnalysis>;

    /// # Errors
    /// See [`LLMProvider::generate_prd`].
    async fn extract_from_mockups(&self, sources: &[String]) -> ProviderResult<MockupExtraction>;

    /// # Errors
    /// See [`LLMProvider::generate_prd`].
    async fn analyze_mockup(
        &self,
        image_url: &str,
        context: &MockupAnalysisContext,
    ) -> ProviderResult<MockupAnalysis>;
}

/// A file the provider judged relevant after a mid-generation codebase query.
#[derive(Debug, Clone)]
pub struct RelevantFile {
    pub file_path: String,
    pub excerpt: String,
}

/// `requestCodebaseContext`'s response shape (§6).
#[derive(Debug, Clone, Default)]
pub struct CodebaseContextResponse {
    pub relevant_files: Vec<RelevantFile>,
    pub summary: String,
    pub confidence: f64,
    pub chunks_analyzed: usize,
}

/// `requestMockupContext`'s response shape (§6).
#[derive(Debug, Clone, Default)]
pub struct MockupContextResponse {
    pub relevant_analyses: Vec<MockupAnalysis>,
    pub summary: String,
    pub confidence: f64,
}

/// `hasAdditionalContext`'s response shape (§6).
#[derive(Debug, Clone, Default)]
pub struct AdditionalContextAvailability {
    pub has_codebase: bool,
    pub has_mockups: bool,
    pub codebase_project_id: Option<Uuid>,
    pub mockup_count: usize,
    pub is_codebase_indexed: bool,
}

/// Lets a provider ask mid-generation for additional codebase or mockup
/// context (§4.7 Phase 4), rather than forcing the whole corpus up front.
#[async_trait]
pub trait ContextRequestPort: Send + Sync {
    /// # Errors
    /// Returns a [`crate::error::ProviderError`] if the underlying retrieval fails.
    async fn request_codebase_context(
        &self,
        project_id: Uuid,
        question: &str,
        search_query: &str,
    ) -> ProviderResult<CodebaseContextResponse>;

    /// # Errors
    /// See [`ContextRequestPort::request_codebase_context`].
    async fn request_mockup_context(
        &self,
        request_id: Uuid,
        feature_query: &str,
    ) -> ProviderResult<MockupContextResponse>;

    /// # Errors
    /// See [`ContextRequestPort::request_codebase_context`].
    async fn has_additional_context(
        &self,
        request_id: Uuid,
    ) -> ProviderResult<AdditionalContextAvailability>;
}
