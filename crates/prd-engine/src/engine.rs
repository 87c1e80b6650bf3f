//! The Clarification & Generation Engine (§4.7): the composition point of
//! the workspace, driving one request from analysis through a persisted
//! document.

use std::sync::Arc;

use prd_config::{ClarificationConfig, ContextBudgetConfig};
use prd_context::{BuiltContext, ContextInputs};
use prd_mockup::MockupAnalyzer;
use prd_providers::{ClarificationAnswer, ContextRequestPort, GenerateCommand, Orchestrator};
use prd_search::RagRetriever;
use prd_store::models::{
    DocumentMetadata, IndexingStatus, PRDDocument, PRDRequest, PRDSection, RequestStatus, SectionType,
};
use prd_store::traits::{
    CodebaseLinkRepository, CodebaseProjectRepository, MockupRepository, PRDDocumentRepository,
    PRDRequestRepository,
};
use tracing::instrument;
use uuid::Uuid;

use crate::clarify::{combine_confidence, derive_mockup_clarifications, merge_and_rank, RankedQuestion};
use crate::context_request::EngineContextPort;
use crate::error::{EngineError, EngineResult};
use crate::progress::ProgressSink;

/// Initial-retrieval chunk ceiling for Phase 3 (distinct from the
/// mid-generation ceiling the provider's [`ContextRequestPort`] uses).
const INITIAL_RETRIEVAL_MAX_CHUNKS: usize = 10;
const INITIAL_RETRIEVAL_SIMILARITY_THRESHOLD: f32 = 0.65;

/// What [`ClarificationEngine::run`] (or [`ClarificationEngine::resume`])
/// produced (§4.7 Phase 2/5).
#[derive(Debug, Clone)]
pub enum EngineOutcome {
    /// Phase 2 gated: the request needs the caller to answer these questions
    /// before generation proceeds.
    NeedsClarification { request_id: Uuid, questions: Vec<RankedQuestion> },
    /// Phase 5 completed: the document is persisted and the request is `completed`.
    Generated { request_id: Uuid, document: PRDDocument, provider_used: String },
}

async fn notify(sink: Option<&dyn ProgressSink>, checkpoint: &str) {
    if let Some(sink) = sink {
        sink.on_progress(checkpoint).await;
    }
}

/// Drives one request through all five §4.7 phases. Holds every collaborator
/// the phases need, composed once at startup by the binary crate.
pub struct ClarificationEngine {
    requests: Arc<dyn PRDRequestRepository>,
    documents: Arc<dyn PRDDocumentRepository>,
    mockups: Arc<dyn MockupRepository>,
    codebase_links: Arc<dyn CodebaseLinkRepository>,
    codebase_projects: Arc<dyn CodebaseProjectRepository>,
    mockup_analyzer: Arc<MockupAnalyzer>,
    retriever: Arc<dyn RagRetriever>,
    orchestrator: Arc<Orchestrator>,
    context_port: Arc<dyn ContextRequestPort>,
    clarification_cfg: ClarificationConfig,
    context_cfg: ContextBudgetConfig,
}

impl ClarificationEngine {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        requests: Arc<dyn PRDRequestRepository>,
        documents: Arc<dyn PRDDocumentRepository>,
        mockups: Arc<dyn MockupRepository>,
        codebase_links: Arc<dyn CodebaseLinkRepository>,
        codebase_projects: Arc<dyn CodebaseProjectRepository>,
        mockup_analyzer: Arc<MockupAnalyzer>,
        retriever: Arc<dyn RagRetriever>,
        orchestrator: Arc<Orchestrator>,
        clarification_cfg: ClarificationConfig,
        context_cfg: ContextBudgetConfig,
    ) -> Self {
        let context_port = Arc::new(EngineContextPort::new(
            Arc::clone(&retriever),
            Arc::clone(&mockup_analyzer),
            Arc::clone(&mockups),
            Arc::clone(&codebase_links),
            Arc::clone(&codebase_projects),
        ));
        Self {
            requests,
            documents,
            mockups,
            codebase_links,
            codebase_projects,
            mockup_analyzer,
            retriever,
            orchestrator,
            context_port,
            clarification_cfg,
            context_cfg,
        }
    }

    /// Run Phases 1-2 (and, if the gate passes, 3-5) for `request_id`,
    /// notifying `sink` at each checkpoint (§4.8). Pass `None` for a
    /// non-interactive caller (a CLI command, a test).
    ///
    /// # Errors
    /// Propagates store, provider, mockup, or search failures. On provider
    /// exhaustion the request is transitioned to `failed(reason)` before the
    /// error is returned.
    #[instrument(skip(self, sink), fields(request_id = %request_id))]
    pub async fn run(&self, request_id: Uuid, sink: Option<&dyn ProgressSink>) -> EngineResult<EngineOutcome> {
        let request = self.requests.get(request_id).await?;
        notify(sink, "analyze").await;
        let (confidence, ranked) = self.analyze(&request, &[]).await?;

        if self.clarification_cfg.enabled && confidence < self.clarification_cfg.confidence_threshold {
            self.requests.update_status(request_id, RequestStatus::ClarificationNeeded).await?;
            return Ok(EngineOutcome::NeedsClarification {
                request_id,
                questions: ranked,
            });
        }

        self.requests.update_status(request_id, RequestStatus::Processing).await?;
        self.proceed(request_id, &[], sink).await
    }

    /// Resume a request sitting in `clarificationNeeded` with the caller's
    /// answers (§4.7 Phase 1 re-analysis, scenario: "confidence recomputed").
    /// Unlike [`Self::run`], the gate is not re-applied: the caller already
    /// supplied the information the gate was missing, so resuming always
    /// proceeds to generation.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] if the request isn't in
    /// `clarificationNeeded`, or propagates provider/search failures.
    #[instrument(skip(self, answers, sink), fields(request_id = %request_id))]
    pub async fn resume(
        &self,
        request_id: Uuid,
        answers: Vec<ClarificationAnswer>,
        sink: Option<&dyn ProgressSink>,
    ) -> EngineResult<EngineOutcome> {
        let request = self.requests.get(request_id).await?;
        if !matches!(request.status, RequestStatus::ClarificationNeeded) {
            return Err(EngineError::Store(prd_store::error::StoreError::BusinessRule(format!(
                "request {request_id} is not awaiting clarification"
            ))));
        }
        notify(sink, "analyze").await;
        let _ = self.analyze(&request, &answers).await?;
        self.requests.update_status(request_id, RequestStatus::Processing).await?;
        self.proceed(request_id, &answers, sink).await
    }

    /// Phase 1 — Analyze: textual + (if present) mockup-level analysis,
    /// combined into one confidence and one ranked clarification list.
    async fn analyze(
        &self,
        request: &PRDRequest,
        answers: &[ClarificationAnswer],
    ) -> EngineResult<(f64, Vec<RankedQuestion>)> {
        let text = Self::compose_analysis_text(request, answers);
        let preferred = request.preferred_provider.as_deref();

        let (text_analysis, _) = self
            .orchestrator
            .call(preferred, |provider| {
                let text = text.clone();
                async move { provider.analyze_requirements(&text).await }
            })
            .await?;

        let uploads = self.mockups.get_for_request(request.id).await?;
        if uploads.is_empty() {
            let ranked = merge_and_rank(&text_analysis.clarifications_needed, &[]);
            return Ok((text_analysis.confidence, ranked));
        }

        self.mockup_analyzer.analyze_mockups(request.id).await?;

        let sources: Vec<String> = uploads.iter().map(|u| u.storage_path.clone()).collect();
        let (extraction, _) = self
            .orchestrator
            .call(preferred, |provider| {
                let sources = sources.clone();
                async move { provider.extract_from_mockups(&sources).await }
            })
            .await?;

        let confidence = combine_confidence(
            text_analysis.confidence,
            extraction.features.len(),
            extraction.flows.len(),
            extraction.components.len(),
        );
        let mockup_clarifications = derive_mockup_clarifications(&extraction);
        let ranked = merge_and_rank(&text_analysis.clarifications_needed, &mockup_clarifications);
        Ok((confidence, ranked))
    }

    /// Phases 3-5: build context, generate, parse and persist.
    async fn proceed(
        &self,
        request_id: Uuid,
        answers: &[ClarificationAnswer],
        sink: Option<&dyn ProgressSink>,
    ) -> EngineResult<EngineOutcome> {
        let request = self.requests.get(request_id).await?;
        match self.generate(&request, answers, sink).await {
            Ok((document, provider_used)) => {
                self.documents.create(document.clone()).await?;
                self.requests.complete(request_id, document.id).await?;
                Ok(EngineOutcome::Generated { request_id, document, provider_used })
            }
            Err(err) => {
                self.requests
                    .update_status(request_id, RequestStatus::Failed { reason: err.to_string() })
                    .await?;
                Err(err)
            }
        }
    }

    async fn generate(
        &self,
        request: &PRDRequest,
        answers: &[ClarificationAnswer],
        sink: Option<&dyn ProgressSink>,
    ) -> EngineResult<(PRDDocument, String)> {
        let inputs = self.build_context_inputs(request, answers, sink).await?;
        let built = prd_context::build_context(&inputs, &self.context_cfg);
        notify(sink, &format!("context:{:?}", built.strategy())).await;
        let rendered = Self::render_context(&built);

        let command = GenerateCommand {
            title: request.title.clone(),
            description: request.description.clone(),
            context: rendered,
            clarifications: answers.to_vec(),
        };

        let (output, provider_used) = self
            .orchestrator
            .call(request.preferred_provider.as_deref(), |provider| {
                let command = command.clone();
                let context_port = Arc::clone(&self.context_port);
                async move { provider.generate_prd(&command, Some(context_port)).await }
            })
            .await?;
        notify(sink, &format!("provider-selected:{provider_used}")).await;

        let sections = Self::parse_sections(&output.content);
        if let Some(sink) = sink {
            for section in &sections {
                sink.on_section(section).await;
            }
        }
        let word_count = u32::try_from(output.content.split_whitespace().count()).unwrap_or(u32::MAX);
        let metadata = DocumentMetadata {
            format: "markdown".to_string(),
            language: "en".to_string(),
            word_count,
            estimated_read_time: DocumentMetadata::estimated_read_time_for(word_count),
            tags: Vec::new(),
            attachments: Vec::new(),
        };

        let document = PRDDocument::new(
            request.id,
            request.title.clone(),
            output.content,
            sections,
            metadata,
            output.confidence,
            provider_used.clone(),
            None,
        )?;
        Ok((document, provider_used))
    }

    /// Phase 3 — Context build: gather consolidated mockup analyses, the
    /// first fully-indexed linked codebase's overview and retrieved files,
    /// and the accepted Q/A pairs.
    async fn build_context_inputs(
        &self,
        request: &PRDRequest,
        answers: &[ClarificationAnswer],
        sink: Option<&dyn ProgressSink>,
    ) -> EngineResult<ContextInputs> {
        let mockup_analyses = self.mockup_analyzer.per_mockup_analyses(request.id).await?;

        let project_ids = self.codebase_links.projects_for_request(request.id).await?;
        let mut codebase_overview = None;
        let mut code_files = Vec::new();
        if !project_ids.is_empty() {
            notify(sink, "retrieve").await;
        }
        for project_id in project_ids {
            let project = self.codebase_projects.get(project_id).await?;
            if project.indexing_status != IndexingStatus::Completed || project.total_chunks == 0 {
                continue;
            }
            if codebase_overview.is_none() {
                codebase_overview = Some((&project).into());
            }
            let result = self
                .retriever
                .search(
                    project.id,
                    &request.title,
                    &request.description,
                    INITIAL_RETRIEVAL_MAX_CHUNKS,
                    INITIAL_RETRIEVAL_SIMILARITY_THRESHOLD,
                    &prd_common::CorrelationId::new(),
                )
                .await?;
            code_files.extend(
                result
                    .chunks
                    .into_iter()
                    .map(|c| prd_providers::RelevantFile { file_path: c.file_path, excerpt: c.content }),
            );
        }
        code_files.truncate(INITIAL_RETRIEVAL_MAX_CHUNKS);

        Ok(ContextInputs {
            title: request.title.clone(),
            description: request.description.clone(),
            clarifications: answers.to_vec(),
            mockup_analyses,
            codebase_overview,
            code_files,
        })
    }

    /// Flatten a [`BuiltContext`] into the single `context: String` field
    /// [`GenerateCommand`] carries. `SinglePass`/`Summarized` pass through
    /// unchanged; `MultiTurn` is rendered as each turn's content followed by
    /// its templated acknowledgment, since the provider trait models one
    /// generation call rather than true multi-message injection.
    fn render_context(built: &BuiltContext) -> String {
        match built {
            BuiltContext::SinglePass(text) | BuiltContext::Summarized(text) => text.clone(),
            BuiltContext::MultiTurn(turns) => turns
                .iter()
                .map(|t| format!("{}\n\n> {}", t.content, t.acknowledgment))
                .collect::<Vec<_>>()
                .join("\n\n---\n\n"),
        }
    }

    /// Compose the text [`LLMProvider::analyze_requirements`] sees: title and
    /// description, with any accepted Q/A pairs appended as context.
    fn compose_analysis_text(request: &PRDRequest, answers: &[ClarificationAnswer]) -> String {
        let mut text = format!("{}\n\n{}", request.title, request.description);
        if !answers.is_empty() {
            text.push_str("\n\nClarifications:\n");
            for answer in answers {
                text.push_str(&format!("- Q: {}\n  A: {}\n", answer.question, answer.answer));
            }
        }
        text
    }

    /// Phase 5 heading split: ATX headings (levels 1-3) start a new section;
    /// everything before the first heading is discarded.
    fn parse_sections(content: &str) -> Vec<PRDSection> {
        let mut sections = Vec::new();
        let mut current_title: Option<String> = None;
        let mut current_body = String::new();

        for line in content.lines() {
            if let Some(heading) = Self::atx_heading(line) {
                if let Some(title) = current_title.take() {
                    sections.push(Self::finish_section(sections.len(), &title, &current_body));
                    current_body.clear();
                }
                current_title = Some(heading.to_string());
            } else if current_title.is_some() {
                current_body.push_str(line);
                current_body.push('\n');
            }
        }
        if let Some(title) = current_title {
            sections.push(Self::finish_section(sections.len(), &title, &current_body));
        }
        sections
    }

    fn finish_section(order: usize, title: &str, body: &str) -> PRDSection {
        PRDSection {
            order: i32::try_from(order).unwrap_or(i32::MAX),
            section_type: SectionType::from_heading(title),
            title: title.to_string(),
            content: body.trim().to_string(),
        }
    }

    fn atx_heading(line: &str) -> Option<&str> {
        let trimmed = line.trim_start();
        for depth in [1, 2, 3] {
            let prefix = "#".repeat(depth) + " ";
            if let Some(rest) = trimmed.strip_prefix(&prefix) {
                return Some(rest.trim());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_atx_headings_into_sections() {
        let content = "# Executive Summary\nThis is the summary.\n\n## User Stories\nAs a user...\n";
        let sections = ClarificationEngine::parse_sections(content);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section_type, SectionType::ExecutiveSummary);
        assert_eq!(sections[0].content, "This is the summary.");
        assert_eq!(sections[1].section_type, SectionType::UserStories);
    }

    #[test]
    fn text_before_first_heading_is_discarded() {
        let content = "preamble\n# Risks\nbody\n";
        let sections = ClarificationEngine::parse_sections(content);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "body");
    }

    #[test]
    fn render_context_flattens_multi_turn_with_acknowledgments() {
        use prd_context::Turn;
        let built = BuiltContext::MultiTurn(vec![
            Turn { content: "first".to_string(), acknowledgment: "ack1".to_string() },
            Turn { content: "second".to_string(), acknowledgment: "ack2".to_string() },
        ]);
        let rendered = ClarificationEngine::render_context(&built);
        assert!(rendered.contains("first"));
        assert!(rendered.contains("> ack1"));
        assert!(rendered.contains("second"));
    }
}
