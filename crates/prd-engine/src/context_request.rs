//! The `ContextRequestPort` adapter (§4.7 Phase 4, §6): lets a provider ask
//! mid-generation for additional codebase or mockup context, composing the
//! retriever, mockup analyzer, and store link tables this crate already
//! depends on.

use std::sync::Arc;

use async_trait::async_trait;
use prd_common::{Classified, CorrelationId, ErrorKind};
use prd_mockup::MockupAnalyzer;
use prd_providers::{
    AdditionalContextAvailability, CodebaseContextResponse, ContextRequestPort,
    MockupContextResponse, ProviderError, ProviderResult, RelevantFile,
};
use prd_search::RagRetriever;
use prd_store::{CodebaseLinkRepository, CodebaseProjectRepository, IndexingStatus, MockupRepository};
use uuid::Uuid;

const MID_GENERATION_MAX_CHUNKS: usize = 10;
const MID_GENERATION_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Maps any `Classified` collaborator error onto the §7 taxonomy surfaced
/// through [`ProviderError`], since the port is reached from inside a
/// provider adapter's call (§9 "do not leak provider idioms").
fn classified_to_provider_error<E: Classified + ToString>(err: E) -> ProviderError {
    match err.kind() {
        ErrorKind::Timeout => ProviderError::Timeout { provider: "context-request".to_string(), timeout_ms: 0 },
        ErrorKind::Unauthorized => {
            ProviderError::Unauthorized { provider: "context-request".to_string(), reason: err.to_string() }
        }
        _ => ProviderError::Other(err.to_string()),
    }
}

/// Default [`ContextRequestPort`], composed at [`crate::ClarificationEngine`]
/// construction time and handed to the selected provider for the duration
/// of one `generate_prd` call.
pub struct EngineContextPort {
    retriever: Arc<dyn RagRetriever>,
    mockup_analyzer: Arc<MockupAnalyzer>,
    mockups: Arc<dyn MockupRepository>,
    codebase_links: Arc<dyn CodebaseLinkRepository>,
    codebase_projects: Arc<dyn CodebaseProjectRepository>,
}

impl EngineContextPort {
    #[must_use]
    pub const fn new(
        retriever: Arc<dyn RagRetriever>,
        mockup_analyzer: Arc<MockupAnalyzer>,
        mockups: Arc<dyn MockupRepository>,
        codebase_links: Arc<dyn CodebaseLinkRepository>,
        codebase_projects: Arc<dyn CodebaseProjectRepository>,
    ) -> Self {
        Self { retriever, mockup_analyzer, mockups, codebase_links, codebase_projects }
    }
}

#[async_trait]
impl ContextRequestPort for EngineContextPort {
    async fn request_codebase_context(
        &self,
        project_id: Uuid,
        question: &str,
        search_query: &str,
    ) -> ProviderResult<CodebaseContextResponse> {
        let correlation_id = CorrelationId::new();
        let result = self
            .retriever
            .search(
                project_id,
                question,
                search_query,
                MID_GENERATION_MAX_CHUNKS,
                MID_GENERATION_SIMILARITY_THRESHOLD,
                &correlation_id,
            )
            .await
            .map_err(classified_to_provider_error)?;

        let chunks_analyzed = result.chunks.len();
        let relevant_files = result
            .chunks
            .into_iter()
            .map(|c| RelevantFile { file_path: c.file_path, excerpt: c.content })
            .collect();

        Ok(CodebaseContextResponse {
            relevant_files,
            summary: format!("{chunks_analyzed} chunk(s) retrieved at mean similarity {:.2}", result.mean_similarity),
            confidence: f64::from(result.mean_similarity),
            chunks_analyzed,
        })
    }

    async fn request_mockup_context(
        &self,
        request_id: Uuid,
        feature_query: &str,
    ) -> ProviderResult<MockupContextResponse> {
        let analyses = self.mockup_analyzer.per_mockup_analyses(request_id).await.map_err(classified_to_provider_error)?;
        let query = feature_query.to_lowercase();
        let relevant_analyses: Vec<_> = analyses
            .into_iter()
            .filter(|a| {
                a.user_flows.iter().any(|f| f.to_lowercase().contains(&query))
                    || a.business_logic.iter().any(|b| b.description.to_lowercase().contains(&query))
                    || a.extracted_text.iter().any(|t| t.text.to_lowercase().contains(&query))
            })
            .collect();

        let confidence = if relevant_analyses.is_empty() {
            0.0
        } else {
            relevant_analyses.iter().map(|a| a.confidence).sum::<f64>() / relevant_analyses.len() as f64
        };

        Ok(MockupContextResponse {
            summary: format!("{} mockup analysis(es) matched '{feature_query}'", relevant_analyses.len()),
            relevant_analyses,
            confidence,
        })
    }

    async fn has_additional_context(&self, request_id: Uuid) -> ProviderResult<AdditionalContextAvailability> {
        let project_ids =
            self.codebase_links.projects_for_request(request_id).await.map_err(classified_to_provider_error)?;
        let mut codebase_project_id = None;
        let mut is_codebase_indexed = false;
        for project_id in project_ids {
            let project = self.codebase_projects.get(project_id).await.map_err(classified_to_provider_error)?;
            if codebase_project_id.is_none() {
                codebase_project_id = Some(project.id);
            }
            if project.indexing_status == IndexingStatus::Completed && project.total_chunks > 0 {
                is_codebase_indexed = true;
                codebase_project_id = Some(project.id);
                break;
            }
        }

        let mockup_count =
            self.mockups.get_for_request(request_id).await.map_err(classified_to_provider_error)?.len();

        Ok(AdditionalContextAvailability {
            has_codebase: codebase_project_id.is_some(),
            has_mockups: mockup_count > 0,
            codebase_project_id,
            mockup_count,
            is_codebase_indexed,
        })
    }
}
