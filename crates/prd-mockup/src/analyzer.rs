//! The Mockup Analyzer (§4.4): per-image vision analysis plus cross-mockup
//! consolidation for a request.

use prd_providers::{
    BusinessLogicInference, ExtractedText, LLMProvider, LayoutStructure, MockupAnalysis,
    MockupAnalysisContext, UiElement,
};
use prd_store::models::MockupUpload;
use prd_store::traits::{MockupRepository, PRDRequestRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{MockupError, MockupResult};
use crate::storage::{MockupStorage, SIGNED_URL_TTL_SECONDS};

/// Consolidated view across every processed mockup attached to a request
/// (§4.4 "cross-mockup consolidation"): UI elements and extracted text are
/// unioned with exact-match dedup, flows are unioned by string, and the
/// overall confidence is the mean of each analysis's own confidence.
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedMockupAnalysis {
    pub ui_elements: Vec<UiElement>,
    pub extracted_text: Vec<ExtractedText>,
    pub layouts: Vec<LayoutStructure>,
    pub color_scheme: Vec<String>,
    pub user_flows: Vec<String>,
    pub business_logic: Vec<BusinessLogicInference>,
    pub confidence: f64,
    pub mockup_count: usize,
}

/// Runs vision analysis against every mockup attached to a request and
/// consolidates the per-image results into one cross-mockup view.
pub struct MockupAnalyzer {
    requests: Arc<dyn PRDRequestRepository>,
    mockups: Arc<dyn MockupRepository>,
    storage: Arc<dyn MockupStorage>,
    provider: Arc<dyn LLMProvider>,
}

impl MockupAnalyzer {
    #[must_use]
    pub fn new(
        requests: Arc<dyn PRDRequestRepository>,
        mockups: Arc<dyn MockupRepository>,
        storage: Arc<dyn MockupStorage>,
        provider: Arc<dyn LLMProvider>,
    ) -> Self {
        Self { requests, mockups, storage, provider }
    }

    /// Analyze one mockup upload (§4.4 a/b): checks the request exists,
    /// mints a signed URL, gathers already-processed analyses from the same
    /// request as context, invokes the vision provider, and persists the
    /// result.
    ///
    /// # Errors
    /// Returns [`MockupError::RequestNotFound`] if the upload's request is
    /// missing, or propagates storage/provider/store failures.
    #[instrument(skip(self), fields(upload_id = %upload_id))]
    pub async fn analyze_mockup(&self, upload_id: Uuid) -> MockupResult<MockupUpload> {
        let upload = self.mockups.get(upload_id).await?;
        let request = self
            .requests
            .get(upload.request_id)
            .await
            .map_err(|_| MockupError::RequestNotFound(upload.request_id))?;

        let existing_analyses = self.existing_analyses(upload.request_id, upload.id).await?;

        let signed_url = self
            .storage
            .signed_url(&upload.bucket, &upload.storage_path, SIGNED_URL_TTL_SECONDS)
            .await?;

        let context = MockupAnalysisContext {
            request_title: request.title.clone(),
            request_description: request.description.clone(),
            existing_analyses,
        };

        let analysis = self.provider.analyze_mockup(&signed_url, &context).await?;
        let analysis_json = serde_json::to_value(&analysis)?;

        let updated = self
            .mockups
            .mark_processed(upload.id, analysis_json, analysis.confidence)
            .await?;
        Ok(updated)
    }

    /// Analyze every not-yet-processed mockup for a request (Open Question
    /// resolution: a thin wrapper fanning `analyze_mockup` over `getForRequest`).
    ///
    /// # Errors
    /// Returns the first failure encountered; uploads already processed
    /// before the failure keep their persisted result.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn analyze_mockups(&self, request_id: Uuid) -> MockupResult<Vec<MockupUpload>> {
        let uploads = self.mockups.get_for_request(request_id).await?;
        let mut results = Vec::with_capacity(uploads.len());
        for upload in uploads {
            if upload.is_processed {
                results.push(upload);
                continue;
            }
            results.push(self.analyze_mockup(upload.id).await?);
        }
        Ok(results)
    }

    /// Build the cross-mockup consolidated view for a request (§4.4).
    ///
    /// # Errors
    /// Returns [`MockupError::MalformedAnalysis`] if a stored
    /// `analysisResult` can't be parsed back into a [`MockupAnalysis`].
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn consolidate(&self, request_id: Uuid) -> MockupResult<ConsolidatedMockupAnalysis> {
        let uploads = self.mockups.get_for_request(request_id).await?;
        let analyses = Self::parsed_analyses(&uploads)?;
        Ok(Self::consolidate_analyses(&analyses))
    }

    /// The per-mockup analyses for a request, one entry per processed
    /// upload, in upload order (§4.5 "per mockup" context chunks — distinct
    /// from [`Self::consolidate`]'s cross-mockup union).
    ///
    /// # Errors
    /// Returns [`MockupError::MalformedAnalysis`] if a stored
    /// `analysisResult` can't be parsed back into a [`MockupAnalysis`].
    pub async fn per_mockup_analyses(&self, request_id: Uuid) -> MockupResult<Vec<MockupAnalysis>> {
        let uploads = self.mockups.get_for_request(request_id).await?;
        Self::parsed_analyses(&uploads)
    }

    async fn existing_analyses(
        &self,
        request_id: Uuid,
        excluding: Uuid,
    ) -> MockupResult<Vec<MockupAnalysis>> {
        let uploads = self.mockups.get_for_request(request_id).await?;
        let relevant: Vec<_> = uploads.into_iter().filter(|u| u.id != excluding).collect();
        Self::parsed_analyses(&relevant)
    }

    fn parsed_analyses(uploads: &[MockupUpload]) -> MockupResult<Vec<MockupAnalysis>> {
        uploads
            .iter()
            .filter_map(|u| u.analysis_result.clone())
            .map(|v| serde_json::from_value(v).map_err(MockupError::from))
            .collect()
    }

    fn consolidate_analyses(analyses: &[MockupAnalysis]) -> ConsolidatedMockupAnalysis {
        if analyses.is_empty() {
            return ConsolidatedMockupAnalysis::default();
        }

        let mut ui_elements: Vec<UiElement> = Vec::new();
        let mut seen_elements: HashSet<String> = HashSet::new();
        let mut extracted_text: Vec<ExtractedText> = Vec::new();
        let mut seen_text: HashSet<String> = HashSet::new();
        let mut color_scheme: HashSet<String> = HashSet::new();
        let mut user_flows: HashSet<String> = HashSet::new();
        let mut business_logic: Vec<BusinessLogicInference> = Vec::new();
        let mut layouts = Vec::with_capacity(analyses.len());

        for analysis in analyses {
            for element in &analysis.ui_elements {
                let key = format!("{:?}|{:?}", element.element_type, element.label);
                if seen_elements.insert(key) {
                    ui_elements.push(element.clone());
                }
            }
            for text in &analysis.extracted_text {
                let key = format!("{:?}|{}", text.category, text.text);
                if seen_text.insert(key) {
                    extracted_text.push(text.clone());
                }
            }
            color_scheme.extend(analysis.color_scheme.iter().cloned());
            user_flows.extend(analysis.user_flows.iter().cloned());
            business_logic.extend(analysis.business_logic.iter().cloned());
            layouts.push(analysis.layout.clone());
        }

        let confidence = analyses.iter().map(|a| a.confidence).sum::<f64>() / analyses.len() as f64;

        ConsolidatedMockupAnalysis {
            ui_elements,
            extracted_text,
            layouts,
            color_scheme: color_scheme.into_iter().collect(),
            user_flows: user_flows.into_iter().collect(),
            business_logic,
            confidence,
            mockup_count: analyses.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prd_providers::test_utils::StubProvider;
    use prd_store::models::{PRDRequest, Priority, Requester};
    use prd_store::mock::MockStore;

    fn sample_request() -> PRDRequest {
        PRDRequest::new(
            "A title long enough".into(),
            "A description that is definitely over fifty characters long.".into(),
            Priority::Medium,
            Requester { id: Uuid::new_v4(), email: None },
            vec![],
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn analyze_mockup_round_trips_through_mark_processed() {
        let store = Arc::new(MockStore::new());
        let requests: Arc<dyn PRDRequestRepository> = store.clone();
        let mockups: Arc<dyn MockupRepository> = store;
        let request = requests.create(sample_request()).await.unwrap();

        let upload = MockupUpload::new(
            request.id,
            "path/1.png".into(),
            "bucket".into(),
            "1.png".into(),
            1024,
            "image/png".into(),
        )
        .unwrap();
        let upload = mockups.create(upload).await.unwrap();

        let storage: Arc<dyn MockupStorage> = Arc::new(crate::storage::MockMockupStorage::new());
        storage.upload("bucket", "path/1.png", vec![0; 16]).await.unwrap();

        let provider: Arc<dyn LLMProvider> = Arc::new(StubProvider::healthy("vision-a", 100));
        let analyzer = MockupAnalyzer::new(requests, mockups, storage, provider);

        let updated = analyzer.analyze_mockup(upload.id).await.unwrap();
        assert!(updated.is_processed);
        assert!(updated.analysis_result.is_some());
    }

    #[test]
    fn consolidate_dedups_elements_and_averages_confidence() {
        let a = MockupAnalysis {
            ui_elements: vec![UiElement {
                element_type: prd_providers::UiElementType::Button,
                bounding_box: prd_providers::BoundingBox { x: 0.0, y: 0.0, w: 0.1, h: 0.1 },
                label: Some("Submit".into()),
            }],
            confidence: 0.8,
            ..Default::default()
        };
        let b = MockupAnalysis {
            ui_elements: vec![UiElement {
                element_type: prd_providers::UiElementType::Button,
                bounding_box: prd_providers::BoundingBox { x: 0.5, y: 0.5, w: 0.1, h: 0.1 },
                label: Some("Submit".into()),
            }],
            confidence: 0.6,
            ..Default::default()
        };
        let consolidated = MockupAnalyzer::consolidate_analyses(&[a, b]);
        assert_eq!(consolidated.ui_elements.len(), 1);
        assert!((consolidated.confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(consolidated.mockup_count, 2);
    }
}
