//! Test doubles for [`crate::LLMProvider`], shared across this crate's own
//! tests and downstream crates (`prd-mockup`, `prd-engine`).

use async_trait::async_trait;
use prd_config::PrivacyLevel;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    Capability, ContextRequestPort, GenerateCommand, GenerationOutput, LLMProvider,
    RequirementsAnalysis,
};
use crate::vision::{MockupAnalysis, MockupAnalysisContext, MockupExtraction};

/// A configurable [`LLMProvider`] double: can be made unavailable, made to
/// fail every call with a transient error, or succeed with canned output.
pub struct StubProvider {
    name: String,
    priority: u32,
    available: bool,
    fail: bool,
    calls: AtomicUsize,
}

impl StubProvider {
    #[must_use]
    pub fn healthy(name: &str, priority: u32) -> Self {
        Self { name: name.to_string(), priority, available: true, fail: false, calls: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn unavailable(name: &str, priority: u32) -> Self {
        Self { name: name.to_string(), priority, available: false, fail: false, calls: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn failing(name: &str, priority: u32) -> Self {
        Self { name: name.to_string(), priority, available: true, fail: true, calls: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::TextGeneration, Capability::RequirementsAnalysis, Capability::VisionAnalysis]
    }

    fn max_privacy_level(&self) -> PrivacyLevel {
        PrivacyLevel::External
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn generate_prd(
        &self,
        command: &GenerateCommand,
        _context_request: Option<Arc<dyn ContextRequestPort>>,
    ) -> ProviderResult<GenerationOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::RateLimited { provider: self.name.clone(), reason: "stub".into() });
        }
        Ok(GenerationOutput {
            content: format!("# Executive Summary\n\n{}\n", command.title),
            confidence: 0.9,
            metadata: HashMap::new(),
        })
    }

    async fn analyze_requirements(&self, _text: &str) -> ProviderResult<RequirementsAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::RateLimited { provider: self.name.clone(), reason: "stub".into() });
        }
        Ok(RequirementsAnalysis { confidence: 0.82, ..Default::default() })
    }

    async fn extract_from_mockups(&self, _sources: &[String]) -> ProviderResult<MockupExtraction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MockupExtraction::default())
    }

    async fn analyze_mockup(
        &self,
        _image_url: &str,
        _context: &MockupAnalysisContext,
    ) -> ProviderResult<MockupAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::RateLimited { provider: self.name.clone(), reason: "stub".into() });
        }
        Ok(MockupAnalysis { confidence: 0.9, ..Default::default() })
    }
}
