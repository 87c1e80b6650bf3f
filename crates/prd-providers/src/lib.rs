//! Provider Orchestrator and `LLMProvider`/`Context Request Port` collaborators (§4.6, §6).

pub mod error;
pub mod health;
pub mod orchestrator;
pub mod provider;
pub mod vision;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ProviderError, ProviderResult};
pub use health::{HealthTable, ProviderHealth};
pub use orchestrator::Orchestrator;
pub use provider::{
    AdditionalContextAvailability, Capability, ClarificationAnswer, CodebaseContextResponse,
    ContextRequestPort, GenerateCommand, GenerationOutput, LLMProvider, MockupContextResponse,
    RelevantFile, RequirementsAnalysis,
};
pub use vision::{
    BoundingBox, BusinessLogicInference, ExtractedText, LayoutStructure, MockupAnalysis,
    MockupAnalysisContext, MockupExtraction, TextCategory, UiElement, UiElementType,
};
