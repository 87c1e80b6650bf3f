//! Mockup vision-analysis wire shapes (§4.4, §6 "LLM Provider").
//!
//! These are the types a vision-capable [`crate::LLMProvider`] adapter hands
//! back for a single mockup image. `prd-mockup` persists and consolidates
//! them; this crate only defines the contract.

use serde::{Deserialize, Serialize};

/// Closed enum of recognizable UI element kinds (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UiElementType {
    Button,
    TextField,
    Label,
    Image,
    Icon,
    NavigationBar,
    TabBar,
    TableView,
    CollectionView,
    Card,
    Dropdown,
    Checkbox,
    RadioButton,
    Slider,
    Toggle,
    SearchBar,
    Other,
}

/// Normalized bounding box, each component in `[0, 1]` relative to image size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One detected UI element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiElement {
    #[serde(rename = "type")]
    pub element_type: UiElementType,
    pub bounding_box: BoundingBox,
    pub label: Option<String>,
}

/// Closed enum of extracted-text categories (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextCategory {
    Heading,
    Subheading,
    Body,
    Label,
    Button,
    Placeholder,
    Error,
    Other,
}

/// One piece of text read off the mockup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub category: TextCategory,
    pub text: String,
}

/// Layout-level structure inferred from the mockup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutStructure {
    pub screen_type: String,
    pub hierarchy_levels: u32,
    pub primary_layout: String,
    pub component_groups: Vec<String>,
}

/// One business-logic inference with its own confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessLogicInference {
    pub description: String,
    pub confidence: f64,
}

/// The structured per-mockup result a vision-capable provider returns (§4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockupAnalysis {
    pub ui_elements: Vec<UiElement>,
    pub extracted_text: Vec<ExtractedText>,
    pub layout: LayoutStructure,
    pub color_scheme: Vec<String>,
    pub user_flows: Vec<String>,
    pub business_logic: Vec<BusinessLogicInference>,
    /// Overall `[0, 1]` confidence for this single analysis.
    pub confidence: f64,
}

/// Context passed alongside the image URL when invoking the provider (§4.4 b).
#[derive(Debug, Clone, Default)]
pub struct MockupAnalysisContext {
    pub request_title: String,
    pub request_description: String,
    pub existing_analyses: Vec<MockupAnalysis>,
}

/// §6 `extractFromMockups(sources[])` — the coarser, text-level feature
/// extraction the Clarification & Generation Engine combines with textual
/// analysis (§4.7 Phase 1), distinct from the full per-image [`MockupAnalysis`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockupExtraction {
    pub features: Vec<String>,
    pub flows: Vec<String>,
    pub components: Vec<String>,
    pub business_logic: Vec<String>,
}
