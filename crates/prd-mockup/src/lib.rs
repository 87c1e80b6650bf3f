//! Mockup Analyzer: per-image vision analysis and cross-mockup
//! consolidation (§4.4).

pub mod analyzer;
pub mod error;
pub mod storage;

pub use analyzer::{ConsolidatedMockupAnalysis, MockupAnalyzer};
pub use error::{MockupError, MockupResult};
pub use storage::{MockMockupStorage, MockupStorage, SIGNED_URL_TTL_SECONDS};
