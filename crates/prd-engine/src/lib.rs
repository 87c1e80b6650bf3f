//! Clarification & Generation Engine (§4.7): analyzes a request, gates on
//! low confidence, builds context, drives a provider, and persists the
//! resulting document. The composition point of the workspace — every
//! other domain crate is a collaborator this crate composes behind one
//! `run`/`resume` entry point, consumed by a session (§4.8) or a CLI command.

pub mod clarify;
pub mod context_request;
pub mod engine;
pub mod error;
pub mod export;
pub mod progress;

pub use clarify::{ClarificationPriority, RankedQuestion};
pub use context_request::EngineContextPort;
pub use engine::{ClarificationEngine, EngineOutcome};
pub use error::{EngineError, EngineResult};
pub use export::{ExportFormat, ExportedDocument, export_document};
pub use progress::ProgressSink;
