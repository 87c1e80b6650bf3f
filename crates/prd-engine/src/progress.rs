//! Progress checkpoints emitted while `ClarificationEngine::run`/`resume`
//! drive a request (§4.8 "progress frames on well-defined engine
//! checkpoints... sections streamed as they are finalized").

use async_trait::async_trait;
use prd_store::models::PRDSection;

/// Notified at fixed checkpoints during one generation run. `prd-session`
/// implements this to turn checkpoints into `progress`/`section` wire
/// frames; callers that don't need streaming (a CLI command, a test) pass
/// `None` to every method that accepts a sink.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// A well-defined checkpoint was reached: `"analyze"`, `"retrieve"`,
    /// `"provider-selected:<name>"`, or `"context:<strategy>"`.
    async fn on_progress(&self, checkpoint: &str);

    /// One section was finalized by Phase 5's parse step, in `order`.
    async fn on_section(&self, section: &PRDSection);
}
