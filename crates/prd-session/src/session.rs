//! The `SessionActor` (§4.8): a single in-flight generation task per
//! request, talking to its owner over a transport-agnostic channel pair.
//!
//! `prd-session` stops at the channel boundary: bridging [`SessionHandle`]'s
//! `inbound`/`outbound` to an actual WebSocket or SSE connection is a
//! transport concern, out of scope per §1.

use std::sync::Arc;

use async_trait::async_trait;
use prd_engine::{ClarificationEngine, EngineOutcome, ProgressSink};
use prd_providers::ClarificationAnswer;
use prd_store::models::{PRDSection, RequestStatus};
use prd_store::traits::PRDRequestRepository;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;

use crate::error::SessionResult;
use crate::frame::{ClientFrame, ServerFrame, WireQuestion, WireSection};
use crate::registry::SessionRegistry;

/// Bounded so a slow/absent transport consumer applies backpressure rather
/// than letting the actor buffer unbounded progress frames.
const CHANNEL_CAPACITY: usize = 64;

/// What a caller holds after [`SessionActor::spawn`]: the two ends of the
/// frame channel plus a handle to the driving task, and a `cancel` trigger
/// standing in for "the client closed the channel" (§4.8 "Cancellation").
pub struct SessionHandle {
    /// Send [`ClientFrame`]s to the session.
    pub inbound: mpsc::Sender<ClientFrame>,
    /// Receive [`ServerFrame`]s from the session, in emission order.
    pub outbound: mpsc::Receiver<ServerFrame>,
    /// Completes when the driven generation task exits.
    pub task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Signal cancellation: the in-flight provider call (if any) is
    /// abandoned at its next suspension point and the request transitions
    /// to `cancelled` (§4.8, §5 "Cancellation & timeouts").
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Forwards [`prd_engine::ProgressSink`] checkpoints onto the outbound
/// channel as `progress`/`section` frames. Owns the only `Sender` half used
/// during one generation, so outgoing writes are naturally serialized
/// (§4.8 "a single session serializes its outgoing writes").
struct ChannelProgressSink {
    outbound: mpsc::Sender<ServerFrame>,
}

#[async_trait]
impl ProgressSink for ChannelProgressSink {
    async fn on_progress(&self, checkpoint: &str) {
        let _ = self.outbound.send(ServerFrame::Progress { message: checkpoint.to_string() }).await;
    }

    async fn on_section(&self, section: &PRDSection) {
        let _ = self.outbound.send(ServerFrame::Section(WireSection::from(section))).await;
    }
}

/// Drives one request's generation, per §4.8.
pub struct SessionActor {
    request_id: Uuid,
    engine: Arc<ClarificationEngine>,
    requests: Arc<dyn PRDRequestRepository>,
}

impl SessionActor {
    /// Reserve `request_id` in `registry` (rejecting a second concurrent
    /// session for the same request) and spawn the driving task.
    ///
    /// # Errors
    /// Returns [`crate::error::SessionError::AlreadyActive`] if a session
    /// for `request_id` is already registered.
    pub fn spawn(
        request_id: Uuid,
        engine: Arc<ClarificationEngine>,
        requests: Arc<dyn PRDRequestRepository>,
        registry: Arc<SessionRegistry>,
    ) -> SessionResult<SessionHandle> {
        let guard = registry.acquire(request_id)?;

        let (inbound_tx, inbound_rx) = mpsc::channel::<ClientFrame>(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel::<ServerFrame>(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let actor = Self { request_id, engine, requests };
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            actor.run(inbound_rx, outbound_tx, task_cancel).await;
        });

        Ok(SessionHandle { inbound: inbound_tx, outbound: outbound_rx, task, cancel })
    }

    #[instrument(skip(self, inbound, outbound, cancel), fields(request_id = %self.request_id))]
    async fn run(
        &self,
        mut inbound: mpsc::Receiver<ClientFrame>,
        outbound: mpsc::Sender<ServerFrame>,
        cancel: CancellationToken,
    ) {
        let _ = outbound.send(ServerFrame::Status { message: "session_open".to_string() }).await;
        let sink = ChannelProgressSink { outbound: outbound.clone() };

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    self.cancel_request().await;
                    break;
                }
                frame = inbound.recv() => {
                    match frame {
                        None => {
                            // Client closed the channel: same contract as an explicit cancel.
                            self.cancel_request().await;
                            break;
                        }
                        Some(ClientFrame::StartGeneration { .. }) => {
                            if !self.drive(self.engine.run(self.request_id, Some(&sink)), &outbound, &cancel).await {
                                break;
                            }
                        }
                        Some(ClientFrame::ClarificationAnswers { answers }) => {
                            let answers: Vec<ClarificationAnswer> =
                                answers.into_iter().map(Into::into).collect();
                            if !self
                                .drive(self.engine.resume(self.request_id, answers, Some(&sink)), &outbound, &cancel)
                                .await
                            {
                                break;
                            }
                        }
                        Some(ClientFrame::Response { value }) => {
                            tracing::debug!(response = %value, "mid-generation response observed, no live provider round-trip wired");
                        }
                    }
                }
            }
        }
    }

    /// Race one engine call against cancellation, emitting the resulting
    /// frame(s). Returns `false` once the session should stop (completed,
    /// failed, or cancelled), `true` to keep accepting frames (e.g. after a
    /// `clarification_needed` outcome).
    async fn drive(
        &self,
        fut: impl std::future::Future<Output = prd_engine::EngineResult<EngineOutcome>>,
        outbound: &mpsc::Sender<ServerFrame>,
        cancel: &CancellationToken,
    ) -> bool {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.cancel_request().await;
                false
            }
            result = fut => {
                match result {
                    Ok(EngineOutcome::NeedsClarification { questions, .. }) => {
                        let questions: Vec<WireQuestion> = questions.iter().map(WireQuestion::from).collect();
                        let _ = outbound.send(ServerFrame::ClarificationNeeded { questions }).await;
                        true
                    }
                    Ok(EngineOutcome::Generated { document, .. }) => {
                        let _ = outbound.send(ServerFrame::GenerationComplete { document }).await;
                        false
                    }
                    Err(err) => {
                        let _ = outbound.send(ServerFrame::Error { message: err.to_string() }).await;
                        false
                    }
                }
            }
        }
    }

    async fn cancel_request(&self) {
        if let Ok(request) = self.requests.get(self.request_id).await
            && !request.status.is_terminal()
        {
            let _ = self.requests.update_status(self.request_id, RequestStatus::Cancelled).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prd_config::{ClarificationConfig, ContextBudgetConfig};
    use prd_mockup::{MockMockupStorage, MockupAnalyzer};
    use prd_providers::test_utils::StubProvider;
    use prd_providers::Orchestrator;
    use prd_search::test_mocks::MockSearch;
    use prd_store::models::{PRDRequest, Priority, Requester};
    use prd_store::MockStore;

    fn engine_with_provider(provider: Arc<dyn prd_providers::LLMProvider>) -> Arc<ClarificationEngine> {
        let store = Arc::new(MockStore::new());
        let orchestrator = Arc::new(Orchestrator::new(vec![provider.clone()], prd_config::ProviderConfig::from_env()));
        let mockup_analyzer = Arc::new(MockupAnalyzer::new(
            store.clone(),
            store.clone(),
            Arc::new(MockMockupStorage::new()),
            provider,
        ));
        Arc::new(ClarificationEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            mockup_analyzer,
            Arc::new(MockSearch::empty()),
            orchestrator,
            ClarificationConfig { enabled: true, confidence_threshold: 0.70 },
            ContextBudgetConfig::from_env(),
        ))
    }

    async fn seeded_request(store: &MockStore) -> Uuid {
        let request = PRDRequest::new(
            "Chat".to_string(),
            "Add real-time messaging to the product".to_string(),
            Priority::Medium,
            Requester { id: Uuid::new_v4(), email: None },
            vec![],
            None,
        )
        .unwrap();
        let created = store.create(request).await.unwrap();
        created.id
    }

    #[tokio::test]
    async fn a_second_session_for_the_same_request_is_rejected() {
        let provider: Arc<dyn prd_providers::LLMProvider> = Arc::new(StubProvider::healthy("p", 100));
        let engine = engine_with_provider(provider);
        let store = MockStore::new();
        let request_id = seeded_request(&store).await;
        let requests: Arc<dyn PRDRequestRepository> = Arc::new(store);
        let registry = SessionRegistry::new();

        let _first = SessionActor::spawn(request_id, engine.clone(), requests.clone(), registry.clone()).unwrap();
        let second = SessionActor::spawn(request_id, engine, requests, registry);
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn closing_inbound_cancels_a_pending_request() {
        let provider: Arc<dyn prd_providers::LLMProvider> = Arc::new(StubProvider::healthy("p", 100));
        let engine = engine_with_provider(provider);
        let store = MockStore::new();
        let request_id = seeded_request(&store).await;
        let requests: Arc<dyn PRDRequestRepository> = Arc::new(store);
        let registry = SessionRegistry::new();

        let handle = SessionActor::spawn(request_id, engine, requests.clone(), registry).unwrap();
        drop(handle.inbound);
        handle.task.await.unwrap();

        let request = requests.get(request_id).await.unwrap();
        assert!(matches!(request.status, RequestStatus::Cancelled));
    }
}
