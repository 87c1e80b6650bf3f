//! Provider selection, retry, and fallback (§4.6).

use prd_config::ProviderConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::error::{ProviderError, ProviderResult, is_retryable};
use crate::health::HealthTable;
use crate::provider::LLMProvider;

/// Priority-ordered, health-tracked fallback chain over a fixed set of
/// providers (§4.6). Constructed once at composition-root startup and
/// shared by `Arc` (§9 "Global state").
pub struct Orchestrator {
    providers: Vec<Arc<dyn LLMProvider>>,
    health: HealthTable,
    config: ProviderConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn LLMProvider>>, config: ProviderConfig) -> Self {
        Self { providers, health: HealthTable::new(), config }
    }

    /// Snapshot of every registered provider's health, for status endpoints.
    #[must_use]
    pub fn health_snapshot(&self, provider: &str) -> crate::health::ProviderHealth {
        self.health.snapshot(provider)
    }

    /// Build the ordered candidate list (§4.6 "Selection"): privacy-eligible,
    /// healthy, available providers, with the preferred one (if eligible)
    /// first, otherwise ordered by descending priority with least-recently
    /// used breaking ties.
    async fn select_candidates(&self, preferred_provider: Option<&str>) -> Vec<Arc<dyn LLMProvider>> {
        let now = Instant::now();
        let mut eligible = Vec::new();
        for provider in &self.providers {
            if provider.max_privacy_level() > self.config.max_privacy_level {
                continue;
            }
            if !self.health.snapshot(provider.name()).is_healthy(now) {
                continue;
            }
            if !provider.is_available().await {
                continue;
            }
            eligible.push(Arc::clone(provider));
        }

        if let Some(preferred) = preferred_provider
            && let Some(pos) = eligible.iter().position(|p| p.name() == preferred)
        {
            let chosen = eligible.remove(pos);
            eligible.sort_by(|a, b| self.selection_order(a, b));
            eligible.insert(0, chosen);
            return eligible;
        }
        if preferred_provider.is_some() {
            tracing::warn!(
                preferred = preferred_provider,
                "preferred provider unavailable, falling back to general selection rule"
            );
        }

        eligible.sort_by(|a, b| self.selection_order(a, b));
        eligible
    }

    /// Descending priority; least-recently-successful first among ties.
    fn selection_order(&self, a: &Arc<dyn LLMProvider>, b: &Arc<dyn LLMProvider>) -> std::cmp::Ordering {
        b.priority().cmp(&a.priority()).then_with(|| {
            let a_last = self.health.snapshot(a.name()).last_success_at();
            let b_last = self.health.snapshot(b.name()).last_success_at();
            match (a_last, b_last) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (Some(_), None) => std::cmp::Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(&b),
            }
        })
    }

    /// Run `call` against the selected candidate chain: deadline, exponential
    /// backoff retry on transient errors (up to `max_retries` attempts), then
    /// one fallback attempt on the next candidate on definitive failure
    /// (§4.6 "Execution").
    ///
    /// # Errors
    /// Returns [`ProviderError::NoProvidersAvailable`] if no candidate is
    /// eligible, or [`ProviderError::AllProvidersFailed`] if the primary and
    /// its fallback both failed.
    pub async fn call<F, Fut, T>(&self, preferred_provider: Option<&str>, call: F) -> ProviderResult<(T, String)>
    where
        F: Fn(Arc<dyn LLMProvider>) -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let candidates = self.select_candidates(preferred_provider).await;
        let mut attempted = Vec::new();
        let mut candidates = candidates.into_iter();

        let Some(primary) = candidates.next() else {
            return Err(ProviderError::NoProvidersAvailable);
        };
        attempted.push(primary.name().to_string());
        match self.call_with_retries(&primary, &call).await {
            Ok(value) => return Ok((value, primary.name().to_string())),
            Err(err) => tracing::warn!(provider = primary.name(), error = %err, "primary provider exhausted retries"),
        }

        // (iii) on definitive failure, advance to the next candidate and retry once.
        if let Some(fallback) = candidates.next() {
            attempted.push(fallback.name().to_string());
            let deadline = Duration::from_secs(self.config.deadline_seconds);
            let started = Instant::now();
            let outcome = tokio::time::timeout(deadline, call(Arc::clone(&fallback))).await;
            let elapsed = started.elapsed();
            match outcome {
                Ok(Ok(value)) => {
                    self.health.record_success(fallback.name(), elapsed);
                    return Ok((value, fallback.name().to_string()));
                }
                Ok(Err(err)) => {
                    self.record_call_failure(&fallback, elapsed);
                    tracing::warn!(provider = fallback.name(), error = %err, "fallback provider failed");
                }
                Err(_) => {
                    self.record_call_failure(&fallback, elapsed);
                    tracing::warn!(provider = fallback.name(), "fallback provider timed out");
                }
            }
        }

        Err(ProviderError::AllProvidersFailed { attempts: attempted })
    }

    async fn call_with_retries<F, Fut, T>(&self, provider: &Arc<dyn LLMProvider>, call: &F) -> ProviderResult<T>
    where
        F: Fn(Arc<dyn LLMProvider>) -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let deadline = Duration::from_secs(self.config.deadline_seconds);
        let mut attempt = 0;
        loop {
            let started = Instant::now();
            let outcome = tokio::time::timeout(deadline, call(Arc::clone(provider))).await;
            let elapsed = started.elapsed();
            match outcome {
                Ok(Ok(value)) => {
                    self.health.record_success(provider.name(), elapsed);
                    return Ok(value);
                }
                Ok(Err(err)) if attempt < self.config.max_retries && is_retryable(&err) => {
                    self.record_call_failure(provider, elapsed);
                    let delay = Duration::from_millis(100) * 2_u32.pow(attempt);
                    tracing::warn!(provider = provider.name(), attempt, ?delay, error = %err, "transient provider failure, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                Ok(Err(err)) => {
                    self.record_call_failure(provider, elapsed);
                    return Err(err);
                }
                Err(_) => {
                    self.record_call_failure(provider, elapsed);
                    return Err(ProviderError::Timeout {
                        provider: provider.name().to_string(),
                        timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    });
                }
            }
        }
    }

    fn record_call_failure(&self, provider: &Arc<dyn LLMProvider>, elapsed: Duration) {
        self.health.record_failure(
            provider.name(),
            elapsed,
            self.config.failure_threshold,
            Duration::from_secs(self.config.unhealthy_cooldown_seconds),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Capability, GenerateCommand, GenerationOutput};
    use crate::test_utils::StubProvider;
    use prd_config::PrivacyLevel;

    fn config() -> ProviderConfig {
        ProviderConfig {
            max_privacy_level: PrivacyLevel::External,
            preferred_provider: None,
            api_keys: std::collections::HashMap::new(),
            deadline_seconds: 5,
            max_retries: 3,
            failure_threshold: 3,
            unhealthy_cooldown_seconds: 60,
        }
    }

    fn command() -> GenerateCommand {
        GenerateCommand {
            title: "T".into(),
            description: "D".into(),
            context: String::new(),
            clarifications: Vec::new(),
        }
    }

    #[tokio::test]
    async fn falls_back_to_next_candidate_on_definitive_failure() {
        let a = Arc::new(StubProvider::unavailable("A", 10));
        let b = Arc::new(StubProvider::healthy("B", 50));
        let c = Arc::new(StubProvider::failing("C", 100));
        let orchestrator = Orchestrator::new(
            vec![a, b.clone(), c],
            config(),
        );

        let (_output, generated_by) = orchestrator
            .call(Some("A"), |p| {
                let command = command();
                async move { p.generate_prd(&command, None).await }
            })
            .await
            .unwrap();

        assert_eq!(generated_by, "B");
    }

    #[tokio::test]
    async fn no_candidates_yields_no_providers_available() {
        let orchestrator = Orchestrator::new(vec![], config());
        let err = orchestrator
            .call(None, |p: Arc<dyn LLMProvider>| async move {
                p.analyze_requirements("x").await.map(|a| GenerationOutput {
                    content: String::new(),
                    confidence: a.confidence,
                    metadata: std::collections::HashMap::new(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NoProvidersAvailable));
    }
}
