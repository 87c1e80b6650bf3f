//! Per-provider health table (§4.6, §9 "Global state").
//!
//! The only process-wide mutable state besides configuration: a single
//! `RwLock`-guarded map, constructed once at composition-root startup and
//! shared by `Arc` into every subsystem that generates.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Running health stats for one provider, updated after every call.
#[derive(Debug, Clone)]
pub struct ProviderHealth {
    pub consecutive_failures: u32,
    pub total_calls: u64,
    pub avg_response_time_ms: f64,
    /// Set when `consecutive_failures` crosses the configured threshold;
    /// cleared once the cooldown elapses or a call succeeds.
    unhealthy_until: Option<Instant>,
    /// Used for least-recently-used tie-breaking among equal-priority
    /// candidates (§4.6 "Selection"). `None` means never succeeded.
    last_success_at: Option<Instant>,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            total_calls: 0,
            avg_response_time_ms: 0.0,
            unhealthy_until: None,
            last_success_at: None,
        }
    }
}

impl ProviderHealth {
    #[must_use]
    pub fn is_healthy(&self, now: Instant) -> bool {
        self.unhealthy_until.is_none_or(|until| now >= until)
    }

    #[must_use]
    pub const fn last_success_at(&self) -> Option<Instant> {
        self.last_success_at
    }

    fn record_response_time(&mut self, elapsed: Duration) {
        #[allow(clippy::cast_precision_loss)]
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.total_calls += 1;
        #[allow(clippy::cast_precision_loss)]
        let count = self.total_calls as f64;
        self.avg_response_time_ms += (elapsed_ms - self.avg_response_time_ms) / count;
    }

    fn record_success(&mut self, elapsed: Duration, now: Instant) {
        self.record_response_time(elapsed);
        self.consecutive_failures = 0;
        self.unhealthy_until = None;
        self.last_success_at = Some(now);
    }

    fn record_failure(&mut self, elapsed: Duration, failure_threshold: u32, cooldown: Duration, now: Instant) {
        self.record_response_time(elapsed);
        self.consecutive_failures += 1;
        if self.consecutive_failures >= failure_threshold {
            self.unhealthy_until = Some(now + cooldown);
        }
    }
}

/// The shared health table: one [`ProviderHealth`] row per provider name.
#[derive(Debug, Default)]
pub struct HealthTable {
    rows: std::sync::RwLock<HashMap<String, ProviderHealth>>,
}

impl HealthTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot used by selection (§4.6): healthy/unhealthy status and the
    /// last-success timestamp for LRU tie-breaking.
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn snapshot(&self, provider: &str) -> ProviderHealth {
        self.rows.read().expect("health table lock poisoned").get(provider).cloned().unwrap_or_default()
    }

    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn record_success(&self, provider: &str, elapsed: Duration) {
        let mut rows = self.rows.write().expect("health table lock poisoned");
        rows.entry(provider.to_string()).or_default().record_success(elapsed, Instant::now());
    }

    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn record_failure(&self, provider: &str, elapsed: Duration, failure_threshold: u32, cooldown: Duration) {
        let mut rows = self.rows.write().expect("health table lock poisoned");
        rows.entry(provider.to_string()).or_default().record_failure(
            elapsed,
            failure_threshold,
            cooldown,
            Instant::now(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn becomes_unhealthy_after_threshold_and_recovers_after_cooldown() {
        let table = HealthTable::new();
        for _ in 0..3 {
            table.record_failure("c", Duration::from_millis(1), 3, Duration::from_millis(0));
        }
        let snap = table.snapshot("c");
        assert_eq!(snap.consecutive_failures, 3);
        // cooldown is zero, so it should already read healthy again.
        assert!(snap.is_healthy(Instant::now() + Duration::from_millis(1)));
    }

    #[test]
    fn success_clears_failure_streak() {
        let table = HealthTable::new();
        table.record_failure("a", Duration::from_millis(1), 3, Duration::from_secs(60));
        table.record_success("a", Duration::from_millis(1));
        assert_eq!(table.snapshot("a").consecutive_failures, 0);
    }
}
