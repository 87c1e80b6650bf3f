//! Closed error taxonomy for the Provider Orchestrator (§4.6, §7).

use prd_common::{Classified, ErrorKind};
use thiserror::Error;

/// Errors surfaced by [`crate::LLMProvider`] adapters and [`crate::Orchestrator`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No candidate satisfied the configured privacy ceiling and availability check.
    #[error("no provider is available under the configured privacy ceiling")]
    NoProvidersAvailable,

    /// The selected provider rejected the credential.
    #[error("provider '{provider}' rejected credentials: {reason}")]
    Unauthorized { provider: String, reason: String },

    /// The selected provider is rate-limiting calls (transient, retryable).
    #[error("provider '{provider}' is rate-limited: {reason}")]
    RateLimited { provider: String, reason: String },

    /// A connection-level or 5xx failure talking to the provider (transient, retryable).
    #[error("provider '{provider}' unavailable: {reason}")]
    Upstream { provider: String, reason: String },

    /// The provider returned a response the adapter could not make sense of.
    #[error("provider '{provider}' returned a malformed response: {reason}")]
    MalformedResponse { provider: String, reason: String },

    /// The call exceeded its deadline (§4.6 "Execution").
    #[error("provider '{provider}' call timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// The primary candidate and its single fallback both failed (§4.6 "Execution" iii).
    #[error("all provider candidates failed: {attempts:?}")]
    AllProvidersFailed { attempts: Vec<String> },

    /// Anything else, preserved for diagnostics.
    #[error("provider error: {0}")]
    Other(String),
}

impl Classified for ProviderError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NoProvidersAvailable => ErrorKind::ProcessingFailed,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::RateLimited { .. } | Self::Upstream { .. } | Self::AllProvidersFailed { .. } => {
                ErrorKind::ProcessingFailed
            }
            Self::MalformedResponse { .. } | Self::Other(_) => ErrorKind::ProcessingFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

/// Whether a failure is transient and worth a same-provider retry with
/// backoff (§4.6 "Execution" ii: "connection, 5xx, rate-limit").
#[must_use]
pub fn is_retryable(err: &ProviderError) -> bool {
    matches!(err, ProviderError::RateLimited { .. } | ProviderError::Upstream { .. })
}

/// Result alias used throughout `prd-providers`.
pub type ProviderResult<T> = Result<T, ProviderError>;
