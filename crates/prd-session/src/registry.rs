//! Tracks which request ids currently have an active session, so a second
//! session for the same request is rejected (§4.8 "concurrent sessions for
//! the same request are rejected").

use dashmap::DashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};

/// Process-wide set of request ids with a live [`crate::SessionActor`].
/// Constructed once at composition-root startup and shared by `Arc`, the
/// same way the provider registry/health table is (§9 "Global state").
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: DashSet<Uuid>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reserve `request_id` for a new session.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyActive`] if a session for this request
    /// is already registered.
    pub fn acquire(&self, request_id: Uuid) -> SessionResult<SessionGuard<'_>> {
        if !self.active.insert(request_id) {
            return Err(SessionError::AlreadyActive(request_id));
        }
        Ok(SessionGuard { registry: self, request_id })
    }

    fn release(&self, request_id: Uuid) {
        self.active.remove(&request_id);
    }

    #[must_use]
    pub fn is_active(&self, request_id: Uuid) -> bool {
        self.active.contains(&request_id)
    }
}

/// Releases its request id from the registry on drop, so a crashed or
/// cancelled session never leaves a request permanently unreachable.
pub struct SessionGuard<'a> {
    registry: &'a SessionRegistry,
    request_id: Uuid,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(self.request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_for_same_request_is_rejected() {
        let registry = SessionRegistry::new();
        let _guard = registry.acquire(Uuid::new_v4()).unwrap();
        let request_id = Uuid::new_v4();
        let _first = registry.acquire(request_id).unwrap();
        assert!(registry.acquire(request_id).is_err());
    }

    #[test]
    fn dropping_the_guard_releases_the_request() {
        let registry = SessionRegistry::new();
        let request_id = Uuid::new_v4();
        {
            let _guard = registry.acquire(request_id).unwrap();
            assert!(registry.is_active(request_id));
        }
        assert!(!registry.is_active(request_id));
        assert!(registry.acquire(request_id).is_ok());
    }
}
