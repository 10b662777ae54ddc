//! Relay session tracking.
//!
//! Every WebSocket relay holds a [`SessionGuard`] for its whole life. The
//! tracker exposes the live count so shutdown can report what it is
//! draining, and the guard keeps the sessions gauge in step.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Only uniqueness matters, so relaxed ordering is enough.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws-{}", self.0)
    }
}

/// Counts relay sessions that are currently open.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    active: Arc<AtomicU64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session. The count drops again when the guard does.
    pub fn track(&self) -> SessionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        metrics::record_session_opened();
        SessionGuard {
            active: Arc::clone(&self.active),
            id: SessionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Held by a relay task for as long as both sockets are in use.
#[derive(Debug)]
pub struct SessionGuard {
    active: Arc<AtomicU64>,
    id: SessionId,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        metrics::record_session_closed();
        tracing::trace!(session_id = %self.id, "Session released");
    }
}
