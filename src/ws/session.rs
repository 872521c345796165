//! Live session accounting for the health endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Counts {
    active: AtomicUsize,
    total: AtomicU64,
}

/// Counts open and historical Socket.IO sessions.
///
/// Cloning shares the counters.
#[derive(Debug, Clone, Default)]
pub struct SessionCounter {
    counts: Arc<Counts>,
}

impl SessionCounter {
    /// Creates a counter with no sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session. It stays active until the guard drops.
    #[must_use]
    pub fn open(&self) -> SessionGuard {
        self.counts.active.fetch_add(1, Ordering::Relaxed);
        self.counts.total.fetch_add(1, Ordering::Relaxed);
        SessionGuard {
            counts: Arc::clone(&self.counts),
        }
    }

    /// Sessions currently open.
    #[must_use]
    pub fn active(&self) -> usize {
        self.counts.active.load(Ordering::Relaxed)
    }

    /// Sessions opened since startup.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.total.load(Ordering::Relaxed)
    }
}

/// Marks one session as active for its lifetime.
#[derive(Debug)]
pub struct SessionGuard {
    counts: Arc<Counts>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.counts.active.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_active_sessions() {
        let counter = SessionCounter::new();
        let a = counter.open();
        let b = counter.clone().open();
        assert_eq!(counter.active(), 2);

        drop(a);
        assert_eq!(counter.active(), 1);
        drop(b);
        assert_eq!(counter.active(), 0);
        assert_eq!(counter.total(), 2);
    }
}
