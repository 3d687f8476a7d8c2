//! Session scoping for in-flight work.
//!
//! Each login mints a [`SessionGuard`] carrying a cancellation token and a
//! generation number. Async results check the guard before touching the
//! store, so a response that resolves after logout, or after a newer login,
//! is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Mints guards and tracks which generation is current.
#[derive(Debug, Default)]
pub struct SessionTracker {
    current: Arc<AtomicU64>,
}

impl SessionTracker {
    /// Creates a tracker with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation. Guards from earlier generations stop
    /// being current.
    pub fn begin(&self) -> SessionGuard {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        SessionGuard {
            token: CancellationToken::new(),
            generation,
            current: Arc::clone(&self.current),
        }
    }

    /// Makes every outstanding guard stale.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    /// Current generation number.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

/// Handle identifying one session.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    token: CancellationToken,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl SessionGuard {
    /// Returns true while the session is neither cancelled nor superseded.
    #[must_use]
    pub fn is_current(&self) -> bool {
        !self.token.is_cancelled() && self.current.load(Ordering::Acquire) == self.generation
    }

    /// Generation this guard was minted for.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancels the session.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolves once the session is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_current_until_cancelled() {
        let tracker = SessionTracker::new();
        let guard = tracker.begin();
        assert!(guard.is_current());

        guard.cancel();
        assert!(!guard.is_current());
    }

    #[test]
    fn test_newer_session_supersedes() {
        let tracker = SessionTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();

        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn test_invalidate() {
        let tracker = SessionTracker::new();
        let guard = tracker.begin();
        tracker.invalidate();
        assert!(!guard.is_current());
    }

    #[tokio::test]
    async fn test_cancelled_resolves() {
        let tracker = SessionTracker::new();
        let guard = tracker.begin();
        let clone = guard.clone();
        clone.cancel();
        guard.cancelled().await;
    }
}
