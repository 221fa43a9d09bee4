//! One cancellation switch for every timer a session owns.
//!
//! Countdowns, inter-shot pauses, readiness polling, the recording hard
//! stop and the loop cycle all take a [`CancelToken`] from the same
//! [`CancelScope`]. Releasing the session cancels the scope once and every
//! pending timer wakes up.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::models::error::CaptureError;

#[derive(Debug, Default)]
struct ScopeShared {
    epoch: AtomicU64,
    notify: Notify,
}

#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    shared: Arc<ScopeShared>,
}

impl CancelScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token tied to the current epoch.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            shared: Arc::clone(&self.shared),
            epoch: self.shared.epoch.load(Ordering::SeqCst),
        }
    }

    /// Cancel every token handed out so far. Later tokens are unaffected.
    pub fn cancel_all(&self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    shared: Arc<ScopeShared>,
    epoch: u64,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.shared.epoch.load(Ordering::SeqCst) != self.epoch
    }

    /// Resolves once the owning scope is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent cancel is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    pub async fn sleep(&self, duration: Duration) -> Result<(), CaptureError> {
        self.sleep_until(Instant::now() + duration).await
    }

    pub async fn sleep_until(&self, deadline: Instant) -> Result<(), CaptureError> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(CaptureError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_runs_to_completion() {
        let scope = CancelScope::new();
        let start = Instant::now();
        scope.token().sleep(Duration::from_secs(3)).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_wakes_pending_sleep() {
        let scope = CancelScope::new();
        let token = scope.token();
        let sleeper = tokio::spawn(async move { token.sleep(Duration::from_secs(60)).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        scope.cancel_all();

        assert_eq!(sleeper.await.unwrap(), Err(CaptureError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_after_cancel_are_fresh() {
        let scope = CancelScope::new();
        let old = scope.token();
        scope.cancel_all();
        let new = scope.token();

        assert!(old.is_cancelled());
        assert!(!new.is_cancelled());
        assert_eq!(old.sleep(Duration::from_secs(1)).await, Err(CaptureError::Cancelled));
        assert!(new.sleep(Duration::from_millis(10)).await.is_ok());
    }
}
