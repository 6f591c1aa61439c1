//! UI-wide blocking gate.
//!
//! At most one mutation is in flight: [`UiBlocker::try_block`] hands out a
//! single [`BlockGuard`], and dropping the guard is the only way to release
//! the gate. The overlay follows the lower/upper limits: it is shown only if
//! the action is still running after the lower limit, and once shown it
//! stays up until the upper limit measured from the start of the action.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::PresenterConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockerLimits {
    pub lower: Duration,
    pub upper: Duration,
}

impl From<&PresenterConfig> for BlockerLimits {
    fn from(config: &PresenterConfig) -> Self {
        Self {
            lower: config.lower_limit(),
            upper: config.upper_limit(),
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    blocked: bool,
    overlay_visible: bool,
    acquisitions: u64,
    releases: u64,
}

/// Cloneable handle to the gate; clones share state.
#[derive(Clone, Debug)]
pub struct UiBlocker {
    limits: BlockerLimits,
    state: Arc<Mutex<GateState>>,
}

impl UiBlocker {
    #[must_use]
    pub fn new(limits: BlockerLimits) -> Self {
        Self {
            limits,
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Engages the gate, or `None` when it is already held.
    #[must_use]
    pub fn try_block(&self) -> Option<BlockGuard> {
        let mut state = self.lock();
        if state.blocked {
            warn!("ui blocked, action ignored");
            return None;
        }
        state.blocked = true;
        state.acquisitions += 1;
        drop(state);
        Some(BlockGuard {
            blocker: self.clone(),
            started: Instant::now(),
        })
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.lock().blocked
    }

    #[must_use]
    pub fn overlay_visible(&self) -> bool {
        self.lock().overlay_visible
    }

    #[must_use]
    pub fn acquisitions(&self) -> u64 {
        self.lock().acquisitions
    }

    #[must_use]
    pub fn releases(&self) -> u64 {
        self.lock().releases
    }

    fn show_overlay(&self) {
        debug!("blocking overlay shown");
        self.lock().overlay_visible = true;
    }

    fn release(&self) {
        let mut state = self.lock();
        state.blocked = false;
        state.overlay_visible = false;
        state.releases += 1;
    }
}

/// Scoped hold on the gate. Released on drop, whatever the outcome.
#[derive(Debug)]
pub struct BlockGuard {
    blocker: UiBlocker,
    started: Instant,
}

impl BlockGuard {
    /// Awaits `action` under the overlay timing rules.
    pub async fn hold<F: Future>(&self, action: F) -> F::Output {
        let limits = self.blocker.limits;
        tokio::pin!(action);

        let mut shown = false;
        let output = tokio::select! {
            output = &mut action => output,
            () = tokio::time::sleep_until(self.started + limits.lower) => {
                self.blocker.show_overlay();
                shown = true;
                action.await
            }
        };

        if shown {
            tokio::time::sleep_until(self.started + limits.upper).await;
        }
        output
    }
}

impl Drop for BlockGuard {
    fn drop(&mut self) {
        self.blocker.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocker() -> UiBlocker {
        UiBlocker::new(BlockerLimits {
            lower: Duration::from_millis(350),
            upper: Duration::from_millis(1_000),
        })
    }

    #[test]
    fn second_block_is_refused() {
        let blocker = blocker();
        let guard = blocker.try_block().unwrap();
        assert!(blocker.is_blocked());
        assert!(blocker.try_block().is_none());
        drop(guard);
        assert!(!blocker.is_blocked());
        assert_eq!((blocker.acquisitions(), blocker.releases()), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_action_never_shows_overlay() {
        let blocker = blocker();
        let guard = blocker.try_block().unwrap();
        let started = Instant::now();

        let value = guard
            .hold(async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                7
            })
            .await;

        assert_eq!(value, 7);
        assert!(!blocker.overlay_visible());
        assert!(started.elapsed() < Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_action_keeps_overlay_until_upper_limit() {
        let blocker = blocker();
        let guard = blocker.try_block().unwrap();
        let started = Instant::now();
        let watcher = blocker.clone();

        guard
            .hold(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                assert!(watcher.overlay_visible());
            })
            .await;

        assert!(started.elapsed() >= Duration::from_millis(1_000));
        assert!(started.elapsed() < Duration::from_millis(1_100));
        assert!(blocker.overlay_visible());
        drop(guard);
        assert!(!blocker.overlay_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn action_past_upper_limit_returns_immediately() {
        let blocker = blocker();
        let guard = blocker.try_block().unwrap();
        let started = Instant::now();

        guard
            .hold(tokio::time::sleep(Duration::from_millis(1_500)))
            .await;

        assert!(started.elapsed() >= Duration::from_millis(1_500));
        assert!(started.elapsed() < Duration::from_millis(1_600));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_action_still_releases() {
        let blocker = blocker();
        let result: Result<(), &str> = {
            let guard = blocker.try_block().unwrap();
            guard.hold(async { Err("boom") }).await
        };
        assert!(result.is_err());
        assert!(!blocker.is_blocked());
        assert_eq!(blocker.releases(), 1);
    }
}
