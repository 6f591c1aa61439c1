use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::model::PointId;

/// Who receives an Escape press.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscapeTarget {
    Point(PointId),
    NewPoint,
}

#[derive(Debug, Default)]
struct Listeners {
    next: AtomicU64,
    targets: Mutex<BTreeMap<u64, EscapeTarget>>,
}

/// Escape listeners. A listener lives exactly as long as its [`EscapeSubscription`].
#[derive(Clone, Debug, Default)]
pub struct KeyboardHub {
    listeners: Arc<Listeners>,
}

impl KeyboardHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn targets_lock(&self) -> MutexGuard<'_, BTreeMap<u64, EscapeTarget>> {
        self.listeners
            .targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn on_escape(&self, target: EscapeTarget) -> EscapeSubscription {
        let key = self.listeners.next.fetch_add(1, Ordering::Relaxed);
        self.targets_lock().insert(key, target);
        EscapeSubscription {
            key,
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// Current listeners, oldest first.
    #[must_use]
    pub fn targets(&self) -> Vec<EscapeTarget> {
        self.targets_lock().values().cloned().collect()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.targets_lock().len()
    }
}

/// Unsubscribes on drop.
#[derive(Debug)]
pub struct EscapeSubscription {
    key: u64,
    listeners: Arc<Listeners>,
}

impl Drop for EscapeSubscription {
    fn drop(&mut self) {
        self.listeners
            .targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
