//! Presenters: per-point view/edit state machines and the list orchestrating them.

mod header;
mod keyboard;
mod list;
mod new_point;
mod point;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::blocker::UiBlocker;
use crate::event::Event;
use crate::store::Catalog;
use crate::view::Surface;

pub use self::header::HeaderPresenter;
pub use self::keyboard::{EscapeSubscription, EscapeTarget, KeyboardHub};
pub use self::list::{DispatchOutcome, ListPresenter};
pub use self::new_point::NewPointPresenter;
pub use self::point::PointPresenter;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Viewing,
    Editing,
    Saving,
    Deleting,
    Aborting,
}

impl Mode {
    /// `Viewing` and `Editing` are the modes a presenter rests in.
    #[must_use]
    pub const fn is_stable(self) -> bool {
        matches!(self, Self::Viewing | Self::Editing)
    }

    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Saving | Self::Deleting)
    }
}

/// What a presenter needs to draw itself.
pub struct RenderContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub catalog: &'a Catalog,
    pub keyboard: &'a KeyboardHub,
}

/// Host-side trigger sender. Triggers arriving while the UI is blocked are dropped.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
    blocker: UiBlocker,
}

impl EventSender {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Event>, blocker: UiBlocker) -> Self {
        Self { tx, blocker }
    }

    /// Whether the trigger was queued.
    pub fn send(&self, event: Event) -> bool {
        if self.blocker.is_blocked() {
            debug!(?event, "trigger dropped while blocked");
            return false;
        }
        self.tx.send(event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocker::BlockerLimits;
    use std::time::Duration;

    #[test]
    fn sender_drops_triggers_while_blocked() {
        let blocker = UiBlocker::new(BlockerLimits {
            lower: Duration::from_millis(1),
            upper: Duration::from_millis(2),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = EventSender::new(tx, blocker.clone());

        let guard = blocker.try_block().unwrap();
        assert!(!sender.send(Event::EscapePressed));
        drop(guard);
        assert!(sender.send(Event::NewPointRequested));

        assert_eq!(rx.try_recv().unwrap(), Event::NewPointRequested);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stable_and_busy_modes() {
        assert!(Mode::Viewing.is_stable() && Mode::Editing.is_stable());
        assert!(!Mode::Aborting.is_stable());
        assert!(Mode::Saving.is_busy() && Mode::Deleting.is_busy());
        assert!(!Mode::Editing.is_busy());
    }
}
