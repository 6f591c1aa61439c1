use std::sync::{PoisonError, RwLock};
use tracing::debug;

use super::{ChangeReceiver, ChangeSender, Observable};
use crate::event::UpdateType;
use crate::filter::FilterType;

/// Current filter selection.
#[derive(Debug, Default)]
pub struct FilterModel {
    filter: RwLock<FilterType>,
    observers: Observable,
}

impl FilterModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(&self) -> FilterType {
        *self.filter.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `filter` and notifies, even when it did not change.
    pub fn set_filter(&self, scope: UpdateType, filter: FilterType) {
        *self.filter.write().unwrap_or_else(PoisonError::into_inner) = filter;
        debug!(%filter, ?scope, "filter selected");
        self.observers.notify(scope, None);
    }

    pub fn attach(&self, sender: ChangeSender) {
        self.observers.attach(sender);
    }

    #[must_use]
    pub fn subscribe(&self) -> ChangeReceiver {
        self.observers.subscribe()
    }
}
