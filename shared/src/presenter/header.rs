use tokio::sync::mpsc;
use tracing::debug;

use crate::filter::filter_counts;
use crate::model::UnixTimeMs;
use crate::store::{Catalog, ChangeReceiver, TripModels};
use crate::trip_info::summarize;
use crate::view::{FilterBar, Position, Region, Surface, ViewHandle, ViewNode};

/// Filter bar and trip summary. Redraws after any point or filter change.
pub struct HeaderPresenter<S: Surface> {
    surface: S,
    models: TripModels,
    catalog: Catalog,
    changes: ChangeReceiver,
    filter_view: Option<ViewHandle>,
    info_view: Option<ViewHandle>,
    clock: fn() -> UnixTimeMs,
}

impl<S: Surface> HeaderPresenter<S> {
    pub fn new(surface: S, models: TripModels) -> Self {
        let (tx, changes) = mpsc::unbounded_channel();
        models.attach(&tx);
        Self {
            surface,
            catalog: models.catalog(),
            models,
            changes,
            filter_view: None,
            info_view: None,
            clock: UnixTimeMs::now,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> UnixTimeMs) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn init(&mut self) {
        self.render();
    }

    /// Drains pending notifications; one redraw covers all of them.
    pub fn process_changes(&mut self) {
        let mut changed = false;
        while self.changes.try_recv().is_ok() {
            changed = true;
        }
        if changed {
            self.render();
        }
    }

    fn render(&mut self) {
        let points = self.models.points.points();
        let counts = filter_counts(&points, (self.clock)());
        let bar = ViewNode::FilterBar(FilterBar::new(&counts, self.models.filter.filter()));
        match self.filter_view {
            Some(handle) => self.surface.replace(handle, bar),
            None => self.filter_view = Some(self.surface.mount(Region::Filters, Position::End, bar)),
        }

        match (summarize(&points, &self.catalog), self.info_view) {
            (Some(info), Some(handle)) => self.surface.replace(handle, ViewNode::TripInfo(info)),
            (Some(info), None) => {
                let handle = self.surface.mount(Region::TripInfo, Position::Start, ViewNode::TripInfo(info));
                self.info_view = Some(handle);
            }
            (None, Some(handle)) => {
                self.surface.unmount(handle);
                self.info_view = None;
            }
            (None, None) => {}
        }
        debug!(points = points.len(), "header rendered");
    }

    pub async fn run(&mut self) {
        while self.changes.recv().await.is_some() {
            while self.changes.try_recv().is_ok() {}
            self.render();
        }
    }
}
