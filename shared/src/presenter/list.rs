use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::keyboard::{EscapeTarget, KeyboardHub};
use super::new_point::NewPointPresenter;
use super::point::PointPresenter;
use super::{Mode, RenderContext};
use crate::blocker::{BlockerLimits, UiBlocker};
use crate::config::PresenterConfig;
use crate::error::ApiError;
use crate::event::{Event, Intent, UpdateType, UserAction};
use crate::filter::{filter_points, FilterType};
use crate::model::{Point, PointId, UnixTimeMs};
use crate::sort::{sort_points, SortType};
use crate::store::{Catalog, ChangeReceiver, ModelChange, TripModels};
use crate::view::{Message, Position, Region, SortBar, Surface, ViewHandle, ViewNode};

/// Result of one pass through the action dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    /// The backend rejected the call. The acting presenter shakes until its
    /// revert deadline, see [`ListPresenter::process_timers`].
    Aborted,
    /// Nothing was dispatched: the gate was held or no presenter could act.
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum RevertTarget {
    Point(PointId),
    NewPoint,
}

/// A shake in progress and when it ends.
#[derive(Debug)]
struct PendingRevert {
    target: RevertTarget,
    deadline: Instant,
}

/// Owns what is on screen: sort selection, the live presenters, loading and
/// empty states, and the gate every mutation passes through.
pub struct ListPresenter<S: Surface> {
    config: PresenterConfig,
    surface: S,
    models: TripModels,
    catalog: Catalog,
    changes: ChangeReceiver,
    presenters: HashMap<PointId, PointPresenter>,
    new_point: NewPointPresenter,
    keyboard: KeyboardHub,
    blocker: UiBlocker,
    current_sort: SortType,
    is_loading: bool,
    sort_view: Option<ViewHandle>,
    message_view: Option<ViewHandle>,
    reverts: VecDeque<PendingRevert>,
    clock: fn() -> UnixTimeMs,
}

impl<S: Surface> ListPresenter<S> {
    /// Subscribes to the point and filter models. `on_new_point_close` runs
    /// whenever the creation form goes away.
    pub fn new(
        config: PresenterConfig,
        surface: S,
        models: TripModels,
        on_new_point_close: impl FnMut() + Send + 'static,
    ) -> Self {
        let (tx, changes) = mpsc::unbounded_channel();
        models.attach(&tx);
        let blocker = UiBlocker::new(BlockerLimits::from(&config));
        Self {
            current_sort: config.default_sort,
            catalog: models.catalog(),
            config,
            surface,
            models,
            changes,
            presenters: HashMap::new(),
            new_point: NewPointPresenter::new(on_new_point_close),
            keyboard: KeyboardHub::new(),
            blocker,
            is_loading: true,
            sort_view: None,
            message_view: None,
            reverts: VecDeque::new(),
            clock: UnixTimeMs::now,
        }
    }

    /// Replaces the wall clock used for filtering and new drafts.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> UnixTimeMs) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub fn blocker(&self) -> &UiBlocker {
        &self.blocker
    }

    #[must_use]
    pub fn keyboard(&self) -> &KeyboardHub {
        &self.keyboard
    }

    #[must_use]
    pub fn current_sort(&self) -> SortType {
        self.current_sort
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn is_creating(&self) -> bool {
        self.new_point.is_active()
    }

    #[must_use]
    pub fn mode_of(&self, id: &PointId) -> Option<Mode> {
        self.presenters.get(id).map(PointPresenter::mode)
    }

    /// Presenters in `Editing`, plus one for an open creation form.
    #[must_use]
    pub fn editing_count(&self) -> usize {
        let editing = self
            .presenters
            .values()
            .filter(|p| p.mode() == Mode::Editing)
            .count();
        editing + usize::from(self.new_point.is_active())
    }

    #[must_use]
    pub fn registered_ids(&self) -> Vec<PointId> {
        let mut ids: Vec<_> = self.presenters.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn parts(&mut self) -> (RenderContext<'_>, &mut HashMap<PointId, PointPresenter>, &mut NewPointPresenter) {
        let Self {
            surface,
            catalog,
            keyboard,
            presenters,
            new_point,
            ..
        } = self;
        let ctx = RenderContext {
            surface,
            catalog,
            keyboard,
        };
        (ctx, presenters, new_point)
    }

    /// Filtered then sorted snapshot, rebuilt on every call.
    #[must_use]
    pub fn visible_points(&self) -> Vec<Point> {
        let now = (self.clock)();
        let filter = self.models.filter.filter();
        let filtered = filter_points(filter, &self.models.points.points(), now);
        sort_points(self.current_sort, &filtered)
    }

    /// First paint. Shows the loading state until the model reports `Init`.
    pub fn initialize(&mut self) {
        self.process_changes();
        self.render_list();
    }

    /// Resets sort and filter, then opens the creation form.
    pub fn create_new_point(&mut self) {
        if self.is_loading || self.new_point.is_active() {
            return;
        }
        self.current_sort = self.config.default_sort;
        self.models.filter.set_filter(UpdateType::Major, FilterType::Everything);
        self.process_changes();
        self.close_all_edits();
        self.hide_message();

        let now = (self.clock)();
        let (mut ctx, _, new_point) = self.parts();
        new_point.init(now, &mut ctx);
    }

    /// Routes one user trigger. Triggers are ignored while the gate is held.
    pub async fn handle(&mut self, event: Event) {
        self.process_timers();
        if self.blocker.is_blocked() {
            debug!(?event, "ignored while blocked");
            return;
        }
        match event {
            Event::OpenEdit { id } => self.open_edit(&id),
            Event::CloseEdit { id } => {
                let (mut ctx, presenters, _) = self.parts();
                if let Some(presenter) = presenters.get_mut(&id) {
                    presenter.close_edit(&mut ctx);
                }
            }
            Event::EscapePressed => self.escape(),
            Event::SortChanged { sort } => self.change_sort(sort),
            Event::FilterChanged { filter } => {
                if filter != self.models.filter.filter() {
                    self.models.filter.set_filter(UpdateType::Major, filter);
                }
            }
            Event::NewPointRequested => self.create_new_point(),
            Event::CancelNewPoint => self.close_new_point(),
            Event::SubmitEdit(edited) => {
                let (mut ctx, presenters, _) = self.parts();
                let intent = presenters
                    .get_mut(&edited.id)
                    .and_then(|p| p.submit(*edited, &mut ctx));
                self.dispatch(intent).await;
            }
            Event::DeletePoint { id } => {
                let intent = self.presenters.get(&id).and_then(PointPresenter::delete);
                self.dispatch(intent).await;
            }
            Event::ToggleFavorite { id } => {
                let intent = self.presenters.get(&id).and_then(PointPresenter::toggle_favorite);
                self.dispatch(intent).await;
            }
            Event::SubmitNewPoint(edited) => {
                let (mut ctx, _, new_point) = self.parts();
                let intent = new_point.submit(*edited, &mut ctx);
                self.dispatch(intent).await;
            }
        }
        self.process_changes();
    }

    async fn dispatch(&mut self, intent: Option<Intent>) {
        if let Some(Intent { action, scope, point }) = intent {
            self.dispatch_action(action, scope, point).await;
        }
    }

    /// The single path every mutation takes: block, mark busy, await the
    /// model, confirm or abort, release. The backend call is the only await.
    pub async fn dispatch_action(
        &mut self,
        action: UserAction,
        scope: UpdateType,
        point: Point,
    ) -> DispatchOutcome {
        let Some(guard) = self.blocker.try_block() else {
            return DispatchOutcome::Ignored;
        };

        let id = point.id.clone();
        {
            let (mut ctx, presenters, new_point) = self.parts();
            match action {
                UserAction::AddPoint if new_point.is_active() && new_point.mode().is_stable() => {
                    new_point.set_saving(&mut ctx);
                }
                UserAction::UpdatePoint | UserAction::DeletePoint
                    if presenters.get(&id).is_some_and(|p| p.mode().is_stable()) =>
                {
                    if let Some(presenter) = presenters.get_mut(&id) {
                        if action == UserAction::UpdatePoint {
                            presenter.set_saving(&mut ctx);
                        } else {
                            presenter.set_deleting(&mut ctx);
                        }
                    }
                }
                _ => {
                    warn!(?action, %id, "no idle presenter to act");
                    return DispatchOutcome::Ignored;
                }
            }
        }

        let points = &self.models.points;
        let result: Result<Option<Point>, ApiError> = match action {
            UserAction::AddPoint => guard.hold(points.add_point(scope, &point)).await.map(Some),
            UserAction::UpdatePoint => guard.hold(points.update_point(scope, &point)).await.map(Some),
            UserAction::DeletePoint => guard.hold(points.delete_point(scope, &id)).await.map(|()| None),
        };

        let outcome = match result {
            Ok(stored) => {
                info!(?action, %id, "action completed");
                let (mut ctx, presenters, new_point) = self.parts();
                match (action, stored) {
                    (UserAction::UpdatePoint, Some(updated)) => {
                        if let Some(presenter) = presenters.get_mut(&id) {
                            presenter.confirm_saved(updated, &mut ctx);
                        }
                    }
                    (UserAction::AddPoint, _) => new_point.destroy(&mut ctx),
                    _ => {}
                }
                self.process_changes();
                if action == UserAction::DeletePoint {
                    self.acknowledge_delete(&id);
                }
                DispatchOutcome::Completed
            }
            Err(e) => {
                warn!(
                    ?action,
                    %id,
                    error = %e,
                    code = e.code(),
                    retryable = e.is_retryable(),
                    "action aborted"
                );
                let (mut ctx, presenters, new_point) = self.parts();
                let target = match action {
                    UserAction::AddPoint => {
                        new_point.set_aborting(&mut ctx);
                        RevertTarget::NewPoint
                    }
                    UserAction::UpdatePoint | UserAction::DeletePoint => {
                        if let Some(presenter) = presenters.get_mut(&id) {
                            presenter.set_aborting(&mut ctx);
                        }
                        RevertTarget::Point(id)
                    }
                };
                self.schedule_revert(target);
                DispatchOutcome::Aborted
            }
        };
        drop(guard);
        outcome
    }

    fn schedule_revert(&mut self, target: RevertTarget) {
        self.reverts.retain(|pending| pending.target != target);
        let deadline = Instant::now() + self.config.shake_duration();
        self.reverts.push_back(PendingRevert { target, deadline });
    }

    /// When the next shake ends, if one is playing.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.reverts.front().map(|pending| pending.deadline)
    }

    /// Ends every shake whose deadline has passed, returning its presenter
    /// to the mode it held before the failed action.
    pub fn process_timers(&mut self) {
        let now = Instant::now();
        while self.reverts.front().is_some_and(|pending| pending.deadline <= now) {
            let Some(PendingRevert { target, .. }) = self.reverts.pop_front() else {
                break;
            };
            let (mut ctx, presenters, new_point) = self.parts();
            match target {
                RevertTarget::NewPoint => new_point.finish_aborting(&mut ctx),
                RevertTarget::Point(id) => {
                    if let Some(presenter) = presenters.get_mut(&id) {
                        presenter.finish_aborting(&mut ctx);
                    }
                }
            }
        }
    }

    /// A confirmed delete must not leave a presenter behind.
    fn acknowledge_delete(&mut self, id: &PointId) {
        let (mut ctx, presenters, _) = self.parts();
        if let Some(mut stale) = presenters.remove(id) {
            warn!(%id, "deleted point still rendered, removing");
            stale.destroy(&mut ctx);
        }
        self.show_empty_if_needed();
    }

    /// Drains queued model notifications.
    pub fn process_changes(&mut self) {
        while let Ok(change) = self.changes.try_recv() {
            self.apply_change(change);
        }
    }

    fn apply_change(&mut self, change: ModelChange) {
        debug!(scope = ?change.scope, "model changed");
        match change.scope {
            UpdateType::Patch => {
                let Some(point) = change.point else {
                    return;
                };
                let (mut ctx, presenters, _) = self.parts();
                if let Some(presenter) = presenters.get_mut(&point.id) {
                    presenter.init(point, &mut ctx);
                }
            }
            UpdateType::Minor => {
                self.clear_list(false);
                self.render_list();
            }
            UpdateType::Major => {
                self.clear_list(true);
                self.render_list();
            }
            UpdateType::Init => {
                self.is_loading = false;
                self.clear_list(false);
                self.render_list();
            }
        }
    }

    fn open_edit(&mut self, id: &PointId) {
        if !self.presenters.contains_key(id) {
            warn!(%id, "open edit for unknown point");
            return;
        }
        self.close_new_point();
        self.close_all_edits();
        let (mut ctx, presenters, _) = self.parts();
        if let Some(presenter) = presenters.get_mut(id) {
            presenter.open_edit(&mut ctx);
        }
    }

    /// Forces every point back to its read view.
    fn close_all_edits(&mut self) {
        let (mut ctx, presenters, _) = self.parts();
        for presenter in presenters.values_mut() {
            presenter.reset_view(&mut ctx);
        }
    }

    fn close_new_point(&mut self) {
        if !self.new_point.is_active() {
            return;
        }
        let (mut ctx, _, new_point) = self.parts();
        new_point.destroy(&mut ctx);
        self.show_empty_if_needed();
    }

    fn escape(&mut self) {
        for target in self.keyboard.targets() {
            match target {
                EscapeTarget::Point(id) => {
                    let (mut ctx, presenters, _) = self.parts();
                    if let Some(presenter) = presenters.get_mut(&id) {
                        presenter.escape(&mut ctx);
                    }
                }
                EscapeTarget::NewPoint => self.close_new_point(),
            }
        }
    }

    fn change_sort(&mut self, sort: SortType) {
        if sort == self.current_sort {
            return;
        }
        self.current_sort = sort;
        self.clear_list(false);
        self.render_list();
    }

    /// Tears down every presenter and decoration.
    fn clear_list(&mut self, reset_sort: bool) {
        let (mut ctx, presenters, new_point) = self.parts();
        new_point.destroy(&mut ctx);
        for (_, mut presenter) in presenters.drain() {
            presenter.destroy(&mut ctx);
        }
        if let Some(handle) = self.sort_view.take() {
            self.surface.unmount(handle);
        }
        self.hide_message();
        self.reverts.clear();
        if reset_sort {
            self.current_sort = self.config.default_sort;
        }
    }

    fn render_list(&mut self) {
        if self.is_loading {
            self.show_message(Message::Loading);
            return;
        }
        if self.models.points.load_failed() {
            self.show_message(Message::LoadFailed);
            return;
        }

        let points = self.visible_points();
        if points.is_empty() {
            self.show_empty_if_needed();
            return;
        }

        let bar = ViewNode::SortBar(SortBar::new(self.current_sort));
        self.sort_view = Some(self.surface.mount(Region::Sort, Position::End, bar));

        let (mut ctx, presenters, _) = self.parts();
        for point in points {
            let mut presenter = PointPresenter::new(point.clone());
            presenter.init(point, &mut ctx);
            presenters.insert(presenter.id().clone(), presenter);
        }
    }

    fn show_empty_if_needed(&mut self) {
        if self.is_loading || !self.presenters.is_empty() || self.new_point.is_active() {
            return;
        }
        if let Some(handle) = self.sort_view.take() {
            self.surface.unmount(handle);
        }
        let message = if self.models.points.load_failed() {
            Message::LoadFailed
        } else {
            Message::Empty {
                filter: self.models.filter.filter(),
            }
        };
        self.show_message(message);
    }

    fn show_message(&mut self, message: Message) {
        let node = ViewNode::Message(message);
        match self.message_view {
            Some(handle) => self.surface.replace(handle, node),
            None => self.message_view = Some(self.surface.mount(Region::Message, Position::End, node)),
        }
    }

    fn hide_message(&mut self) {
        if let Some(handle) = self.message_view.take() {
            self.surface.unmount(handle);
        }
    }

    /// Event loop: model changes first, then expired shakes, then user
    /// triggers, until triggers end.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<Event>) {
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                biased;
                Some(change) = self.changes.recv() => self.apply_change(change),
                () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.process_timers();
                }
                event = events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
            }
        }
        info!("list presenter stopped");
    }
}
