use tracing::{debug, warn};

use super::keyboard::{EscapeSubscription, EscapeTarget};
use super::{Mode, RenderContext};
use crate::event::{Intent, UpdateType, UserAction};
use crate::model::{Point, PointId};
use crate::view::{FormState, PointCard, PointForm, Position, Region, ViewHandle, ViewNode};

/// View/edit state machine for one point.
///
/// `Viewing -> Editing -> {Viewing, Saving, Deleting}`, busy modes end in
/// `Viewing` on success or `Aborting` on failure, and `Aborting` returns to
/// the stable mode held before the action. Exactly one view is attached.
pub struct PointPresenter {
    point: Point,
    /// Last submitted value, shown by the form until the edit session ends.
    draft: Option<Point>,
    mode: Mode,
    stable: Mode,
    view: Option<ViewHandle>,
    escape: Option<EscapeSubscription>,
}

impl PointPresenter {
    #[must_use]
    pub fn new(point: Point) -> Self {
        Self {
            point,
            draft: None,
            mode: Mode::Viewing,
            stable: Mode::Viewing,
            view: None,
            escape: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &PointId {
        &self.point.id
    }

    #[must_use]
    pub fn point(&self) -> &Point {
        &self.point
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn view(&self) -> Option<ViewHandle> {
        self.view
    }

    fn form_state(&self) -> FormState {
        match self.mode {
            Mode::Saving => FormState::SAVING,
            Mode::Deleting => FormState::DELETING,
            _ => FormState::IDLE,
        }
    }

    fn node(&self, ctx: &RenderContext<'_>) -> ViewNode {
        if self.stable == Mode::Viewing {
            ViewNode::Card(PointCard::build(&self.point, ctx.catalog))
        } else {
            let shown = self.draft.as_ref().unwrap_or(&self.point);
            ViewNode::Form(PointForm::build(shown, ctx.catalog, false, self.form_state()))
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let node = self.node(ctx);
        match self.view {
            Some(handle) => ctx.surface.replace(handle, node),
            None => self.view = Some(ctx.surface.mount(Region::List, Position::End, node)),
        }
    }

    /// Renders `point`, keeping the current mode. An open form is redrawn in place.
    pub fn init(&mut self, point: Point, ctx: &mut RenderContext<'_>) {
        self.point = point;
        self.render(ctx);
    }

    /// Whether the form was opened.
    pub fn open_edit(&mut self, ctx: &mut RenderContext<'_>) -> bool {
        if self.mode != Mode::Viewing {
            return false;
        }
        self.mode = Mode::Editing;
        self.stable = Mode::Editing;
        self.escape = Some(ctx.keyboard.on_escape(EscapeTarget::Point(self.point.id.clone())));
        self.render(ctx);
        debug!(id = %self.point.id, "edit opened");
        true
    }

    /// Idempotent `Editing -> Viewing`.
    pub fn reset_view(&mut self, ctx: &mut RenderContext<'_>) {
        if self.mode != Mode::Editing {
            return;
        }
        self.mode = Mode::Viewing;
        self.stable = Mode::Viewing;
        self.draft = None;
        self.escape = None;
        self.render(ctx);
    }

    pub fn close_edit(&mut self, ctx: &mut RenderContext<'_>) {
        self.reset_view(ctx);
    }

    pub fn escape(&mut self, ctx: &mut RenderContext<'_>) {
        self.reset_view(ctx);
    }

    /// Packages an edited value for the dispatcher. Invalid input shakes the form.
    pub fn submit(&mut self, edited: Point, ctx: &mut RenderContext<'_>) -> Option<Intent> {
        if self.mode != Mode::Editing {
            return None;
        }
        if edited.id != self.point.id {
            warn!(expected = %self.point.id, got = %edited.id, "submit for another point");
            return None;
        }
        if let Err(e) = edited.validate() {
            debug!(id = %self.point.id, error = %e, "invalid submit");
            self.shake(ctx);
            return None;
        }
        let scope = UpdateType::for_edit(&self.point, &edited);
        self.draft = Some(edited.clone());
        Some(Intent::new(UserAction::UpdatePoint, scope, edited))
    }

    #[must_use]
    pub fn delete(&self) -> Option<Intent> {
        (self.mode == Mode::Editing)
            .then(|| Intent::new(UserAction::DeletePoint, UpdateType::Minor, self.point.clone()))
    }

    /// Favorite flip from the read view.
    #[must_use]
    pub fn toggle_favorite(&self) -> Option<Intent> {
        if self.mode != Mode::Viewing {
            return None;
        }
        let mut toggled = self.point.clone();
        toggled.is_favorite = !toggled.is_favorite;
        let scope = UpdateType::for_edit(&self.point, &toggled);
        Some(Intent::new(UserAction::UpdatePoint, scope, toggled))
    }

    pub fn set_saving(&mut self, ctx: &mut RenderContext<'_>) {
        self.mode = Mode::Saving;
        if self.stable == Mode::Editing {
            self.render(ctx);
        }
    }

    pub fn set_deleting(&mut self, ctx: &mut RenderContext<'_>) {
        self.mode = Mode::Deleting;
        self.render(ctx);
    }

    /// Failure feedback. The view keeps its busy look until [`Self::finish_aborting`].
    pub fn set_aborting(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.mode.is_busy() {
            warn!(id = %self.point.id, mode = ?self.mode, "abort without a pending action");
            return;
        }
        self.mode = Mode::Aborting;
        self.shake(ctx);
    }

    pub fn finish_aborting(&mut self, ctx: &mut RenderContext<'_>) {
        if self.mode != Mode::Aborting {
            return;
        }
        self.mode = self.stable;
        self.render(ctx);
    }

    /// Successful update: back to the read view with the stored value.
    pub fn confirm_saved(&mut self, updated: Point, ctx: &mut RenderContext<'_>) {
        self.point = updated;
        self.draft = None;
        self.mode = Mode::Viewing;
        self.stable = Mode::Viewing;
        self.escape = None;
        self.render(ctx);
    }

    fn shake(&self, ctx: &mut RenderContext<'_>) {
        if let Some(handle) = self.view {
            ctx.surface.shake(handle);
        }
    }

    pub fn destroy(&mut self, ctx: &mut RenderContext<'_>) {
        if let Some(handle) = self.view.take() {
            ctx.surface.unmount(handle);
        }
        self.escape = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DestinationId, PointType, UnixTimeMs};
    use crate::presenter::KeyboardHub;
    use crate::store::Catalog;
    use crate::view::HeadlessSurface;
    use std::sync::Arc;

    struct Harness {
        surface: HeadlessSurface,
        catalog: Catalog,
        keyboard: KeyboardHub,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                surface: HeadlessSurface::new(),
                catalog: Catalog::new(Arc::default(), Arc::default()),
                keyboard: KeyboardHub::new(),
            }
        }

        fn ctx(&mut self) -> RenderContext<'_> {
            RenderContext {
                surface: &mut self.surface,
                catalog: &self.catalog,
                keyboard: &self.keyboard,
            }
        }
    }

    fn point(price: u32) -> Point {
        Point {
            id: PointId::new("a"),
            kind: PointType::Ship,
            date_from: UnixTimeMs(0),
            date_to: UnixTimeMs(UnixTimeMs::HOUR),
            base_price: price,
            destination: Some(DestinationId::new("d")),
            offers: vec![],
            is_favorite: false,
        }
    }

    fn mounted(h: &mut Harness) -> PointPresenter {
        let mut presenter = PointPresenter::new(point(10));
        presenter.init(point(10), &mut h.ctx());
        presenter
    }

    #[test]
    fn open_and_escape_swap_in_place() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        let handle = presenter.view().unwrap();

        assert!(presenter.open_edit(&mut h.ctx()));
        assert_eq!(presenter.view(), Some(handle));
        assert_eq!(h.surface.forms().len(), 1);
        assert_eq!(h.keyboard.listener_count(), 1);

        presenter.escape(&mut h.ctx());
        assert_eq!(presenter.mode(), Mode::Viewing);
        assert_eq!(h.surface.cards().len(), 1);
        assert_eq!(h.keyboard.listener_count(), 0);
    }

    #[test]
    fn reset_view_is_idempotent() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        presenter.reset_view(&mut h.ctx());
        presenter.reset_view(&mut h.ctx());
        assert_eq!(presenter.mode(), Mode::Viewing);
        assert_eq!(h.surface.mounted_count(), 1);
    }

    #[test]
    fn init_while_editing_redraws_the_form() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        presenter.open_edit(&mut h.ctx());
        presenter.init(point(77), &mut h.ctx());
        assert_eq!(presenter.mode(), Mode::Editing);
        assert_eq!(h.surface.forms()[0].base_price, 77);
    }

    #[test]
    fn invalid_submit_shakes_and_stays_editing() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        presenter.open_edit(&mut h.ctx());
        let mut broken = point(10);
        broken.destination = None;

        assert!(presenter.submit(broken, &mut h.ctx()).is_none());
        assert_eq!(presenter.mode(), Mode::Editing);
        assert_eq!(h.surface.shakes().len(), 1);
    }

    #[test]
    fn submit_scope_follows_changed_fields() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        presenter.open_edit(&mut h.ctx());

        let intent = presenter.submit(point(99), &mut h.ctx()).unwrap();
        assert_eq!(intent.action, UserAction::UpdatePoint);
        assert_eq!(intent.scope, UpdateType::Minor);

        let mut renamed = point(10);
        renamed.kind = PointType::Bus;
        assert_eq!(presenter.submit(renamed, &mut h.ctx()).unwrap().scope, UpdateType::Patch);
    }

    #[test]
    fn failed_save_returns_to_editing_with_draft() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        presenter.open_edit(&mut h.ctx());
        presenter.submit(point(55), &mut h.ctx()).unwrap();

        presenter.set_saving(&mut h.ctx());
        assert!(h.surface.forms()[0].state.is_saving);
        presenter.set_aborting(&mut h.ctx());
        assert_eq!(presenter.mode(), Mode::Aborting);
        presenter.finish_aborting(&mut h.ctx());

        assert_eq!(presenter.mode(), Mode::Editing);
        let form = h.surface.forms()[0];
        assert_eq!(form.state, FormState::IDLE);
        assert_eq!(form.base_price, 55);
        assert_eq!(presenter.point().base_price, 10);
    }

    #[test]
    fn favorite_failure_keeps_the_card() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        let intent = presenter.toggle_favorite().unwrap();
        assert!(intent.point.is_favorite);
        assert_eq!(intent.scope, UpdateType::Minor);

        presenter.set_saving(&mut h.ctx());
        presenter.set_aborting(&mut h.ctx());
        presenter.finish_aborting(&mut h.ctx());
        assert_eq!(presenter.mode(), Mode::Viewing);
        assert_eq!(h.surface.cards().len(), 1);
    }

    #[test]
    fn abort_needs_a_pending_action() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        presenter.open_edit(&mut h.ctx());

        presenter.set_aborting(&mut h.ctx());
        assert_eq!(presenter.mode(), Mode::Editing);
        assert!(h.surface.shakes().is_empty());
    }

    #[test]
    fn delete_only_from_the_form() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        assert!(presenter.delete().is_none());
        presenter.open_edit(&mut h.ctx());
        let intent = presenter.delete().unwrap();
        assert_eq!((intent.action, intent.scope), (UserAction::DeletePoint, UpdateType::Minor));
    }

    #[test]
    fn destroy_detaches_and_unsubscribes() {
        let mut h = Harness::new();
        let mut presenter = mounted(&mut h);
        presenter.open_edit(&mut h.ctx());
        presenter.destroy(&mut h.ctx());
        assert_eq!(h.surface.mounted_count(), 0);
        assert_eq!(h.keyboard.listener_count(), 0);
    }
}
