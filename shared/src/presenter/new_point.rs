use tracing::debug;

use super::keyboard::{EscapeSubscription, EscapeTarget};
use super::{Mode, RenderContext};
use crate::event::{Intent, UpdateType, UserAction};
use crate::model::{Point, UnixTimeMs};
use crate::view::{FormState, PointForm, Position, Region, ViewHandle, ViewNode};

/// Creation form. Starts in `Editing`, has no read view, and tears itself
/// down on cancel, on success, or when another edit opens.
pub struct NewPointPresenter {
    draft: Point,
    mode: Mode,
    view: Option<ViewHandle>,
    escape: Option<EscapeSubscription>,
    on_destroy: Box<dyn FnMut() + Send>,
}

impl NewPointPresenter {
    /// `on_destroy` runs once per destroyed form.
    pub fn new(on_destroy: impl FnMut() + Send + 'static) -> Self {
        Self {
            draft: Point::blank(UnixTimeMs(0)),
            mode: Mode::Editing,
            view: None,
            escape: None,
            on_destroy: Box::new(on_destroy),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.view.is_some()
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let state = match self.mode {
            Mode::Saving => FormState::SAVING,
            _ => FormState::IDLE,
        };
        let node = ViewNode::Form(PointForm::build(&self.draft, ctx.catalog, true, state));
        match self.view {
            Some(handle) => ctx.surface.replace(handle, node),
            None => self.view = Some(ctx.surface.mount(Region::List, Position::Start, node)),
        }
    }

    /// Opens an empty form at the top of the list. No-op while one is open.
    pub fn init(&mut self, now: UnixTimeMs, ctx: &mut RenderContext<'_>) {
        if self.is_active() {
            return;
        }
        self.draft = Point::blank(now);
        self.mode = Mode::Editing;
        self.escape = Some(ctx.keyboard.on_escape(EscapeTarget::NewPoint));
        self.render(ctx);
        debug!("new point form opened");
    }

    pub fn submit(&mut self, edited: Point, ctx: &mut RenderContext<'_>) -> Option<Intent> {
        if !self.is_active() || self.mode != Mode::Editing {
            return None;
        }
        if let Err(e) = edited.validate() {
            debug!(error = %e, "invalid new point");
            self.shake(ctx);
            return None;
        }
        self.draft = edited.clone();
        Some(Intent::new(UserAction::AddPoint, UpdateType::Minor, edited))
    }

    pub fn set_saving(&mut self, ctx: &mut RenderContext<'_>) {
        self.mode = Mode::Saving;
        self.render(ctx);
    }

    pub fn set_aborting(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.mode.is_busy() {
            return;
        }
        self.mode = Mode::Aborting;
        self.shake(ctx);
    }

    pub fn finish_aborting(&mut self, ctx: &mut RenderContext<'_>) {
        if self.mode != Mode::Aborting || !self.is_active() {
            return;
        }
        self.mode = Mode::Editing;
        self.render(ctx);
    }

    fn shake(&self, ctx: &mut RenderContext<'_>) {
        if let Some(handle) = self.view {
            ctx.surface.shake(handle);
        }
    }

    pub fn destroy(&mut self, ctx: &mut RenderContext<'_>) {
        let Some(handle) = self.view.take() else {
            return;
        };
        ctx.surface.unmount(handle);
        self.escape = None;
        self.mode = Mode::Editing;
        (self.on_destroy)();
        debug!("new point form closed");
    }
}
