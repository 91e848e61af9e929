//! Per-surface state: overlay widgets, the primary gesture recognizer and
//! the fake-fullscreen session while one is active.

use log::{debug, info, warn};

use crate::dom::{Document, NodeId};
use crate::fullscreen::{FakeFullscreenManager, FullscreenPhase, MSG_EXITED};
use crate::gesture::{GestureOutcome, GestureRecognizer, GestureSettings, PointerEvent, PointerKind};
use crate::overlay::{ControlIcon, FeedbackLabel, FeedbackSlot, OverlayWidgets};
use crate::platform::PlatformApi;
use crate::runtime::Page;
use crate::timers::TimerTask;
use crate::{Error, Result};

/// Marker set on surfaces that have been taken over.
pub const TAKEOVER_ATTR: &str = "data-takeover";

/// Which part of a surface's UI an event target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Capture,
    Control,
    Fullscreen,
    ExitControl,
}

#[derive(Debug)]
pub struct SurfaceController {
    surface: NodeId,
    attached: bool,
    widgets: OverlayWidgets,
    recognizer: GestureRecognizer,
    fullscreen: Option<FakeFullscreenManager>,
}

impl SurfaceController {
    /// Take over `surface`. A surface without a parent has nowhere to put the
    /// overlay and is skipped with `Ok(None)`.
    pub fn attach<P: PlatformApi>(page: &mut Page<P>, surface: NodeId) -> Result<Option<Self>> {
        let doc = &mut page.doc;
        if doc.media(surface).is_none() {
            return Err(Error::NotMedia(surface));
        }
        if doc.parent(surface).is_none() {
            debug!("{:?} has no parent, skipping", surface);
            return Ok(None);
        }
        let widgets = OverlayWidgets::install(doc, surface)?;
        doc.set_attr(surface, TAKEOVER_ATTR, "true")?;
        info!("attached to surface {:?}", surface);
        Ok(Some(SurfaceController {
            surface,
            attached: true,
            widgets,
            recognizer: GestureRecognizer::new(GestureSettings::from(&page.config)),
            fullscreen: None,
        }))
    }

    pub fn surface(&self) -> NodeId {
        self.surface
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn widgets(&self) -> &OverlayWidgets {
        &self.widgets
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    pub fn fullscreen(&self) -> Option<&FakeFullscreenManager> {
        self.fullscreen.as_ref()
    }

    pub fn phase(&self) -> FullscreenPhase {
        self.fullscreen
            .as_ref()
            .map(FakeFullscreenManager::phase)
            .unwrap_or(FullscreenPhase::Inactive)
    }

    /// The label the user currently sees for this surface.
    pub fn active_label(&self) -> &FeedbackLabel {
        match &self.fullscreen {
            Some(fs) => fs.label(),
            None => self.widgets.label(),
        }
    }

    pub fn route(&self, doc: &Document, target: NodeId) -> Option<Route> {
        if let Some(fs) = &self.fullscreen {
            if target == fs.exit_button() {
                return Some(Route::ExitControl);
            }
            if fs.owns(doc, target) {
                return Some(Route::Fullscreen);
            }
        }
        if target == self.widgets.control() {
            return Some(Route::Control);
        }
        if target == self.widgets.capture() {
            return Some(Route::Capture);
        }
        None
    }

    pub fn pointer<P: PlatformApi>(&mut self, page: &mut Page<P>, target: NodeId, ev: &PointerEvent) -> Result<Option<GestureOutcome>> {
        match self.route(&page.doc, target) {
            Some(Route::Capture) => {
                let now = page.now_ms;
                let media = page.doc.media_mut(self.surface)?;
                let outcome = self.recognizer.handle(ev, now, media);
                let label = self.widgets.label_mut();
                for effect in &outcome.effects {
                    label.apply(&mut page.doc, &mut page.timers, now, self.surface, effect);
                }
                Ok(Some(outcome))
            }
            Some(Route::Fullscreen) => match self.fullscreen.as_mut() {
                Some(fs) => fs.handle_pointer(page, ev).map(Some),
                None => Ok(None),
            },
            Some(Route::ExitControl) => {
                match ev.kind {
                    PointerKind::Down => {
                        if let Some(fs) = &self.fullscreen {
                            fs.press_exit_button(&mut page.doc);
                        }
                    }
                    PointerKind::Up => {
                        self.exit_fullscreen(page)?;
                    }
                    PointerKind::Move => {}
                }
                Ok(None)
            }
            Some(Route::Control) | None => Ok(None),
        }
    }

    pub fn click<P: PlatformApi>(&mut self, page: &mut Page<P>, target: NodeId) -> Result<()> {
        match self.route(&page.doc, target) {
            Some(Route::Control) => self.toggle_fullscreen(page).map(|_| ()),
            Some(Route::ExitControl) => self.exit_fullscreen(page).map(|_| ()),
            _ => Ok(()),
        }
    }

    pub fn hover<P: PlatformApi>(&self, page: &mut Page<P>, target: NodeId, hovered: bool) {
        if target == self.widgets.control() {
            self.widgets.set_control_hover(&mut page.doc, hovered);
        }
    }

    /// Returns the phase after toggling.
    pub fn toggle_fullscreen<P: PlatformApi>(&mut self, page: &mut Page<P>) -> Result<FullscreenPhase> {
        if self.fullscreen.is_some() {
            self.exit_fullscreen(page)?;
        } else {
            self.enter_fullscreen(page)?;
        }
        Ok(self.phase())
    }

    /// Returns false if a session was already active.
    pub fn enter_fullscreen<P: PlatformApi>(&mut self, page: &mut Page<P>) -> Result<bool> {
        if self.fullscreen.is_some() {
            debug!("{:?} already in fake fullscreen", self.surface);
            return Ok(false);
        }
        let fs = FakeFullscreenManager::enter(page, self.surface, self.widgets.control())?;
        self.widgets.set_control_icon(&mut page.doc, ControlIcon::Exit);
        self.fullscreen = Some(fs);
        Ok(true)
    }

    /// Returns false if no session was active.
    pub fn exit_fullscreen<P: PlatformApi>(&mut self, page: &mut Page<P>) -> Result<bool> {
        let Some(fs) = self.fullscreen.take() else {
            return Ok(false);
        };
        fs.exit(page)?;
        self.widgets.set_control_icon(&mut page.doc, ControlIcon::Enter);
        let hide_ms = page.config.feedback_hide_ms;
        let now = page.now_ms;
        self.widgets
            .label_mut()
            .flash(&mut page.doc, &mut page.timers, now, self.surface, MSG_EXITED, hide_ms);
        Ok(true)
    }

    pub fn on_viewport_change<P: PlatformApi>(&self, page: &mut Page<P>) {
        if let Some(fs) = &self.fullscreen {
            fs.on_viewport_change(page);
        }
    }

    /// A timer scheduled on behalf of this surface fired.
    pub fn fire<P: PlatformApi>(&mut self, page: &mut Page<P>, task: TimerTask) {
        match task {
            TimerTask::HideFeedback { slot: FeedbackSlot::Primary, .. } => {
                self.widgets.label_mut().expire(&mut page.doc);
            }
            TimerTask::HideFeedback { slot: FeedbackSlot::Fullscreen, .. } => {
                if let Some(fs) = self.fullscreen.as_mut() {
                    fs.label_mut().expire(&mut page.doc);
                }
            }
            TimerTask::ViewportCorrection { .. } => {
                if let Some(fs) = &self.fullscreen {
                    fs.on_viewport_retry(page);
                }
            }
        }
    }

    /// Undo the takeover: leave fullscreen, remove the overlay and drop every
    /// pending timer of this surface.
    pub fn detach<P: PlatformApi>(mut self, page: &mut Page<P>) {
        if let Some(fs) = self.fullscreen.take() {
            if let Err(e) = fs.exit(page) {
                warn!("leaving fake fullscreen on detach failed: {}", e);
            }
        }
        self.attached = false;
        self.widgets.remove(&mut page.doc, &mut page.timers);
        page.timers.cancel_surface(self.surface);
        page.remove_viewport_listener(self.surface);
        page.doc.remove_attr(self.surface, TAKEOVER_ATTR);
        info!("detached from surface {:?}", self.surface);
    }
}
