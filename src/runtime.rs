//! The host-facing runtime: one page, its timers, its platform, and the set
//! of surfaces taken over on it.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::Serialize;

use crate::controller::{SurfaceController, TAKEOVER_ATTR};
use crate::dom::{Document, NodeId};
use crate::fullscreen::FullscreenPhase;
use crate::gesture::{GestureOutcome, PointerEvent};
use crate::overlay::FeedbackSlot;
use crate::platform::{HeadlessPlatform, PlatformApi};
use crate::timers::TimerQueue;
use crate::{Result, TakeoverConfig};

/// Shared page state every surface works against.
pub struct Page<P: PlatformApi = HeadlessPlatform> {
    pub(crate) doc: Document,
    pub(crate) timers: TimerQueue,
    pub(crate) platform: P,
    pub(crate) config: TakeoverConfig,
    pub(crate) now_ms: u64,
    viewport_listeners: BTreeSet<NodeId>,
}

impl<P: PlatformApi> Page<P> {
    pub fn new(doc: Document, platform: P, config: TakeoverConfig) -> Self {
        Page {
            doc,
            timers: TimerQueue::new(),
            platform,
            config,
            now_ms: 0,
            viewport_listeners: BTreeSet::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &TakeoverConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub(crate) fn add_viewport_listener(&mut self, surface: NodeId) {
        self.viewport_listeners.insert(surface);
    }

    pub(crate) fn remove_viewport_listener(&mut self, surface: NodeId) {
        self.viewport_listeners.remove(&surface);
    }

    pub fn has_viewport_listener(&self, surface: NodeId) -> bool {
        self.viewport_listeners.contains(&surface)
    }

    pub fn viewport_listener_count(&self) -> usize {
        self.viewport_listeners.len()
    }
}

/// What a surface's visible feedback label currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    pub slot: &'static str,
    pub visible: bool,
    pub text: String,
}

/// Takes over every media surface on a page and dispatches host events to
/// them.
pub struct Takeover<P: PlatformApi = HeadlessPlatform> {
    page: Page<P>,
    surfaces: BTreeMap<NodeId, SurfaceController>,
}

impl Takeover<HeadlessPlatform> {
    pub fn new(config: TakeoverConfig, doc: Document) -> Result<Self> {
        let platform = HeadlessPlatform::new(config.viewport);
        Self::with_platform(config, doc, platform)
    }

    pub fn from_html(config: TakeoverConfig, html: &str) -> Result<Self> {
        Self::new(config, Document::parse(html)?)
    }
}

impl<P: PlatformApi> Takeover<P> {
    pub fn with_platform(config: TakeoverConfig, doc: Document, platform: P) -> Result<Self> {
        config.validate()?;
        Ok(Takeover {
            page: Page::new(doc, platform, config),
            surfaces: BTreeMap::new(),
        })
    }

    /// Attach to every surface on the page not yet taken over. Returns how
    /// many were attached.
    pub fn scan(&mut self) -> usize {
        let videos = self.page.doc.elements_by_tag("video");
        videos.into_iter().filter(|&v| self.attach(v)).count()
    }

    /// Mutation hook: the host inserted `nodes`. Surfaces among them or
    /// inside them are attached.
    pub fn nodes_added(&mut self, nodes: &[NodeId]) -> usize {
        let mut attached = 0;
        for &node in nodes {
            let candidates: Vec<NodeId> = self
                .page
                .doc
                .descendants(node)
                .into_iter()
                .chain(std::iter::once(node))
                .filter(|&id| self.page.doc.media(id).is_some())
                .collect();
            for id in candidates {
                if self.attach(id) {
                    attached += 1;
                }
            }
        }
        attached
    }

    /// Attach to one surface. False if it is already taken over, carries the
    /// takeover marker, has no parent or is not a media element.
    pub fn attach(&mut self, surface: NodeId) -> bool {
        if self.surfaces.contains_key(&surface) || self.page.doc.attr(surface, TAKEOVER_ATTR).is_some() {
            return false;
        }
        match SurfaceController::attach(&mut self.page, surface) {
            Ok(Some(controller)) => {
                self.surfaces.insert(surface, controller);
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!("not attaching {:?}: {}", surface, e);
                false
            }
        }
    }

    pub fn detach(&mut self, surface: NodeId) -> bool {
        match self.surfaces.remove(&surface) {
            Some(controller) => {
                controller.detach(&mut self.page);
                true
            }
            None => false,
        }
    }

    fn owner_of(&self, target: NodeId) -> Option<NodeId> {
        self.surfaces
            .values()
            .find(|c| c.route(&self.page.doc, target).is_some())
            .map(SurfaceController::surface)
    }

    /// Deliver a pointer event to whatever widget `target` is.
    pub fn pointer(&mut self, target: NodeId, ev: PointerEvent) -> Option<GestureOutcome> {
        let surface = self.owner_of(target)?;
        let controller = self.surfaces.get_mut(&surface)?;
        match controller.pointer(&mut self.page, target, &ev) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("pointer event on {:?} failed: {}", surface, e);
                None
            }
        }
    }

    pub fn click(&mut self, target: NodeId) {
        let Some(surface) = self.owner_of(target) else {
            return;
        };
        if let Some(controller) = self.surfaces.get_mut(&surface) {
            if let Err(e) = controller.click(&mut self.page, target) {
                warn!("click on {:?} failed: {}", surface, e);
            }
        }
    }

    pub fn hover(&mut self, target: NodeId, hovered: bool) {
        if let Some(surface) = self.owner_of(target) {
            if let Some(controller) = self.surfaces.get(&surface) {
                controller.hover(&mut self.page, target, hovered);
            }
        }
    }

    /// Programmatic equivalent of activating the surface's control.
    pub fn toggle_fullscreen(&mut self, surface: NodeId) -> Result<FullscreenPhase> {
        match self.surfaces.get_mut(&surface) {
            Some(controller) => controller.toggle_fullscreen(&mut self.page),
            None => Err(crate::Error::NodeNotFound(surface)),
        }
    }

    /// Window resized.
    pub fn resize(&mut self, width: u32, height: u32) {
        let device = self.page.platform.device_mut();
        let mut metrics = device.metrics();
        metrics.width = width;
        metrics.height = height;
        device.set_metrics(metrics);
        self.notify_viewport();
    }

    /// Device rotated.
    pub fn orientation_change(&mut self) {
        self.page.platform.device_mut().rotate();
        self.notify_viewport();
    }

    fn notify_viewport(&mut self) {
        for controller in self.surfaces.values() {
            if self.page.has_viewport_listener(controller.surface()) {
                controller.on_viewport_change(&mut self.page);
            }
        }
    }

    /// Advance the clock, firing due timers in deadline order.
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some((deadline, task)) = self.page.timers.pop_due(now_ms) {
            self.page.now_ms = self.page.now_ms.max(deadline);
            match self.surfaces.get_mut(&task.surface()) {
                Some(controller) => controller.fire(&mut self.page, task),
                None => debug!("dropping timer for unknown surface {:?}", task.surface()),
            }
        }
        self.page.now_ms = self.page.now_ms.max(now_ms);
    }

    /// The host learned the media's duration.
    pub fn load_metadata(&mut self, surface: NodeId, duration: f64) -> Result<()> {
        self.page.doc.media_mut(surface)?.duration = duration;
        Ok(())
    }

    pub fn phase(&self, surface: NodeId) -> FullscreenPhase {
        self.surfaces
            .get(&surface)
            .map(SurfaceController::phase)
            .unwrap_or(FullscreenPhase::Inactive)
    }

    pub fn is_attached(&self, surface: NodeId) -> bool {
        self.surfaces.get(&surface).is_some_and(SurfaceController::is_attached)
    }

    pub fn surfaces(&self) -> Vec<NodeId> {
        self.surfaces.keys().copied().collect()
    }

    pub fn controller(&self, surface: NodeId) -> Option<&SurfaceController> {
        self.surfaces.get(&surface)
    }

    pub fn feedback(&self, surface: NodeId) -> Option<FeedbackView> {
        let label = self.surfaces.get(&surface)?.active_label();
        Some(FeedbackView {
            slot: match label.slot() {
                FeedbackSlot::Primary => "primary",
                FeedbackSlot::Fullscreen => "fullscreen",
            },
            visible: label.is_visible(&self.page.doc),
            text: label.text(&self.page.doc).to_string(),
        })
    }

    pub fn page(&self) -> &Page<P> {
        &self.page
    }

    pub fn document(&self) -> &Document {
        &self.page.doc
    }

    /// Host-side page mutation. Pair structural insertions with
    /// [`Takeover::nodes_added`].
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.page.doc
    }

    pub fn platform(&self) -> &P {
        &self.page.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.page.platform
    }

    pub fn config(&self) -> &TakeoverConfig {
        &self.page.config
    }

    pub fn now_ms(&self) -> u64 {
        self.page.now_ms
    }
}
