//! Fake fullscreen: a CSS-driven, full-viewport, rotated presentation of a
//! surface with exact restoration on exit.
//!
//! A [`FakeFullscreenManager`] exists only for the lifetime of one session:
//! [`FakeFullscreenManager::enter`] builds it and [`FakeFullscreenManager::exit`]
//! consumes it. Everything the session changes on the page is owned by the
//! manager (style snapshot, original placement, hidden elements, injected
//! nodes, timer handles), so nothing outlives the session. Injected nodes are
//! released back to the document on exit.
//!
//! Enter and exit each run to completion inside one call, so a surface is only
//! ever observed [`FullscreenPhase::Inactive`] or [`FullscreenPhase::Active`].

use log::{debug, info, warn};
use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::gesture::{GestureOutcome, GestureRecognizer, GestureSettings, PointerEvent};
use crate::overlay::{ControlIcon, FeedbackLabel, FeedbackSlot, CONTROL_HOVER_BG, ROLE_ATTR};
use crate::platform::{negotiate, PlatformApi, EXIT_ENTRIES, REQUEST_ENTRIES};
use crate::runtime::Page;
use crate::style::{Declaration, InlineStyle};
use crate::timers::{TimerId, TimerTask};
use crate::visibility::{HiddenElementSet, VisibilityGuard};
use crate::{Error, Result};

pub const CONTAINER_ATTR: &str = "data-fullscreen-container";
pub const STYLE_ATTR: &str = "data-fullscreen-style";
pub const EXIT_BUTTON_ATTR: &str = "data-fullscreen-exit-btn";

pub const MSG_ENTERED: &str = "横屏全屏";
pub const MSG_EXITED: &str = "退出全屏";

/// Surface properties a snapshot is expected to round-trip.
pub const SURFACE_FIELDS: &[&str] = &["position", "top", "left", "width", "height", "z-index", "transform"];

const CONTAINER_CSS: &str = "position: fixed !important; top: 0 !important; left: 0 !important; \
    width: 100vw !important; height: 100vh !important; max-height: 100vh !important; \
    min-height: 100vh !important; z-index: 2147483647 !important; background: #000 !important; \
    margin: 0 !important; padding: 0 !important; border: none !important; outline: none !important; \
    transform: none !important; animation: none !important; transition: none !important; \
    pointer-events: auto !important; visibility: visible !important; opacity: 1 !important; \
    display: block !important; overflow: hidden !important; isolation: isolate !important; \
    will-change: transform !important; backface-visibility: hidden !important; \
    perspective: 1000px !important; box-sizing: border-box !important;";

// Width and height are swapped and the box is rotated about its top-left
// corner; the translate pulls it back into the viewport.
const SURFACE_CSS: &str = "position: absolute !important; top: 0 !important; left: 0 !important; \
    width: 100vh !important; height: 100vw !important; z-index: 2147483647 !important; \
    transform: rotate(90deg) translate(0, -100%) !important; transform-origin: top left !important; \
    margin: 0 !important; padding: 0 !important; border: none !important; outline: none !important; \
    background: #000 !important; object-fit: contain !important; pointer-events: auto !important; \
    visibility: visible !important; opacity: 1 !important; display: block !important;";

const EXIT_BUTTON_CSS: &str = "position: fixed !important; bottom: 12px !important; right: 12px !important; \
    width: 36px !important; height: 36px !important; background-color: rgba(40, 40, 40, 0.80) !important; \
    border-radius: 8px !important; cursor: pointer !important; display: flex !important; \
    align-items: center !important; justify-content: center !important; z-index: 2147483648 !important; \
    box-shadow: 0 2px 8px 0 rgba(0,0,0,0.15) !important; margin: 0 !important; padding: 0 !important; \
    border: none !important; outline: none !important; pointer-events: auto !important; \
    visibility: visible !important; opacity: 1 !important; touch-action: manipulation !important;";

const LABEL_CSS: &str = "position: fixed !important; top: 50% !important; left: 50% !important; \
    transform: translate(-50%, -50%) !important; background: rgba(40, 40, 40, 0.80) !important; \
    color: #fff !important; font-size: 0.98rem !important; font-weight: 500 !important; \
    padding: 0.32em 1.05em !important; border-radius: 1em !important; pointer-events: none !important; \
    opacity: 0 !important; z-index: 2147483647 !important; user-select: none !important; \
    display: block !important;";

const INJECTED_CSS: &str = r#"
@supports (-webkit-appearance: none) {
    body, html { height: 100% !important; overflow: hidden !important; }
}
body {
    -webkit-transform: translate3d(0,0,0) !important;
    transform: translate3d(0,0,0) !important;
}
[data-fullscreen-container] {
    position: fixed !important;
    top: -10px !important;
    left: -10px !important;
    right: -10px !important;
    bottom: -10px !important;
    width: calc(100vw + 20px) !important;
    height: calc(100vh + 20px) !important;
    z-index: 2147483647 !important;
    background: #000 !important;
    padding: 10px !important;
    box-sizing: border-box !important;
}
"#;

/// Whether a surface currently has a fake-fullscreen session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FullscreenPhase {
    Inactive,
    Active,
}

/// Everything enter changes that exit must put back.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSnapshot {
    surface: InlineStyle,
    root_overflow: Option<Declaration>,
    root_height: Option<Declaration>,
    root_vh: Option<Declaration>,
    body_overflow: Option<Declaration>,
    body_height: Option<Declaration>,
}

impl StyleSnapshot {
    pub fn capture(doc: &Document, surface: NodeId) -> Result<Self> {
        let surface_style = doc.element(surface)?.style().clone();
        let html = doc.element(doc.html())?.style();
        let body = doc.element(doc.body())?.style();
        Ok(StyleSnapshot {
            surface: surface_style,
            root_overflow: html.declaration("overflow").cloned(),
            root_height: html.declaration("height").cloned(),
            root_vh: html.declaration("--vh").cloned(),
            body_overflow: body.declaration("overflow").cloned(),
            body_height: body.declaration("height").cloned(),
        })
    }

    /// Captured inline value of one surface property.
    pub fn surface_field(&self, name: &str) -> Option<&str> {
        self.surface.get(name)
    }

    pub fn surface_style(&self) -> &InlineStyle {
        &self.surface
    }

    fn restore_surface(&self, doc: &mut Document, surface: NodeId) -> Result<()> {
        doc.set_style(surface, self.surface.clone())
    }

    fn restore_document(&self, doc: &mut Document) {
        let (html, body) = (doc.html(), doc.body());
        if let Ok(s) = doc.style_mut(html) {
            s.restore_declaration("overflow", self.root_overflow.clone());
            s.restore_declaration("height", self.root_height.clone());
            s.restore_declaration("--vh", self.root_vh.clone());
        }
        if let Ok(s) = doc.style_mut(body) {
            s.restore_declaration("overflow", self.body_overflow.clone());
            s.restore_declaration("height", self.body_height.clone());
        }
    }
}

/// Lock the page to the top of a full-height, non-scrolling viewport.
pub fn apply_viewport_correction<P: PlatformApi>(page: &mut Page<P>) {
    let vh = page.platform.device().metrics().vh_unit();
    let doc = &mut page.doc;
    doc.scroll_to(0.0, 0.0);
    let (html, body) = (doc.html(), doc.body());
    if let Ok(s) = doc.style_mut(html) {
        s.set("--vh", &format!("{vh}px"));
        s.set("height", "100vh");
        s.set("overflow", "hidden");
    }
    if let Ok(s) = doc.style_mut(body) {
        s.set("height", "100vh");
        s.set("overflow", "hidden");
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    parent: NodeId,
    next_sibling: Option<NodeId>,
}

/// One fake-fullscreen session for one surface.
#[derive(Debug)]
pub struct FakeFullscreenManager {
    surface: NodeId,
    snapshot: StyleSnapshot,
    placement: Placement,
    container: NodeId,
    style_node: NodeId,
    exit_button: NodeId,
    label: FeedbackLabel,
    recognizer: GestureRecognizer,
    guard: VisibilityGuard,
    hidden: Option<HiddenElementSet>,
    retry_timers: Vec<TimerId>,
    native_entry: Option<&'static str>,
}

impl FakeFullscreenManager {
    /// Put `surface` into fake fullscreen. `control` is the surface's own
    /// control affordance, kept visible by the occlusion pass.
    pub fn enter<P: PlatformApi>(page: &mut Page<P>, surface: NodeId, control: NodeId) -> Result<Self> {
        debug!("fake fullscreen {:?}: entering", surface);
        let doc = &mut page.doc;
        let snapshot = StyleSnapshot::capture(doc, surface)?;
        let parent = doc
            .parent(surface)
            .ok_or_else(|| Error::Other(format!("{surface:?} has no parent")))?;
        let placement = Placement {
            parent,
            next_sibling: doc.next_sibling(surface),
        };

        let style_node = doc.create_element("style");
        doc.set_attr(style_node, STYLE_ATTR, "true")?;
        doc.set_text(style_node, INJECTED_CSS)?;
        let head = doc.head();
        doc.append_child(head, style_node)?;

        let container = doc.create_element("div");
        doc.set_style(container, InlineStyle::parse(CONTAINER_CSS))?;
        doc.set_attr(container, CONTAINER_ATTR, "true")?;
        doc.set_style(surface, InlineStyle::parse(SURFACE_CSS))?;
        doc.append_child(container, surface)?;
        let body = doc.body();
        doc.append_child(body, container)?;

        let native_entry = negotiate(page.platform.fullscreen(), REQUEST_ENTRIES);

        apply_viewport_correction(page);
        let now = page.now_ms;
        let mut retry_timers = Vec::new();
        for delay in page.config.viewport_retry_delays_ms.clone() {
            retry_timers.push(page.timers.schedule(now, delay, TimerTask::ViewportCorrection { surface }));
        }
        page.add_viewport_listener(surface);

        let guard = VisibilityGuard::new(page.config.occlusion_z_index_threshold);
        let hidden = guard.suppress_occlusions(&mut page.doc, &[surface, control, container]);

        let doc = &mut page.doc;
        let exit_button = doc.create_element("div");
        doc.set_style(exit_button, InlineStyle::parse(EXIT_BUTTON_CSS))?;
        doc.set_attr(exit_button, EXIT_BUTTON_ATTR, "true")?;
        doc.set_attr(exit_button, ROLE_ATTR, "exit-control")?;
        doc.set_inner_markup(exit_button, ControlIcon::Exit.markup())?;
        doc.append_child(body, exit_button)?;

        let mut label = FeedbackLabel::install(doc, container, LABEL_CSS, FeedbackSlot::Fullscreen)?;
        let recognizer = GestureRecognizer::new(GestureSettings::from(&page.config));

        let hide_ms = page.config.feedback_hide_ms;
        label.flash(&mut page.doc, &mut page.timers, now, surface, MSG_ENTERED, hide_ms);

        info!(
            "fake fullscreen {:?}: active (native: {}, hidden: {})",
            surface,
            native_entry.unwrap_or("none"),
            hidden.len()
        );
        Ok(FakeFullscreenManager {
            surface,
            snapshot,
            placement,
            container,
            style_node,
            exit_button,
            label,
            recognizer,
            guard,
            hidden: Some(hidden),
            retry_timers,
            native_entry,
        })
    }

    /// Tear the session down and restore the page.
    pub fn exit<P: PlatformApi>(mut self, page: &mut Page<P>) -> Result<()> {
        debug!("fake fullscreen {:?}: exiting", self.surface);
        let surface = self.surface;

        let Placement { parent, next_sibling } = self.placement;
        let doc = &mut page.doc;
        if doc.is_connected(parent) && !doc.contains(surface, parent) {
            doc.insert_before(parent, surface, next_sibling)?;
        } else {
            warn!(
                "fake fullscreen {:?}: original parent {:?} left the page, restoring into <body>",
                surface, parent
            );
            let body = doc.body();
            doc.append_child(body, surface)?;
        }
        self.snapshot.restore_surface(doc, surface)?;

        page.remove_viewport_listener(surface);
        for id in self.retry_timers.drain(..) {
            page.timers.cancel(id);
        }

        page.doc.release(self.style_node);
        page.doc.release(self.container);

        negotiate(page.platform.fullscreen(), EXIT_ENTRIES);

        page.doc.release(self.exit_button);
        self.label.remove(&mut page.doc, &mut page.timers);

        if let Some(hidden) = self.hidden.take() {
            self.guard.restore(&mut page.doc, hidden);
        }
        self.snapshot.restore_document(&mut page.doc);

        info!("fake fullscreen {:?}: inactive", surface);
        Ok(())
    }

    pub fn surface(&self) -> NodeId {
        self.surface
    }

    /// A live manager is always active.
    pub fn phase(&self) -> FullscreenPhase {
        FullscreenPhase::Active
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn exit_button(&self) -> NodeId {
        self.exit_button
    }

    pub fn label(&self) -> &FeedbackLabel {
        &self.label
    }

    pub fn label_mut(&mut self) -> &mut FeedbackLabel {
        &mut self.label
    }

    pub fn snapshot(&self) -> &StyleSnapshot {
        &self.snapshot
    }

    pub fn hidden(&self) -> Option<&HiddenElementSet> {
        self.hidden.as_ref()
    }

    pub fn native_entry(&self) -> Option<&'static str> {
        self.native_entry
    }

    /// Whether `target` is the container or something inside it.
    pub fn owns(&self, doc: &Document, target: NodeId) -> bool {
        doc.contains(self.container, target)
    }

    /// Gestures inside the container drive the same surface.
    pub fn handle_pointer<P: PlatformApi>(&mut self, page: &mut Page<P>, ev: &PointerEvent) -> Result<GestureOutcome> {
        let now = page.now_ms;
        let media = page.doc.media_mut(self.surface)?;
        let outcome = self.recognizer.handle(ev, now, media);
        for effect in &outcome.effects {
            self.label.apply(&mut page.doc, &mut page.timers, now, self.surface, effect);
        }
        Ok(outcome)
    }

    /// Resize / orientation change: correct the viewport again and re-pin the
    /// container to the new viewport height.
    pub fn on_viewport_change<P: PlatformApi>(&self, page: &mut Page<P>) {
        apply_viewport_correction(page);
        if let Ok(s) = page.doc.style_mut(self.container) {
            s.set_important("height", "100vh");
            s.set_important("max-height", "100vh");
            s.set_important("min-height", "100vh");
        }
    }

    /// Delayed viewport correction retry.
    pub fn on_viewport_retry<P: PlatformApi>(&self, page: &mut Page<P>) {
        apply_viewport_correction(page);
    }

    /// Pressed-state feedback on the exit affordance.
    pub fn press_exit_button(&self, doc: &mut Document) {
        if let Ok(s) = doc.style_mut(self.exit_button) {
            s.set_important("background-color", CONTROL_HOVER_BG);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HeadlessPlatform, TakeoverConfig};

    const PAGE: &str = r#"<html style="overflow: auto"><body>
<div class="navbar" id="bar">menu</div>
<div id="player"><video style="width: 320px; height: 180px; z-index: 2" data-duration="100"></video><p id="after">caption</p></div>
</body></html>"#;

    fn page() -> (Page<HeadlessPlatform>, NodeId, NodeId) {
        let doc = Document::parse(PAGE).unwrap();
        let mut page = Page::new(doc, HeadlessPlatform::default(), TakeoverConfig::default());
        let video = page.doc.elements_by_tag("video")[0];
        let control = page.doc.create_element("div");
        let parent = page.doc.parent(video).unwrap();
        page.doc.append_child(parent, control).unwrap();
        (page, video, control)
    }

    #[test]
    fn enter_reparents_and_rotates_surface() {
        let (mut page, video, control) = page();
        let fs = FakeFullscreenManager::enter(&mut page, video, control).unwrap();
        assert_eq!(fs.phase(), FullscreenPhase::Active);
        assert_eq!(page.doc.parent(video), Some(fs.container()));
        assert_eq!(page.doc.parent(fs.container()), Some(page.doc.body()));
        assert_eq!(page.doc.parent(fs.exit_button()), Some(page.doc.body()));
        assert_eq!(
            page.doc.style(video).unwrap().get("transform"),
            Some("rotate(90deg) translate(0, -100%)")
        );
        assert_eq!(fs.snapshot().surface_field("width"), Some("320px"));
        assert_eq!(fs.native_entry(), Some("requestFullscreen"));
        assert_eq!(page.doc.find_by_attr(STYLE_ATTR, "true").len(), 1);
        assert!(fs.label().is_visible(&page.doc));
        assert_eq!(fs.label().text(&page.doc), MSG_ENTERED);
    }

    #[test]
    fn exit_releases_injected_nodes_for_reuse() {
        let (mut page, video, control) = page();
        let fs = FakeFullscreenManager::enter(&mut page, video, control).unwrap();
        let active_len = page.doc.arena_len();
        let (container, exit_button) = (fs.container(), fs.exit_button());
        fs.exit(&mut page).unwrap();
        assert!(page.doc.get(container).is_none());
        assert!(page.doc.get(exit_button).is_none());

        let fs = FakeFullscreenManager::enter(&mut page, video, control).unwrap();
        assert_eq!(page.doc.arena_len(), active_len);
        assert_eq!(fs.phase(), FullscreenPhase::Active);
        fs.exit(&mut page).unwrap();
    }

    #[test]
    fn phases_report_as_inactive_or_active() {
        assert_eq!(serde_json::to_value(FullscreenPhase::Inactive).unwrap(), "inactive");
        assert_eq!(serde_json::to_value(FullscreenPhase::Active).unwrap(), "active");
    }

    #[test]
    fn enter_then_exit_restores_everything() {
        let (mut page, video, control) = page();
        let before = page.doc.style_digest();
        let after_p = page.doc.find_by_attr("id", "after")[0];
        let fs = FakeFullscreenManager::enter(&mut page, video, control).unwrap();
        let bar = page.doc.find_by_attr("id", "bar")[0];
        assert!(fs.hidden().unwrap().contains(bar));
        fs.exit(&mut page).unwrap();
        assert_eq!(page.doc.next_sibling(video), Some(after_p));
        assert_eq!(before, page.doc.style_digest());
        assert!(page.timers.is_empty());
        assert!(!page.has_viewport_listener(video));
    }

    #[test]
    fn exit_falls_back_to_body_when_parent_is_gone() {
        let (mut page, video, control) = page();
        let fs = FakeFullscreenManager::enter(&mut page, video, control).unwrap();
        let player = page.doc.find_by_attr("id", "player")[0];
        page.doc.remove(player);
        fs.exit(&mut page).unwrap();
        assert_eq!(page.doc.parent(video), Some(page.doc.body()));
        assert_eq!(page.doc.style(video).unwrap().get("width"), Some("320px"));
    }

    #[test]
    fn viewport_correction_pins_document() {
        let (mut page, _, _) = page();
        page.doc.scroll_to(0.0, 400.0);
        apply_viewport_correction(&mut page);
        assert_eq!(page.doc.scroll_position(), (0.0, 0.0));
        let html = page.doc.style(page.doc.html()).unwrap();
        assert_eq!(html.get("--vh"), Some("8.44px"));
        assert_eq!(html.get("overflow"), Some("hidden"));
        assert_eq!(page.doc.style(page.doc.body()).unwrap().get("height"), Some("100vh"));
    }
}
