//! Overlay widgets injected next to a surface: the capture layer, the
//! feedback label and the fullscreen control affordance.

use log::debug;

use crate::dom::{Document, NodeId};
use crate::gesture::FeedbackEffect;
use crate::style::InlineStyle;
use crate::timers::{TimerId, TimerQueue, TimerTask};
use crate::Result;

/// Attribute tagging every element the takeover injects.
pub const ROLE_ATTR: &str = "data-takeover-role";

const CAPTURE_CSS: &str = "position: absolute; top: 0; left: 0; width: 100%; height: 100%; \
    background-color: rgba(128, 128, 128, 0); z-index: 9999; cursor: pointer; touch-action: none;";

const LABEL_CSS: &str = "position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); \
    background: rgba(40, 40, 40, 0.80); color: #fff; font-size: 0.98rem; font-weight: 500; \
    padding: 0.32em 1.05em; border-radius: 1em; box-shadow: 0 2px 12px 0 rgba(0,0,0,0.18); \
    pointer-events: none; opacity: 0; transition: opacity 0.2s cubic-bezier(.4,0,.2,1); \
    z-index: 10000; user-select: none; letter-spacing: 0.02em;";

const CONTROL_CSS: &str = "position: absolute; bottom: 12px; right: 12px; width: 36px; height: 36px; \
    background-color: rgba(40, 40, 40, 0.80); border-radius: 8px; cursor: pointer; display: flex; \
    align-items: center; justify-content: center; z-index: 10001; \
    box-shadow: 0 2px 8px 0 rgba(0,0,0,0.15); transition: background-color 0.2s ease;";

pub const CONTROL_IDLE_BG: &str = "rgba(40, 40, 40, 0.80)";
pub const CONTROL_HOVER_BG: &str = "rgba(60, 60, 60, 0.90)";

/// Which feedback label of a surface an effect or timer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackSlot {
    /// The label installed beside the surface at attach time.
    Primary,
    /// The label living inside the fake-fullscreen container.
    Fullscreen,
}

/// Iconography of a control affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlIcon {
    Enter,
    Exit,
}

impl ControlIcon {
    pub fn markup(self) -> &'static str {
        match self {
            ControlIcon::Enter => concat!(
                r##"<svg width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="#fff" stroke-width="2">"##,
                r#"<path d="M8 3H5a2 2 0 0 0-2 2v3m18 0V5a2 2 0 0 0-2-2h-3m0 18h3a2 2 0 0 0 2-2v-3M3 16v3a2 2 0 0 0 2 2h3"/></svg>"#
            ),
            ControlIcon::Exit => concat!(
                r##"<svg width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="#fff" stroke-width="2">"##,
                r#"<path d="M8 3v3a2 2 0 0 1-2 2H3m18 0h-3a2 2 0 0 1-2-2V3m0 18v-3a2 2 0 0 0 2-2h3"/></svg>"#
            ),
        }
    }
}

/// A transient text label. Text and opacity are mutated in place; the
/// element is created once.
#[derive(Debug)]
pub struct FeedbackLabel {
    node: NodeId,
    slot: FeedbackSlot,
    pending_hide: Option<TimerId>,
}

impl FeedbackLabel {
    /// Create the label element with `css` and append it to `parent`.
    pub fn install(doc: &mut Document, parent: NodeId, css: &str, slot: FeedbackSlot) -> Result<Self> {
        let node = doc.create_element("div");
        doc.set_style(node, InlineStyle::parse(css))?;
        doc.set_attr(node, ROLE_ATTR, "feedback")?;
        doc.append_child(parent, node)?;
        Ok(FeedbackLabel {
            node,
            slot,
            pending_hide: None,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn slot(&self) -> FeedbackSlot {
        self.slot
    }

    fn set_opacity(&self, doc: &mut Document, opacity: &str) {
        if let Ok(style) = doc.style_mut(self.node) {
            match style.declaration("opacity").map(|d| d.important) {
                Some(true) => style.set_important("opacity", opacity),
                _ => style.set("opacity", opacity),
            }
        }
    }

    pub fn show(&self, doc: &mut Document, text: &str) {
        let _ = doc.set_text(self.node, text);
        self.set_opacity(doc, "1");
    }

    pub fn hide(&self, doc: &mut Document) {
        self.set_opacity(doc, "0");
    }

    pub fn is_visible(&self, doc: &Document) -> bool {
        doc.style(self.node).and_then(|s| s.get("opacity")) == Some("1")
    }

    pub fn text<'a>(&self, doc: &'a Document) -> &'a str {
        doc.text(self.node)
    }

    /// Apply one effect. Any show or hide supersedes a pending auto-hide, so
    /// a stale timer never blanks a newer message.
    pub fn apply(&mut self, doc: &mut Document, timers: &mut TimerQueue, now_ms: u64, surface: NodeId, effect: &FeedbackEffect) {
        if let Some(id) = self.pending_hide.take() {
            timers.cancel(id);
        }
        match effect {
            FeedbackEffect::Show(text) => self.show(doc, text),
            FeedbackEffect::Hide => self.hide(doc),
            FeedbackEffect::HideAfter(ms) => {
                let task = TimerTask::HideFeedback { surface, slot: self.slot };
                self.pending_hide = Some(timers.schedule(now_ms, *ms, task));
            }
        }
    }

    /// Show `text` and hide it again after `hide_after_ms`.
    pub fn flash(&mut self, doc: &mut Document, timers: &mut TimerQueue, now_ms: u64, surface: NodeId, text: &str, hide_after_ms: u64) {
        self.apply(doc, timers, now_ms, surface, &FeedbackEffect::Show(text.to_string()));
        self.apply(doc, timers, now_ms, surface, &FeedbackEffect::HideAfter(hide_after_ms));
    }

    /// Fired auto-hide timer.
    pub fn expire(&mut self, doc: &mut Document) {
        self.pending_hide = None;
        self.hide(doc);
    }

    /// Cancel any pending auto-hide and release the element.
    pub fn remove(mut self, doc: &mut Document, timers: &mut TimerQueue) {
        if let Some(id) = self.pending_hide.take() {
            timers.cancel(id);
        }
        doc.release(self.node);
    }
}

/// The widgets installed beside one surface.
#[derive(Debug)]
pub struct OverlayWidgets {
    capture: NodeId,
    label: FeedbackLabel,
    control: NodeId,
}

impl OverlayWidgets {
    /// Install capture layer, label and control next to `surface`. The
    /// surface's parent becomes the positioning context.
    pub fn install(doc: &mut Document, surface: NodeId) -> Result<Self> {
        let parent = doc
            .parent(surface)
            .ok_or_else(|| crate::Error::Other(format!("{surface:?} has no parent")))?;
        if doc.computed(parent, "position") == "static" {
            doc.style_mut(parent)?.set("position", "relative");
        }

        let capture = doc.create_element("div");
        doc.set_style(capture, InlineStyle::parse(CAPTURE_CSS))?;
        doc.set_attr(capture, ROLE_ATTR, "capture")?;
        doc.append_child(parent, capture)?;

        let label = FeedbackLabel::install(doc, parent, LABEL_CSS, FeedbackSlot::Primary)?;

        let control = doc.create_element("div");
        doc.set_style(control, InlineStyle::parse(CONTROL_CSS))?;
        doc.set_attr(control, ROLE_ATTR, "control")?;
        doc.set_inner_markup(control, ControlIcon::Enter.markup())?;
        doc.append_child(parent, control)?;

        debug!("overlay installed for {:?}: capture={:?} control={:?}", surface, capture, control);
        Ok(OverlayWidgets { capture, label, control })
    }

    pub fn capture(&self) -> NodeId {
        self.capture
    }

    pub fn control(&self) -> NodeId {
        self.control
    }

    pub fn label(&self) -> &FeedbackLabel {
        &self.label
    }

    pub fn label_mut(&mut self) -> &mut FeedbackLabel {
        &mut self.label
    }

    pub fn show_feedback(&self, doc: &mut Document, text: &str) {
        self.label.show(doc, text);
    }

    pub fn hide_feedback(&self, doc: &mut Document) {
        self.label.hide(doc);
    }

    pub fn set_control_icon(&self, doc: &mut Document, icon: ControlIcon) {
        let _ = doc.set_inner_markup(self.control, icon.markup());
    }

    pub fn set_control_hover(&self, doc: &mut Document, hovered: bool) {
        if let Ok(style) = doc.style_mut(self.control) {
            style.set("background-color", if hovered { CONTROL_HOVER_BG } else { CONTROL_IDLE_BG });
        }
    }

    pub fn remove(self, doc: &mut Document, timers: &mut TimerQueue) {
        doc.release(self.capture);
        doc.release(self.control);
        self.label.remove(doc, timers);
    }
}
