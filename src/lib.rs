//! RFox Player Takeover
//!
//! An interaction layer for video surfaces embedded in arbitrary pages:
//! touch gestures become playback commands, and a synthetic "fake
//! fullscreen" presentation works even where native fullscreen is missing or
//! fails to hide browser chrome.
//!
//! # Features
//!
//! - **Gestures**: double-tap toggles play/pause, horizontal drag seeks
//!   (2 seconds per 30 px) with live feedback
//! - **Fake fullscreen**: the surface is reparented into a rotated,
//!   full-viewport container; page chrome is hidden and restored exactly
//! - **Host-driven**: no threads and no wall clock; the host feeds events and
//!   advances time, which keeps every run deterministic
//!
//! # Example
//!
//! ```
//! use rftakeover::{PointerEvent, Takeover, TakeoverConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let html = r#"<html><body><div><video data-duration="60"></video></div></body></html>"#;
//! let mut takeover = Takeover::from_html(TakeoverConfig::default(), html)?;
//! assert_eq!(takeover.scan(), 1);
//!
//! let video = takeover.surfaces()[0];
//! let capture = takeover.controller(video).unwrap().widgets().capture();
//! for at in [0, 120] {
//!     takeover.advance_to(at);
//!     takeover.pointer(capture, PointerEvent::down(10.0));
//!     takeover.pointer(capture, PointerEvent::up(10.0));
//! }
//! assert!(!takeover.document().media(video).unwrap().paused);
//! assert_eq!(takeover.feedback(video).unwrap().text, "播放");
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod controller;
pub mod dom;
pub mod fullscreen;
pub mod gesture;
pub mod overlay;
pub mod platform;
pub mod runtime;
pub mod style;
pub mod timers;
pub mod visibility;

pub use controller::SurfaceController;
pub use dom::{Document, NodeId};
pub use fullscreen::{FakeFullscreenManager, FullscreenPhase, StyleSnapshot};
pub use gesture::{GestureRecognizer, PointerEvent, PointerKind};
pub use overlay::{FeedbackSlot, OverlayWidgets};
pub use platform::{HeadlessPlatform, PlatformApi};
pub use runtime::{FeedbackView, Page, Takeover};
pub use visibility::{HiddenElementSet, VisibilityGuard};

/// Configuration for a takeover runtime
///
/// The defaults reproduce the behaviour users of the page-script know:
/// a 250 ms double-tap window, 2 seconds of seek per 30 px of drag, one
/// second of feedback, and viewport correction retried at 100/300/500 ms.
///
/// # Examples
///
/// ```
/// let cfg = rftakeover::TakeoverConfig::default();
/// assert_eq!(cfg.double_tap_window_ms, 250);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeoverConfig {
    /// Two pointer-ups closer than this toggle playback
    pub double_tap_window_ms: u64,
    /// Horizontal displacement a drag must exceed before it seeks; also the
    /// length of one seek step
    pub seek_threshold_px: f64,
    /// Seconds of seek per step
    pub seek_seconds_per_step: f64,
    /// How long transient feedback stays visible
    pub feedback_hide_ms: u64,
    /// Delays after entering fake fullscreen at which viewport correction is
    /// re-applied
    pub viewport_retry_delays_ms: Vec<u64>,
    /// Elements stacked above this z-index are hidden during fake fullscreen
    pub occlusion_z_index_threshold: i64,
    /// Initial device viewport for the headless platform
    pub viewport: Viewport,
}

impl Default for TakeoverConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: 250,
            seek_threshold_px: 30.0,
            seek_seconds_per_step: 2.0,
            feedback_hide_ms: 1000,
            viewport_retry_delays_ms: vec![100, 300, 500],
            occlusion_z_index_threshold: 500,
            viewport: Viewport::default(),
        }
    }
}

impl TakeoverConfig {
    /// Reject settings the state machines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.double_tap_window_ms == 0 {
            return Err(Error::ConfigError("double_tap_window_ms must be > 0".into()));
        }
        if !(self.seek_threshold_px.is_finite() && self.seek_threshold_px > 0.0) {
            return Err(Error::ConfigError("seek_threshold_px must be a positive number".into()));
        }
        if !(self.seek_seconds_per_step.is_finite() && self.seek_seconds_per_step > 0.0) {
            return Err(Error::ConfigError("seek_seconds_per_step must be a positive number".into()));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError("viewport must not be empty".into()));
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 390,
            height: 844,
        }
    }
}
