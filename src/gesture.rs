//! Single-pointer gesture recognition: double-tap to toggle playback,
//! horizontal drag to seek.
//!
//! The recogniser knows nothing about rendering. It issues playback commands
//! on the [`MediaControl`] it is handed and reports what the feedback label
//! should do as [`FeedbackEffect`]s; the caller decides which label and
//! schedules the timers.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::platform::MediaControl;
use crate::TakeoverConfig;

pub const MSG_PLAY: &str = "播放";
pub const MSG_PAUSE: &str = "暂停";

pub fn seek_message(seconds: i64) -> String {
    if seconds > 0 {
        format!("快进{}秒", seconds)
    } else {
        format!("快退{}秒", -seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// One sample of the pointer stream. `x` is the tracked contact's client X;
/// `contacts` is how many contacts are active on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    #[serde(default = "one_contact")]
    pub contacts: u32,
}

fn one_contact() -> u32 {
    1
}

impl PointerEvent {
    pub fn down(x: f64) -> Self {
        PointerEvent { kind: PointerKind::Down, x, contacts: 1 }
    }

    pub fn moved(x: f64) -> Self {
        PointerEvent { kind: PointerKind::Move, x, contacts: 1 }
    }

    pub fn up(x: f64) -> Self {
        PointerEvent { kind: PointerKind::Up, x, contacts: 0 }
    }

    pub fn with_contacts(mut self, contacts: u32) -> Self {
        self.contacts = contacts;
        self
    }
}

/// What the feedback label should do in response to a pointer sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEffect {
    Show(String),
    Hide,
    HideAfter(u64),
}

/// Classification of a pointer sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Nothing to do: ignored input or a session still in progress.
    Noop,
    /// First tap of a potential double-tap.
    Tap,
    /// Double-tap toggled playback; `playing` is the new state.
    Toggle { playing: bool },
    /// Drag in progress; 0 means below the seek threshold.
    Drag { pending_seconds: i64 },
    /// Drag released with a pending seek.
    Seek { seconds: i64, position: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureOutcome {
    pub gesture: Gesture,
    pub effects: Vec<FeedbackEffect>,
}

impl GestureOutcome {
    fn noop() -> Self {
        GestureOutcome { gesture: Gesture::Noop, effects: Vec::new() }
    }
}

/// Tunables, usually taken from [`TakeoverConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSettings {
    pub double_tap_window_ms: u64,
    pub seek_threshold_px: f64,
    pub seek_seconds_per_step: f64,
    pub feedback_hide_ms: u64,
}

impl From<&TakeoverConfig> for GestureSettings {
    fn from(cfg: &TakeoverConfig) -> Self {
        GestureSettings {
            double_tap_window_ms: cfg.double_tap_window_ms,
            seek_threshold_px: cfg.seek_threshold_px,
            seek_seconds_per_step: cfg.seek_seconds_per_step,
            feedback_hide_ms: cfg.feedback_hide_ms,
        }
    }
}

impl Default for GestureSettings {
    fn default() -> Self {
        (&TakeoverConfig::default()).into()
    }
}

/// Round half toward positive infinity, as the page's `Math.round` does.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Seconds of seek for a horizontal displacement, or `None` when the drag
/// has not crossed the threshold.
pub fn seek_seconds(dx: f64, threshold_px: f64, seconds_per_step: f64) -> Option<i64> {
    if dx.abs() <= threshold_px {
        return None;
    }
    let seconds = round_half_up(dx / threshold_px * seconds_per_step) as i64;
    (seconds != 0).then_some(seconds)
}

/// `current + delta` clamped to `[0, duration]`. An unknown (NaN) duration
/// leaves the upper end open.
pub fn clamp_position(current: f64, delta: f64, duration: f64) -> f64 {
    let current = if current.is_nan() { 0.0 } else { current };
    let mut target = (current + delta).max(0.0);
    if !duration.is_nan() {
        target = target.min(duration);
    }
    target
}

/// State tracked from pointer-down to pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    pub start_x: f64,
    pub has_moved: bool,
    pub pending_seek_seconds: i64,
}

impl GestureSession {
    fn start(x: f64) -> Self {
        GestureSession {
            start_x: x,
            has_moved: false,
            pending_seek_seconds: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    settings: GestureSettings,
    last_tap_ms: Option<u64>,
    session: Option<GestureSession>,
}

impl GestureRecognizer {
    pub fn new(settings: GestureSettings) -> Self {
        GestureRecognizer {
            settings,
            last_tap_ms: None,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn last_tap_ms(&self) -> Option<u64> {
        self.last_tap_ms
    }

    /// Feed one pointer sample taken at `now_ms`.
    pub fn handle(&mut self, ev: &PointerEvent, now_ms: u64, media: &mut dyn MediaControl) -> GestureOutcome {
        match ev.kind {
            PointerKind::Down => {
                if ev.contacts == 1 {
                    self.session = Some(GestureSession::start(ev.x));
                }
                GestureOutcome::noop()
            }
            PointerKind::Move => self.on_move(ev.x),
            PointerKind::Up => self.on_up(now_ms, media),
        }
    }

    fn on_move(&mut self, x: f64) -> GestureOutcome {
        let settings = self.settings;
        let Some(session) = self.session.as_mut() else {
            return GestureOutcome::noop();
        };
        session.has_moved = true;
        let dx = x - session.start_x;
        match seek_seconds(dx, settings.seek_threshold_px, settings.seek_seconds_per_step) {
            Some(seconds) => {
                session.pending_seek_seconds = seconds;
                GestureOutcome {
                    gesture: Gesture::Drag { pending_seconds: seconds },
                    effects: vec![FeedbackEffect::Show(seek_message(seconds))],
                }
            }
            None => {
                session.pending_seek_seconds = 0;
                GestureOutcome {
                    gesture: Gesture::Drag { pending_seconds: 0 },
                    effects: vec![FeedbackEffect::Hide],
                }
            }
        }
    }

    fn on_up(&mut self, now_ms: u64, media: &mut dyn MediaControl) -> GestureOutcome {
        let Some(session) = self.session.take() else {
            return GestureOutcome::noop();
        };

        if session.has_moved {
            self.last_tap_ms = None;
            if session.pending_seek_seconds == 0 {
                return GestureOutcome {
                    gesture: Gesture::Noop,
                    effects: vec![FeedbackEffect::Hide],
                };
            }
            let seconds = session.pending_seek_seconds;
            let position = clamp_position(media.current_time(), seconds as f64, media.duration());
            media.set_current_time(position);
            debug!("gesture: seek {}s -> {}", seconds, position);
            return GestureOutcome {
                gesture: Gesture::Seek { seconds, position },
                effects: vec![FeedbackEffect::Hide],
            };
        }

        match self.last_tap_ms {
            Some(prev) if now_ms.saturating_sub(prev) < self.settings.double_tap_window_ms => {
                self.last_tap_ms = None;
                let playing = if media.is_paused() {
                    media.play();
                    true
                } else {
                    media.pause();
                    false
                };
                debug!("gesture: double tap, playing={}", playing);
                GestureOutcome {
                    gesture: Gesture::Toggle { playing },
                    effects: vec![
                        FeedbackEffect::Show(if playing { MSG_PLAY } else { MSG_PAUSE }.to_string()),
                        FeedbackEffect::HideAfter(self.settings.feedback_hide_ms),
                    ],
                }
            }
            _ => {
                self.last_tap_ms = Some(now_ms);
                GestureOutcome {
                    gesture: Gesture::Tap,
                    effects: Vec::new(),
                }
            }
        }
    }
}
