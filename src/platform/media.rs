//! Media control surface consumed by the gesture recogniser

/// Playback commands and queries on a controlled media element.
///
/// `duration` is NaN until metadata has loaded, like `HTMLMediaElement`.
pub trait MediaControl {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn duration(&self) -> f64;
}

/// In-memory playback state. `<video>` elements in the page model carry one
/// of these; tests can also drive a standalone instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaState {
    pub paused: bool,
    pub current_time: f64,
    pub duration: f64,
}

impl MediaState {
    pub fn new() -> Self {
        MediaState {
            paused: true,
            current_time: 0.0,
            duration: f64::NAN,
        }
    }

    /// A paused element with metadata already loaded.
    pub fn with_duration(duration: f64) -> Self {
        MediaState {
            duration,
            ..Self::new()
        }
    }

    pub fn has_metadata(&self) -> bool {
        !self.duration.is_nan()
    }
}

impl Default for MediaState {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaControl for MediaState {
    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds;
    }

    fn duration(&self) -> f64 {
        self.duration
    }
}
