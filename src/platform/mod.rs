//! Host platform surface: media control, device emulation, native fullscreen
//!
//! This module contains the public types and traits the takeover core uses to
//! talk to its host, plus deterministic in-memory emulations used by the
//! headless runtime, the CLI and the test-suite.

pub mod device;
pub mod fullscreen;
pub mod media;

pub use device::{DeviceEmulation, DeviceMetrics, EmulatedDevice};
pub use fullscreen::{negotiate, EmulatedFullscreen, FullscreenBackend, EXIT_ENTRIES, REQUEST_ENTRIES};
pub use media::{MediaControl, MediaState};

use crate::Viewport;

/// A small composite trait hosts implement to expose platform primitives in
/// a typed way.
pub trait PlatformApi {
    fn device(&self) -> &dyn DeviceEmulation;
    fn device_mut(&mut self) -> &mut dyn DeviceEmulation;
    fn fullscreen(&mut self) -> &mut dyn FullscreenBackend;
}

/// Headless platform: an emulated device plus emulated native fullscreen.
pub struct HeadlessPlatform {
    device: EmulatedDevice,
    fullscreen: EmulatedFullscreen,
}

impl HeadlessPlatform {
    pub fn new(viewport: Viewport) -> Self {
        HeadlessPlatform {
            device: EmulatedDevice::new(viewport),
            fullscreen: EmulatedFullscreen::new(),
        }
    }

    pub fn with_fullscreen(mut self, fullscreen: EmulatedFullscreen) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Inspect the emulated native fullscreen state.
    pub fn native_fullscreen(&self) -> &EmulatedFullscreen {
        &self.fullscreen
    }

    pub fn native_fullscreen_mut(&mut self) -> &mut EmulatedFullscreen {
        &mut self.fullscreen
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl PlatformApi for HeadlessPlatform {
    fn device(&self) -> &dyn DeviceEmulation {
        &self.device
    }

    fn device_mut(&mut self) -> &mut dyn DeviceEmulation {
        &mut self.device
    }

    fn fullscreen(&mut self) -> &mut dyn FullscreenBackend {
        &mut self.fullscreen
    }
}
