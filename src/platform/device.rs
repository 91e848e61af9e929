//! Device emulation primitives used for viewport correction

use crate::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMetrics {
    pub width: u32,
    pub height: u32,
    pub dpr: f32,
    pub touch: bool,
}

impl DeviceMetrics {
    /// One percent of the viewport height in CSS pixels, the value behind the
    /// `--vh` custom property.
    pub fn vh_unit(&self) -> f64 {
        self.height as f64 / 100.0
    }
}

impl From<Viewport> for DeviceMetrics {
    fn from(v: Viewport) -> Self {
        DeviceMetrics {
            width: v.width,
            height: v.height,
            dpr: 3.0,
            touch: true,
        }
    }
}

pub trait DeviceEmulation {
    fn set_metrics(&mut self, m: DeviceMetrics);
    fn metrics(&self) -> DeviceMetrics;

    /// Swap width and height, as an orientation change does.
    fn rotate(&mut self) {
        let mut m = self.metrics();
        std::mem::swap(&mut m.width, &mut m.height);
        self.set_metrics(m);
    }
}

/// Emulated device that simply stores its metrics
pub struct EmulatedDevice {
    metrics: DeviceMetrics,
}

impl EmulatedDevice {
    pub fn new(viewport: Viewport) -> Self {
        EmulatedDevice {
            metrics: viewport.into(),
        }
    }
}

impl Default for EmulatedDevice {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl DeviceEmulation for EmulatedDevice {
    fn set_metrics(&mut self, m: DeviceMetrics) {
        self.metrics = m;
    }

    fn metrics(&self) -> DeviceMetrics {
        self.metrics.clone()
    }
}
