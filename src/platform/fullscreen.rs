//! Native fullscreen as an optional, best-effort capability.
//!
//! Vendor-prefixed entry points are expressed as capability tables: ordered
//! entry names that a [`FullscreenBackend`] can check and invoke. Negotiation
//! walks a table in order, invokes the first entry the host has, and never
//! reports failure to the caller.

use log::debug;

use crate::{Error, Result};

/// Request entry points on the document root, in priority order.
pub const REQUEST_ENTRIES: &[&str] = &[
    "requestFullscreen",
    "webkitRequestFullscreen",
    "mozRequestFullScreen",
    "msRequestFullscreen",
];

/// Exit entry points on the document, in priority order.
pub const EXIT_ENTRIES: &[&str] = &[
    "exitFullscreen",
    "webkitExitFullscreen",
    "mozCancelFullScreen",
    "msExitFullscreen",
];

pub trait FullscreenBackend {
    /// Whether the named entry point exists on this host.
    fn supports(&self, entry: &str) -> bool;
    /// Invoke the named entry point. Hosts may reject.
    fn invoke(&mut self, entry: &str) -> Result<()>;
    /// Whether the host currently reports native fullscreen.
    fn is_active(&self) -> bool;
}

/// Invoke the first entry of `table` the backend supports. Later entries are
/// only fallbacks for a missing capability, never for a rejected one. Returns
/// the entry if it succeeded; a rejection is logged and swallowed.
pub fn negotiate(backend: &mut dyn FullscreenBackend, table: &[&'static str]) -> Option<&'static str> {
    let Some(&entry) = table.iter().find(|&&entry| backend.supports(entry)) else {
        debug!("native fullscreen: no entry point available");
        return None;
    };
    match backend.invoke(entry) {
        Ok(()) => {
            debug!("native fullscreen: {} succeeded", entry);
            Some(entry)
        }
        Err(e) => {
            debug!("native fullscreen: {} failed: {}", entry, e);
            None
        }
    }
}

/// Emulated native fullscreen for headless runs and tests.
///
/// Every invocation is recorded; `reject` makes every invocation fail the way
/// a browser rejects a request made outside a user gesture.
#[derive(Debug, Clone)]
pub struct EmulatedFullscreen {
    supported: Vec<String>,
    reject: bool,
    active: bool,
    invocations: Vec<String>,
}

impl EmulatedFullscreen {
    /// Supports the standard, unprefixed entry points.
    pub fn new() -> Self {
        Self::with_entries(&["requestFullscreen", "exitFullscreen"])
    }

    pub fn with_entries(entries: &[&str]) -> Self {
        EmulatedFullscreen {
            supported: entries.iter().map(|e| e.to_string()).collect(),
            reject: false,
            active: false,
            invocations: Vec::new(),
        }
    }

    /// A host with no native fullscreen at all.
    pub fn unsupported() -> Self {
        Self::with_entries(&[])
    }

    pub fn set_reject(&mut self, reject: bool) {
        self.reject = reject;
    }

    pub fn invocations(&self) -> &[String] {
        &self.invocations
    }
}

impl Default for EmulatedFullscreen {
    fn default() -> Self {
        Self::new()
    }
}

impl FullscreenBackend for EmulatedFullscreen {
    fn supports(&self, entry: &str) -> bool {
        self.supported.iter().any(|e| e == entry)
    }

    fn invoke(&mut self, entry: &str) -> Result<()> {
        self.invocations.push(entry.to_string());
        if self.reject {
            return Err(Error::Platform(format!("{entry} rejected")));
        }
        self.active = REQUEST_ENTRIES.contains(&entry);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
