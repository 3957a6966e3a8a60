//! Virtual Time
//!
//! All playback arithmetic is expressed in seconds of virtual time, with a
//! fixed duration per frame. Nothing here reads a wall clock; the same
//! frame sequence is produced on every run.

use indexmap::IndexMap;

use crate::log::{self, LogPayload};

/// Tolerance for floating-point comparisons of virtual time.
pub const TIME_EPSILON: f64 = 1e-6;

/// Frames-per-second of the virtual clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate(f64);

impl FrameRate {
    /// Create a frame rate. `fps` must be positive.
    pub fn new(fps: f64) -> Self {
        assert!(fps > 0.0, "frame rate must be positive, got {fps}");
        Self(fps)
    }

    pub fn fps(&self) -> f64 {
        self.0
    }

    /// Seconds of virtual time covered by one frame.
    pub fn frame_step(&self) -> f64 {
        1.0 / self.0
    }

    pub fn frames_to_seconds(&self, frames: u64) -> f64 {
        frames as f64 / self.0
    }

    pub fn seconds_to_frames(&self, seconds: f64) -> u64 {
        (seconds * self.0).round().max(0.0) as u64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(30.0)
    }
}

/// Named timeline events consulted by `wait_until`.
///
/// Each event maps a name to an absolute time offset, in seconds from scene
/// time zero. The storage format of the editor-facing timeline is not this
/// module's concern; this is the runtime lookup only.
#[derive(Debug, Clone, Default)]
pub struct TimeEvents {
    events: IndexMap<String, f64>,
}

impl TimeEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or move an event.
    pub fn set(&mut self, name: impl Into<String>, seconds: f64) {
        self.events.insert(name.into(), seconds);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.events.get(name).copied()
    }

    /// Resolve an event to its time offset.
    ///
    /// An unknown name is a wiring fault: reported to the logger sink and
    /// resolved to zero so the waiting thread proceeds instead of stalling.
    pub fn resolve(&self, name: &str) -> f64 {
        match self.get(name) {
            Some(seconds) => seconds,
            None => {
                log::report(
                    LogPayload::message(format!("unknown time event \"{name}\""))
                        .with_inspect(serde_json::json!({ "event": name })),
                );
                0.0
            }
        }
    }

    /// Registered event names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(|s| s.as_str())
    }
}
