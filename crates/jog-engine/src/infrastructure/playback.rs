//! Simulated playback sink.
//!
//! Stands in for the adapter around the real playback framework: it models a
//! transport that advances with wall-clock time at the current rate, clamped
//! to the media bounds.  Production builds replace it with the framework
//! adapter; tests use their own recording sinks.

use std::time::Instant;

use tracing::debug;

use crate::application::session::PlaybackSink;

/// A clock-driven stand-in for the playback framework.
pub struct SimulatedPlayback {
    rate: f64,
    frame_rate: f64,
    duration: i64,
    /// Position at the moment of the last rate change or seek.
    anchor: i64,
    anchor_at: Instant,
}

impl SimulatedPlayback {
    /// Creates a playing transport (autoplay) over `duration` frames.
    pub fn new(duration: i64, frame_rate: f64) -> Self {
        Self {
            rate: 1.0,
            frame_rate,
            duration,
            anchor: 0,
            anchor_at: Instant::now(),
        }
    }

    fn current(&self) -> i64 {
        let advanced = self.anchor_at.elapsed().as_secs_f64() * self.rate * self.frame_rate;
        (self.anchor + advanced as i64).clamp(0, self.duration)
    }
}

impl PlaybackSink for SimulatedPlayback {
    fn set_rate(&mut self, rate: f64) {
        self.anchor = self.current();
        self.anchor_at = Instant::now();
        self.rate = rate;
    }

    fn seek(&mut self, position: i64) {
        self.anchor = position.clamp(0, self.duration);
        self.anchor_at = Instant::now();
        debug!(position = self.anchor, "seek");
    }

    fn flush(&mut self) {
        // Nothing buffered ahead in the simulation.
    }

    fn request_refresh(&mut self) {}

    fn position(&self) -> Option<i64> {
        Some(self.current())
    }

    fn duration(&self) -> Option<i64> {
        Some(self.duration)
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(self.frame_rate)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
