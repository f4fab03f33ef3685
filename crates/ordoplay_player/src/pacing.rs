// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wall-clock frame pacing.
//!
//! Ticks arrive at the display refresh rate. The pacer decides on which of
//! them the project advances so playback follows the project framerate.
//! Pacing only affects when frames are shown, never what they contain.

/// Default fraction of a frame interval a tick may run late before the
/// pacer gives up on the missed frames
pub const DEFAULT_PACING_TOLERANCE: f64 = 0.99;

/// Fraction of a frame interval a tick may arrive ahead of its frame
const EARLY_WINDOW: f64 = 0.25;

/// Decides which ticks advance the project.
///
/// Steps follow an ideal schedule of one frame interval apart. Ticks are
/// matched against the schedule rather than the previous tick, so jitter in
/// one tick is absorbed by the next one.
#[derive(Debug, Clone)]
pub struct FramePacer {
    tolerance: f64,
    last_step: Option<f64>,
    next_due: Option<f64>,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(DEFAULT_PACING_TOLERANCE)
    }
}

impl FramePacer {
    /// Create a pacer
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            last_step: None,
            next_due: None,
        }
    }

    /// Time between frames, in milliseconds
    pub fn interval(framerate: f64) -> f64 {
        1000.0 / framerate
    }

    /// Whether the tick at `now` (ms) should step. Records `now` when it does.
    pub fn should_step(&mut self, now: f64, framerate: f64) -> bool {
        let interval = Self::interval(framerate);
        let base = match self.next_due {
            None => now,
            Some(due) if now < due - interval * EARLY_WINDOW => return false,
            // Too far behind to catch up, restart the schedule
            Some(due) if now - due >= interval * self.tolerance => now,
            Some(due) => due.min(now),
        };
        self.next_due = Some(base + interval);
        self.last_step = Some(now);
        true
    }

    /// Forget the schedule so the next tick steps immediately
    pub fn reset(&mut self) {
        self.last_step = None;
        self.next_due = None;
    }

    /// Wall time of the last step, in milliseconds
    pub fn last_step(&self) -> Option<f64> {
        self.last_step
    }

    /// Wall time the next frame is due at, in milliseconds
    pub fn next_due(&self) -> Option<f64> {
        self.next_due
    }
}
