// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logical frame clock shared between playback and running threads.

use crate::error::{FlowError, FlowResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Default framerate for new projects
pub const DEFAULT_FRAMERATE: f64 = 30.0;

/// Tolerance for float noise when converting seconds to frames
/// (`0.1 * 30.0` must be 3 frames, not 4).
const FRAME_EPSILON: f64 = 1e-9;

struct ClockState {
    frame: AtomicU32,
    framerate: RwLock<f64>,
}

/// The single source of logical time.
///
/// Cloning yields another handle to the same clock. Threads only read it;
/// the playback manager is the only writer.
#[derive(Clone)]
pub struct FrameClock {
    state: Arc<ClockState>,
}

impl FrameClock {
    /// Create a clock at frame 0
    pub fn new(framerate: f64) -> FlowResult<Self> {
        validate_framerate(framerate)?;
        Ok(Self {
            state: Arc::new(ClockState {
                frame: AtomicU32::new(0),
                framerate: RwLock::new(framerate),
            }),
        })
    }

    /// Current frame
    pub fn frame(&self) -> u32 {
        self.state.frame.load(Ordering::Acquire)
    }

    pub(crate) fn set_frame(&self, frame: u32) {
        self.state.frame.store(frame, Ordering::Release);
    }

    pub(crate) fn advance(&self) -> u32 {
        self.state.frame.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Frames per second
    pub fn framerate(&self) -> f64 {
        *self.state.framerate.read()
    }

    /// Change the framerate. Only valid between runs; threads capture
    /// their targets once.
    pub fn set_framerate(&self, framerate: f64) -> FlowResult<()> {
        validate_framerate(framerate)?;
        *self.state.framerate.write() = framerate;
        Ok(())
    }

    /// Convert seconds to a whole number of frames, rounding up
    pub fn seconds_to_frames(&self, seconds: f64) -> u32 {
        let frames = (seconds * self.framerate() - FRAME_EPSILON).ceil();
        if frames <= 0.0 {
            0
        } else {
            frames as u32
        }
    }

    /// Convert frames to seconds
    pub fn frames_to_seconds(&self, frames: u32) -> f64 {
        f64::from(frames) / self.framerate()
    }

    /// Current time in seconds
    pub fn time(&self) -> f64 {
        self.frames_to_seconds(self.frame())
    }
}

impl std::fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameClock")
            .field("frame", &self.frame())
            .field("framerate", &self.framerate())
            .finish()
    }
}

fn validate_framerate(framerate: f64) -> FlowResult<()> {
    if framerate.is_finite() && framerate > 0.0 {
        Ok(())
    } else {
        Err(FlowError::InvalidFramerate(framerate))
    }
}
