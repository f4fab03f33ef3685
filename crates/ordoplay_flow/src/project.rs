// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project contract consumed by players, and the scene-backed project.

use crate::clock::{FrameClock, DEFAULT_FRAMERATE};
use crate::error::FlowResult;
use crate::logger::Logger;
use crate::playback::{PlaybackConfig, PlaybackManager, PlaybackStatus};
use crate::scene::Scene;
use crate::thread::Routine;
use crate::time_events::TimeEvents;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Default output width in pixels
pub const DEFAULT_WIDTH: f64 = 1920.0;

/// Default output height in pixels
pub const DEFAULT_HEIGHT: f64 = 1080.0;

/// Unique identifier for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    /// Create a new random project ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Output size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a size
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// What a render sink is asked to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// Frame being rendered
    pub frame: u32,
    /// Time of the frame in seconds
    pub time: f64,
    /// Logical output size
    pub size: Size,
    /// Multiplier applied to the logical size
    pub resolution_scale: f64,
}

impl RenderRequest {
    /// Output size in physical pixels
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.size.width * self.resolution_scale).round().max(0.0) as u32,
            (self.size.height * self.resolution_scale).round().max(0.0) as u32,
        )
    }
}

/// Render target a project draws into once a frame is settled
pub trait RenderSink: Send + Sync {
    /// Draw the current state of the scene
    fn render(&self, request: &RenderRequest) -> FlowResult<()>;
}

/// Contract between a player and an animation project
pub trait Project: Send {
    /// Current frame
    fn frame(&self) -> u32;

    /// Frames per second
    fn framerate(&self) -> f64;

    /// Change the framerate. Takes effect from the next recalculation.
    fn set_framerate(&mut self, framerate: f64) -> FlowResult<()>;

    /// Convert seconds to frames
    fn seconds_to_frames(&self, seconds: f64) -> u32;

    /// Measure the timeline and rewind to frame 0
    fn recalculate(&mut self) -> FlowResult<()>;

    /// Move to `frame`
    fn seek(&mut self, frame: u32) -> FlowResult<()>;

    /// Advance one frame; `true` once the last frame was reached
    fn next(&mut self) -> FlowResult<bool>;

    /// Render the settled state of the current frame
    fn render(&mut self) -> FlowResult<()>;

    /// Logical output size
    fn size(&self) -> Size;

    /// Change the logical output size
    fn set_size(&mut self, width: f64, height: f64);

    /// Multiplier applied to the output size
    fn resolution_scale(&self) -> f64;

    /// Change the resolution multiplier
    fn set_resolution_scale(&mut self, scale: f64);

    /// Where rendered frames go
    fn set_render_sink(&mut self, sink: Arc<dyn RenderSink>);

    /// Project logger
    fn logger(&self) -> &Logger;

    /// Whether the timeline was edited since the last recalculation
    fn timeline_changed(&self) -> bool {
        false
    }
}

/// Project running a single scene through a [`PlaybackManager`]
pub struct AnimationProject {
    /// Unique project ID
    pub id: ProjectId,
    /// Project name
    pub name: String,
    playback: PlaybackManager,
    clock: FrameClock,
    logger: Logger,
    size: Size,
    resolution_scale: f64,
    sink: Option<Arc<dyn RenderSink>>,
}

impl AnimationProject {
    /// Create a project whose timeline is the `entry` routine
    pub fn new(name: impl Into<String>, entry: Routine) -> FlowResult<Self> {
        Self::with_config(name, entry, DEFAULT_FRAMERATE, PlaybackConfig::default())
    }

    /// Create a project with an explicit framerate and playback config
    pub fn with_config(
        name: impl Into<String>,
        entry: Routine,
        framerate: f64,
        config: PlaybackConfig,
    ) -> FlowResult<Self> {
        let name = name.into();
        let clock = FrameClock::new(framerate)?;
        let logger = Logger::new();
        let scene = Scene::new(name.clone(), entry, clock.clone(), logger.clone());
        Ok(Self {
            id: ProjectId::new(),
            name,
            playback: PlaybackManager::new(scene, config),
            clock,
            logger,
            size: Size::default(),
            resolution_scale: 1.0,
            sink: None,
        })
    }

    /// Set the initial output size
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Size::new(width, height);
        self
    }

    /// The playback manager
    pub fn playback(&self) -> &PlaybackManager {
        &self.playback
    }

    /// Mutable access to the playback manager
    pub fn playback_mut(&mut self) -> &mut PlaybackManager {
        &mut self.playback
    }

    /// Editable time events of the scene, for timeline tools
    pub fn time_events(&self) -> Option<Arc<TimeEvents>> {
        self.playback.scene().editable_time_events().cloned()
    }

    /// Playback status
    pub fn status(&self) -> PlaybackStatus {
        self.playback.status()
    }

    /// Timeline length in frames, if measured
    pub fn duration(&self) -> Option<u32> {
        self.playback.duration()
    }
}

impl Project for AnimationProject {
    fn frame(&self) -> u32 {
        self.clock.frame()
    }

    fn framerate(&self) -> f64 {
        self.clock.framerate()
    }

    fn set_framerate(&mut self, framerate: f64) -> FlowResult<()> {
        self.clock.set_framerate(framerate)
    }

    fn seconds_to_frames(&self, seconds: f64) -> u32 {
        self.clock.seconds_to_frames(seconds)
    }

    fn recalculate(&mut self) -> FlowResult<()> {
        self.playback.recalculate().map(|_| ())
    }

    fn seek(&mut self, frame: u32) -> FlowResult<()> {
        self.playback.seek(frame)
    }

    fn next(&mut self) -> FlowResult<bool> {
        self.playback.next()
    }

    fn render(&mut self) -> FlowResult<()> {
        let Some(sink) = &self.sink else {
            tracing::trace!(project = %self.name, "No render sink attached");
            return Ok(());
        };
        let request = RenderRequest {
            frame: self.clock.frame(),
            time: self.clock.time(),
            size: self.size,
            resolution_scale: self.resolution_scale,
        };
        sink.render(&request)
    }

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    fn resolution_scale(&self) -> f64 {
        self.resolution_scale
    }

    fn set_resolution_scale(&mut self, scale: f64) {
        self.resolution_scale = scale;
    }

    fn set_render_sink(&mut self, sink: Arc<dyn RenderSink>) {
        self.sink = Some(sink);
    }

    fn logger(&self) -> &Logger {
        &self.logger
    }

    fn timeline_changed(&self) -> bool {
        self.playback.timeline_changed()
    }
}

impl std::fmt::Debug for AnimationProject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationProject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("frame", &self.clock.frame())
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
