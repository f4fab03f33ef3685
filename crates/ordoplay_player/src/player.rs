// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player driver.
//!
//! A [`Player`] owns at most one project. Hosts feed it attribute changes
//! and display ticks; it loads sources, paces playback to the project
//! framerate and hands settled frames to the render sink.
//!
//! Loads are asynchronous. Every load gets an abort handle and starting a
//! new one aborts the previous load. The load sequence re-checks its handle
//! after each await, so a superseded load never touches the player or
//! configures its stale project.

use crate::attributes::{AttributeChange, PlayerAttributes};
use crate::config::PlayerConfig;
use crate::error::{LoadError, PlayerError, PlayerResult};
use crate::loader::SourceLoader;
use crate::pacing::FramePacer;
use crate::state::PlayerState;
use futures::future::{self, AbortHandle, Abortable, Aborted, BoxFuture, FutureExt};
use ordoplay_flow::{FlowResult, LogCallback, LogPayload, Project, RenderSink, Size};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Result of a display tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing
    Idle,
    /// Too early for the next frame
    Waiting,
    /// The project advanced and rendered `frame`
    Stepped {
        /// Frame that was rendered
        frame: u32,
        /// Whether it was the last frame
        finished: bool,
    },
    /// Stepping failed and the player entered [`PlayerState::Error`]
    Failed,
}

struct PlayerInner {
    state: PlayerState,
    project: Option<Box<dyn Project>>,
    attributes: PlayerAttributes,
    /// Size of the loaded project, used when no attribute overrides it
    default_size: Size,
    playing: bool,
    finished: bool,
    pacer: FramePacer,
    load: Option<AbortHandle>,
    sink: Option<Arc<dyn RenderSink>>,
    last_error: Option<String>,
}

impl PlayerInner {
    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            if !self.state.can_transition_to(state) {
                tracing::warn!(from = %self.state, to = %state, "Illegal player state transition refused");
                return;
            }
            tracing::debug!(from = %self.state, to = %state, "Player state changed");
        }
        self.state = state;
        let playing = self.playing;
        self.set_playing(playing);
    }

    fn set_playing(&mut self, value: bool) {
        let playing = self.state.is_ready() && (value || self.attributes.auto);
        if playing && !self.playing {
            self.pacer.reset();
            tracing::info!("Playback started");
        } else if !playing && self.playing {
            tracing::info!("Playback paused");
        }
        self.playing = playing;
    }

    fn should_play(&self) -> bool {
        self.state.is_ready() && self.playing
    }

    fn fail(&mut self, error: &PlayerError) {
        tracing::error!("Player error: {error}");
        self.last_error = Some(error.to_string());
        self.set_state(PlayerState::Error);
    }

    fn output_size(&self) -> (f64, f64) {
        (
            self.attributes.width.unwrap_or(self.default_size.width),
            self.attributes.height.unwrap_or(self.default_size.height),
        )
    }

    fn run(&mut self) -> FlowResult<TickOutcome> {
        let Some(project) = self.project.as_mut() else {
            return Ok(TickOutcome::Idle);
        };
        if project.timeline_changed() {
            let frame = project.frame();
            tracing::debug!(frame, "Timeline edited, recalculating");
            project.recalculate()?;
            project.seek(frame)?;
            self.finished = false;
        }
        if self.finished {
            project.seek(0)?;
        }
        let finished = project.next()?;
        self.finished = finished;
        project.render()?;
        Ok(TickOutcome::Stepped {
            frame: project.frame(),
            finished,
        })
    }
}

/// Animation player.
///
/// Cheap to clone; clones drive the same player.
#[derive(Clone)]
pub struct Player {
    inner: Arc<Mutex<PlayerInner>>,
    loader: Arc<dyn SourceLoader>,
    config: Arc<PlayerConfig>,
    listeners: Arc<RwLock<Vec<LogCallback>>>,
}

impl Player {
    /// Create a player in the [`PlayerState::Initial`] state
    pub fn new(loader: Arc<dyn SourceLoader>, config: PlayerConfig) -> Self {
        let attributes = PlayerAttributes {
            quality: config.quality,
            auto: config.auto,
            ..PlayerAttributes::default()
        };
        let inner = PlayerInner {
            state: PlayerState::Initial,
            project: None,
            attributes,
            default_size: Size::new(config.default_width, config.default_height),
            playing: false,
            finished: false,
            pacer: FramePacer::new(config.pacing_tolerance),
            load: None,
            sink: None,
            last_error: None,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            loader,
            config: Arc::new(config),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Player configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Lifecycle state
    pub fn state(&self) -> PlayerState {
        self.inner.lock().state
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    /// Whether the last step reached the end of the timeline
    pub fn is_finished(&self) -> bool {
        self.inner.lock().finished
    }

    /// Current frame of the loaded project
    pub fn frame(&self) -> Option<u32> {
        self.inner.lock().project.as_ref().map(|project| project.frame())
    }

    /// Current attribute values
    pub fn attributes(&self) -> PlayerAttributes {
        self.inner.lock().attributes.clone()
    }

    /// Message of the error that put the player in [`PlayerState::Error`]
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    /// The error that put the player in [`PlayerState::Error`], if any
    pub fn error(&self) -> Option<PlayerError> {
        self.last_error().map(PlayerError::Stopped)
    }

    /// Set where frames are rendered, for the current and future projects
    pub fn set_render_sink(&self, sink: Arc<dyn RenderSink>) {
        let mut inner = self.inner.lock();
        if let Some(project) = inner.project.as_mut() {
            project.set_render_sink(Arc::clone(&sink));
        }
        inner.sink = Some(sink);
    }

    /// Receive messages logged by every project this player loads
    pub fn on_project_log(&self, callback: impl Fn(&LogPayload) + Send + Sync + 'static) {
        self.listeners.write().push(Arc::new(callback));
    }

    /// React to an attribute change.
    ///
    /// Returns the load future when the change starts loading a new source.
    /// The host must drive it to completion; dropping it cancels the load.
    pub fn attribute_changed(&self, name: &str, value: Option<&str>) -> Option<BoxFuture<'static, PlayerResult<()>>> {
        let change = AttributeChange::parse(name, value)?;
        tracing::debug!(attribute = name, ?value, "Attribute changed");

        let mut inner = self.inner.lock();
        inner.attributes.apply(&change);
        match change {
            AttributeChange::Source(src) => {
                drop(inner);
                return Some(self.load_source(src));
            }
            AttributeChange::Quality(quality) => {
                if let Some(project) = inner.project.as_mut() {
                    project.set_resolution_scale(quality);
                }
            }
            AttributeChange::Width(_) | AttributeChange::Height(_) => {
                let (width, height) = inner.output_size();
                if let Some(project) = inner.project.as_mut() {
                    project.set_size(width, height);
                }
            }
            AttributeChange::Auto(_) => inner.set_playing(true),
        }
        None
    }

    /// Start loading `src`, aborting any load in flight.
    ///
    /// The future resolves to `Err(LoadError::Aborted)` when a newer load
    /// superseded this one.
    pub fn load_source(&self, src: Option<String>) -> BoxFuture<'static, PlayerResult<()>> {
        let (handle, registration) = AbortHandle::new_pair();
        {
            let mut inner = self.inner.lock();
            if let Some(previous) = inner.load.replace(handle.clone()) {
                previous.abort();
            }
            inner.set_state(PlayerState::Loading);
        }

        let Some(src) = src else {
            let error = self.fail_load(&handle, LoadError::NotFound(String::new()));
            return future::ready(Err(error)).boxed();
        };

        tracing::info!(src = %src, "Loading project");
        let loading = Abortable::new(self.loader.load(&src), registration);
        let player = self.clone();
        async move {
            let outcome = match loading.await {
                Ok(loaded) => player
                    .prepare(loaded, &handle)
                    .and_then(|project| player.install(project, &handle, &src)),
                Err(Aborted) => Err(LoadError::Aborted),
            };
            match outcome {
                Ok(()) => Ok(()),
                Err(LoadError::Aborted) => {
                    tracing::debug!(src = %src, "Load aborted");
                    Err(PlayerError::Load(LoadError::Aborted))
                }
                Err(error) => Err(player.fail_load(&handle, error)),
            }
        }
        .boxed()
    }

    /// Configure a freshly loaded project, checking for a newer load after
    /// every step that may take time
    fn prepare(
        &self,
        loaded: Result<Box<dyn Project>, LoadError>,
        handle: &AbortHandle,
    ) -> Result<Box<dyn Project>, LoadError> {
        ensure_current(handle)?;
        let mut project = loaded?;

        project.set_framerate(self.config.framerate)?;
        project.recalculate()?;
        ensure_current(handle)?;

        project.seek(0)?;
        ensure_current(handle)?;
        Ok(project)
    }

    fn fail_load(&self, handle: &AbortHandle, error: LoadError) -> PlayerError {
        let mut inner = self.inner.lock();
        if handle.is_aborted() {
            return PlayerError::Load(LoadError::Aborted);
        }
        inner.load = None;
        let error = PlayerError::Load(error);
        inner.fail(&error);
        error
    }

    fn install(&self, mut project: Box<dyn Project>, handle: &AbortHandle, src: &str) -> Result<(), LoadError> {
        let mut inner = self.inner.lock();
        // A newer load may have started while this one finished
        ensure_current(handle)?;

        inner.default_size = project.size();
        inner.finished = false;
        project.set_resolution_scale(inner.attributes.quality);
        let (width, height) = inner.output_size();
        project.set_size(width, height);

        let listeners = Arc::clone(&self.listeners);
        project.logger().on_logged(move |payload| {
            let callbacks: Vec<LogCallback> = listeners.read().clone();
            for callback in callbacks {
                callback(payload);
            }
        });
        if let Some(sink) = &inner.sink {
            project.set_render_sink(Arc::clone(sink));
        }

        inner.project = Some(project);
        inner.load = None;
        inner.last_error = None;
        inner.set_state(PlayerState::Ready);
        tracing::info!(src, width, height, "Project ready");
        Ok(())
    }

    /// Start or stop playback. Never moves the frame.
    pub fn set_playing(&self, value: bool) {
        self.inner.lock().set_playing(value);
    }

    /// Flip playback
    pub fn toggle_playing(&self) {
        let mut inner = self.inner.lock();
        let playing = !inner.playing;
        inner.set_playing(playing);
    }

    /// Move the loaded project to `frame` and render it
    pub fn seek(&self, frame: u32) -> PlayerResult<()> {
        let mut inner = self.inner.lock();
        if !inner.state.is_ready() {
            return Err(PlayerError::NotReady);
        }
        let result = match inner.project.as_mut() {
            Some(project) => project.seek(frame).and_then(|()| project.render()),
            None => return Err(PlayerError::NotReady),
        };
        match result {
            Ok(()) => {
                inner.finished = false;
                Ok(())
            }
            Err(error) => {
                let error = PlayerError::Step(error);
                inner.fail(&error);
                Err(error)
            }
        }
    }

    /// Whether the host should keep delivering ticks
    pub fn wants_frame(&self) -> bool {
        self.inner.lock().should_play()
    }

    /// Handle a display tick at wall time `now`, in milliseconds
    pub fn tick(&self, now: f64) -> TickOutcome {
        let mut inner = self.inner.lock();
        if !inner.should_play() {
            return TickOutcome::Idle;
        }
        let Some(framerate) = inner.project.as_ref().map(|project| project.framerate()) else {
            return TickOutcome::Idle;
        };
        if !inner.pacer.should_step(now, framerate) {
            return TickOutcome::Waiting;
        }
        match inner.run() {
            Ok(outcome) => {
                if let TickOutcome::Stepped { frame, finished } = outcome {
                    tracing::trace!(frame, finished, "Stepped");
                }
                outcome
            }
            Err(error) => {
                inner.fail(&PlayerError::Step(error));
                TickOutcome::Failed
            }
        }
    }

    /// The host stopped showing the player
    pub fn detach(&self) {
        let mut inner = self.inner.lock();
        // Stops even while `auto` is set; a detached player has nobody watching
        if inner.playing {
            inner.playing = false;
            tracing::info!("Player detached, playback stopped");
        }
    }
}

fn ensure_current(handle: &AbortHandle) -> Result<(), LoadError> {
    if handle.is_aborted() {
        Err(LoadError::Aborted)
    } else {
        Ok(())
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Player")
            .field("state", &inner.state)
            .field("playing", &inner.playing)
            .field("attributes", &inner.attributes)
            .finish_non_exhaustive()
    }
}
