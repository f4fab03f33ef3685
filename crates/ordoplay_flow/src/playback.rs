// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback manager: steps a scene across frames and seeks by replay.

use crate::error::{FlowError, FlowResult};
use crate::scene::Scene;
use crate::time_events::TimeEventRegistry;
use serde::{Deserialize, Serialize};

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Not advancing on its own
    #[default]
    Stopped,
    /// Advancing on every driven tick
    Playing,
    /// The last frame of the timeline was reached
    Finished,
}

/// How forward seeks are performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeekStrategy {
    /// Step forward from the current frame
    #[default]
    Incremental,
    /// Always replay from frame 0
    Replay,
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Strategy for forward seeks
    pub seek_strategy: SeekStrategy,
    /// Upper bound on the timeline length measured by
    /// [`PlaybackManager::recalculate`]
    pub max_frames: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            seek_strategy: SeekStrategy::Incremental,
            // One hour at 60 fps
            max_frames: 216_000,
        }
    }
}

/// Drives a scene frame by frame
#[derive(Debug)]
pub struct PlaybackManager {
    scene: Scene,
    config: PlaybackConfig,
    status: PlaybackStatus,
    /// Timeline length in frames, known after a recalculation
    duration: Option<u32>,
    /// Whether the current run reached its last frame
    finished: bool,
    /// Whether the current run has been started at all
    started: bool,
    /// Registry revision the duration was measured with
    measured_revision: u64,
}

impl PlaybackManager {
    /// Create a manager for `scene`
    pub fn new(scene: Scene, config: PlaybackConfig) -> Self {
        Self {
            scene,
            config,
            status: PlaybackStatus::Stopped,
            duration: None,
            finished: false,
            started: false,
            measured_revision: 0,
        }
    }

    /// Current frame
    pub fn frame(&self) -> u32 {
        self.scene.clock().frame()
    }

    /// Playback status
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Timeline length in frames, if measured
    pub fn duration(&self) -> Option<u32> {
        self.duration
    }

    /// Whether the current run reached its last frame
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The managed scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the scene. Changing it invalidates the current run.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.started = false;
        self.duration = None;
        &mut self.scene
    }

    /// Playback configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Start playing. Does not move the frame.
    pub fn start(&mut self) {
        if self.status == PlaybackStatus::Stopped {
            self.status = PlaybackStatus::Playing;
        }
    }

    /// Stop playing. Does not move the frame.
    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Stopped;
        }
    }

    /// Whether the manager is playing
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Discard the current run and run frame 0 of a new one
    pub fn reset(&mut self) -> FlowResult<()> {
        self.scene.reset();
        self.started = true;
        self.finished = false;
        if self.status == PlaybackStatus::Finished {
            self.status = PlaybackStatus::Stopped;
        }
        self.scene.advance()?;
        self.update_finished();
        Ok(())
    }

    /// Advance exactly one frame.
    ///
    /// Returns `true` once the last frame of the timeline was reached. Further
    /// calls do nothing and keep returning `true` until a seek rewinds.
    pub fn next(&mut self) -> FlowResult<bool> {
        if !self.started {
            self.reset()?;
        }
        if self.finished {
            return Ok(true);
        }
        let frame = self.scene.clock().advance();
        tracing::trace!(frame, "Advancing frame");
        self.scene.advance()?;
        self.update_finished();
        Ok(self.finished)
    }

    /// Move to `target`.
    ///
    /// Seeking backwards replays the timeline from frame 0; seeking forwards
    /// steps from the current frame unless [`SeekStrategy::Replay`] is
    /// configured. Both yield the same state. The target is clamped to the
    /// measured duration.
    pub fn seek(&mut self, target: u32) -> FlowResult<()> {
        let target = self.duration.map_or(target, |duration| target.min(duration));
        let current = self.frame();
        let replay = !self.started
            || target < current
            || (target > current && self.config.seek_strategy == SeekStrategy::Replay);

        tracing::debug!(from = current, to = target, replay, "Seeking");
        if replay {
            self.reset()?;
        }
        while self.frame() < target && !self.finished {
            self.next()?;
        }
        if !self.finished && self.status == PlaybackStatus::Finished {
            self.status = PlaybackStatus::Stopped;
        }
        Ok(())
    }

    /// Measure the timeline by running it to the end once, then rewind to
    /// frame 0. Returns the duration in frames.
    pub fn recalculate(&mut self) -> FlowResult<u32> {
        let was_playing = self.is_playing();
        self.duration = None;
        self.reset()?;
        while !self.finished {
            if self.frame() >= self.config.max_frames {
                return Err(FlowError::TimelineTooLong(self.config.max_frames));
            }
            self.next()?;
        }
        let duration = self.frame();
        self.duration = Some(duration);
        self.measured_revision = self.scene.time_events().revision();
        self.reset()?;
        if was_playing {
            self.status = PlaybackStatus::Playing;
        }
        tracing::debug!(scene = %self.scene.name, duration, "Timeline recalculated");
        Ok(duration)
    }

    /// Whether time events were edited since the last recalculation
    pub fn timeline_changed(&self) -> bool {
        self.scene.time_events().revision() != self.measured_revision
    }

    fn update_finished(&mut self) {
        let at_end = self
            .duration
            .is_some_and(|duration| self.frame() >= duration);
        self.finished = self.scene.is_finished() || at_end;
        if self.finished {
            self.status = PlaybackStatus::Finished;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;
    use crate::context::SceneContext;
    use crate::logger::Logger;
    use crate::thread::Routine;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Scene whose observable state is a list of (frame, label) entries
    fn recording_scene(framerate: f64, log: Arc<Mutex<Vec<(u32, String)>>>) -> Scene {
        let clock = FrameClock::new(framerate).unwrap();
        let entry = Routine::new("main", move |ctx: SceneContext| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push((ctx.frame(), "start".to_string()));
                ctx.wait_for(2.0).await?;
                log.lock().push((ctx.frame(), "first".to_string()));
                ctx.wait_for(3.0).await?;
                log.lock().push((ctx.frame(), "second".to_string()));
                Ok::<(), FlowError>(())
            }
        });
        Scene::new("recording", entry, clock, Logger::new())
    }

    fn manager(framerate: f64) -> (PlaybackManager, Arc<Mutex<Vec<(u32, String)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scene = recording_scene(framerate, Arc::clone(&log));
        (PlaybackManager::new(scene, PlaybackConfig::default()), log)
    }

    #[test]
    fn test_consecutive_waits_at_60_fps() {
        let (mut playback, log) = manager(60.0);
        playback.reset().unwrap();
        let mut finished = false;
        while !finished {
            finished = playback.next().unwrap();
        }
        assert_eq!(
            *log.lock(),
            vec![
                (0, "start".to_string()),
                (120, "first".to_string()),
                (300, "second".to_string()),
            ]
        );
        assert_eq!(playback.frame(), 300);
        assert_eq!(playback.status(), PlaybackStatus::Finished);
        assert!(playback.next().unwrap());
        assert_eq!(playback.frame(), 300);
    }

    #[test]
    fn test_recalculate_measures_duration() {
        let (mut playback, _) = manager(10.0);
        assert_eq!(playback.recalculate().unwrap(), 50);
        assert_eq!(playback.duration(), Some(50));
        assert_eq!(playback.frame(), 0);
        assert!(!playback.is_finished());
        assert!(!playback.timeline_changed());
    }

    #[test]
    fn test_recalculate_limit() {
        let (mut playback, _) = manager(10.0);
        playback.config.max_frames = 20;
        assert!(matches!(playback.recalculate(), Err(FlowError::TimelineTooLong(20))));
    }

    #[test]
    fn test_seek_backwards_replays() {
        let (mut playback, log) = manager(10.0);
        playback.seek(30).unwrap();
        assert_eq!(playback.frame(), 30);
        playback.seek(5).unwrap();
        assert_eq!(playback.frame(), 5);
        // The second run started over
        let starts = log.lock().iter().filter(|(_, label)| label == "start").count();
        assert_eq!(starts, 2);
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let (mut playback, _) = manager(10.0);
        playback.recalculate().unwrap();
        playback.seek(500).unwrap();
        assert_eq!(playback.frame(), 50);
        assert!(playback.is_finished());

        playback.seek(10).unwrap();
        assert!(!playback.is_finished());
        assert_eq!(playback.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_forward_seek_matches_replay() {
        for target in [0, 1, 19, 20, 21, 49, 50] {
            let (mut stepped, stepped_log) = manager(10.0);
            stepped.reset().unwrap();
            while stepped.frame() < target {
                stepped.next().unwrap();
            }

            let (mut incremental, incremental_log) = manager(10.0);
            incremental.seek(target.min(3)).unwrap();
            incremental.seek(target).unwrap();

            let (mut replayed, replayed_log) = manager(10.0);
            replayed.config.seek_strategy = SeekStrategy::Replay;
            replayed.seek(target + 7).unwrap();
            replayed.seek(target).unwrap();

            let expected: Vec<_> = stepped_log.lock().clone();
            let last_run = |log: &Arc<Mutex<Vec<(u32, String)>>>| {
                let entries = log.lock();
                let start = entries.iter().rposition(|(_, label)| label == "start").unwrap();
                entries[start..].to_vec()
            };
            assert_eq!(last_run(&incremental_log), expected, "incremental seek to {target}");
            assert_eq!(last_run(&replayed_log), expected, "replayed seek to {target}");
            assert_eq!(incremental.frame(), target);
            assert_eq!(replayed.frame(), target);
        }
    }

    #[test]
    fn test_start_and_pause_keep_frame() {
        let (mut playback, _) = manager(10.0);
        playback.seek(4).unwrap();
        playback.start();
        assert!(playback.is_playing());
        assert_eq!(playback.frame(), 4);
        playback.pause();
        assert_eq!(playback.status(), PlaybackStatus::Stopped);
        assert_eq!(playback.frame(), 4);
    }

    #[test]
    fn test_timeline_edit_is_detected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let clock = FrameClock::new(10.0).unwrap();
        let entry = Routine::new("main", move |ctx: SceneContext| {
            let log = Arc::clone(&log);
            async move {
                ctx.wait_until_event("intro").await?;
                log.lock().push(ctx.frame());
                Ok::<(), FlowError>(())
            }
        });
        let scene = Scene::new("events", entry, clock, Logger::new());
        let mut playback = PlaybackManager::new(scene, PlaybackConfig::default());
        assert_eq!(playback.recalculate().unwrap(), 0);

        let events = playback.scene().editable_time_events().unwrap().clone();
        events.set_frame("intro", 30);
        assert!(playback.timeline_changed());
        assert_eq!(playback.recalculate().unwrap(), 30);
        assert!(!playback.timeline_changed());
    }

    #[test]
    fn test_thread_error_surfaces_from_next() {
        let clock = FrameClock::new(10.0).unwrap();
        let entry = Routine::new("broken", |ctx: SceneContext| async move {
            ctx.wait_for(0.1).await?;
            Err::<(), FlowError>(FlowError::custom("bad frame"))
        });
        let scene = Scene::new("errors", entry, clock, Logger::new());
        let mut playback = PlaybackManager::new(scene, PlaybackConfig::default());
        playback.reset().unwrap();
        assert!(playback.next().is_err());
    }
}
