// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene: an entry routine plus the state of its current run.

use crate::clock::FrameClock;
use crate::context::SceneContext;
use crate::error::FlowResult;
use crate::logger::Logger;
use crate::scheduler::Scheduler;
use crate::thread::Routine;
use crate::time_events::{TimeEventRegistry, TimeEvents};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    /// Create a new random scene ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

/// A scene and its running threads
pub struct Scene {
    /// Unique scene ID
    pub id: SceneId,
    /// Scene name
    pub name: String,
    entry: Routine,
    clock: FrameClock,
    logger: Logger,
    time_events: Arc<dyn TimeEventRegistry>,
    editable_events: Option<Arc<TimeEvents>>,
    scheduler: Scheduler,
    context: SceneContext,
}

impl Scene {
    /// Create a scene with an editable time event registry
    pub fn new(name: impl Into<String>, entry: Routine, clock: FrameClock, logger: Logger) -> Self {
        let events = Arc::new(TimeEvents::new());
        let scheduler = Scheduler::new();
        let time_events: Arc<dyn TimeEventRegistry> = events.clone();
        let context = SceneContext::new(
            clock.clone(),
            Arc::clone(&time_events),
            logger.clone(),
            scheduler.queue().clone(),
        );
        Self {
            id: SceneId::new(),
            name: name.into(),
            entry,
            clock,
            logger,
            time_events,
            editable_events: Some(events),
            scheduler,
            context,
        }
    }

    /// Replace the time event registry, e.g. with a
    /// [`ReadOnlyTimeEvents`](crate::time_events::ReadOnlyTimeEvents) for
    /// previews. Drops all running threads.
    pub fn set_time_events(&mut self, registry: Arc<dyn TimeEventRegistry>) {
        self.scheduler.clear();
        self.editable_events = None;
        self.time_events = registry;
        self.context = SceneContext::new(
            self.clock.clone(),
            Arc::clone(&self.time_events),
            self.logger.clone(),
            self.scheduler.queue().clone(),
        );
    }

    /// Use an editable registry shared with a timeline editor
    pub fn set_editable_time_events(&mut self, events: Arc<TimeEvents>) {
        self.set_time_events(events.clone());
        self.editable_events = Some(events);
    }

    /// Start a new run: drop every thread, rewind to frame 0 and create the
    /// entry thread. The entry thread is first resumed by the next
    /// [`Scene::advance`].
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.clock.set_frame(0);
        self.time_events.reset();
        self.scheduler
            .spawn(self.entry.name(), self.entry.instantiate(self.context.clone()));
        tracing::trace!(scene = %self.name, "Scene reset");
    }

    /// Run one convergence pass for the current frame
    pub fn advance(&mut self) -> FlowResult<()> {
        self.scheduler.advance_one_frame()
    }

    /// Whether every thread of the run has finished
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// Context handed to routines
    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    /// The scheduler running this scene
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The registry used by this scene
    pub fn time_events(&self) -> &Arc<dyn TimeEventRegistry> {
        &self.time_events
    }

    /// The editable registry, unless a custom one was installed
    pub fn editable_time_events(&self) -> Option<&Arc<TimeEvents>> {
        self.editable_events.as_ref()
    }

    /// The project clock
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Entry routine
    pub fn entry(&self) -> &Routine {
        &self.entry
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
