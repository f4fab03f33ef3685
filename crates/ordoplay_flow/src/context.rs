// SPDX-License-Identifier: MIT OR Apache-2.0
//! Handle through which routines observe and extend their scene.

use crate::clock::FrameClock;
use crate::error::{FlowError, FlowResult};
use crate::logger::Logger;
use crate::thread::{Routine, SpawnQueue, ThreadHandle};
use crate::time_events::TimeEventRegistry;
use crate::wait::Wait;
use std::future::Future;
use std::sync::Arc;

/// Scene access for running threads.
///
/// Every routine receives a context when it is instantiated. The context is
/// cheap to clone and can be moved into spawned child routines.
#[derive(Clone)]
pub struct SceneContext {
    clock: FrameClock,
    time_events: Arc<dyn TimeEventRegistry>,
    logger: Logger,
    queue: SpawnQueue,
}

impl SceneContext {
    pub(crate) fn new(
        clock: FrameClock,
        time_events: Arc<dyn TimeEventRegistry>,
        logger: Logger,
        queue: SpawnQueue,
    ) -> Self {
        Self {
            clock,
            time_events,
            logger,
            queue,
        }
    }

    /// Current frame
    pub fn frame(&self) -> u32 {
        self.clock.frame()
    }

    /// Current time in seconds
    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    /// Project framerate
    pub fn framerate(&self) -> f64 {
        self.clock.framerate()
    }

    /// Convert seconds to frames using the project framerate
    pub fn seconds_to_frames(&self, seconds: f64) -> u32 {
        self.clock.seconds_to_frames(seconds)
    }

    /// The project clock
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// The scene's time event registry
    pub fn time_events(&self) -> &Arc<dyn TimeEventRegistry> {
        &self.time_events
    }

    /// The project logger
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Wait for `seconds`, relative to the frame of the first resumption
    pub fn wait_for(&self, seconds: f64) -> Wait {
        Wait::duration(self.clone(), seconds)
    }

    /// Wait until the absolute time `seconds`
    pub fn wait_until(&self, seconds: f64) -> Wait {
        Wait::until(self.clone(), seconds)
    }

    /// Wait until the named time event.
    ///
    /// An event happens immediately unless the timeline moved it.
    pub fn wait_until_event(&self, name: impl Into<String>) -> Wait {
        Wait::event(self.clone(), name.into())
    }

    /// Wait that completes immediately, for starting `after` chains
    pub fn now(&self) -> Wait {
        self.wait_for(0.0)
    }

    /// Run `routine` after `seconds`
    pub fn delay<F>(&self, seconds: f64, routine: F) -> impl Future<Output = FlowResult<()>> + Send + 'static
    where
        F: Future<Output = FlowResult<()>> + Send + 'static,
    {
        self.wait_for(seconds).after(routine)
    }

    /// Start a new thread in this scene.
    ///
    /// The thread is resumed for the first time later in the same frame.
    pub fn spawn<F>(&self, name: &str, body: F) -> ThreadHandle
    where
        F: Future<Output = FlowResult<()>> + Send + 'static,
    {
        self.queue.spawn(name, Box::pin(body))
    }

    /// Start a registered routine as a new thread
    pub fn spawn_routine(&self, routine: &Routine) -> ThreadHandle {
        self.queue.spawn(routine.name(), routine.instantiate(self.clone()))
    }

    /// Run all bodies as parallel threads and wait for every one of them
    pub fn all<I, F>(&self, bodies: I) -> impl Future<Output = FlowResult<()>> + Send + 'static
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = FlowResult<()>> + Send + 'static,
    {
        let ctx = self.clone();
        let bodies: Vec<F> = bodies.into_iter().collect();
        async move {
            let handles: Vec<ThreadHandle> = bodies
                .into_iter()
                .enumerate()
                .map(|(index, body)| ctx.spawn(&format!("all[{index}]"), body))
                .collect();
            for handle in handles {
                handle.join().await;
            }
            Ok::<(), FlowError>(())
        }
    }
}

impl std::fmt::Debug for SceneContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneContext")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
