// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-stepped animation flow for OrdoPlay.
//!
//! Animations are written as routines: async functions that yield with
//! waits and spawn or join further threads. Time never flows on its own.
//! The scheduler resumes every live thread each frame until it settles, so a
//! given frame always yields the same state.
//!
//! ## Architecture
//!
//! - [`FrameClock`] holds the current frame and framerate
//! - [`Wait`] suspends a thread until a frame, a duration or a time event
//! - [`TimeEvents`] resolves named delays that the timeline can move
//! - [`Scheduler`] resumes threads in creation order until the frame settles
//! - [`PlaybackManager`] steps a [`Scene`] and seeks by replaying it
//! - [`Project`] is what players drive

pub mod clock;
pub mod context;
pub mod error;
pub mod logger;
pub mod playback;
pub mod project;
pub mod scene;
pub mod scheduler;
pub mod thread;
pub mod time_events;
pub mod wait;

pub use clock::{FrameClock, DEFAULT_FRAMERATE};
pub use context::SceneContext;
pub use error::{FlowError, FlowResult};
pub use logger::{LogCallback, LogLevel, LogPayload, Logger, SubscriptionId};
pub use playback::{PlaybackConfig, PlaybackManager, PlaybackStatus, SeekStrategy};
pub use project::{
    AnimationProject, Project, ProjectId, RenderRequest, RenderSink, Size, DEFAULT_HEIGHT,
    DEFAULT_WIDTH,
};
pub use scene::{Scene, SceneId};
pub use scheduler::Scheduler;
pub use thread::{Join, Routine, Thread, ThreadFuture, ThreadHandle, ThreadId};
pub use time_events::{ReadOnlyTimeEvents, TimeEvent, TimeEventRegistry, TimeEvents};
pub use wait::Wait;
