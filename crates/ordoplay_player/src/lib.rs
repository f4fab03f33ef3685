// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Player - drives animation projects for a host.
//!
//! The player loads a project from a source, measures its timeline and
//! plays it back paced to the project framerate. Hosts configure it through
//! string attributes and deliver display ticks; rendered frames go to a
//! [`RenderSink`](ordoplay_flow::RenderSink).
//!
//! ## Lifecycle
//!
//! `Initial → Loading → Ready`, with `Error` reachable from `Loading` and
//! `Ready`. Supplying a new source is the only way out of `Error`.

pub mod attributes;
pub mod config;
pub mod demo;
pub mod error;
pub mod loader;
pub mod pacing;
pub mod player;
pub mod state;

pub use attributes::{AttributeChange, PlayerAttributes, OBSERVED_ATTRIBUTES};
pub use config::PlayerConfig;
pub use error::{LoadError, PlayerError, PlayerResult};
pub use loader::{SceneLibrary, SourceLoader};
pub use pacing::{FramePacer, DEFAULT_PACING_TOLERANCE};
pub use player::{Player, TickOutcome};
pub use state::PlayerState;
