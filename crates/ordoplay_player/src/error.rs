// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player error types.

use ordoplay_flow::FlowError;
use thiserror::Error;

/// Failure to produce a project from a source
#[derive(Debug, Error)]
pub enum LoadError {
    /// No project is known under this source
    #[error("Source not found: {0}")]
    NotFound(String),
    /// The load was superseded by a newer source
    #[error("Load aborted")]
    Aborted,
    /// The project failed while being prepared
    #[error("Project error: {0}")]
    Flow(#[from] FlowError),
    /// Loader-specific failure
    #[error("{0}")]
    Custom(String),
}

/// Player failures
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Loading a source failed
    #[error("Failed to load project: {0}")]
    Load(#[from] LoadError),
    /// Stepping, seeking or rendering failed
    #[error("Failed to step project: {0}")]
    Step(#[source] FlowError),
    /// The operation needs a ready project
    #[error("Player is not ready")]
    NotReady,
    /// The player stopped on an earlier failure; holds its message
    #[error("{0}")]
    Stopped(String),
    /// Invalid player configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for player operations
pub type PlayerResult<T> = std::result::Result<T, PlayerError>;
