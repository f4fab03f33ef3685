// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while scheduling and stepping animation threads.

/// Error during thread scheduling or playback
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A wait was given a negative or non-finite duration
    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(f64),

    /// Framerate must be positive and finite
    #[error("Invalid framerate: {0}")]
    InvalidFramerate(f64),

    /// A thread failed while being resumed
    #[error("Thread '{name}' failed: {source}")]
    Thread {
        /// Name of the failing thread
        name: String,
        /// Error returned by the routine
        #[source]
        source: Box<FlowError>,
    },

    /// The timeline did not finish within the configured frame limit
    #[error("Timeline exceeded {0} frames")]
    TimelineTooLong(u32),

    /// Time event metadata could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom error raised by an animation routine
    #[error("{0}")]
    Custom(String),
}

impl FlowError {
    /// Create a custom error from any message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// The innermost error, skipping thread wrappers
    pub fn root_cause(&self) -> &FlowError {
        match self {
            FlowError::Thread { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for flow operations
pub type FlowResult<T> = std::result::Result<T, FlowError>;
