// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project logger with subscriber fan-out.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Severity of a project log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Diagnostic detail
    Debug,
    /// Informational
    Info,
    /// Something looks off
    Warn,
    /// Something failed
    Error,
}

/// A message emitted through a [`Logger`]
#[derive(Debug, Clone, PartialEq)]
pub struct LogPayload {
    /// Severity
    pub level: LogLevel,
    /// Message text
    pub message: String,
}

/// Callback invoked for every logged payload
pub type LogCallback = Arc<dyn Fn(&LogPayload) + Send + Sync>;

/// Handle returned by [`Logger::on_logged`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Logger shared by a project and its routines.
///
/// Every message is recorded as a `tracing` event and forwarded to the
/// subscribers registered with [`Logger::on_logged`].
#[derive(Clone, Default)]
pub struct Logger {
    subscribers: Arc<RwLock<Vec<(SubscriptionId, LogCallback)>>>,
    next_id: Arc<AtomicU64>,
}

impl Logger {
    /// Create a logger without subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to logged messages
    pub fn on_logged(&self, callback: impl Fn(&LogPayload) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    /// Log a message
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let payload = LogPayload {
            level,
            message: message.into(),
        };
        match level {
            LogLevel::Debug => tracing::debug!(target: "ordoplay_flow::project", "{}", payload.message),
            LogLevel::Info => tracing::info!(target: "ordoplay_flow::project", "{}", payload.message),
            LogLevel::Warn => tracing::warn!(target: "ordoplay_flow::project", "{}", payload.message),
            LogLevel::Error => tracing::error!(target: "ordoplay_flow::project", "{}", payload.message),
        }

        // Callbacks may log again; don't hold the lock while calling them
        let subscribers: Vec<LogCallback> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in subscribers {
            callback(&payload);
        }
    }

    /// Log at debug level
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    /// Log at info level
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    /// Log at warn level
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    /// Log at error level
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
