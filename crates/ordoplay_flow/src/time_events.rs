// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named time events.
//!
//! A time event is a delay anchor that routines wait on by name. By default an
//! event happens at the frame where it is first referenced; the timeline can
//! then move it by editing its offset. Edits survive replays: every run
//! re-anchors the event, the offset stays.

use crate::error::FlowResult;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Registry resolving event names to frames
pub trait TimeEventRegistry: Send + Sync {
    /// Resolve `name`, anchoring it at `frame` if this is its first
    /// reference in the current run.
    fn register(&self, name: &str, frame: u32) -> u32;

    /// Resolved frame of an event without registering it
    fn get(&self, name: &str) -> Option<u32>;

    /// Whether the event is known
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Begin a new run
    fn reset(&self);

    /// Counter bumped on every timeline edit
    fn revision(&self) -> u64 {
        0
    }
}

/// A single time event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEvent {
    /// Event name
    pub name: String,
    /// Frame at which the event was first referenced in the current run
    pub initial_frame: u32,
    /// Timeline edit, in frames, relative to `initial_frame`
    pub offset: i64,
    /// Absolute frame requested before the event was ever referenced.
    /// Turned into an offset at the first reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_frame: Option<u32>,
    /// Referenced during the current run
    #[serde(skip)]
    pub registered: bool,
    /// `initial_frame` comes from a real reference
    #[serde(skip)]
    anchored: bool,
}

impl TimeEvent {
    fn new(name: &str, initial_frame: u32) -> Self {
        Self {
            name: name.to_string(),
            initial_frame,
            offset: 0,
            pending_frame: None,
            registered: true,
            anchored: true,
        }
    }

    fn unanchored(name: &str) -> Self {
        Self {
            registered: false,
            anchored: false,
            ..Self::new(name, 0)
        }
    }

    /// Frame the event resolves to
    pub fn frame(&self) -> u32 {
        if let Some(frame) = self.pending_frame {
            return frame;
        }
        let frame = i64::from(self.initial_frame) + self.offset;
        frame.clamp(0, i64::from(u32::MAX)) as u32
    }

    fn anchor(&mut self, frame: u32) {
        self.initial_frame = frame;
        self.registered = true;
        self.anchored = true;
        if let Some(target) = self.pending_frame.take() {
            self.offset = i64::from(target) - i64::from(frame);
        }
    }
}

/// Editable time event registry
#[derive(Debug, Default)]
pub struct TimeEvents {
    events: RwLock<IndexMap<String, TimeEvent>>,
    revision: AtomicU64,
}

impl TimeEvents {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Move an event by `offset` frames from its anchor.
    ///
    /// Unknown events are created so edits loaded ahead of the first run
    /// apply once the event is referenced.
    pub fn set_offset(&self, name: &str, offset: i64) {
        let mut events = self.events.write();
        let event = events
            .entry(name.to_string())
            .or_insert_with(|| TimeEvent::unanchored(name));
        if event.offset != offset || event.pending_frame.is_some() {
            event.offset = offset;
            event.pending_frame = None;
            self.revision.fetch_add(1, Ordering::AcqRel);
            tracing::debug!(event = name, offset, "Time event edited");
        }
    }

    /// Move an event so it resolves to `frame`.
    ///
    /// An event that was never referenced keeps `frame` as an absolute
    /// target until its first reference.
    pub fn set_frame(&self, name: &str, frame: u32) {
        let mut events = self.events.write();
        let event = events
            .entry(name.to_string())
            .or_insert_with(|| TimeEvent::unanchored(name));
        if event.anchored {
            let offset = i64::from(frame) - i64::from(event.initial_frame);
            if event.offset != offset {
                event.offset = offset;
                self.revision.fetch_add(1, Ordering::AcqRel);
                tracing::debug!(event = name, offset, "Time event edited");
            }
        } else if event.pending_frame != Some(frame) {
            event.pending_frame = Some(frame);
            self.revision.fetch_add(1, Ordering::AcqRel);
            tracing::debug!(event = name, frame, "Time event edited before first reference");
        }
    }

    /// Snapshot of all events in registration order
    pub fn events(&self) -> Vec<TimeEvent> {
        self.events.read().values().cloned().collect()
    }

    /// Number of known events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether no event is known
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Export the events as JSON metadata
    pub fn to_json(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(&self.events())?)
    }

    /// Apply offsets from JSON metadata produced by [`TimeEvents::to_json`]
    pub fn load_json(&self, json: &str) -> FlowResult<()> {
        let loaded: Vec<TimeEvent> = serde_json::from_str(json)?;
        for event in loaded {
            match event.pending_frame {
                Some(frame) => self.set_frame(&event.name, frame),
                None => self.set_offset(&event.name, event.offset),
            }
        }
        Ok(())
    }
}

impl TimeEventRegistry for TimeEvents {
    fn register(&self, name: &str, frame: u32) -> u32 {
        let mut events = self.events.write();
        match events.get_mut(name) {
            Some(event) => {
                if !event.registered {
                    event.anchor(frame);
                }
                event.frame()
            }
            None => {
                let event = TimeEvent::new(name, frame);
                let resolved = event.frame();
                events.insert(name.to_string(), event);
                tracing::trace!(event = name, frame, "Time event registered");
                resolved
            }
        }
    }

    fn get(&self, name: &str) -> Option<u32> {
        self.events.read().get(name).map(TimeEvent::frame)
    }

    fn reset(&self) {
        for event in self.events.write().values_mut() {
            event.registered = false;
        }
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

/// Registry for replay or preview contexts that must not mutate the
/// timeline. Known events resolve to their recorded frame; unknown events
/// happen immediately.
#[derive(Debug, Default)]
pub struct ReadOnlyTimeEvents {
    frames: IndexMap<String, u32>,
}

impl ReadOnlyTimeEvents {
    /// Create an empty read-only registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the current state of an editable registry
    pub fn from_events(events: &TimeEvents) -> Self {
        Self {
            frames: events
                .events()
                .into_iter()
                .map(|e| {
                    let frame = e.frame();
                    (e.name, frame)
                })
                .collect(),
        }
    }
}

impl TimeEventRegistry for ReadOnlyTimeEvents {
    fn register(&self, name: &str, frame: u32) -> u32 {
        self.frames.get(name).copied().unwrap_or(frame)
    }

    fn get(&self, name: &str) -> Option<u32> {
        self.frames.get(name).copied()
    }

    fn reset(&self) {}
}
