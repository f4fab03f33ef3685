// SPDX-License-Identifier: MIT OR Apache-2.0
//! Threads: resumable animation routines driven every frame.

use crate::context::SceneContext;
use crate::error::FlowResult;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Body of a thread
pub type ThreadFuture = Pin<Box<dyn Future<Output = FlowResult<()>> + Send + 'static>>;

/// Identifier of a thread, sequential within one scene run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u64);

#[derive(Debug, Default)]
struct ThreadStatus {
    finished: AtomicBool,
    cancelled: AtomicBool,
}

/// A suspended routine owned by the scheduler
pub struct Thread {
    id: ThreadId,
    name: Arc<str>,
    future: ThreadFuture,
    status: Arc<ThreadStatus>,
}

impl Thread {
    fn new(id: ThreadId, name: Arc<str>, future: ThreadFuture) -> (Self, ThreadHandle) {
        let status = Arc::new(ThreadStatus::default());
        let handle = ThreadHandle {
            id,
            name: Arc::clone(&name),
            status: Arc::clone(&status),
        };
        (
            Self {
                id,
                name,
                future,
                status,
            },
            handle,
        )
    }

    /// Thread ID
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the routine ran to completion (or was cancelled)
    pub fn is_finished(&self) -> bool {
        self.status.finished.load(Ordering::Acquire)
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.status.cancelled.load(Ordering::Acquire)
    }

    /// Resume the routine until it yields or completes
    pub(crate) fn resume(&mut self, cx: &mut Context<'_>) -> Poll<FlowResult<()>> {
        if self.is_finished() {
            return Poll::Ready(Ok(()));
        }
        if self.is_cancelled() {
            self.status.finished.store(true, Ordering::Release);
            return Poll::Ready(Ok(()));
        }
        let poll = self.future.as_mut().poll(cx);
        if poll.is_ready() {
            self.status.finished.store(true, Ordering::Release);
        }
        poll
    }
}

impl std::fmt::Debug for Thread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Observer of a spawned thread
#[derive(Debug, Clone)]
pub struct ThreadHandle {
    id: ThreadId,
    name: Arc<str>,
    status: Arc<ThreadStatus>,
}

impl ThreadHandle {
    /// Thread ID
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the thread finished
    pub fn is_finished(&self) -> bool {
        self.status.finished.load(Ordering::Acquire)
    }

    /// Stop the thread at its next turn. Its remaining body never runs.
    pub fn cancel(&self) {
        self.status.cancelled.store(true, Ordering::Release);
    }

    /// Wait until the thread finished
    pub fn join(&self) -> Join {
        Join {
            status: Arc::clone(&self.status),
        }
    }
}

/// Future returned by [`ThreadHandle::join`]
#[derive(Debug)]
pub struct Join {
    status: Arc<ThreadStatus>,
}

impl Future for Join {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.status.finished.load(Ordering::Acquire) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Queue of threads created since the scheduler last looked.
///
/// Shared by the scheduler and every [`SceneContext`] of the scene so
/// routines can spawn while the scheduler is mid-pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpawnQueue {
    pending: Arc<Mutex<Vec<Thread>>>,
    next_id: Arc<AtomicU64>,
}

impl SpawnQueue {
    pub(crate) fn spawn(&self, name: &str, future: ThreadFuture) -> ThreadHandle {
        let id = ThreadId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (thread, handle) = Thread::new(id, Arc::from(name), future);
        tracing::trace!(id = id.0, name, "Thread spawned");
        self.pending.lock().push(thread);
        handle
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub(crate) fn drain(&self) -> Vec<Thread> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Drop queued threads and restart ID numbering
    pub(crate) fn reset(&self) {
        self.pending.lock().clear();
        self.next_id.store(0, Ordering::Relaxed);
    }
}

/// Function creating the body of a thread for a scene
pub type RoutineFn = dyn Fn(SceneContext) -> ThreadFuture + Send + Sync;

/// A named, reusable animation routine.
///
/// Registering a routine is what makes a function runnable as a thread: the
/// scene instantiates it again on every run, so replays start from the same
/// state.
#[derive(Clone)]
pub struct Routine {
    name: Arc<str>,
    factory: Arc<RoutineFn>,
}

impl Routine {
    /// Register `factory` as a routine
    pub fn new<F, Fut>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(SceneContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FlowResult<()>> + Send + 'static,
    {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            factory: Arc::new(move |ctx| -> ThreadFuture { Box::pin(factory(ctx)) }),
        }
    }

    /// Routine name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a fresh thread body
    pub fn instantiate(&self, ctx: SceneContext) -> ThreadFuture {
        (self.factory)(ctx)
    }
}

impl std::fmt::Debug for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Routine").field("name", &self.name).finish()
    }
}
