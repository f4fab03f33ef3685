// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative thread scheduler.
//!
//! All threads of a scene are resumed every frame, one at a time, in the
//! order they were created, until none of them can progress further. The
//! frame counter does not move during a pass, so every thread observes the
//! same logical instant.

use crate::error::{FlowError, FlowResult};
use crate::thread::{SpawnQueue, Thread, ThreadFuture, ThreadHandle};
use futures::task::noop_waker;
use std::task::{Context, Poll};

/// Runs the active threads of one scene
#[derive(Debug, Default)]
pub struct Scheduler {
    threads: Vec<Thread>,
    queue: SpawnQueue,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn queue(&self) -> &SpawnQueue {
        &self.queue
    }

    /// Add a thread, resumed from the next pass on
    pub fn spawn(&mut self, name: &str, body: ThreadFuture) -> ThreadHandle {
        self.queue.spawn(name, body)
    }

    /// Resume the active threads until none can progress in the current frame.
    ///
    /// Threads are resumed in creation order. Threads spawned during a sweep
    /// are resumed in the same sweep, after the threads that already existed.
    /// While a sweep finishes at least one thread, another sweep follows so
    /// joiners continue in the frame their target finished. A thread error
    /// stops the pass and is returned; threads resumed so far keep their
    /// progress.
    pub fn advance_one_frame(&mut self) -> FlowResult<()> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        self.threads.extend(self.queue.drain());
        let mut sweeps = 0_u32;
        loop {
            sweeps += 1;
            let mut finished_any = false;
            let mut index = 0;
            while index < self.threads.len() {
                let thread = &mut self.threads[index];
                index += 1;
                if thread.is_finished() {
                    continue;
                }
                let poll = {
                    let _span = tracing::trace_span!("thread", id = thread.id().0, name = thread.name()).entered();
                    thread.resume(&mut cx)
                };
                match poll {
                    Poll::Ready(Ok(())) => finished_any = true,
                    Poll::Ready(Err(source)) => {
                        return Err(FlowError::Thread {
                            name: thread.name().to_string(),
                            source: Box::new(source),
                        });
                    }
                    Poll::Pending => {}
                }
                self.threads.extend(self.queue.drain());
            }
            if !finished_any {
                break;
            }
        }
        tracing::trace!(sweeps, threads = self.threads.len(), "Frame pass complete");

        self.threads.retain(|thread| !thread.is_finished());
        Ok(())
    }

    /// Drop every thread, queued ones included
    pub fn clear(&mut self) {
        self.threads.clear();
        self.queue.reset();
    }

    /// Number of active threads
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Whether no thread is left, queued ones included
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty() && self.queue.is_empty()
    }

    /// Names of the active threads in resumption order
    pub fn thread_names(&self) -> Vec<&str> {
        self.threads.iter().map(Thread::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;
    use crate::context::SceneContext;
    use crate::logger::Logger;
    use crate::time_events::TimeEvents;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Fixture {
        scheduler: Scheduler,
        clock: FrameClock,
        ctx: SceneContext,
        log: Arc<Mutex<Vec<String>>>,
    }

    fn fixture() -> Fixture {
        let scheduler = Scheduler::new();
        let clock = FrameClock::new(10.0).unwrap();
        let ctx = SceneContext::new(
            clock.clone(),
            Arc::new(TimeEvents::new()),
            Logger::new(),
            scheduler.queue().clone(),
        );
        Fixture {
            scheduler,
            clock,
            ctx,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    impl Fixture {
        fn step(&mut self) -> FlowResult<()> {
            self.clock.advance();
            self.scheduler.advance_one_frame()
        }
    }

    #[test]
    fn test_threads_resume_in_creation_order() {
        let mut f = fixture();
        for name in ["a", "b", "c"] {
            let ctx = f.ctx.clone();
            let log = Arc::clone(&f.log);
            f.scheduler.spawn(
                name,
                Box::pin(async move {
                    for _ in 0..10 {
                        log.lock().push(format!("{name}@{}", ctx.frame()));
                        ctx.wait_for(0.1).await?;
                    }
                    Ok::<(), FlowError>(())
                }),
            );
        }

        f.scheduler.advance_one_frame().unwrap();
        f.step().unwrap();
        assert_eq!(*f.log.lock(), vec!["a@0", "b@0", "c@0", "a@1", "b@1", "c@1"]);
        assert_eq!(f.scheduler.thread_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_finished_threads_are_removed() {
        let mut f = fixture();
        let ctx = f.ctx.clone();
        f.scheduler.spawn("short", Box::pin(async move { ctx.wait_for(0.2).await }));
        f.scheduler.spawn("instant", Box::pin(async { Ok::<(), FlowError>(()) }));

        f.scheduler.advance_one_frame().unwrap();
        assert_eq!(f.scheduler.len(), 1);
        f.step().unwrap();
        assert_eq!(f.scheduler.len(), 1);
        f.step().unwrap();
        assert!(f.scheduler.is_empty());
    }

    #[test]
    fn test_spawned_threads_run_in_same_pass() {
        let mut f = fixture();
        let ctx = f.ctx.clone();
        let log = Arc::clone(&f.log);
        f.scheduler.spawn(
            "parent",
            Box::pin(async move {
                let child_log = Arc::clone(&log);
                let child_ctx = ctx.clone();
                let child = ctx.spawn("child", async move {
                    child_log.lock().push(format!("child@{}", child_ctx.frame()));
                    child_ctx.wait_for(0.2).await
                });
                log.lock().push("parent spawned".to_string());
                child.join().await;
                log.lock().push(format!("joined@{}", ctx.frame()));
                Ok::<(), FlowError>(())
            }),
        );

        f.scheduler.advance_one_frame().unwrap();
        assert_eq!(*f.log.lock(), vec!["parent spawned", "child@0"]);
        assert_eq!(f.scheduler.thread_names(), vec!["parent", "child"]);

        f.step().unwrap();
        assert_eq!(f.log.lock().len(), 2);
        // The child finishes after the parent was resumed, the parent still joins in frame 2
        f.step().unwrap();
        assert_eq!(f.log.lock().last().map(String::as_str), Some("joined@2"));
        assert!(f.scheduler.is_empty());
    }

    #[test]
    fn test_all_waits_for_every_body() {
        let mut f = fixture();
        let ctx = f.ctx.clone();
        let log = Arc::clone(&f.log);
        f.scheduler.spawn(
            "main",
            Box::pin(async move {
                ctx.all([ctx.wait_for(0.1), ctx.wait_for(0.3)]).await?;
                log.lock().push(format!("done@{}", ctx.frame()));
                Ok::<(), FlowError>(())
            }),
        );

        f.scheduler.advance_one_frame().unwrap();
        for _ in 0..4 {
            f.step().unwrap();
        }
        assert_eq!(*f.log.lock(), vec!["done@3"]);
    }

    #[test]
    fn test_consecutive_all_blocks_do_not_drift() {
        let mut f = fixture();
        let ctx = f.ctx.clone();
        let log = Arc::clone(&f.log);
        f.scheduler.spawn(
            "main",
            Box::pin(async move {
                ctx.all([ctx.wait_for(0.1), ctx.wait_for(0.3)]).await?;
                log.lock().push(format!("all_done@{}", ctx.frame()));
                ctx.all([ctx.wait_for(0.2)]).await?;
                log.lock().push(format!("second_done@{}", ctx.frame()));
                Ok::<(), FlowError>(())
            }),
        );

        f.scheduler.advance_one_frame().unwrap();
        for _ in 0..8 {
            f.step().unwrap();
        }
        assert_eq!(*f.log.lock(), vec!["all_done@3", "second_done@5"]);
        assert!(f.scheduler.is_empty());
    }

    #[test]
    fn test_nested_joins_settle_in_one_frame() {
        let mut f = fixture();
        let ctx = f.ctx.clone();
        let log = Arc::clone(&f.log);
        f.scheduler.spawn(
            "outer",
            Box::pin(async move {
                let inner_ctx = ctx.clone();
                let inner = ctx.spawn("inner", async move {
                    let leaf_ctx = inner_ctx.clone();
                    inner_ctx
                        .spawn("leaf", async move { leaf_ctx.wait_for(0.1).await })
                        .join()
                        .await;
                    Ok::<(), FlowError>(())
                });
                inner.join().await;
                log.lock().push(format!("outer@{}", ctx.frame()));
                Ok::<(), FlowError>(())
            }),
        );

        f.scheduler.advance_one_frame().unwrap();
        assert_eq!(f.scheduler.thread_names(), vec!["outer", "inner", "leaf"]);
        f.step().unwrap();
        assert_eq!(*f.log.lock(), vec!["outer@1"]);
        assert!(f.scheduler.is_empty());
    }

    #[test]
    fn test_thread_error_propagates() {
        let mut f = fixture();
        let ctx = f.ctx.clone();
        f.scheduler.spawn(
            "faulty",
            Box::pin(async move {
                ctx.wait_for(0.1).await?;
                Err::<(), FlowError>(FlowError::custom("broken"))
            }),
        );

        f.scheduler.advance_one_frame().unwrap();
        let error = f.step().unwrap_err();
        assert!(matches!(&error, FlowError::Thread { name, .. } if name == "faulty"));
        assert!(matches!(error.root_cause(), FlowError::Custom(_)));
    }

    #[test]
    fn test_frame_is_constant_within_pass() {
        let mut f = fixture();
        f.clock.set_frame(7);
        for name in ["x", "y"] {
            let ctx = f.ctx.clone();
            let log = Arc::clone(&f.log);
            f.scheduler.spawn(
                name,
                Box::pin(async move {
                    log.lock().push(ctx.frame().to_string());
                    ctx.wait_for(0.0).await?;
                    log.lock().push(ctx.frame().to_string());
                    Ok::<(), FlowError>(())
                }),
            );
        }
        f.scheduler.advance_one_frame().unwrap();
        assert_eq!(*f.log.lock(), vec!["7", "7", "7", "7"]);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut f = fixture();
        let ctx = f.ctx.clone();
        f.scheduler.spawn("long", Box::pin(async move { ctx.wait_for(100.0).await }));
        f.scheduler.advance_one_frame().unwrap();
        assert_eq!(f.scheduler.len(), 1);
        f.scheduler.clear();
        assert!(f.scheduler.is_empty());
    }
}
