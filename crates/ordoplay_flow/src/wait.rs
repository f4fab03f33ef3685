// SPDX-License-Identifier: MIT OR Apache-2.0
//! Suspension points for animation threads.
//!
//! A [`Wait`] resolves its target frame on the first resumption and then
//! yields once per frame until the project clock reaches it:
//!
//! ```ignore
//! // current time: 0s
//! ctx.wait_for(2.0).await?;
//! // current time: 2s
//! ctx.wait_until(3.0).await?;
//! // current time: 3s
//! ctx.wait_until_event("drop").await?;
//! ```

use crate::context::SceneContext;
use crate::error::{FlowError, FlowResult};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone)]
enum WaitTarget {
    /// Seconds relative to the first resumption
    Duration(f64),
    /// Absolute time in seconds
    Time(f64),
    /// Named time event
    Event(String),
}

/// Future that completes once the clock reaches a target frame
#[derive(Debug)]
#[must_use = "waits do nothing unless awaited"]
pub struct Wait {
    ctx: SceneContext,
    target: WaitTarget,
    frame: Option<u32>,
}

impl Wait {
    pub(crate) fn duration(ctx: SceneContext, seconds: f64) -> Self {
        Self::new(ctx, WaitTarget::Duration(seconds))
    }

    pub(crate) fn until(ctx: SceneContext, seconds: f64) -> Self {
        Self::new(ctx, WaitTarget::Time(seconds))
    }

    pub(crate) fn event(ctx: SceneContext, name: String) -> Self {
        Self::new(ctx, WaitTarget::Event(name))
    }

    fn new(ctx: SceneContext, target: WaitTarget) -> Self {
        Self {
            ctx,
            target,
            frame: None,
        }
    }

    /// Target frame, once the wait has been resumed
    pub fn target_frame(&self) -> Option<u32> {
        self.frame
    }

    /// Continue into `next` when the wait completes
    pub fn after<F>(self, next: F) -> impl Future<Output = FlowResult<()>> + Send + 'static
    where
        F: Future<Output = FlowResult<()>> + Send + 'static,
    {
        async move {
            self.await?;
            next.await
        }
    }

    fn resolve(&self) -> FlowResult<u32> {
        let now = self.ctx.frame();
        match &self.target {
            WaitTarget::Duration(seconds) => {
                let frames = self.ctx.seconds_to_frames(validate(*seconds)?);
                Ok(now.saturating_add(frames))
            }
            WaitTarget::Time(seconds) => Ok(self.ctx.seconds_to_frames(validate(*seconds)?)),
            WaitTarget::Event(name) => Ok(self.ctx.time_events().register(name, now)),
        }
    }
}

impl Future for Wait {
    type Output = FlowResult<()>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let target = match self.frame {
            Some(frame) => frame,
            None => match self.resolve() {
                Ok(frame) => {
                    self.frame = Some(frame);
                    frame
                }
                Err(error) => return Poll::Ready(Err(error)),
            },
        };

        // The scheduler resumes every thread each frame, so no waker is kept
        if self.ctx.frame() < target {
            Poll::Pending
        } else {
            Poll::Ready(Ok(()))
        }
    }
}

fn validate(seconds: f64) -> FlowResult<f64> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(FlowError::InvalidDuration(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;
    use crate::logger::Logger;
    use crate::thread::SpawnQueue;
    use crate::time_events::{TimeEventRegistry, TimeEvents};
    use futures::task::noop_waker;
    use std::sync::Arc;

    fn context(framerate: f64) -> (SceneContext, FrameClock, Arc<TimeEvents>) {
        let clock = FrameClock::new(framerate).unwrap();
        let events = Arc::new(TimeEvents::new());
        let ctx = SceneContext::new(
            clock.clone(),
            events.clone(),
            Logger::new(),
            SpawnQueue::default(),
        );
        (ctx, clock, events)
    }

    fn poll<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        Pin::new(future).poll(&mut cx)
    }

    /// Resume once per frame, returning the frame at which the wait finished
    fn run_to_completion(wait: &mut Wait, clock: &FrameClock) -> u32 {
        loop {
            if let Poll::Ready(result) = poll(wait) {
                result.unwrap();
                return clock.frame();
            }
            clock.advance();
        }
    }

    #[test]
    fn test_wait_for_counts_frames() {
        let (ctx, clock, _) = context(60.0);
        clock.set_frame(10);
        let mut wait = ctx.wait_for(0.5);
        assert_eq!(run_to_completion(&mut wait, &clock), 40);
        assert_eq!(wait.target_frame(), Some(40));
    }

    #[test]
    fn test_wait_for_captures_start_on_first_resume() {
        let (ctx, clock, _) = context(10.0);
        let mut wait = ctx.wait_for(1.0);
        clock.set_frame(5);
        assert!(poll(&mut wait).is_pending());
        assert_eq!(wait.target_frame(), Some(15));
    }

    #[test]
    fn test_zero_wait_never_suspends() {
        let (ctx, _, _) = context(30.0);
        assert!(poll(&mut ctx.wait_for(0.0)).is_ready());
        assert!(poll(&mut ctx.wait_until(0.0)).is_ready());
        assert!(poll(&mut ctx.now()).is_ready());
    }

    #[test]
    fn test_wait_until_past_time_is_immediate() {
        let (ctx, clock, _) = context(30.0);
        clock.set_frame(90);
        let mut wait = ctx.wait_until(1.0);
        assert!(matches!(poll(&mut wait), Poll::Ready(Ok(()))));
    }

    #[test]
    fn test_wait_until_absolute() {
        let (ctx, clock, _) = context(30.0);
        clock.set_frame(12);
        let mut wait = ctx.wait_until(1.0);
        assert_eq!(run_to_completion(&mut wait, &clock), 30);
    }

    #[test]
    fn test_wait_until_event_defaults_to_now() {
        let (ctx, clock, events) = context(30.0);
        let mut wait = ctx.wait_until_event("intro");
        assert!(poll(&mut wait).is_ready());
        assert_eq!(events.get("intro"), Some(0));

        events.set_frame("intro", 30);
        events.reset();
        clock.set_frame(0);
        let mut wait = ctx.wait_until_event("intro");
        assert_eq!(run_to_completion(&mut wait, &clock), 30);
    }

    #[test]
    fn test_invalid_durations_fail_fast() {
        let (ctx, _, _) = context(30.0);
        for seconds in [-1.0, f64::NAN, f64::INFINITY] {
            let result = poll(&mut ctx.wait_for(seconds));
            assert!(matches!(result, Poll::Ready(Err(FlowError::InvalidDuration(_)))));
        }
        assert!(matches!(
            poll(&mut ctx.wait_until(-0.5)),
            Poll::Ready(Err(FlowError::InvalidDuration(_)))
        ));
    }

    #[test]
    fn test_after_continues_transparently() {
        let (ctx, clock, _) = context(10.0);
        let reached = Arc::new(parking_lot::Mutex::new(None));
        let record = Arc::clone(&reached);
        let inner = ctx.clone();
        let mut chained = Box::pin(ctx.wait_for(1.0).after(async move {
            *record.lock() = Some(inner.frame());
            inner.wait_for(0.5).await
        }));

        let mut finished_at = None;
        for _ in 0..30 {
            if poll(&mut chained).is_ready() {
                finished_at = Some(clock.frame());
                break;
            }
            clock.advance();
        }
        assert_eq!(*reached.lock(), Some(10));
        assert_eq!(finished_at, Some(15));
    }
}
