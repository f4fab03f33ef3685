// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo scenes shipped with the player binary.

use crate::loader::SceneLibrary;
use ordoplay_flow::{
    FlowError, FlowResult, PlaybackConfig, RenderRequest, RenderSink, Routine, SceneContext,
    ThreadFuture,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Animated properties of the demo stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageSnapshot {
    /// Title opacity, 0 to 1
    pub title_opacity: f64,
    /// Horizontal title offset in pixels
    pub title_x: f64,
    /// Counter shown under the title
    pub counter: u32,
    /// Caption text
    pub caption: String,
}

/// Shared state animated by the demo routines and read by [`StageSink`]
#[derive(Debug, Default)]
pub struct Stage {
    state: Mutex<StageSnapshot>,
}

impl Stage {
    /// Copy of the current state
    pub fn snapshot(&self) -> StageSnapshot {
        self.state.lock().clone()
    }

    fn update(&self, apply: impl FnOnce(&mut StageSnapshot)) {
        apply(&mut self.state.lock());
    }

    fn reset(&self) {
        *self.state.lock() = StageSnapshot::default();
    }
}

/// Render sink logging the stage on every frame
#[derive(Debug)]
pub struct StageSink {
    stage: Arc<Stage>,
}

impl StageSink {
    /// Create a sink reading `stage`
    pub fn new(stage: Arc<Stage>) -> Self {
        Self { stage }
    }
}

impl RenderSink for StageSink {
    fn render(&self, request: &RenderRequest) -> FlowResult<()> {
        let snapshot = self.stage.snapshot();
        let (width, height) = request.physical_size();
        tracing::info!(
            frame = request.frame,
            time = %format!("{:.3}", request.time),
            width,
            height,
            opacity = %format!("{:.2}", snapshot.title_opacity),
            x = %format!("{:.1}", snapshot.title_x),
            counter = snapshot.counter,
            caption = %snapshot.caption,
            "Rendered frame"
        );
        Ok(())
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Call `apply` once per frame for `seconds` with progress from 0 to 1
async fn tween(ctx: SceneContext, seconds: f64, apply: impl Fn(f64) + Send + 'static) -> FlowResult<()> {
    let frames = ctx.seconds_to_frames(seconds).max(1);
    let step = 1.0 / ctx.framerate();
    for frame in 1..=frames {
        ctx.wait_for(step).await?;
        apply(f64::from(frame) / f64::from(frames));
    }
    Ok(())
}

fn intro(stage: Arc<Stage>) -> Routine {
    Routine::new("intro", move |ctx: SceneContext| {
        let stage = Arc::clone(&stage);
        async move {
            stage.reset();
            ctx.logger().info("Intro started");

            let fade = tween(ctx.clone(), 0.5, {
                let stage = Arc::clone(&stage);
                move |t| stage.update(|s| s.title_opacity = t)
            });
            let slide = tween(ctx.clone(), 0.75, {
                let stage = Arc::clone(&stage);
                move |t| stage.update(|s| s.title_x = lerp(-200.0, 0.0, t))
            });
            ctx.all([Box::pin(fade) as ThreadFuture, Box::pin(slide)]).await?;

            let counter = ctx.spawn("counter", {
                let ctx = ctx.clone();
                let stage = Arc::clone(&stage);
                async move {
                    for n in 1..=3 {
                        ctx.wait_for(0.25).await?;
                        stage.update(|s| s.counter = n);
                    }
                    Ok::<(), FlowError>(())
                }
            });
            ctx.wait_until_event("caption").await?;
            stage.update(|s| s.caption = "OrdoPlay".to_string());
            counter.join().await;

            ctx.wait_until_event("outro").await?;
            tween(ctx.clone(), 0.5, {
                let stage = Arc::clone(&stage);
                move |t| stage.update(|s| s.title_opacity = 1.0 - t)
            })
            .await?;
            ctx.logger().info("Intro finished");
            Ok::<(), FlowError>(())
        }
    })
}

fn countdown(stage: Arc<Stage>) -> Routine {
    Routine::new("countdown", move |ctx: SceneContext| {
        let stage = Arc::clone(&stage);
        async move {
            stage.reset();
            stage.update(|s| s.title_opacity = 1.0);
            for n in (1..=3).rev() {
                stage.update(|s| {
                    s.counter = n;
                    s.caption = n.to_string();
                });
                ctx.wait_for(1.0).await?;
            }
            stage.update(|s| s.caption = "Go".to_string());
            let hide = Arc::clone(&stage);
            ctx.delay(0.5, async move {
                hide.update(|s| s.title_opacity = 0.0);
                Ok::<(), FlowError>(())
            })
            .await
        }
    })
}

/// Library with the demo scenes and the stage they animate
pub fn demo_library(playback: PlaybackConfig) -> (SceneLibrary, Arc<Stage>) {
    let stage = Arc::new(Stage::default());
    let mut library = SceneLibrary::new(playback);
    library
        .register(intro(Arc::clone(&stage)))
        .register(countdown(Arc::clone(&stage)));
    (library, stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::player::{Player, TickOutcome};
    use crate::state::PlayerState;
    use ordoplay_flow::{Project, TimeEventRegistry};

    #[test]
    fn test_intro_runs_to_end() {
        let (library, stage) = demo_library(PlaybackConfig::default());
        let mut project = library.build("intro").unwrap();
        project.recalculate().unwrap();
        let duration = project.duration().unwrap();
        project.seek(duration).unwrap();

        let snapshot = stage.snapshot();
        assert_eq!(snapshot.title_opacity, 0.0);
        assert_eq!(snapshot.counter, 3);
        assert_eq!(snapshot.caption, "OrdoPlay");
    }

    #[test]
    fn test_outro_edit_extends_intro() {
        let (library, _) = demo_library(PlaybackConfig::default());
        let mut project = library.build("intro").unwrap();
        project.recalculate().unwrap();
        let before = project.duration().unwrap();

        let events = project.time_events().unwrap();
        assert!(events.contains("caption"));
        events.set_offset("outro", 30);
        project.recalculate().unwrap();
        assert_eq!(project.duration().unwrap(), before + 30);
    }

    #[test]
    fn test_intro_seek_matches_playback() {
        let (library, stage) = demo_library(PlaybackConfig::default());
        let mut project = library.build("intro").unwrap();
        project.recalculate().unwrap();

        let mut stepped = vec![stage.snapshot()];
        while !project.next().unwrap() {
            stepped.push(stage.snapshot());
        }
        stepped.push(stage.snapshot());

        for frame in [40, 3, 17, 0, 29] {
            project.seek(frame).unwrap();
            assert_eq!(stage.snapshot(), stepped[frame as usize], "frame {frame}");
        }
    }

    #[test]
    fn test_player_plays_countdown() {
        let (library, stage) = demo_library(PlaybackConfig::default());
        let player = Player::new(Arc::new(library), PlayerConfig::default());
        player.set_render_sink(Arc::new(StageSink::new(Arc::clone(&stage))));
        futures::executor::block_on(player.attribute_changed("src", Some("countdown")).unwrap()).unwrap();
        assert_eq!(player.state(), PlayerState::Ready);

        player.set_playing(true);
        let mut last = None;
        for tick in 0..400 {
            if let TickOutcome::Stepped { frame, finished: true } = player.tick(f64::from(tick) * 20.0) {
                last = Some(frame);
                break;
            }
        }
        // 3.5 seconds at 60 fps
        assert_eq!(last, Some(210));
        assert_eq!(stage.snapshot().caption, "Go");
        assert_eq!(stage.snapshot().title_opacity, 0.0);
    }
}
