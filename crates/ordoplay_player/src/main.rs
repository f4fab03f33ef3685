// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Player - plays a demo scene in the terminal.
//!
//! Usage: `ordoplay_player [scene] [config.ron]`
//!
//! Ticks come from a tokio interval at display refresh rate; every rendered
//! frame is logged.

use ordoplay_player::demo::{demo_library, StageSink};
use ordoplay_player::{Player, PlayerConfig, PlayerError, PlayerResult, PlayerState, TickOutcome};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Display refresh interval
const TICK_INTERVAL: Duration = Duration::from_micros(16_667);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ordoplay_player=debug,ordoplay_flow=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OrdoPlay Player v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run().await {
        tracing::error!("Player failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> PlayerResult<()> {
    let mut args = std::env::args().skip(1);
    let src = args.next().unwrap_or_else(|| "intro".to_string());
    let config = match args.next() {
        Some(path) => PlayerConfig::load(Path::new(&path))?,
        None => PlayerConfig::default(),
    };

    let (library, stage) = demo_library(config.playback.clone());
    tracing::debug!(scenes = ?library.names().collect::<Vec<_>>(), "Demo scenes registered");

    let player = Player::new(Arc::new(library), config);
    player.set_render_sink(Arc::new(StageSink::new(stage)));

    if let Some(load) = player.attribute_changed("src", Some(&src)) {
        load.await?;
    }
    if player.state() != PlayerState::Ready {
        return Err(player.error().unwrap_or(PlayerError::NotReady));
    }

    player.set_playing(true);
    let start = Instant::now();
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while player.wants_frame() {
        interval.tick().await;
        let now = start.elapsed().as_secs_f64() * 1000.0;
        match player.tick(now) {
            TickOutcome::Stepped {
                frame,
                finished: true,
            } => {
                tracing::info!(frame, "Playback finished");
                return Ok(());
            }
            TickOutcome::Failed => return Err(player.error().unwrap_or(PlayerError::NotReady)),
            TickOutcome::Idle | TickOutcome::Waiting | TickOutcome::Stepped { .. } => {}
        }
    }
    Ok(())
}
