//! Headless dungeon server.
//!
//! Composition root that builds the starting dungeon, starts the simulation
//! runtime and relays what the human keeper would be told to the log.
//!
//! ```bash
//! RUST_LOG=keeper_runtime=debug KEEPER_TICKS=300 cargo run -p keeper-server
//! ```
mod config;
mod dungeon;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use keeper_runtime::{Event, NotificationEvent, Runtime, SpeciesCatalog, Topic};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Load configuration from environment
    let config = ServerConfig::from_env();

    // 2. Setup logging
    setup_logging();
    tracing::info!(
        "Starting keeper server: seed={}, ticks={}, period={:?}",
        config.runtime.seed,
        config.ticks,
        config.tick_period
    );

    // 3. Build the dungeon and the runtime
    let catalog = SpeciesCatalog::standard();
    let world = dungeon::starting_dungeon(&catalog)?;
    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .world(world)
        .build()
        .await?;

    // 4. Relay notifications to the log
    let relay = tokio::spawn(relay_notifications(
        runtime.subscribe(Topic::Notification),
    ));

    // 5. Run
    let last = runtime.run(config.ticks, config.tick_period).await?;
    tracing::info!(
        "Stopped at tick {}: acted={}, idle={}, events={}",
        last.tick,
        last.acted,
        last.idle,
        last.events
    );

    let snapshot = runtime.handle().snapshot().await?;
    for seat in &snapshot.seats {
        tracing::info!(
            "Seat {}: creatures={}, stored_gold={}, gold_mined={}",
            seat.id,
            seat.creatures,
            seat.stored_gold,
            seat.gold_mined
        );
    }

    runtime.shutdown().await?;
    relay.await?;
    Ok(())
}

async fn relay_notifications(mut rx: tokio::sync::broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(Event::Notification(NotificationEvent::Notice { tick, seat, notice })) => {
                tracing::info!("[{}] seat {}: {:?}", tick, seat, notice);
            }
            Ok(Event::Notification(NotificationEvent::Chat { tick, seat, message })) => {
                tracing::info!("[{}] seat {} chat: {}", tick, seat, message);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Notification relay lagged, skipped {}", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn setup_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
