//! Arena server entry point.
//!
//! Boots a single room from the data directory and keeps it ticking. A
//! transport attaches through [`arena_runtime::RoomHandle`]; this binary only
//! logs what the room publishes.
mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use arena_content::ContentFactory;
use arena_core::Arena;
use arena_runtime::{Room, RoomConfig, RoomEvent, Topic};
use tokio::sync::broadcast::error::RecvError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();
    let _guard = setup_logging(&config)?;

    let room = boot_room(&config)?;
    let handle = room.handle();
    let mut membership = handle.subscribe(Topic::Membership)?;
    let mut snapshots = handle.subscribe(Topic::Snapshot)?;

    let run_for = (config.run_seconds > 0).then(|| Duration::from_secs(config.run_seconds));
    let deadline = async {
        match run_for {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut last_logged = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            _ = &mut deadline => {
                tracing::info!(seconds = config.run_seconds, "run time elapsed");
                break;
            }
            event = membership.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "membership subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            event = snapshots.recv() => match event {
                Ok(RoomEvent::Snapshot(snapshot)) => {
                    // One line per simulated second is plenty for a log.
                    let second = snapshot.clock.as_millis() / 1000;
                    if last_logged != Some(second) {
                        last_logged = Some(second);
                        log_event(&RoomEvent::Snapshot(snapshot));
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "snapshot subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    room.shutdown().await?;
    tracing::info!("arena server stopped");
    Ok(())
}

fn boot_room(config: &ServerConfig) -> Result<Room> {
    let factory = ContentFactory::new(&config.data_dir);

    let mut combat = factory.load_config()?;
    if let Some(tick_hz) = config.tick_hz {
        combat.tick_hz = tick_hz;
    }
    combat
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid combat config: {}", e))?;
    let kits = factory.load_kits()?;

    let mut room_config = RoomConfig {
        combat: combat.clone(),
        ..RoomConfig::default()
    }
    .with_kits(kits.into_map());

    let arena = match &config.map {
        Some(name) => {
            let map = factory
                .load_map(name)
                .with_context(|| format!("Failed to boot room on map '{}'", name))?;
            room_config = room_config.with_spawn_points(map.spawns);
            Arena::new(combat, map.grid)
        }
        None => Arena::open(combat),
    };

    tracing::info!(
        data_dir = %config.data_dir.display(),
        map = config.map.as_deref().unwrap_or("<open field>"),
        "booting room"
    );
    Ok(Room::spawn(room_config, arena))
}

fn log_event(event: &RoomEvent) {
    match event.to_json() {
        Ok(json) => tracing::info!(topic = ?event.topic(), "{}", json),
        Err(e) => tracing::warn!("Failed to encode room event: {}", e),
    }
}

/// Stderr logging, plus a file under `ARENA_LOG_DIR` when it is set.
///
/// The returned guard flushes the file writer and must live as long as `main`.
fn setup_logging(config: &ServerConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::never(dir, "arena-server.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = &config.log_dir {
        tracing::info!("Log file: {}/arena-server.log", dir.display());
    }
    Ok(guard)
}
