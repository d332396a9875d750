//! Runner session client binary.
//!
//! Composition root: loads session content, registers simulated
//! collaborators, starts the runtime and logs progression until Ctrl-C or
//! the configured run time elapses.
//!
//! # Examples
//!
//! ```bash
//! RUST_LOG=runtime=debug RUNNER_REBIRTH_AT=4 cargo run -p runner-client
//! ```
mod config;
mod observer;
mod sim;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;

use runner_content::{ContentFactory, SessionLoader, StageLoader};
use runner_core::{Position, SessionConfig, StageOracle};
use runner_runtime::{
    AccountContext, EncounterManager, EventBus, FlatRebirthStats, FlatStatSystem,
    InMemoryAccount, LinearStat, PlayerWorld, RebirthStatSystem, Runtime, ServiceRegistry,
    StageOracleImpl, StatUpgradeSystem,
};

use config::ClientConfig;
use sim::{SimEncounters, SimWorld};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    let (session, stages) = load_content(&config)?;
    tracing::info!(
        chapters = stages.chapter_count(),
        stage_distance = session.stage_distance,
        chapter_distance = session.chapter_distance,
        "content loaded"
    );

    // 1. Collaborators
    let bus = EventBus::new();
    let services = ServiceRegistry::new();
    let world = Arc::new(SimWorld::new(
        bus.clone(),
        Position::ORIGIN,
        session.player.move_speed,
    ));
    let encounters = Arc::new(SimEncounters::new(
        session.special_encounter_chance,
        config.sim.one_shot_ratio,
        config.runtime.seed,
    ));
    let account = Arc::new(InMemoryAccount::new());
    let rebirth_stats = FlatRebirthStats::new(
        LinearStat::new(f64::from(session.player.move_speed), 0.5),
        LinearStat::new(f64::from(session.special_encounter_chance), 0.01),
    );

    services.register(Arc::new(session));
    services.register::<dyn StageOracle>(Arc::new(stages));
    services.register::<dyn EncounterManager>(encounters.clone());
    services.register::<dyn PlayerWorld>(world.clone());
    services.register::<dyn AccountContext>(account.clone());
    services.register::<dyn StatUpgradeSystem>(Arc::new(FlatStatSystem::new()));
    services.register::<dyn RebirthStatSystem>(Arc::new(rebirth_stats));

    // 2. Observers, before the first playthrough announces itself
    let (chapter_tx, chapter_rx) = watch::channel(0);
    let observers = observer::install(&bus, chapter_tx);

    // 3. Runtime
    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .services(services)
        .event_bus(bus.clone())
        .build()
        .await;
    tracing::info!("session started");

    // 4. Drive the simulation
    let driver = sim::drive(world, encounters, bus, config.sim.clone(), chapter_rx);
    let deadline = async {
        match config.sim.run_for {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        _ = driver => {}
        _ = deadline => tracing::info!("run time elapsed"),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("interrupted");
        }
    }

    runtime.shutdown().await?;
    drop(observers);

    tracing::info!(
        gold = %account.gold(),
        rebirth_points = %account.rebirth_points(),
        highest_chapter = account.highest_chapter(),
        rebirths = account.rebirth_count(),
        "session finished"
    );
    Ok(())
}

/// Loads session tuning and the stage table, preferring explicit paths.
fn load_content(config: &ClientConfig) -> Result<(SessionConfig, StageOracleImpl)> {
    let factory = ContentFactory::default_paths();

    let session = match &config.session_config {
        Some(path) => SessionLoader::load(path),
        None => factory.load_session(),
    }
    .context("Failed to load session config")?;

    let stages = match &config.stage_table {
        Some(path) => StageLoader::load(path),
        None => factory.load_stages(),
    }
    .context("Failed to load stage table")?;

    Ok((session, StageOracleImpl::new(stages)))
}
