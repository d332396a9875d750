//! Client configuration loaded from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use runner_runtime::RuntimeConfig;

/// Everything the binary needs to assemble a session.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub runtime: RuntimeConfig,
    /// Explicit `session.toml`; the bundled data directory otherwise.
    pub session_config: Option<PathBuf>,
    /// Explicit `stages.ron`; the bundled data directory otherwise.
    pub stage_table: Option<PathBuf>,
    pub sim: SimConfig,
}

/// Knobs for the simulated world.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// World step for player movement.
    pub frame: Duration,
    /// One live encounter is defeated per interval.
    pub kill_interval: Duration,
    /// Share of kills that land in a single hit.
    pub one_shot_ratio: f64,
    /// Request a rebirth on reaching this chapter.
    pub rebirth_at: Option<u32>,
    /// Stop after this long. `None` runs until Ctrl-C.
    pub run_for: Option<Duration>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(50),
            kill_interval: Duration::from_secs(1),
            one_shot_ratio: 0.3,
            rebirth_at: None,
            run_for: None,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `RUNNER_SESSION_CONFIG` - Path to `session.toml`
    /// - `RUNNER_STAGE_TABLE` - Path to `stages.ron`
    /// - `RUNNER_DISTANCE_TICK_MS` - Distance loop period (default: 100)
    /// - `RUNNER_POPULATION_TICK_MS` - Population loop period (default: 1000)
    /// - `RUNNER_SEED` - Seed for encounter counts (default: random)
    /// - `RUNNER_SERVICE_TIMEOUT_MS` - Give up waiting for services (default: wait)
    /// - `RUNNER_KILL_INTERVAL_MS` - Simulated kill cadence (default: 1000)
    /// - `RUNNER_ONE_SHOT_RATIO` - Share of one-shot kills (default: 0.3)
    /// - `RUNNER_REBIRTH_AT` - Chapter that triggers a rebirth (default: never)
    /// - `RUNNER_RUN_SECS` - Stop after this many seconds (default: until Ctrl-C)
    pub fn from_env() -> Self {
        let mut runtime = RuntimeConfig::default();
        if let Some(ms) = read_env::<u64>("RUNNER_DISTANCE_TICK_MS") {
            runtime.distance_tick = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = read_env::<u64>("RUNNER_POPULATION_TICK_MS") {
            runtime.population_tick = Duration::from_millis(ms.max(1));
        }
        runtime.seed = read_env::<u64>("RUNNER_SEED");
        runtime.service_timeout = read_env::<u64>("RUNNER_SERVICE_TIMEOUT_MS").map(Duration::from_millis);

        let mut sim = SimConfig::default();
        if let Some(ms) = read_env::<u64>("RUNNER_KILL_INTERVAL_MS") {
            sim.kill_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ratio) = read_env::<f64>("RUNNER_ONE_SHOT_RATIO") {
            sim.one_shot_ratio = ratio.clamp(0.0, 1.0);
        }
        sim.rebirth_at = read_env::<u32>("RUNNER_REBIRTH_AT");
        sim.run_for = read_env::<u64>("RUNNER_RUN_SECS").map(Duration::from_secs);

        Self {
            runtime,
            session_config: env::var_os("RUNNER_SESSION_CONFIG").map(PathBuf::from),
            stage_table: env::var_os("RUNNER_STAGE_TABLE").map(PathBuf::from),
            sim,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
