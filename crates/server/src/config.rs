//! Server configuration loaded from the environment.
use std::env;
use std::time::Duration;

use keeper_runtime::RuntimeConfig;

/// Everything the headless server needs to start a dungeon.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub runtime: RuntimeConfig,
    /// Ticks to run before shutting down.
    pub ticks: u32,
    /// Wall-clock time between two ticks.
    pub tick_period: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            ticks: 600,
            tick_period: Duration::from_millis(100),
        }
    }
}

impl ServerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `KEEPER_SEED` - Seed of the simulation RNG
    /// - `KEEPER_TICKS` - Ticks to run (default: 600)
    /// - `KEEPER_TICK_MS` - Milliseconds between ticks (default: 100)
    /// - `KEEPER_NOTIFY_COOLDOWN` - Ticks a repeated notice is suppressed (default: 60)
    /// - `KEEPER_PAYDAY_INTERVAL` - Ticks between paydays, 0 disables (default: 600)
    /// - `KEEPER_CHICKEN_INTERVAL` - Ticks between hatchings, 0 disables (default: 40)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(seed) = read_env::<u64>("KEEPER_SEED") {
            config.runtime.seed = seed;
        }
        if let Some(ticks) = read_env::<u32>("KEEPER_TICKS") {
            config.ticks = ticks;
        }
        if let Some(ms) = read_env::<u64>("KEEPER_TICK_MS") {
            config.tick_period = Duration::from_millis(ms.max(1));
        }
        if let Some(window) = read_env::<u64>("KEEPER_NOTIFY_COOLDOWN") {
            config.runtime.notification_window = window;
        }
        if let Some(interval) = read_env::<u64>("KEEPER_PAYDAY_INTERVAL") {
            config.runtime.payday_interval = interval;
        }
        if let Some(interval) = read_env::<u64>("KEEPER_CHICKEN_INTERVAL") {
            config.runtime.chicken_interval = interval;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
