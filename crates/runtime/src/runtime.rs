//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for the server to drive the dungeon.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use keeper_core::{AiConfig, GridPathfinder, Pathfinder, RngOracle, World};

use crate::api::{Result, RuntimeError, RuntimeHandle, TickSummary};
use crate::events::{Event, EventBus, Topic};
use crate::oracle::SmallRngOracle;
use crate::workers::{Command, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub ai: AiConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Seed of the default RNG oracle.
    pub seed: u64,
    /// Ticks during which a repeated notice to the same seat is dropped.
    pub notification_window: u64,
    /// Ticks between two paydays; 0 disables wages.
    pub payday_interval: u64,
    /// Ticks between two hatchings in each hatchery; 0 disables breeding.
    pub chicken_interval: u64,
}

impl RuntimeConfig {
    pub const DEFAULT_SEED: u64 = 0x6b65_6570;
    pub const DEFAULT_NOTIFICATION_WINDOW: u64 = 60;
    pub const DEFAULT_PAYDAY_INTERVAL: u64 = 600;
    pub const DEFAULT_CHICKEN_INTERVAL: u64 = 40;
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            event_buffer_size: 1024,
            command_buffer_size: 32,
            seed: Self::DEFAULT_SEED,
            notification_window: Self::DEFAULT_NOTIFICATION_WINDOW,
            payday_interval: Self::DEFAULT_PAYDAY_INTERVAL,
            chicken_interval: Self::DEFAULT_CHICKEN_INTERVAL,
        }
    }
}

/// Main runtime that drives the dungeon simulation
///
/// Runtime owns the worker task; [`RuntimeHandle`] provides a cloneable
/// façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Subscribe to events from one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Run `ticks` ticks back to back
    pub async fn advance(&self, ticks: u32) -> Result<TickSummary> {
        self.handle.advance(ticks).await
    }

    /// Run `ticks` ticks, one every `period`
    pub async fn run(&self, ticks: u32, period: Duration) -> Result<TickSummary> {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last = TickSummary::default();
        for _ in 0..ticks {
            interval.tick().await;
            last = self.handle.advance(1).await?;
        }
        Ok(last)
    }

    /// Shutdown the runtime gracefully
    ///
    /// Waits for the worker to drain its queue; every cloned handle must be
    /// dropped first.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    world: Option<World>,
    rng: Option<Box<dyn RngOracle>>,
    pathfinder: Option<Box<dyn Pathfinder>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            world: None,
            rng: None,
            pathfinder: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide the dungeon to simulate (required)
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    /// Replace the seeded [`SmallRngOracle`]
    pub fn rng(mut self, rng: impl RngOracle + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Replace the breadth-first [`GridPathfinder`]
    pub fn pathfinder(mut self, pathfinder: impl Pathfinder + 'static) -> Self {
        self.pathfinder = Some(Box::new(pathfinder));
        self
    }

    /// Build the runtime and spawn its worker
    pub async fn build(self) -> Result<Runtime> {
        let world = self.world.ok_or(RuntimeError::MissingWorld)?;
        let config = self.config;

        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size);
        let event_bus = EventBus::with_capacity(config.event_buffer_size);
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(SmallRngOracle::seeded(config.seed)));
        let pathfinder = self
            .pathfinder
            .unwrap_or_else(|| Box::new(GridPathfinder::new()));

        let sim_worker =
            SimulationWorker::new(world, config, rng, pathfinder, command_rx, event_bus);
        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        Ok(Runtime {
            handle,
            sim_worker_handle,
        })
    }
}
