//! Runtime orchestration for the dungeon simulation.
//!
//! This crate owns the authoritative [`keeper_core::World`] inside a worker
//! task and exposes it through a command channel and a topic-based event bus.
//! Consumers embed [`Runtime`] to advance ticks, act as the keeper, and
//! subscribe to notifications through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the event bus and the notification limiter
//! - [`oracle`] provides the seeded RNG and the species catalog
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod oracle;
pub mod runtime;

mod workers;

pub use api::{
    CreatureSummary, Result, RuntimeError, RuntimeHandle, SeatSummary, TickSummary, WorldSnapshot,
};
pub use events::{
    Event, EventBus, NotificationEvent, NotificationLimiter, SimulationEvent, Topic,
};
pub use oracle::{SmallRngOracle, SpeciesCatalog};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
