//! Collaborator services injected into the simulation.
//!
//! The AI never owns a pathfinder or a random source: both are borrowed
//! through [`SimulationContext`](crate::SimulationContext) so tests can swap in
//! scripted implementations.
mod path;
mod rng;

pub use path::{GridPathfinder, MovementProfile, Pathfinder};
pub use rng::{PcgRng, RngOracle, ScriptedRng, shuffle};
