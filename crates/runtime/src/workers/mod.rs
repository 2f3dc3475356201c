//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker owns the authoritative world and advances it tick by
//! tick on request.

mod economy;
mod simulation;

pub use simulation::{Command, SimulationWorker};
