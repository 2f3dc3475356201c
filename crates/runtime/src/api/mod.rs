//! Public API surface for runtime consumers.
mod errors;
mod handle;
mod snapshot;

pub use errors::{Result, RuntimeError};
pub use handle::RuntimeHandle;
pub use snapshot::{CreatureSummary, SeatSummary, TickSummary, WorldSnapshot};
