//! Tile grid consumed by the AI: material, dig and claim state, worker locks.
//!
//! The AI only calls tile-level operations (`dig_out`, `claim_for_seat`, lock
//! counters) and reads the results; it never reshapes the grid.
mod grid;
mod tile;

pub use grid::TileMap;
pub use tile::{SeatMask, Tile, TileKind};
