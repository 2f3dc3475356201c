//! Server-authoritative creature AI for a dungeon-keeper simulation.
//!
//! `keeper-core` owns the per-creature action stacks, the per-action handlers
//! and the per-tick upkeep driver. It performs no I/O: randomness and
//! pathfinding are injected through [`SimulationContext`] and every side effect
//! (animations, sounds, notifications, chat) is emitted as a [`SimEvent`]. All
//! creature state mutation flows through [`driver::do_upkeep`].
pub mod action;
pub mod combat;
pub mod config;
pub mod context;
pub mod creature;
pub mod driver;
pub mod env;
pub mod error;
pub mod event;
pub mod handlers;
pub mod listener;
pub mod map;
pub mod types;
pub mod world;

pub use action::{Action, ActionKind, ActionRecord, ActionStack, FightTarget};
pub use config::AiConfig;
pub use context::{Dispatch, SimulationContext, Turn};
pub use creature::{
    BaseStats, Creature, CreatureDefinition, Home, LevelGains, MoodLevel, MoodModifier,
    RoomAffinity, Visibility,
};
pub use driver::{UpkeepOutcome, decide_priority_action, do_upkeep};
pub use env::{GridPathfinder, MovementProfile, Pathfinder, PcgRng, RngOracle, ScriptedRng};
pub use error::{ErrorContext, ErrorSeverity, GameError, UpkeepError, WorldError};
pub use event::{AnimationState, PlayerNotice, SimEvent, SoundEffect};
pub use listener::{LifecycleEvent, ListenerHandle, ListenerRegistry};
pub use map::{SeatMask, Tile, TileKind, TileMap};
pub use types::{ActionId, EntityId, Position, SeatId, Tick};
pub use world::{
    Attackable, Building, BuildingKind, EntityCarryType, MapObject, ObjectKind, RoomKind, Seat,
    World,
};
