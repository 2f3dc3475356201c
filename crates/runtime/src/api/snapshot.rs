//! Serializable views of the simulation for clients and logs.
use serde::{Deserialize, Serialize};

use keeper_core::{ActionKind, Creature, EntityId, MoodLevel, Position, SeatId, Tick, World};

use super::errors::{Result, RuntimeError};

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: Tick,
    /// Creatures whose action stack ran this tick.
    pub acted: usize,
    /// Creatures skipped, knocked out or counting down to death.
    pub idle: usize,
    pub removed: Vec<EntityId>,
    /// Creatures whose upkeep hit a structural error.
    pub errors: usize,
    pub events: usize,
    pub notifications_sent: usize,
    pub notifications_dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSummary {
    pub id: EntityId,
    pub name: String,
    pub class: String,
    pub seat: SeatId,
    pub position: Position,
    pub on_map: bool,
    pub hp: f64,
    pub max_hp: f64,
    pub level: u32,
    pub gold_carried: u32,
    pub mood: MoodLevel,
    pub current_action: Option<ActionKind>,
    pub stack_depth: usize,
}

impl From<&Creature> for CreatureSummary {
    fn from(creature: &Creature) -> Self {
        Self {
            id: creature.id,
            name: creature.name.clone(),
            class: creature.class_name().to_string(),
            seat: creature.seat,
            position: creature.position,
            on_map: creature.on_map,
            hp: creature.hp,
            max_hp: creature.max_hp,
            level: creature.level,
            gold_carried: creature.gold_carried,
            mood: creature.mood(),
            current_action: creature.ai.stack.top_kind(),
            stack_depth: creature.ai.stack.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSummary {
    pub id: SeatId,
    pub team: u8,
    pub stored_gold: u32,
    pub gold_mined: u64,
    pub creatures: usize,
}

/// Read-only picture of the world at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub creatures: Vec<CreatureSummary>,
    pub seats: Vec<SeatSummary>,
}

impl WorldSnapshot {
    pub fn capture(world: &World, tick: Tick) -> Self {
        let creatures: Vec<CreatureSummary> =
            world.creatures().map(CreatureSummary::from).collect();
        let seats = world
            .seats()
            .map(|seat| SeatSummary {
                id: seat.id,
                team: seat.team,
                stored_gold: world.seat_gold(seat.id),
                gold_mined: seat.gold_mined,
                creatures: creatures.iter().filter(|c| c.seat == seat.id).count(),
            })
            .collect();
        Self {
            tick,
            creatures,
            seats,
        }
    }

    pub fn creature(&self, id: EntityId) -> Option<&CreatureSummary> {
        self.creatures.iter().find(|c| c.id == id)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(RuntimeError::Snapshot)
    }
}
