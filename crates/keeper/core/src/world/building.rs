//! Rooms and traps, reduced to the contract the creature AI consumes.
use std::collections::BTreeMap;

use super::object::EntityCarryType;
use crate::env::{RngOracle, shuffle};
use crate::types::{EntityId, Position, SeatId};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RoomKind {
    Treasury,
    Dormitory,
    Hatchery,
    Portal,
    DungeonTemple,
    TrainingHall,
    Library,
    Workshop,
    Arena,
    Crypt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuildingKind {
    Room(RoomKind),
    Trap { armed: bool },
}

impl BuildingKind {
    pub fn room(&self) -> Option<RoomKind> {
        match self {
            Self::Room(kind) => Some(*kind),
            Self::Trap { .. } => None,
        }
    }
}

/// A bed placed in a dormitory.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bed {
    /// Top-left tile of the footprint; the owner's home tile.
    pub anchor: Position,
    pub tiles: Vec<Position>,
    pub owner: EntityId,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Building {
    pub id: EntityId,
    pub kind: BuildingKind,
    pub seat: SeatId,
    pub tiles: Vec<Position>,
    pub hp: f64,
    pub max_users: usize,
    users: Vec<EntityId>,
    gold: BTreeMap<Position, u32>,
    beds: Vec<Bed>,
    reserved_spots: Vec<Position>,
}

impl Building {
    pub const MAX_GOLD_PER_TILE: u32 = 5000;
    pub const DEFAULT_HP: f64 = 100.0;

    pub fn new(id: EntityId, kind: BuildingKind, seat: SeatId, tiles: Vec<Position>) -> Self {
        let max_users = match kind {
            BuildingKind::Room(RoomKind::Arena) => 2,
            BuildingKind::Room(_) => tiles.len(),
            BuildingKind::Trap { .. } => 0,
        };
        let gold = match kind {
            BuildingKind::Room(RoomKind::Treasury) => tiles.iter().map(|t| (*t, 0)).collect(),
            _ => BTreeMap::new(),
        };
        Self {
            id,
            kind,
            seat,
            tiles,
            hp: Self::DEFAULT_HP,
            max_users,
            users: Vec::new(),
            gold,
            beds: Vec::new(),
            reserved_spots: Vec::new(),
        }
    }

    pub fn room_kind(&self) -> Option<RoomKind> {
        self.kind.room()
    }

    pub fn is_room(&self, kind: RoomKind) -> bool {
        self.room_kind() == Some(kind)
    }

    pub fn covers(&self, position: Position) -> bool {
        self.tiles.contains(&position)
    }

    pub fn covered_tile(&self, index: usize) -> Option<Position> {
        self.tiles.get(index).copied()
    }

    pub fn num_covered_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Covered tile closest to the footprint's centroid.
    pub fn central_tile(&self) -> Option<Position> {
        if self.tiles.is_empty() {
            return None;
        }
        let n = self.tiles.len() as i64;
        let cx = self.tiles.iter().map(|p| i64::from(p.x)).sum::<i64>() / n;
        let cy = self.tiles.iter().map(|p| i64::from(p.y)).sum::<i64>() / n;
        let centroid = Position::new(cx as i32, cy as i32);
        self.tiles
            .iter()
            .copied()
            .min_by_key(|p| p.distance_sq(centroid))
    }

    // ========================================================================
    // Creature slots
    // ========================================================================

    pub fn has_open_creature_spot(&self, creature: EntityId) -> bool {
        self.users.contains(&creature) || self.users.len() < self.max_users
    }

    /// Adds `creature` to the users. Returns false if the room is full.
    pub fn add_creature_using_room(&mut self, creature: EntityId) -> bool {
        if self.users.contains(&creature) {
            return true;
        }
        if self.users.len() >= self.max_users {
            return false;
        }
        self.users.push(creature);
        true
    }

    pub fn remove_creature_using_room(&mut self, creature: EntityId) {
        self.users.retain(|c| *c != creature);
    }

    pub fn users(&self) -> &[EntityId] {
        &self.users
    }

    // ========================================================================
    // Carried entities
    // ========================================================================

    pub fn has_carry_entity_spot(&self, carry: EntityCarryType) -> bool {
        match (self.kind, carry) {
            (BuildingKind::Room(RoomKind::Treasury), EntityCarryType::Gold) => {
                self.empty_storage_space() > 0
            }
            (BuildingKind::Room(RoomKind::Crypt), EntityCarryType::Corpse)
            | (BuildingKind::Room(RoomKind::Library), EntityCarryType::ResearchScroll) => {
                self.reserved_spots.len() < self.tiles.len()
            }
            (BuildingKind::Trap { armed: false }, EntityCarryType::CraftedTrap) => {
                self.reserved_spots.is_empty()
            }
            _ => false,
        }
    }

    /// Reserves a drop tile for an entity on its way here.
    ///
    /// Prefers a tile nobody else is heading to; treasuries accept several
    /// carriers on the same tile.
    pub fn ask_spot_for_carried_entity(&mut self, carry: EntityCarryType) -> Option<Position> {
        if !self.has_carry_entity_spot(carry) {
            return None;
        }
        let spot = self
            .tiles
            .iter()
            .copied()
            .find(|t| !self.reserved_spots.contains(t))
            .or_else(|| self.tiles.first().copied())?;
        self.reserved_spots.push(spot);
        Some(spot)
    }

    pub fn release_carried_spot(&mut self, spot: Position) {
        if let Some(idx) = self.reserved_spots.iter().position(|p| *p == spot) {
            self.reserved_spots.swap_remove(idx);
        }
    }

    pub fn reserved_spots(&self) -> &[Position] {
        &self.reserved_spots
    }

    // ========================================================================
    // Treasury
    // ========================================================================

    pub fn total_gold_storage(&self) -> u32 {
        self.gold.len() as u32 * Self::MAX_GOLD_PER_TILE
    }

    pub fn stored_gold(&self) -> u32 {
        self.gold.values().sum()
    }

    pub fn empty_storage_space(&self) -> u32 {
        self.total_gold_storage().saturating_sub(self.stored_gold())
    }

    /// Stores up to `amount`, starting with `tile`. Returns the amount deposited.
    pub fn deposit_gold(&mut self, amount: u32, tile: Position) -> u32 {
        let mut remaining = amount;
        if let Some(stored) = self.gold.get_mut(&tile) {
            let put = remaining.min(Self::MAX_GOLD_PER_TILE - *stored);
            *stored += put;
            remaining -= put;
        }
        for stored in self.gold.values_mut() {
            if remaining == 0 {
                break;
            }
            let put = remaining.min(Self::MAX_GOLD_PER_TILE - *stored);
            *stored += put;
            remaining -= put;
        }
        amount - remaining
    }

    /// Takes up to `amount` out of storage. Returns the amount withdrawn.
    pub fn withdraw_gold(&mut self, amount: u32) -> u32 {
        let mut taken = 0;
        for stored in self.gold.values_mut() {
            let take = (amount - taken).min(*stored);
            *stored -= take;
            taken += take;
            if taken == amount {
                break;
            }
        }
        taken
    }

    // ========================================================================
    // Dormitory
    // ========================================================================

    fn bed_footprint(anchor: Position, w: u32, h: u32) -> Vec<Position> {
        let mut tiles = Vec::with_capacity((w * h) as usize);
        for dy in 0..h as i32 {
            for dx in 0..w as i32 {
                tiles.push(anchor.offset(dx, dy));
            }
        }
        tiles
    }

    fn is_open_for_bed(&self, tile: Position) -> bool {
        self.covers(tile) && !self.beds.iter().any(|b| b.tiles.contains(&tile))
    }

    fn tile_can_accept_bed(&self, anchor: Position, w: u32, h: u32) -> bool {
        Self::bed_footprint(anchor, w, h)
            .into_iter()
            .all(|t| self.is_open_for_bed(t))
    }

    pub fn bed_of(&self, creature: EntityId) -> Option<&Bed> {
        self.beds.iter().find(|b| b.owner == creature)
    }

    /// Places a bed for `creature` anchored at `tile`, trying both orientations.
    pub fn claim_tile_for_sleeping(
        &mut self,
        tile: Position,
        creature: EntityId,
        footprint: (u32, u32),
    ) -> bool {
        if !self.is_room(RoomKind::Dormitory) {
            return false;
        }
        let (a, b) = footprint;
        let dims = if self.tile_can_accept_bed(tile, a, b) {
            (a, b)
        } else if self.tile_can_accept_bed(tile, b, a) {
            (b, a)
        } else {
            return false;
        };
        self.beds.push(Bed {
            anchor: tile,
            tiles: Self::bed_footprint(tile, dims.0, dims.1),
            owner: creature,
        });
        true
    }

    pub fn release_tile_for_sleeping(&mut self, creature: EntityId) -> bool {
        let before = self.beds.len();
        self.beds.retain(|b| b.owner != creature);
        before != self.beds.len()
    }

    /// Random open tile able to hold a bed of the given footprint.
    pub fn location_for_bed(
        &self,
        footprint: (u32, u32),
        rng: &mut dyn RngOracle,
    ) -> Option<Position> {
        let (a, b) = footprint;
        let mut open: Vec<Position> = self
            .tiles
            .iter()
            .copied()
            .filter(|t| self.is_open_for_bed(*t))
            .collect();
        if open.len() < (a * b) as usize {
            return None;
        }
        shuffle(rng, &mut open);
        open.into_iter()
            .find(|t| self.tile_can_accept_bed(*t, a, b) || self.tile_can_accept_bed(*t, b, a))
    }

    pub fn beds(&self) -> &[Bed] {
        &self.beds
    }
}
