//! Entity arena owning every creature, object, building and seat.
//!
//! Entities are addressed by [`EntityId`]; ids are never reused, so a stale id
//! simply fails to resolve. Actions reference entities by id and learn about
//! their invalidation through the [`ListenerRegistry`].
mod building;
mod object;
mod seat;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use building::{Bed, Building, BuildingKind, RoomKind};
pub use object::{EntityCarryType, MapObject, ObjectKind};
pub use seat::{Seat, WorkerJob};

use crate::action::lifecycle::clear_stack;
use crate::creature::{Creature, CreatureDefinition};
use crate::error::WorldError;
use crate::listener::{LifecycleEvent, ListenerHandle, ListenerRegistry};
use crate::map::TileMap;
use crate::types::{EntityId, Position, SeatId};

/// Something a creature can attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attackable {
    Creature(EntityId),
    Building(EntityId),
}

impl Attackable {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Creature(id) | Self::Building(id) => *id,
        }
    }
}

/// A lifecycle event addressed to a creature that was checked out when it fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingDelivery {
    pub handle: ListenerHandle,
    pub entity: EntityId,
    pub event: LifecycleEvent,
}

#[derive(Clone, Debug)]
pub struct World {
    pub map: TileMap,
    creatures: BTreeMap<EntityId, Creature>,
    objects: BTreeMap<EntityId, MapObject>,
    buildings: BTreeMap<EntityId, Building>,
    seats: BTreeMap<SeatId, Seat>,
    pub listeners: ListenerRegistry,
    pending: Vec<PendingDelivery>,
    next_id: u32,
    /// Seat that furious creatures defect to.
    pub rogue_seat: Option<SeatId>,
}

impl World {
    pub fn new(map: TileMap) -> Self {
        Self {
            map,
            creatures: BTreeMap::new(),
            objects: BTreeMap::new(),
            buildings: BTreeMap::new(),
            seats: BTreeMap::new(),
            listeners: ListenerRegistry::new(),
            pending: Vec::new(),
            next_id: 1,
            rogue_seat: None,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    // ========================================================================
    // Seats
    // ========================================================================

    pub fn add_seat(&mut self, seat: Seat) {
        self.seats.insert(seat.id, seat);
    }

    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats.get(&id)
    }

    pub fn seat_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        self.seats.get_mut(&id)
    }

    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.values()
    }

    /// Seats on different teams are enemies; the rogue seat is everyone's enemy.
    pub fn are_enemies(&self, a: SeatId, b: SeatId) -> bool {
        if a == b {
            return false;
        }
        if self.rogue_seat == Some(a) || self.rogue_seat == Some(b) {
            return true;
        }
        match (self.seats.get(&a), self.seats.get(&b)) {
            (Some(sa), Some(sb)) => !sa.is_ally(sb),
            _ => true,
        }
    }

    pub fn is_human_seat(&self, seat: SeatId) -> bool {
        self.seat(seat).is_some_and(|s| s.is_human)
    }

    // ========================================================================
    // Creatures
    // ========================================================================

    pub fn spawn_creature(
        &mut self,
        name: impl Into<String>,
        seat: SeatId,
        definition: Arc<CreatureDefinition>,
        position: Position,
    ) -> Result<EntityId, WorldError> {
        if !self.map.is_passable(position, definition_profile(&definition)) {
            return Err(if self.map.contains(position) {
                WorldError::NotPassable { position }
            } else {
                WorldError::OutOfBounds { position }
            });
        }
        let id = self.allocate_id();
        let creature = Creature::new(id, name, seat, definition, position);
        self.creatures.insert(id, creature);
        tracing::debug!("World: spawned creature id={}, seat={}, at={}", id, seat, position);
        Ok(id)
    }

    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn creature_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Ids of every creature currently in the arena, ascending.
    pub fn creature_ids(&self) -> Vec<EntityId> {
        self.creatures.keys().copied().collect()
    }

    /// Takes `id` out of the arena while `f` runs with mutable access to both.
    ///
    /// Lifecycle events for the checked-out creature are queued and delivered
    /// once `f` returns. The creature is put back unless it was marked removed.
    pub fn with_creature_out<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut Creature, &mut World) -> R,
    ) -> Option<R> {
        let mut creature = self.creatures.remove(&id)?;
        let result = f(&mut creature, self);
        self.deliver_pending(&mut creature);
        if creature.removed {
            self.pending.retain(|p| p.handle.creature != id);
        } else {
            self.creatures.insert(id, creature);
        }
        Some(result)
    }

    /// Fires `Dead` then `RemovedFromMap` for a creature that is leaving the world.
    ///
    /// The creature must already be checked out and flagged `removed`.
    pub fn retire_creature(&mut self, creature: &mut Creature) {
        creature.removed = true;
        creature.on_map = false;
        self.fire_lifecycle(creature.id, LifecycleEvent::Dead);
        self.fire_lifecycle(creature.id, LifecycleEvent::RemovedFromMap);
        self.listeners.forget_entity(creature.id);
        tracing::debug!("World: creature removed id={}", creature.id);
    }

    /// Lifts a creature off the map into its owner's hand, dropping everything it was doing.
    pub fn pick_up_creature(&mut self, id: EntityId) -> Result<(), WorldError> {
        self.with_creature_out(id, |creature, world| {
            if !creature.on_map {
                return Err(WorldError::NotOnMap { id });
            }
            clear_stack(creature, world);
            creature.on_map = false;
            world.fire_lifecycle(id, LifecycleEvent::PickedUp);
            tracing::debug!("World: creature picked up id={}", id);
            Ok(())
        })
        .ok_or(WorldError::CreatureNotFound { id })?
    }

    /// Puts a held creature back on the map. A dropped worker inspects its
    /// surroundings on its next idle turn.
    pub fn drop_creature(&mut self, id: EntityId, position: Position) -> Result<(), WorldError> {
        self.with_creature_out(id, |creature, world| {
            if !world.map.contains(position) {
                return Err(WorldError::OutOfBounds { position });
            }
            if !world.map.is_passable(position, creature.movement_profile()) {
                return Err(WorldError::NotPassable { position });
            }
            creature.position = position;
            creature.on_map = true;
            creature.ai.forced_drop = creature.is_worker();
            world.fire_lifecycle(id, LifecycleEvent::Dropped);
            tracing::debug!("World: creature dropped id={}, at={}", id, position);
            Ok(())
        })
        .ok_or(WorldError::CreatureNotFound { id })?
    }

    // ========================================================================
    // Buildings
    // ========================================================================

    pub fn add_building(
        &mut self,
        kind: BuildingKind,
        seat: SeatId,
        tiles: Vec<Position>,
    ) -> Result<EntityId, WorldError> {
        if let Some(position) = tiles.iter().copied().find(|p| !self.map.contains(*p)) {
            return Err(WorldError::OutOfBounds { position });
        }
        let id = self.allocate_id();
        for position in &tiles {
            if let Some(tile) = self.map.tile_mut(*position) {
                tile.building = Some(id);
            }
        }
        self.buildings
            .insert(id, Building::new(id, kind, seat, tiles));
        Ok(id)
    }

    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    pub fn building_mut(&mut self, id: EntityId) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn building_at(&self, position: Position) -> Option<&Building> {
        let id = self.map.tile(position)?.building?;
        self.buildings.get(&id)
    }

    /// Rooms of `kind` owned by `seat`, ascending id.
    pub fn rooms_of(&self, seat: SeatId, kind: RoomKind) -> Vec<EntityId> {
        self.buildings
            .values()
            .filter(|b| b.seat == seat && b.is_room(kind))
            .map(|b| b.id)
            .collect()
    }

    pub fn remove_building(&mut self, id: EntityId) -> Result<Building, WorldError> {
        if !self.buildings.contains_key(&id) {
            return Err(WorldError::BuildingNotFound { id });
        }
        self.fire_lifecycle(id, LifecycleEvent::Dead);
        self.fire_lifecycle(id, LifecycleEvent::RemovedFromMap);
        self.listeners.forget_entity(id);
        let building = self
            .buildings
            .remove(&id)
            .ok_or(WorldError::BuildingNotFound { id })?;
        for position in &building.tiles {
            if let Some(tile) = self.map.tile_mut(*position) {
                tile.building = None;
            }
        }
        Ok(building)
    }

    /// Gold stored in every treasury of `seat`.
    pub fn seat_gold(&self, seat: SeatId) -> u32 {
        self.buildings
            .values()
            .filter(|b| b.seat == seat && b.is_room(RoomKind::Treasury))
            .map(Building::stored_gold)
            .sum()
    }

    // ========================================================================
    // Map objects
    // ========================================================================

    pub fn spawn_object(&mut self, kind: ObjectKind, position: Position) -> EntityId {
        let id = self.allocate_id();
        self.objects.insert(id, MapObject::new(id, kind, position));
        id
    }

    pub fn object(&self, id: EntityId) -> Option<&MapObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: EntityId) -> Option<&mut MapObject> {
        self.objects.get_mut(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &MapObject> {
        self.objects.values()
    }

    pub fn objects_at(&self, position: Position) -> Vec<EntityId> {
        self.objects
            .values()
            .filter(|o| o.on_map && o.position == position)
            .map(|o| o.id)
            .collect()
    }

    pub fn remove_object(&mut self, id: EntityId) -> Result<MapObject, WorldError> {
        if !self.objects.contains_key(&id) {
            return Err(WorldError::EntityNotFound { id });
        }
        self.fire_lifecycle(id, LifecycleEvent::RemovedFromMap);
        self.listeners.forget_entity(id);
        self.objects
            .remove(&id)
            .ok_or(WorldError::EntityNotFound { id })
    }

    /// Lets `building` absorb an object dropped on one of its tiles.
    ///
    /// Returns true when the object was consumed, fully or in part.
    pub fn building_receive_carried(&mut self, building: EntityId, object: EntityId) -> bool {
        let Some(obj) = self.objects.get(&object) else {
            return false;
        };
        let (kind, position) = (obj.kind, obj.position);
        let Some(target) = self.buildings.get_mut(&building) else {
            return false;
        };
        if !target.covers(position) {
            return false;
        }
        let seat = target.seat;
        let consumed = match (target.kind, kind) {
            (BuildingKind::Room(RoomKind::Treasury), ObjectKind::TreasuryGold { amount }) => {
                let deposited = target.deposit_gold(amount, position);
                if deposited < amount {
                    if let Some(obj) = self.objects.get_mut(&object) {
                        obj.kind = ObjectKind::TreasuryGold {
                            amount: amount - deposited,
                        };
                    }
                    return deposited > 0;
                }
                true
            }
            (BuildingKind::Room(RoomKind::Crypt), ObjectKind::Corpse) => true,
            (BuildingKind::Room(RoomKind::Library), ObjectKind::ResearchScroll { points }) => {
                if let Some(seat) = self.seats.get_mut(&seat) {
                    seat.research_points += u64::from(points);
                }
                true
            }
            (BuildingKind::Trap { armed: false }, ObjectKind::CraftedTrap) => {
                target.kind = BuildingKind::Trap { armed: true };
                true
            }
            _ => false,
        };
        if consumed {
            let _ = self.remove_object(object);
        }
        consumed
    }

    // ========================================================================
    // Lifecycle notifications
    // ========================================================================

    /// Notifies every listener of `entity`.
    ///
    /// Listeners on creatures in the arena are notified immediately; those on a
    /// checked-out creature are queued until it is put back.
    pub fn fire_lifecycle(&mut self, entity: EntityId, event: LifecycleEvent) {
        for handle in self.listeners.handles_for(entity) {
            match self.creatures.get_mut(&handle.creature) {
                Some(creature) => {
                    if !creature.ai.stack.notify(handle.action, entity, event) {
                        self.listeners.unregister(entity, handle);
                    }
                }
                None => self.pending.push(PendingDelivery {
                    handle,
                    entity,
                    event,
                }),
            }
        }
    }

    /// Hands queued lifecycle events to `creature`.
    pub fn deliver_pending(&mut self, creature: &mut Creature) {
        if self.pending.is_empty() {
            return;
        }
        let (mine, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| p.handle.creature == creature.id);
        self.pending = rest;
        for delivery in mine {
            if !creature
                .ai
                .stack
                .notify(delivery.handle.action, delivery.entity, delivery.event)
            {
                self.listeners.unregister(delivery.entity, delivery.handle);
            }
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn definition_profile(definition: &CreatureDefinition) -> crate::env::MovementProfile {
    crate::env::MovementProfile::from_speeds(
        definition.base.ground_speed,
        definition.base.water_speed,
        definition.base.lava_speed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Tile, TileKind};

    fn world() -> World {
        let mut world = World::new(TileMap::new(6, 6, Tile::floor(TileKind::Dirt)));
        world.add_seat(Seat::new(SeatId(1), 1));
        world.add_seat(Seat::new(SeatId(2), 2));
        world
    }

    #[test]
    fn ids_are_never_reused() {
        let mut world = world();
        let a = world.spawn_object(ObjectKind::Corpse, Position::ORIGIN);
        world.remove_object(a).expect("present");
        let b = world.spawn_object(ObjectKind::Corpse, Position::ORIGIN);
        assert_ne!(a, b);
        assert!(world.object(a).is_none());
    }

    #[test]
    fn treasury_absorbs_gold_dropped_inside() {
        let mut world = world();
        let treasury = world
            .add_building(
                BuildingKind::Room(RoomKind::Treasury),
                SeatId(1),
                vec![Position::new(1, 1)],
            )
            .expect("in bounds");
        let outside = world.spawn_object(ObjectKind::TreasuryGold { amount: 300 }, Position::ORIGIN);
        assert!(!world.building_receive_carried(treasury, outside));
        let inside =
            world.spawn_object(ObjectKind::TreasuryGold { amount: 300 }, Position::new(1, 1));
        assert!(world.building_receive_carried(treasury, inside));
        assert!(world.object(inside).is_none());
        assert_eq!(world.seat_gold(SeatId(1)), 300);
    }

    #[test]
    fn teams_decide_enmity() {
        let mut world = world();
        world.add_seat(Seat::new(SeatId(3), 1));
        assert!(world.are_enemies(SeatId(1), SeatId(2)));
        assert!(!world.are_enemies(SeatId(1), SeatId(3)));
        world.rogue_seat = Some(SeatId(3));
        assert!(world.are_enemies(SeatId(1), SeatId(3)));
    }

    #[test]
    fn spawning_inside_a_wall_is_rejected() {
        let mut world = world();
        world.map.set_tile(Position::new(2, 2), Tile::wall(TileKind::Dirt));
        let def = Arc::new(CreatureDefinition::worker("Kobold"));
        assert_eq!(
            world.spawn_creature("k", SeatId(1), def.clone(), Position::new(2, 2)),
            Err(WorldError::NotPassable {
                position: Position::new(2, 2)
            })
        );
        assert!(matches!(
            world.spawn_creature("k", SeatId(1), def, Position::new(9, 9)),
            Err(WorldError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn dropped_worker_is_flagged_for_inspection() {
        let mut world = world();
        let def = Arc::new(CreatureDefinition::worker("Kobold"));
        let id = world
            .spawn_creature("k", SeatId(1), def, Position::new(1, 1))
            .expect("spawn");
        world.pick_up_creature(id).expect("on map");
        assert_eq!(
            world.pick_up_creature(id),
            Err(WorldError::NotOnMap { id })
        );
        world.drop_creature(id, Position::new(4, 4)).expect("floor");
        let kobold = world.creature(id).expect("kept");
        assert!(kobold.on_map && kobold.ai.forced_drop);
        assert_eq!(kobold.position, Position::new(4, 4));
        assert_eq!(kobold.ai.stack.len(), 1);
    }
}
