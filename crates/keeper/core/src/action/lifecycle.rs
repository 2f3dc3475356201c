//! Acquire and release of the holds owned by live actions.
//!
//! Every push runs [`acquire`] and every pop or clear runs [`release`], so a
//! lock count always equals the number of live actions referencing the target.
use super::record::{Action, ActionRecord, FightTarget};
use crate::creature::Creature;
use crate::listener::{LifecycleEvent, ListenerHandle};
use crate::world::{World, WorkerJob};

fn handle(creature: &Creature, record: &ActionRecord) -> ListenerHandle {
    ListenerHandle {
        creature: creature.id,
        action: record.id,
    }
}

/// Takes the holds `record` needs. May rewrite the payload (e.g. to store a
/// reserved drop tile or to null a target that turned out to be gone).
pub(crate) fn acquire(record: &mut ActionRecord, creature: &mut Creature, world: &mut World) {
    let listener = handle(creature, record);

    if let Some(job) = WorkerJob::for_action(record.kind()) {
        if let Some(seat) = world.seat_mut(creature.seat) {
            seat.add_worker_job(job);
        }
    }

    match &mut record.action {
        Action::DigTile { tile, .. } => {
            if let Some(tile) = world.map.tile_mut(*tile) {
                tile.workers_digging += 1;
            }
        }
        Action::ClaimGroundTile { tile } | Action::ClaimWallTile { tile, .. } => {
            if let Some(tile) = world.map.tile_mut(*tile) {
                tile.workers_claiming += 1;
            }
        }
        Action::GrabEntity { entity } => {
            if let Some(id) = *entity {
                match world.object_mut(id) {
                    Some(object) => {
                        object.carry_lock = true;
                        world.listeners.register(id, listener);
                    }
                    None => *entity = None,
                }
            }
        }
        Action::CarryEntity {
            entity,
            building,
            drop_tile,
        } => {
            let Some(id) = *entity else {
                return;
            };
            if world.object(id).is_none() {
                *entity = None;
                return;
            }
            world.fire_lifecycle(id, LifecycleEvent::PickedUp);
            let carry_type = match world.object_mut(id) {
                Some(object) => {
                    object.carry_lock = true;
                    object.carried_by = Some(creature.id);
                    object.on_map = false;
                    object.seat = Some(creature.seat);
                    object.carry_type()
                }
                None => return,
            };
            creature.carried_entity = Some(id);
            world.listeners.register(id, listener);
            if let Some(building_id) = *building {
                match world.building_mut(building_id) {
                    Some(target) => {
                        *drop_tile = target.ask_spot_for_carried_entity(carry_type);
                        world.listeners.register(building_id, listener);
                    }
                    None => *building = None,
                }
            }
        }
        Action::UseRoom { room, .. } => {
            if let Some(id) = *room {
                let joined = world
                    .building_mut(id)
                    .is_some_and(|target| target.add_creature_using_room(creature.id));
                if joined {
                    creature.job_room = Some(id);
                    world.listeners.register(id, listener);
                } else {
                    *room = None;
                }
            }
        }
        Action::UseHatchery { hatchery, .. } => {
            if let Some(id) = *hatchery {
                let joined = world
                    .building_mut(id)
                    .is_some_and(|target| target.add_creature_using_room(creature.id));
                if joined {
                    creature.eat_room = Some(id);
                    world.listeners.register(id, listener);
                } else {
                    *hatchery = None;
                }
            }
        }
        Action::EatChicken { chicken } => {
            if let Some(id) = *chicken {
                match world.object_mut(id) {
                    Some(object) => {
                        object.carry_lock = true;
                        world.listeners.register(id, listener);
                    }
                    None => *chicken = None,
                }
            }
        }
        Action::Fight {
            target: FightTarget::Specific(id),
            ..
        }
        | Action::FightArena { opponent: Some(id) } => {
            world.listeners.register(*id, listener);
        }
        _ => {}
    }
}

/// Releases every action of `creature` and reseeds a single Idle.
pub(crate) fn clear_stack(creature: &mut Creature, world: &mut World) {
    for record in creature.ai.stack.drain() {
        release(&record, creature, world);
    }
    creature.walk_path.clear();
    creature.ai.stack.insert(Action::Idle);
}

/// Gives back every hold `record` owns. Safe to call on any payload state.
pub(crate) fn release(record: &ActionRecord, creature: &mut Creature, world: &mut World) {
    let listener = handle(creature, record);

    if let Some(job) = WorkerJob::for_action(record.kind()) {
        if let Some(seat) = world.seat_mut(creature.seat) {
            seat.remove_worker_job(job);
        }
    }

    match &record.action {
        Action::DigTile { tile, .. } => {
            if let Some(tile) = world.map.tile_mut(*tile) {
                tile.workers_digging = tile.workers_digging.saturating_sub(1);
            }
        }
        Action::ClaimGroundTile { tile } | Action::ClaimWallTile { tile, .. } => {
            if let Some(tile) = world.map.tile_mut(*tile) {
                tile.workers_claiming = tile.workers_claiming.saturating_sub(1);
            }
        }
        Action::GrabEntity { entity: Some(id) } | Action::EatChicken { chicken: Some(id) } => {
            if let Some(object) = world.object_mut(*id) {
                if object.carried_by.is_none() {
                    object.carry_lock = false;
                }
            }
        }
        Action::CarryEntity {
            entity,
            building,
            drop_tile,
        } => {
            if let (Some(building_id), Some(spot)) = (building, drop_tile) {
                if let Some(target) = world.building_mut(*building_id) {
                    target.release_carried_spot(*spot);
                }
            }
            if let Some(id) = *entity {
                if let Some(object) = world.object_mut(id) {
                    object.carry_lock = false;
                    object.carried_by = None;
                    object.on_map = true;
                    object.position = creature.position;
                }
                world.listeners.unregister_action(listener);
                world.fire_lifecycle(id, LifecycleEvent::Dropped);
                if let Some(building_id) = *building {
                    world.building_receive_carried(building_id, id);
                }
            }
            creature.carried_entity = None;
        }
        Action::UseRoom { room, .. } => {
            if let Some(id) = room {
                if let Some(target) = world.building_mut(*id) {
                    target.remove_creature_using_room(creature.id);
                }
            }
            creature.job_room = None;
        }
        Action::UseHatchery { hatchery, .. } => {
            if let Some(id) = hatchery {
                if let Some(target) = world.building_mut(*id) {
                    target.remove_creature_using_room(creature.id);
                }
            }
            creature.eat_room = None;
        }
        _ => {}
    }

    world.listeners.unregister_action(listener);
}
