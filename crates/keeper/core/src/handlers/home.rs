//! Beds and sleep.
use super::movement::{set_destination, start_walk};
use super::{own_building_here, path_to};
use crate::context::{Dispatch, Turn};
use crate::creature::{Creature, Home};
use crate::env::shuffle;
use crate::event::{AnimationState, PlayerNotice};
use crate::types::Position;
use crate::world::{RoomKind, World};

const MAX_AWAKENESS: f64 = 100.0;

/// Gives the creature's bed back to its dormitory.
pub(crate) fn release_home(creature: &mut Creature, world: &mut World) {
    let Some(home) = creature.home.take() else {
        return;
    };
    if let Some(dormitory) = world.building_mut(home.room) {
        dormitory.release_tile_for_sleeping(creature.id);
    }
}

pub(super) fn find_home(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if !forced && turn.creature.home.is_some() {
        turn.pop();
        return Dispatch::Loop;
    }

    let id = turn.creature.id;
    let position = turn.creature.position;
    let footprint = turn.creature.definition.bed_footprint;

    let dormitory = own_building_here(turn).filter(|b| {
        turn.world
            .building(*b)
            .is_some_and(|room| room.is_room(RoomKind::Dormitory))
    });
    if let Some(room) = dormitory {
        if turn.creature.home.is_some_and(|h| h.room == room) {
            turn.pop();
            return Dispatch::Loop;
        }
        let claimed = turn
            .world
            .building_mut(room)
            .is_some_and(|b| b.claim_tile_for_sleeping(position, id, footprint));
        if claimed {
            release_home(turn.creature, turn.world);
            turn.creature.home = Some(Home {
                room,
                tile: position,
            });
            tracing::debug!("Home: bed placed creature={}, tile={}", id, position);
            turn.pop();
            return Dispatch::Loop;
        }
        let rng = &mut *turn.ctx.rng;
        let spot = turn
            .world
            .building(room)
            .and_then(|b| b.location_for_bed(footprint, rng));
        if let Some(spot) = spot {
            if set_destination(turn, spot) {
                return Dispatch::Loop;
            }
        }
    }

    if forced || turn.creature.home.is_some() {
        turn.pop();
        return Dispatch::Loop;
    }

    let mut dormitories = turn
        .world
        .rooms_of(turn.creature.seat, RoomKind::Dormitory);
    shuffle(turn.ctx.rng, &mut dormitories);
    let mut best: Option<Vec<Position>> = None;
    for room in dormitories {
        let rng = &mut *turn.ctx.rng;
        let spot = turn
            .world
            .building(room)
            .and_then(|b| b.location_for_bed(footprint, rng));
        let Some(path) = spot.and_then(|spot| path_to(turn, spot)) else {
            continue;
        };
        if path.is_empty() || best.as_ref().is_some_and(|b| b.len() <= path.len()) {
            continue;
        }
        best = Some(path);
    }
    if let Some(path) = best {
        if start_walk(turn, path, AnimationState::Walk) {
            return Dispatch::Loop;
        }
    }

    turn.notify_player(PlayerNotice::CannotFindBed { creature: id });
    turn.pop();
    Dispatch::Loop
}

pub(super) fn sleep(turn: &mut Turn<'_, '_>) -> Dispatch {
    let Some(home) = turn.creature.home else {
        turn.pop();
        return Dispatch::Loop;
    };
    let has_bed = turn
        .world
        .building(home.room)
        .is_some_and(|b| b.bed_of(turn.creature.id).is_some());
    if !has_bed {
        turn.creature.home = None;
        turn.pop();
        return Dispatch::Loop;
    }

    if turn.creature.position != home.tile {
        if !set_destination(turn, home.tile) {
            turn.pop();
        }
        return Dispatch::Loop;
    }

    let config = turn.config();
    let creature = &mut *turn.creature;
    creature.awakeness = (creature.awakeness + config.sleep_awakeness_gain).min(MAX_AWAKENESS);
    creature.hp = (creature.hp + config.sleep_hp_gain).min(creature.max_hp);
    let rested = creature.awakeness >= MAX_AWAKENESS && creature.hp >= creature.max_hp;
    turn.set_animation(AnimationState::Sleep, true);
    if rested {
        turn.pop();
    }
    Dispatch::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::action::{Action, ActionKind};
    use crate::config::AiConfig;
    use crate::context::SimulationContext;
    use crate::creature::CreatureDefinition;
    use crate::env::{GridPathfinder, PcgRng};
    use crate::map::{Tile, TileMap};
    use crate::types::{EntityId, SeatId, Tick};
    use crate::world::{BuildingKind, Seat};

    fn dormitory_world() -> (World, EntityId) {
        let mut world = World::new(TileMap::new(6, 4, Tile::claimed(SeatId(1))));
        world.add_seat(Seat::new(SeatId(1), 1).human());
        let tiles = vec![
            Position::new(4, 1),
            Position::new(5, 1),
            Position::new(4, 2),
            Position::new(5, 2),
        ];
        let room = world
            .add_building(BuildingKind::Room(RoomKind::Dormitory), SeatId(1), tiles)
            .expect("dormitory");
        (world, room)
    }

    #[test]
    fn finds_a_bed_then_sleeps_it_off() {
        let (mut world, dormitory) = dormitory_world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(3);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature(
                "Troll1",
                SeatId(1),
                Arc::new(CreatureDefinition::fighter("Troll")),
                Position::new(4, 1),
            )
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            creature.awakeness = 99.0;
            creature.hp = creature.max_hp;
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push_forced(Action::Sleep);
            turn.push_forced(Action::FindHome { forced: false });
            assert_eq!(find_home(&mut turn, false), Dispatch::Loop);
            assert_eq!(
                turn.creature.home,
                Some(Home {
                    room: dormitory,
                    tile: Position::new(4, 1)
                })
            );
            assert_eq!(turn.creature.ai.stack.top_kind(), Some(ActionKind::Sleep));
            assert_eq!(sleep(&mut turn), Dispatch::Done);
            assert_eq!(turn.creature.ai.stack.kinds(), vec![ActionKind::Idle]);
            assert_eq!(turn.creature.awakeness, MAX_AWAKENESS);
        });
        assert!(world
            .building(dormitory)
            .is_some_and(|b| b.bed_of(id).is_some()));
    }

    #[test]
    fn no_dormitory_reports_missing_bed() {
        let mut world = World::new(TileMap::new(3, 3, Tile::claimed(SeatId(1))));
        world.add_seat(Seat::new(SeatId(1), 1).human());
        let config = AiConfig::default();
        let mut rng = PcgRng::new(3);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature(
                "Troll1",
                SeatId(1),
                Arc::new(CreatureDefinition::fighter("Troll")),
                Position::new(1, 1),
            )
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push(Action::FindHome { forced: false });
            assert_eq!(find_home(&mut turn, false), Dispatch::Loop);
            assert_eq!(turn.creature.ai.stack.kinds(), vec![ActionKind::Idle]);
        });
        assert!(ctx.events.iter().any(|e| matches!(
            e,
            crate::event::SimEvent::Notify {
                notice: PlayerNotice::CannotFindBed { .. },
                ..
            }
        )));
    }

    #[test]
    fn releasing_home_frees_the_bed() {
        let (mut world, dormitory) = dormitory_world();
        let id = world
            .spawn_creature(
                "Troll1",
                SeatId(1),
                Arc::new(CreatureDefinition::fighter("Troll")),
                Position::new(4, 1),
            )
            .expect("spawn");
        world.with_creature_out(id, |creature, world| {
            let placed = world
                .building_mut(dormitory)
                .is_some_and(|b| b.claim_tile_for_sleeping(Position::new(4, 1), id, (1, 2)));
            assert!(placed);
            creature.home = Some(Home {
                room: dormitory,
                tile: Position::new(4, 1),
            });
            release_home(creature, world);
            assert_eq!(creature.home, None);
        });
        assert!(world.building(dormitory).is_some_and(|b| b.beds().is_empty()));
    }
}
