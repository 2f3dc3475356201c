//! Hunger: hunting loose chickens and eating in hatcheries.
use super::movement::{set_destination, start_walk};
use super::{can_reach, path_to};
use crate::action::{Action, ActionKind};
use crate::context::{Dispatch, Turn};
use crate::event::{AnimationState, PlayerNotice, SimEvent, SoundEffect};
use crate::types::{EntityId, Position};
use crate::world::{ObjectKind, RoomKind};

/// Hunger below which even a forced meal is skipped.
const FORCED_HUNGER_MIN: f64 = 5.0;
/// Upper bound of the random hunger threshold for a voluntary meal.
const VOLUNTARY_HUNGER_ROLL: f64 = 15.0;

fn needs_to_eat(turn: &mut Turn<'_, '_>, forced: bool) -> bool {
    if forced {
        turn.creature.hunger >= FORCED_HUNGER_MIN
    } else {
        turn.creature.hunger > turn.ctx.rng.uniform(0.0, VOLUNTARY_HUNGER_ROLL)
    }
}

/// Counts down the meal cooldown. Returns true while the creature must wait.
fn cooling_down(turn: &mut Turn<'_, '_>) -> bool {
    if turn.creature.ai.eat_cooldown == 0 {
        return false;
    }
    turn.creature.ai.eat_cooldown -= 1;
    turn.set_animation(AnimationState::Idle, true);
    true
}

pub(super) fn eat(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if cooling_down(turn) {
        return Dispatch::Done;
    }
    if !needs_to_eat(turn, forced) {
        turn.pop();
        return Dispatch::Loop;
    }
    if !turn.push(Action::SearchFood { forced }) {
        // Already searched this tick and found nothing.
        turn.pop();
    }
    Dispatch::Loop
}

pub(super) fn search_food(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if !needs_to_eat(turn, forced) {
        turn.pop();
        return Dispatch::Loop;
    }

    if let Some(chicken) = closest_loose_chicken(turn) {
        turn.pop();
        turn.push_forced(Action::EatChicken {
            chicken: Some(chicken),
        });
        return Dispatch::Loop;
    }

    let seat = turn.creature.seat;
    let hatcheries = turn.world.rooms_of(seat, RoomKind::Hatchery);
    if hatcheries.is_empty() {
        turn.notify_player(PlayerNotice::CannotFindFood {
            creature: turn.creature.id,
        });
        turn.pop();
        return Dispatch::Loop;
    }

    let mut candidates: Vec<(EntityId, Position)> = hatcheries
        .into_iter()
        .filter_map(|id| turn.world.building(id))
        .filter(|b| b.has_open_creature_spot(turn.creature.id))
        .filter_map(|b| b.covered_tile(0).map(|tile| (b.id, tile)))
        .filter(|(_, tile)| can_reach(turn, *tile))
        .collect();
    if candidates.is_empty() {
        turn.notify_player(PlayerNotice::CannotFindFood {
            creature: turn.creature.id,
        });
        turn.pop();
        return Dispatch::Loop;
    }

    let hatchery = pick_hatchery(turn, &mut candidates);
    tracing::debug!(
        "Eat: heading to hatchery={}, creature={}",
        hatchery,
        turn.creature.id
    );
    turn.pop();
    turn.push_forced(Action::UseHatchery {
        hatchery: Some(hatchery),
        forced,
    });
    Dispatch::Loop
}

/// Nearest unreserved chicken in sight that roams free, or that lives in
/// the hatchery the creature is already eating in.
fn closest_loose_chicken(turn: &Turn<'_, '_>) -> Option<EntityId> {
    let position = turn.creature.position;
    let eat_room = turn.creature.eat_room;
    let in_sight = &turn.creature.visibility.tiles_in_sight;
    let mut best: Option<(i64, EntityId)> = None;
    for chicken in turn.world.objects() {
        if !matches!(chicken.kind, ObjectKind::Chicken { .. })
            || !chicken.on_map
            || chicken.carry_lock
            || !in_sight.contains(&chicken.position)
        {
            continue;
        }
        let dist = position.distance_sq(chicken.position);
        if best.is_some_and(|(best_dist, _)| best_dist <= dist) {
            continue;
        }
        let room = turn
            .world
            .building_at(chicken.position)
            .filter(|b| b.is_room(RoomKind::Hatchery))
            .map(|b| b.id);
        match (room, eat_room) {
            (Some(room), Some(eating)) if room != eating => continue,
            (Some(_), None) => continue,
            _ => {}
        }
        if !can_reach(turn, chicken.position) {
            continue;
        }
        best = Some((dist, chicken.id));
    }
    best.map(|(_, id)| id)
}

/// Inverse-distance biased pick among hatcheries.
///
/// # Formula
///
/// ```text
/// accept(room) = 1 / (max_distance - distance(room))
/// ```
///
/// Up to `hatchery_nb_try` random rooms are tried; when none is accepted the
/// last one tried is used.
fn pick_hatchery(turn: &mut Turn<'_, '_>, candidates: &mut Vec<(EntityId, Position)>) -> EntityId {
    let config = turn.config();
    let position = turn.creature.position;
    let mut tries = config.hatchery_nb_try.max(1);
    let mut chosen = candidates[0].0;
    while tries > 0 && !candidates.is_empty() {
        let (id, tile) = candidates.swap_remove(turn.ctx.rng.index(candidates.len()));
        chosen = id;
        let margin = config.hatchery_max_distance - position.crow_distance(tile);
        let accept = if margin <= 1.0 { 1.0 } else { 1.0 / margin };
        if turn.ctx.rng.chance(accept) {
            break;
        }
        tries -= 1;
    }
    chosen
}

pub(super) fn eat_chicken(turn: &mut Turn<'_, '_>, chicken: Option<EntityId>) -> Dispatch {
    if cooling_down(turn) {
        return Dispatch::Done;
    }
    let Some(id) = chicken else {
        turn.pop();
        return Dispatch::Loop;
    };
    let Some(at) = turn.world.object(id).filter(|o| o.on_map).map(|o| o.position) else {
        turn.pop();
        return Dispatch::Loop;
    };

    if turn.creature.position.distance_sq(at) > 1 {
        let Some(mut path) = path_to(turn, at).filter(|p| !p.is_empty()) else {
            tracing::debug!("Eat: chicken unreachable creature={}", turn.creature.id);
            turn.pop();
            return Dispatch::Loop;
        };
        // Chickens move; only walk most of the way before looking again.
        if path.len() > 2 {
            path.truncate(8 * path.len() / 10);
        }
        return Dispatch::from_loop(start_walk(turn, path, AnimationState::Walk));
    }

    turn.pop();
    if turn.world.remove_object(id).is_ok() {
        turn.emit(SimEvent::EntityRemoved { entity: id });
    }
    let config = turn.config();
    let creature = &mut *turn.creature;
    creature.hunger = (creature.hunger - config.chicken_hunger_decrease).max(0.0);
    creature.hp = (creature.hp + config.chicken_hp_increase).min(creature.max_hp);
    creature.ai.eat_cooldown =
        turn.ctx
            .rng
            .int(i64::from(config.eat_cooldown_min), i64::from(config.eat_cooldown_max)) as u32;
    turn.set_animation_facing(AnimationState::Eat, false, at);
    turn.emit(SimEvent::Sound {
        position: at,
        effect: SoundEffect::Eat,
    });
    tracing::debug!(
        "Eat: chicken eaten creature={}, hunger={:.1}",
        turn.creature.id,
        turn.creature.hunger
    );
    Dispatch::Done
}

pub(super) fn use_hatchery(
    turn: &mut Turn<'_, '_>,
    hatchery: Option<EntityId>,
    forced: bool,
) -> Dispatch {
    if !needs_to_eat(turn, forced) {
        turn.pop();
        return Dispatch::Loop;
    }
    let Some(id) = hatchery else {
        turn.pop();
        return Dispatch::Loop;
    };
    let Some(tiles) = turn.world.building(id).map(|b| b.tiles.clone()) else {
        turn.pop();
        return Dispatch::Loop;
    };
    if tiles.is_empty() {
        turn.pop();
        return Dispatch::Loop;
    }

    let position = turn.creature.position;
    if !tiles.contains(&position) {
        let destination = tiles[turn.ctx.rng.index(tiles.len())];
        if !set_destination(turn, destination) {
            turn.pop();
        }
        return Dispatch::Loop;
    }

    if turn.is_action_in_list(ActionKind::EatChicken) {
        return Dispatch::Done;
    }
    let chicken = turn
        .world
        .objects()
        .filter(|o| matches!(o.kind, ObjectKind::Chicken { .. }))
        .filter(|o| o.on_map && !o.carry_lock && tiles.contains(&o.position))
        .min_by_key(|o| position.distance_sq(o.position))
        .map(|o| o.id);
    match chicken {
        Some(chicken) => {
            turn.push_forced(Action::EatChicken {
                chicken: Some(chicken),
            });
            Dispatch::Loop
        }
        None => {
            turn.set_animation(AnimationState::Idle, true);
            Dispatch::Done
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AiConfig;
    use crate::context::SimulationContext;
    use crate::creature::{CreatureDefinition, compute_visibility};
    use crate::env::{GridPathfinder, PcgRng};
    use crate::map::{Tile, TileMap};
    use crate::types::{SeatId, Tick};
    use crate::world::{BuildingKind, Seat, World};

    fn world() -> World {
        let mut world = World::new(TileMap::new(6, 3, Tile::claimed(SeatId(1))));
        world.add_seat(Seat::new(SeatId(1), 1).human());
        world
    }

    fn hungry_troll(world: &mut World, at: Position) -> EntityId {
        let id = world
            .spawn_creature(
                "Troll1",
                SeatId(1),
                Arc::new(CreatureDefinition::fighter("Troll")),
                at,
            )
            .expect("spawn");
        if let Some(c) = world.creature_mut(id) {
            c.hunger = 90.0;
            c.hp = 50.0;
        }
        id
    }

    #[test]
    fn adjacent_chicken_is_eaten() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(9);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = hungry_troll(&mut world, Position::new(1, 1));
        let chicken = world.spawn_object(ObjectKind::Chicken { hatchery: None }, Position::new(2, 1));

        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push(Action::SearchFood { forced: true });
            assert_eq!(search_food(&mut turn, true), Dispatch::Loop);
            assert_eq!(
                turn.top().map(|r| r.action.clone()),
                Some(Action::EatChicken {
                    chicken: Some(chicken)
                })
            );
            assert_eq!(eat_chicken(&mut turn, Some(chicken)), Dispatch::Done);
            assert_eq!(turn.creature.hunger, 90.0 - config.chicken_hunger_decrease);
            assert_eq!(turn.creature.hp, 50.0 + config.chicken_hp_increase);
            assert!(turn.creature.ai.eat_cooldown >= config.eat_cooldown_min);
        });
        assert!(world.object(chicken).is_none());
    }

    #[test]
    fn no_hatchery_notifies_the_keeper() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(9);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = hungry_troll(&mut world, Position::new(1, 1));

        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push(Action::Eat { forced: true });
            assert_eq!(eat(&mut turn, true), Dispatch::Loop);
            assert_eq!(search_food(&mut turn, true), Dispatch::Loop);
            assert_eq!(turn.creature.ai.stack.top_kind(), Some(ActionKind::Eat));
            // The search already ran this tick, so the meal is given up.
            assert_eq!(eat(&mut turn, true), Dispatch::Loop);
            assert_eq!(turn.creature.ai.stack.kinds(), vec![ActionKind::Idle]);
        });
        assert!(ctx.events.iter().any(|e| matches!(
            e,
            SimEvent::Notify {
                notice: PlayerNotice::CannotFindFood { .. },
                ..
            }
        )));
    }

    #[test]
    fn hatchery_is_joined_and_released() {
        let mut world = world();
        let hatchery = world
            .add_building(
                BuildingKind::Room(RoomKind::Hatchery),
                SeatId(1),
                vec![Position::new(4, 1), Position::new(5, 1)],
            )
            .expect("hatchery");
        let config = AiConfig::default();
        let mut rng = PcgRng::new(9);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = hungry_troll(&mut world, Position::new(0, 1));

        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push(Action::SearchFood { forced: true });
            assert_eq!(search_food(&mut turn, true), Dispatch::Loop);
            assert_eq!(turn.creature.eat_room, Some(hatchery));
            assert!(turn.world.building(hatchery).is_some_and(|b| b.users().contains(&id)));
            turn.clear_action_queue();
            assert_eq!(turn.creature.eat_room, None);
        });
        assert!(world.building(hatchery).is_some_and(|b| b.users().is_empty()));
    }
}
