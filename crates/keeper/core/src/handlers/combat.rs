//! Fighting, attacking and fleeing.
use super::movement::{start_walk, wander_randomly};
use crate::action::{Action, FightTarget};
use crate::combat::{self, emit_attack_sound};
use crate::context::{Dispatch, Turn};
use crate::env::shuffle;
use crate::event::AnimationState;
use crate::types::{EntityId, Position};
use crate::world::{Attackable, RoomKind};

/// Where a creature attacks `target` from.
struct Approach {
    target: Attackable,
    /// Tiles left to walk; empty when already in range.
    path: Vec<Position>,
    /// Target tile closest to where the attacker will stand.
    target_tile: Position,
}

/// Tiles an attackable currently occupies.
fn target_tiles(turn: &Turn<'_, '_>, target: Attackable) -> Vec<Position> {
    match target {
        Attackable::Creature(id) => turn
            .world
            .creature(id)
            .filter(|c| c.on_map && c.is_alive() && !c.is_ko())
            .map(|c| vec![c.position])
            .unwrap_or_default(),
        Attackable::Building(id) => turn
            .world
            .building(id)
            .map(|b| b.tiles.clone())
            .unwrap_or_default(),
    }
}

/// Target with the shortest walk to a fighting position; the first wins on ties.
fn closest_target(turn: &Turn<'_, '_>, targets: &[Attackable]) -> Option<Approach> {
    let profile = turn.creature.movement_profile();
    let mut best: Option<Approach> = None;
    for target in targets {
        let tiles = target_tiles(turn, *target);
        if tiles.is_empty() {
            continue;
        }
        let Some(path) = turn.ctx.pathfinder.path_to_best_fighting_position(
            &turn.world.map,
            profile,
            turn.creature.position,
            &tiles,
            turn.creature.attack_range,
        ) else {
            continue;
        };
        if best.as_ref().is_some_and(|b| b.path.len() <= path.len()) {
            continue;
        }
        let stand = path.last().copied().unwrap_or(turn.creature.position);
        let Some(target_tile) = tiles.iter().copied().min_by_key(|t| t.distance_sq(stand)) else {
            continue;
        };
        best = Some(Approach {
            target: *target,
            path,
            target_tile,
        });
    }
    best
}

/// Attacks from here or walks a short burst toward the fighting position.
fn engage(turn: &mut Turn<'_, '_>, approach: Approach, ko: bool) -> Dispatch {
    if approach.path.is_empty() {
        turn.push_forced(Action::AttackObject {
            target: approach.target,
            target_tile: approach.target_tile,
            ko,
        });
        return Dispatch::Loop;
    }
    let mut path = approach.path;
    path.truncate(turn.config().fight_walk_burst.max(1));
    if start_walk(turn, path, AnimationState::Walk) {
        Dispatch::Loop
    } else {
        Dispatch::Done
    }
}

pub(super) fn fight(turn: &mut Turn<'_, '_>, target: FightTarget, ko: bool) -> Dispatch {
    let (primary, secondary): (Vec<Attackable>, Vec<Attackable>) = match target {
        FightTarget::Lost => {
            turn.pop();
            return Dispatch::Loop;
        }
        FightTarget::Specific(id) => {
            if target_tiles(turn, Attackable::Creature(id)).is_empty() {
                turn.pop();
                return Dispatch::Loop;
            }
            (vec![Attackable::Creature(id)], Vec::new())
        }
        FightTarget::Any => {
            let vis = &turn.creature.visibility;
            if vis.visible_enemies.is_empty() {
                turn.pop();
                return Dispatch::Loop;
            }
            let primary = vis
                .reachable_enemy_creatures
                .iter()
                .map(|id| Attackable::Creature(*id))
                .collect();
            let secondary = if turn.creature.is_worker() {
                Vec::new()
            } else {
                vis.reachable_enemies
                    .iter()
                    .copied()
                    .filter(|t| matches!(t, Attackable::Building(_)))
                    .collect()
            };
            (primary, secondary)
        }
    };

    for targets in [&primary, &secondary] {
        if let Some(approach) = closest_target(turn, targets) {
            return engage(turn, approach, ko);
        }
    }

    tracing::debug!("Fight: no target left creature={}", turn.creature.id);
    turn.pop();
    Dispatch::Loop
}

pub(super) fn fight_arena(turn: &mut Turn<'_, '_>, opponent: Option<EntityId>) -> Dispatch {
    let Some(opponent) = opponent else {
        turn.pop();
        return Dispatch::Loop;
    };
    match closest_target(turn, &[Attackable::Creature(opponent)]) {
        Some(approach) => engage(turn, approach, true),
        None => {
            turn.pop();
            Dispatch::Loop
        }
    }
}

pub(super) fn attack_object(
    turn: &mut Turn<'_, '_>,
    target: Attackable,
    target_tile: Position,
    ko: bool,
) -> Dispatch {
    // Targeting is re-derived by the fight on every attack.
    turn.pop();
    if turn.creature.attack_warmup > 0 {
        return Dispatch::Done;
    }

    let distance = turn.creature.position.crow_distance(target_tile);
    let roll = combat::roll_damage(turn.ctx.rng, turn.creature, distance);
    let outcome = match target {
        Attackable::Creature(id) => {
            if target_tiles(turn, target).is_empty() {
                return Dispatch::Loop;
            }
            combat::strike_creature(turn, id, roll, ko)
        }
        Attackable::Building(id) => combat::strike_building(turn, id, roll),
    };
    let Some(outcome) = outcome else {
        return Dispatch::Loop;
    };

    let exp = combat::attack_experience(outcome.damage, turn.creature.level, outcome.victim_level);
    turn.creature.receive_exp(exp);
    turn.creature.attack_warmup = turn.creature.definition.base.attack_warmup;
    turn.creature.ai.turns_without_fight = 0;
    turn.creature.awakeness = (turn.creature.awakeness - 0.5).max(0.0);
    turn.set_animation_facing(AnimationState::Attack, false, target_tile);
    emit_attack_sound(turn, target_tile);
    tracing::debug!(
        "Fight: creature={} hit target={}, damage={:.2}",
        turn.creature.id,
        target.id(),
        outcome.damage
    );
    Dispatch::Done
}

pub(super) fn flee(turn: &mut Turn<'_, '_>) -> Dispatch {
    let config = turn.config();
    if turn.creature.visibility.reachable_enemies.is_empty()
        || turn.top_turns() > config.nb_turn_flee_max
    {
        turn.pop();
        return Dispatch::Loop;
    }

    let mut temples = turn
        .world
        .rooms_of(turn.creature.seat, RoomKind::DungeonTemple);
    shuffle(turn.ctx.rng, &mut temples);
    let path = temples
        .iter()
        .filter_map(|id| turn.world.building(*id))
        .filter_map(|b| b.central_tile())
        .find_map(|tile| super::path_to(turn, tile));

    // One short burst toward the temple; the next Flee turn re-plans.
    if let Some(mut path) = path {
        if path.len() > config.flee_temple_stop_distance {
            path.truncate(config.flee_temple_stop_distance);
            if start_walk(turn, path, AnimationState::Flee) {
                return Dispatch::Loop;
            }
        }
    }

    if wander_randomly(turn, AnimationState::Flee) {
        return Dispatch::Loop;
    }
    Dispatch::Done
}
