//! Claiming ground and walls for the worker's seat.
use super::can_reach;
use super::movement::set_destination;
use crate::action::Action;
use crate::context::{Dispatch, Turn};
use crate::env::shuffle;
use crate::event::{AnimationState, SimEvent, SoundEffect};
use crate::map::TileMap;
use crate::types::{Position, SeatId};

/// Ground `seat` may start claiming: claimable, unlocked and touching its territory.
fn ground_candidate(map: &TileMap, tile: Position, seat: SeatId) -> bool {
    let Some(t) = map.tile(tile) else {
        return false;
    };
    if !t.is_ground_claimable(seat) || t.workers_claiming > 0 {
        return false;
    }
    map.neighbors(tile).iter().any(|n| {
        map.tile(*n)
            .is_some_and(|nt| nt.is_floor() && nt.is_claimed_for_seat(seat))
    })
}

fn wall_candidate(map: &TileMap, tile: Position, seat: SeatId) -> bool {
    map.is_wall_claimable(tile, seat) && map.tile(tile).is_some_and(|t| t.workers_claiming == 0)
}

fn search_expired(turn: &Turn<'_, '_>, forced: bool) -> bool {
    turn.creature.claim_rate <= 0.0
        || (!forced && turn.top_turns() >= turn.config().nb_turns_before_checking_task)
}

pub(super) fn search_ground_tile(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if search_expired(turn, forced) {
        turn.pop();
        return Dispatch::Loop;
    }

    let position = turn.creature.position;
    let seat = turn.creature.seat;

    if ground_candidate(&turn.world.map, position, seat) {
        turn.push_forced(Action::ClaimGroundTile { tile: position });
        return Dispatch::Loop;
    }

    let mut neighbors = turn.world.map.neighbors(position);
    shuffle(turn.ctx.rng, neighbors.as_mut_slice());
    if let Some(tile) = neighbors
        .into_iter()
        .find(|n| ground_candidate(&turn.world.map, *n, seat))
    {
        turn.push_forced(Action::ClaimGroundTile { tile });
        return Dispatch::Loop;
    }

    let mut best: Option<(i64, Position)> = None;
    for tile in turn.creature.visibility.tiles_in_sight.iter().copied() {
        let dist = position.distance_sq(tile);
        if best.is_some_and(|(best_dist, _)| best_dist <= dist) {
            continue;
        }
        if !ground_candidate(&turn.world.map, tile, seat) || !can_reach(turn, tile) {
            continue;
        }
        best = Some((dist, tile));
    }
    if let Some((_, tile)) = best {
        turn.push_forced(Action::ClaimGroundTile { tile });
        return Dispatch::Loop;
    }

    turn.pop();
    Dispatch::Loop
}

pub(super) fn claim_ground_tile(turn: &mut Turn<'_, '_>, tile: Position) -> Dispatch {
    let seat = turn.creature.seat;
    let claimable = turn
        .world
        .map
        .tile(tile)
        .is_some_and(|t| t.is_ground_claimable(seat));
    if !claimable {
        turn.pop();
        return Dispatch::Loop;
    }

    if turn.creature.position != tile {
        if !set_destination(turn, tile) {
            turn.pop();
        }
        return Dispatch::Loop;
    }

    turn.set_animation(AnimationState::Claim, true);
    claim_step(turn, tile)
}

pub(super) fn search_wall_tile(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if search_expired(turn, forced) {
        turn.pop();
        return Dispatch::Loop;
    }

    let position = turn.creature.position;
    let seat = turn.creature.seat;
    let map = &turn.world.map;

    let adjacent = map
        .neighbors(position)
        .into_iter()
        .find(|n| wall_candidate(map, *n, seat));
    if let Some(tile) = adjacent {
        turn.push_forced(Action::ClaimWallTile {
            tile,
            from: position,
        });
        return Dispatch::Loop;
    }

    let mut best: Option<(i64, Position, Position)> = None;
    for tile in turn.creature.visibility.tiles_in_sight.iter().copied() {
        if !wall_candidate(&turn.world.map, tile, seat) {
            continue;
        }
        for from in turn.world.map.neighbors(tile) {
            let dist = position.distance_sq(from);
            if best.is_some_and(|(best_dist, _, _)| best_dist <= dist) {
                continue;
            }
            if !turn
                .world
                .map
                .is_passable(from, turn.creature.movement_profile())
                || !can_reach(turn, from)
            {
                continue;
            }
            best = Some((dist, tile, from));
        }
    }
    if let Some((_, tile, from)) = best {
        turn.push_forced(Action::ClaimWallTile { tile, from });
        return Dispatch::Loop;
    }

    turn.pop();
    Dispatch::Loop
}

pub(super) fn claim_wall_tile(turn: &mut Turn<'_, '_>, tile: Position, from: Position) -> Dispatch {
    let seat = turn.creature.seat;
    if !turn.world.map.is_wall_claimable(tile, seat) {
        turn.pop();
        return Dispatch::Loop;
    }

    let position = turn.creature.position;
    let profile = turn.creature.movement_profile();
    let spots: Vec<Position> = turn
        .world
        .map
        .neighbors(tile)
        .into_iter()
        .filter(|n| turn.world.map.is_passable(*n, profile))
        .collect();
    if !spots.contains(&position) {
        let destination = if spots.contains(&from) && can_reach(turn, from) {
            Some(from)
        } else {
            spots
                .iter()
                .copied()
                .filter(|p| can_reach(turn, *p))
                .min_by_key(|p| position.distance_sq(*p))
        };
        match destination {
            Some(destination) if set_destination(turn, destination) => {}
            _ => {
                turn.pop();
            }
        }
        return Dispatch::Loop;
    }

    turn.set_animation_facing(AnimationState::Claim, true, tile);
    claim_step(turn, tile)
}

/// One claim increment on `tile`, popping the action once the seat owns it.
fn claim_step(turn: &mut Turn<'_, '_>, tile: Position) -> Dispatch {
    let seat = turn.creature.seat;
    let rate = turn.creature.claim_rate;
    let (amount, finished) = match turn.world.map.tile_mut(tile) {
        Some(t) => {
            let amount = t.claim_for_seat(seat, rate);
            (amount, t.is_claimed_for_seat(seat))
        }
        None => (0.0, false),
    };
    if amount <= 0.0 && !finished {
        turn.clear_action_queue();
        return Dispatch::Done;
    }

    let config = turn.config();
    turn.creature.receive_exp(config.claim_exp_coef * rate / 20.0);
    turn.emit(SimEvent::TileClaimed {
        position: tile,
        seat,
        finished,
    });
    turn.emit(SimEvent::Sound {
        position: tile,
        effect: SoundEffect::Claim,
    });

    if finished {
        tracing::debug!("Claim: tile claimed tile={}, seat={}", tile, seat);
        turn.creature.receive_exp(config.claim_complete_exp);
        turn.pop();
    }
    Dispatch::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::action::ActionKind;
    use crate::config::AiConfig;
    use crate::context::SimulationContext;
    use crate::creature::{CreatureDefinition, compute_visibility};
    use crate::env::{GridPathfinder, PcgRng};
    use crate::map::{Tile, TileKind};
    use crate::types::Tick;
    use crate::world::{Seat, World};

    fn world() -> World {
        let mut map = TileMap::new(4, 3, Tile::floor(TileKind::Dirt));
        map.set_tile(Position::new(0, 1), Tile::claimed(SeatId(1)));
        map.set_tile(Position::new(3, 1), Tile::wall(TileKind::Dirt));
        let mut world = World::new(map);
        world.add_seat(Seat::new(SeatId(1), 1));
        world
    }

    #[test]
    fn claims_ground_next_to_own_territory_until_owned() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(4);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let def = Arc::new(CreatureDefinition::worker("Kobold").with_claim_rate(0.5));
        let id = world
            .spawn_creature("Kobold1", SeatId(1), def, Position::new(1, 1))
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push(Action::SearchGroundTileToClaim { forced: false });
            assert_eq!(search_ground_tile(&mut turn, false), Dispatch::Loop);
            assert_eq!(
                turn.creature.ai.stack.top_kind(),
                Some(ActionKind::ClaimGroundTile)
            );
            let here = Position::new(1, 1);
            assert_eq!(claim_ground_tile(&mut turn, here), Dispatch::Done);
            assert_eq!(claim_ground_tile(&mut turn, here), Dispatch::Done);
            assert_eq!(
                turn.creature.ai.stack.top_kind(),
                Some(ActionKind::SearchGroundTileToClaim)
            );
        });
        let tile = world.map.tile(Position::new(1, 1)).expect("tile");
        assert!(tile.is_claimed_for_seat(SeatId(1)));
        assert_eq!(tile.workers_claiming, 0);
    }

    #[test]
    fn wall_search_ignores_walls_without_own_floor() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(4);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let def = Arc::new(CreatureDefinition::worker("Kobold"));
        let id = world
            .spawn_creature("Kobold1", SeatId(1), def, Position::new(2, 1))
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push(Action::SearchWallTileToClaim { forced: false });
            search_wall_tile(&mut turn, false);
            assert!(!turn.is_action_in_list(ActionKind::ClaimWallTile));
        });
    }
}
