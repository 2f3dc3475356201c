//! Walking: path setup and the one-tile-per-tick walk handler.
use crate::action::{Action, ActionKind};
use crate::context::{Dispatch, Turn};
use crate::event::{AnimationState, SimEvent};
use crate::types::Position;

/// Walks toward `tile` with the walk animation. See [`set_destination_with`].
pub fn set_destination(turn: &mut Turn<'_, '_>, tile: Position) -> bool {
    set_destination_with(turn, tile, AnimationState::Walk)
}

/// Computes a path to `tile` and starts walking it.
///
/// Fails when `tile` is unreachable or the creature already stands on it.
pub fn set_destination_with(
    turn: &mut Turn<'_, '_>,
    tile: Position,
    animation: AnimationState,
) -> bool {
    match super::path_to(turn, tile) {
        Some(path) => start_walk(turn, path, animation),
        None => false,
    }
}

/// Stores `path` as the creature's walk and pushes a WalkToTile on top.
pub fn start_walk(turn: &mut Turn<'_, '_>, path: Vec<Position>, animation: AnimationState) -> bool {
    if path.is_empty() {
        return false;
    }
    turn.creature.walk_path = path.into();
    turn.set_animation(animation, true);
    turn.push_forced(Action::WalkToTile)
}

/// Walks to a random reachable tile among the farthest fifth of the visible tiles.
pub fn wander_randomly(turn: &mut Turn<'_, '_>, animation: AnimationState) -> bool {
    let tiles = turn.creature.visibility.visible_tiles.clone();
    if tiles.is_empty() {
        return false;
    }
    let last = tiles.len() - 1;
    let start = turn.ctx.rng.int((tiles.len() * 4 / 5) as i64, last as i64) as usize;
    let profile = turn.creature.movement_profile();
    for tile in tiles[..=start.min(last)].iter().rev() {
        if *tile == turn.creature.position || !turn.world.map.is_passable(*tile, profile) {
            continue;
        }
        if set_destination_with(turn, *tile, animation) {
            return true;
        }
    }
    false
}

pub(super) fn walk_to_tile(turn: &mut Turn<'_, '_>) -> Dispatch {
    // Targets move: a fight re-derives its walk after one step.
    if turn.is_action_in_list(ActionKind::Fight) && turn.top_turns() > 1 {
        turn.creature.walk_path.clear();
        turn.pop();
        return Dispatch::Loop;
    }

    let Some(next) = turn.creature.walk_path.front().copied() else {
        turn.pop();
        return Dispatch::Loop;
    };
    if !turn
        .world
        .map
        .is_passable(next, turn.creature.movement_profile())
    {
        tracing::debug!(
            "Walk: path blocked creature={}, at={}",
            turn.creature.id,
            next
        );
        turn.creature.walk_path.clear();
        turn.pop();
        return Dispatch::Loop;
    }

    turn.creature.walk_path.pop_front();
    let from = turn.creature.position;
    turn.creature.position = next;
    if let Some(carried) = turn.creature.carried_entity {
        if let Some(object) = turn.world.object_mut(carried) {
            object.position = next;
        }
    }
    turn.emit(SimEvent::CreatureMoved {
        creature: turn.creature.id,
        from,
        to: next,
    });

    if turn.creature.walk_path.is_empty() {
        turn.pop();
        turn.set_animation(AnimationState::Idle, true);
    }
    Dispatch::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AiConfig;
    use crate::context::SimulationContext;
    use crate::creature::CreatureDefinition;
    use crate::env::{GridPathfinder, PcgRng};
    use crate::map::{Tile, TileKind, TileMap};
    use crate::types::{SeatId, Tick};
    use crate::world::{Seat, World};

    fn corridor() -> World {
        let mut map = TileMap::new(5, 3, Tile::wall(TileKind::Rock));
        for x in 0..5 {
            map.set_tile(Position::new(x, 1), Tile::floor(TileKind::Dirt));
        }
        let mut world = World::new(map);
        world.add_seat(Seat::new(SeatId(1), 1));
        world
    }

    #[test]
    fn walks_one_tile_per_step_and_pops_at_the_end() {
        let mut world = corridor();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(9);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature(
                "Kobold1",
                SeatId(1),
                Arc::new(CreatureDefinition::worker("Kobold")),
                Position::new(0, 1),
            )
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            let mut turn = Turn::new(creature, world, &mut ctx);
            assert!(set_destination(&mut turn, Position::new(2, 1)));
            assert_eq!(turn.creature.ai.stack.top_kind(), Some(ActionKind::WalkToTile));

            assert_eq!(walk_to_tile(&mut turn), Dispatch::Done);
            assert_eq!(turn.creature.position, Position::new(1, 1));
            assert_eq!(walk_to_tile(&mut turn), Dispatch::Done);
            assert_eq!(turn.creature.position, Position::new(2, 1));
            assert_eq!(turn.creature.ai.stack.top_kind(), Some(ActionKind::Idle));
        });
    }

    #[test]
    fn no_destination_when_already_there_or_walled_off() {
        let mut world = corridor();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(9);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature(
                "Kobold1",
                SeatId(1),
                Arc::new(CreatureDefinition::worker("Kobold")),
                Position::new(0, 1),
            )
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            let mut turn = Turn::new(creature, world, &mut ctx);
            assert!(!set_destination(&mut turn, Position::new(0, 1)));
            assert!(!set_destination(&mut turn, Position::new(0, 0)));
            assert_eq!(turn.creature.ai.stack.len(), 1);
        });
    }
}
