//! Digging marked walls and bringing the mined gold home.
use super::movement::set_destination;
use super::{buildings_wanting, can_reach};
use crate::action::Action;
use crate::context::{Dispatch, Turn};
use crate::env::MovementProfile;
use crate::event::{AnimationState, PlayerNotice, SimEvent, SoundEffect};
use crate::map::{TileKind, TileMap};
use crate::types::Position;
use crate::world::{EntityCarryType, ObjectKind};

/// Floor tiles next to `tile` a worker can dig it from.
fn dig_positions(map: &TileMap, tile: Position, profile: MovementProfile) -> Vec<Position> {
    map.neighbors(tile)
        .into_iter()
        .filter(|n| map.is_passable(*n, profile))
        .collect()
}

/// Dig positions of an unlocked tile; empty while another worker digs it.
fn free_dig_positions(map: &TileMap, tile: Position, profile: MovementProfile) -> Vec<Position> {
    match map.tile(tile) {
        Some(t) if t.workers_digging == 0 => dig_positions(map, tile, profile),
        _ => Vec::new(),
    }
}

pub(super) fn search_tile_to_dig(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if turn.creature.dig_rate <= 0.0 {
        turn.pop();
        return Dispatch::Loop;
    }
    if !forced && turn.top_turns() >= turn.config().nb_turns_before_checking_task {
        turn.pop();
        return Dispatch::Loop;
    }

    let position = turn.creature.position;
    let seat = turn.creature.seat;
    let profile = turn.creature.movement_profile();
    let map = &turn.world.map;
    let diggable =
        |p: Position| map.tile(p).is_some_and(|t| t.is_marked_for_digging(seat) && t.is_diggable(seat));

    // A marked neighbour can be dug without walking.
    let adjacent = map
        .neighbors(position)
        .into_iter()
        .find(|n| diggable(*n) && free_dig_positions(map, *n, profile).contains(&position));
    if let Some(tile) = adjacent {
        turn.push_forced(Action::DigTile {
            tile,
            from: position,
        });
        return Dispatch::Loop;
    }

    let mut best: Option<(i64, Position, Position)> = None;
    for tile in turn.creature.visibility.tiles_in_sight.iter().copied() {
        if !diggable(tile) {
            continue;
        }
        let dist = position.distance_sq(tile);
        if best.is_some_and(|(best_dist, _, _)| best_dist <= dist) {
            continue;
        }
        let positions = free_dig_positions(map, tile, profile);
        let Some((_, idx)) = turn
            .ctx
            .pathfinder
            .find_best_path(map, profile, position, &positions)
        else {
            continue;
        };
        best = Some((dist, tile, positions[idx]));
    }

    if let Some((_, tile, from)) = best {
        turn.push_forced(Action::DigTile { tile, from });
        return Dispatch::Loop;
    }

    tracing::debug!("Dig: nothing to dig creature={}", turn.creature.id);
    turn.pop();
    if turn.creature.gold_carried > 0 {
        deposit_carried_gold(turn);
    }
    Dispatch::Loop
}

pub(super) fn dig_tile(turn: &mut Turn<'_, '_>, tile: Position, from: Position) -> Dispatch {
    let position = turn.creature.position;
    let seat = turn.creature.seat;
    let profile = turn.creature.movement_profile();

    let Some(kind) = turn
        .world
        .map
        .tile(tile)
        .filter(|t| t.is_marked_for_digging(seat) && t.is_diggable(seat))
        .map(|t| t.kind)
    else {
        // Dug out by someone else or unmarked meanwhile.
        turn.pop();
        return Dispatch::Loop;
    };

    let positions = dig_positions(&turn.world.map, tile, profile);
    if !positions.contains(&position) {
        let destination = if positions.contains(&from) && can_reach(turn, from) {
            Some(from)
        } else {
            positions
                .iter()
                .copied()
                .filter(|p| can_reach(turn, *p))
                .min_by_key(|p| position.distance_sq(*p))
        };
        match destination {
            Some(destination) if set_destination(turn, destination) => {}
            _ => {
                tracing::debug!(
                    "Dig: no way to tile={}, creature={}",
                    tile,
                    turn.creature.id
                );
                turn.pop();
            }
        }
        return Dispatch::Loop;
    }

    turn.set_animation_facing(AnimationState::Dig, true, tile);
    let rate = turn.creature.dig_rate;
    let (amount, finished) = match turn.world.map.tile_mut(tile) {
        Some(t) => {
            let amount = t.dig_out(rate);
            (amount, t.is_floor())
        }
        None => (0.0, false),
    };
    if amount <= 0.0 {
        turn.clear_action_queue();
        return Dispatch::Done;
    }

    let config = turn.config();
    turn.creature.receive_exp(config.dig_exp_coef * rate / 20.0);
    let coef = match kind {
        TileKind::Gold => Some(config.dig_coef_gold),
        TileKind::Gem => Some(config.dig_coef_gem),
        _ => None,
    };
    if let Some(coef) = coef {
        let taken = turn.creature.add_gold((coef * amount) as u32);
        if let Some(owner) = turn.world.seat_mut(seat) {
            owner.gold_mined += u64::from(taken);
        }
        turn.creature.receive_exp(rate / 20.0);
    }

    turn.emit(SimEvent::TileDug {
        position: tile,
        by: turn.creature.id,
        amount,
        finished,
    });
    turn.emit(SimEvent::Sound {
        position: tile,
        effect: SoundEffect::Dig,
    });

    if finished {
        tracing::debug!("Dig: tile dug out tile={}, creature={}", tile, turn.creature.id);
        turn.pop();
        turn.creature.receive_exp(config.dig_complete_exp);
        set_destination(turn, tile);
    }

    let max_gold = turn.creature.max_gold();
    if max_gold > 0 && turn.creature.gold_carried >= max_gold {
        deposit_carried_gold(turn);
    }
    Dispatch::Done
}

/// Drops the carried gold as a pile and starts bringing it to a treasury.
///
/// Returns whether a treasury takes it; otherwise the human owner is told
/// there is no room for gold and the pile stays on the floor.
pub(crate) fn deposit_carried_gold(turn: &mut Turn<'_, '_>) -> bool {
    let amount = std::mem::take(&mut turn.creature.gold_carried);
    if amount == 0 {
        return false;
    }
    let position = turn.creature.position;
    let pile = turn
        .world
        .spawn_object(ObjectKind::TreasuryGold { amount }, position);
    turn.emit(SimEvent::EntitySpawned {
        entity: pile,
        position,
    });
    tracing::debug!(
        "Dig: dropped gold pile={}, amount={}, creature={}",
        pile,
        amount,
        turn.creature.id
    );

    if buildings_wanting(turn, EntityCarryType::Gold).is_empty() {
        turn.notify_player(PlayerNotice::NoTreasuryAvailable);
        return false;
    }
    turn.push_forced(Action::GrabEntity { entity: Some(pile) })
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
    use crate::map::Tile;
    use crate::types::{SeatId, Tick};
    use crate::world::{Seat, World};

    fn world_with_marked_gold(fullness: f64) -> World {
        let mut map = TileMap::new(5, 5, Tile::claimed(SeatId(1)));
        let mut gold = Tile::new(TileKind::Gold, fullness);
        gold.set_marked_for_digging(SeatId(1), true);
        map.set_tile(Position::new(3, 2), gold);
        let mut world = World::new(map);
        world.add_seat(Seat::new(SeatId(1), 1).human());
        world
    }

    #[test]
    fn partial_dig_keeps_the_action() {
        let mut world = world_with_marked_gold(10.0);
        let config = AiConfig::default();
        let mut rng = PcgRng::new(2);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let def = Arc::new(CreatureDefinition::worker("Kobold").with_dig_rate(2.0));
        let id = world
            .spawn_creature("Kobold1", SeatId(1), def, Position::new(2, 2))
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push_forced(Action::DigTile {
                tile: Position::new(3, 2),
                from: Position::new(2, 2),
            });
            assert_eq!(turn.world.map.tile(Position::new(3, 2)).map(|t| t.workers_digging), Some(1));
            let dispatch = dig_tile(&mut turn, Position::new(3, 2), Position::new(2, 2));
            assert_eq!(dispatch, Dispatch::Done);
            assert_eq!(turn.creature.gold_carried, 10);
            assert_eq!(turn.creature.ai.stack.top_kind(), Some(ActionKind::DigTile));
        });
        assert_eq!(world.map.tile(Position::new(3, 2)).map(|t| t.fullness), Some(8.0));
    }

    #[test]
    fn search_skips_a_tile_another_worker_digs() {
        let mut world = world_with_marked_gold(10.0);
        let config = AiConfig::default();
        let mut rng = PcgRng::new(2);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        world
            .map
            .tile_mut(Position::new(3, 2))
            .expect("tile")
            .workers_digging = 1;
        let def = Arc::new(CreatureDefinition::worker("Kobold"));
        let id = world
            .spawn_creature("Kobold1", SeatId(1), def, Position::new(0, 0))
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push(Action::SearchTileToDig { forced: false });
            assert_eq!(search_tile_to_dig(&mut turn, false), Dispatch::Loop);
            assert!(!turn.is_action_in_list(ActionKind::DigTile));
            assert!(!turn.is_action_in_list(ActionKind::SearchTileToDig));
        });
    }

    #[test]
    fn gold_without_treasury_is_dropped_and_reported() {
        let mut world = world_with_marked_gold(10.0);
        let config = AiConfig::default();
        let mut rng = PcgRng::new(2);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let def = Arc::new(CreatureDefinition::worker("Kobold"));
        let id = world
            .spawn_creature("Kobold1", SeatId(1), def, Position::new(1, 1))
            .expect("spawn");

        let taken = world
            .with_creature_out(id, |creature, world| {
                creature.gold_carried = 40;
                let mut turn = Turn::new(creature, world, &mut ctx);
                deposit_carried_gold(&mut turn)
            })
            .expect("creature");
        assert!(!taken);
        assert_eq!(world.creature(id).map(|c| c.gold_carried), Some(0));
        let piles: Vec<u32> = world.objects().map(|o| o.gold()).collect();
        assert_eq!(piles, vec![40]);
        assert!(ctx.events.iter().any(|e| matches!(
            e,
            SimEvent::Notify {
                notice: PlayerNotice::NoTreasuryAvailable,
                ..
            }
        )));
    }
}
