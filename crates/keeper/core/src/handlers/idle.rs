//! Idle: picks the creature's next activity.
//!
//! Workers balance dig, claim and carry work across their seat; other
//! creatures answer calls to war, steal, rest, eat or work. Whatever finds
//! nothing to do wanders around.
use super::movement::{set_destination, wander_randomly};
use super::{can_reach, deposit_carried_gold, own_building_here};
use crate::action::{Action, ActionKind};
use crate::context::{Dispatch, Turn};
use crate::event::AnimationState;
use crate::types::Position;
use crate::world::{RoomKind, WorkerJob};

/// Chance that a worker considers carrying this step.
const CARRY_CHANCE: f64 = 0.3;
/// Chance that a worker considers claiming ground this step.
const CLAIM_GROUND_CHANCE: f64 = 0.9;
/// Dice roll at or above which an idle creature stays put.
const STAY_PUT_ROLL: f64 = 0.6;
/// Chance that a wandering fighter follows a worker around.
const FOLLOW_WORKER_CHANCE: f64 = 0.7;

pub(super) fn idle(turn: &mut Turn<'_, '_>) -> Dispatch {
    turn.set_animation(AnimationState::Idle, true);

    if turn.creature.ai.forced_drop {
        turn.creature.ai.forced_drop = false;
        let handled = if turn.creature.is_worker() {
            worker_dropped(turn)
        } else {
            fighter_dropped(turn)
        };
        if let Some(dispatch) = handled {
            return dispatch;
        }
    }

    let decided = if turn.creature.is_worker() {
        worker_idle(turn)
    } else {
        fighter_idle(turn)
    };
    match decided {
        Some(dispatch) => dispatch,
        None => wander(turn),
    }
}

// ============================================================================
// Dropped by the owner
// ============================================================================

/// A worker dropped by hand works on whatever it was dropped on.
fn worker_dropped(turn: &mut Turn<'_, '_>) -> Option<Dispatch> {
    let position = turn.creature.position;
    let seat = turn.creature.seat;

    if turn.creature.gold_carried > 0 {
        if let Some(id) = own_building_here(turn) {
            if let Some(treasury) = turn
                .world
                .building_mut(id)
                .filter(|b| b.is_room(RoomKind::Treasury))
            {
                let deposited = treasury.deposit_gold(turn.creature.gold_carried, position);
                if deposited > 0 {
                    turn.creature.gold_carried -= deposited;
                    return Some(Dispatch::Loop);
                }
            }
        }
    }

    let map = &turn.world.map;
    let neighbors = map.neighbors(position);

    if turn.creature.dig_rate > 0.0
        && neighbors.iter().any(|n| {
            map.tile(*n)
                .is_some_and(|t| t.is_marked_for_digging(seat) && t.is_diggable(seat))
        })
    {
        turn.push_forced(Action::SearchTileToDig { forced: true });
        return Some(Dispatch::Loop);
    }

    if turn.creature.claim_rate > 0.0 {
        let here_claimed = map
            .tile(position)
            .is_some_and(|t| t.is_claimed_for_seat(seat));
        let ground_here = !here_claimed
            && map.tile(position).is_some_and(|t| t.is_ground_claimable(seat))
            && neighbors.iter().any(|n| {
                map.tile(*n)
                    .is_some_and(|t| t.is_floor() && t.is_claimed_for_seat(seat))
            });
        let ground_next = here_claimed
            && neighbors
                .iter()
                .any(|n| map.tile(*n).is_some_and(|t| t.is_ground_claimable(seat)));
        if ground_here || ground_next {
            turn.push_forced(Action::SearchGroundTileToClaim { forced: true });
            return Some(Dispatch::Loop);
        }
        if here_claimed && neighbors.iter().any(|n| map.is_wall_claimable(*n, seat)) {
            turn.push_forced(Action::SearchWallTileToClaim { forced: true });
            return Some(Dispatch::Loop);
        }
    }

    let carryable_here = turn
        .world
        .objects_at(position)
        .into_iter()
        .filter_map(|id| turn.world.object(id))
        .any(|o| o.is_available_to_carry());
    if carryable_here {
        turn.push_forced(Action::SearchEntityToCarry { forced: true });
        return Some(Dispatch::Loop);
    }
    None
}

/// A fighter dropped in a room uses it.
fn fighter_dropped(turn: &mut Turn<'_, '_>) -> Option<Dispatch> {
    let id = own_building_here(turn)?;
    let building = turn.world.building(id)?;
    let room = building.room_kind()?;
    match room {
        RoomKind::Hatchery => {
            turn.push_forced(Action::Eat { forced: true });
        }
        RoomKind::Dormitory => {
            turn.push_forced(Action::Sleep);
            turn.push_forced(Action::FindHome { forced: true });
        }
        _ => {
            let works_here = turn
                .creature
                .definition
                .affinity_for(room)
                .is_some_and(|a| a.efficiency > 0.0);
            if !works_here || !building.has_open_creature_spot(turn.creature.id) {
                return None;
            }
            turn.push_forced(Action::Job { forced: true });
        }
    }
    Some(Dispatch::Loop)
}

// ============================================================================
// Workers
// ============================================================================

fn worker_idle(turn: &mut Turn<'_, '_>) -> Option<Dispatch> {
    let max_gold = turn.creature.max_gold();
    if max_gold > 0 && turn.creature.gold_carried >= max_gold && deposit_carried_gold(turn) {
        return Some(Dispatch::Loop);
    }

    let mut candidates: Vec<(WorkerJob, Action)> = Vec::with_capacity(4);
    if turn.creature.dig_rate > 0.0 && !turn.creature.visibility.visible_marked_tiles.is_empty() {
        candidates.push((WorkerJob::Dig, Action::SearchTileToDig { forced: false }));
    }
    if turn.ctx.rng.chance(CARRY_CHANCE) {
        candidates.push((WorkerJob::Carry, Action::SearchEntityToCarry { forced: false }));
    }
    if turn.creature.claim_rate > 0.0 {
        if turn.ctx.rng.chance(CLAIM_GROUND_CHANCE) {
            candidates.push((
                WorkerJob::ClaimGround,
                Action::SearchGroundTileToClaim { forced: false },
            ));
        }
        if !turn.creature.visibility.visible_claimable_walls.is_empty() {
            candidates.push((
                WorkerJob::ClaimWall,
                Action::SearchWallTileToClaim { forced: false },
            ));
        }
    }

    // Least represented job first; the stable sort keeps the order above on ties.
    if let Some(seat) = turn.world.seat(turn.creature.seat) {
        candidates.sort_by_key(|(job, _)| seat.workers_doing(*job));
    }
    for (_, action) in candidates {
        if turn.push(action) {
            return Some(Dispatch::Loop);
        }
    }

    if turn.creature.dig_rate > 0.0 && turn.creature.gold_carried > 0 && deposit_carried_gold(turn)
    {
        return Some(Dispatch::Loop);
    }
    None
}

// ============================================================================
// Fighters
// ============================================================================

fn fighter_idle(turn: &mut Turn<'_, '_>) -> Option<Dispatch> {
    let config = turn.config();

    if turn.creature.is_weak(config) {
        return Some(weak_idle(turn));
    }

    let seat = turn.creature.seat;
    if let Some(rally) = turn.world.seat(seat).and_then(|s| s.call_to_war) {
        if turn.creature.position.distance_sq(rally) <= config.call_to_war_cutoff
            && set_destination(turn, rally)
        {
            return Some(Dispatch::Loop);
        }
    }

    let rogue = turn.world.rogue_seat == Some(seat);
    if (rogue || turn.creature.definition.steals_gold) && turn.push(Action::StealFreeGold) {
        return Some(Dispatch::Loop);
    }

    if turn.creature.home.is_none()
        && turn.ctx.rng.chance(0.5)
        && reachable_dormitory(turn)
        && turn.push(Action::FindHome { forced: false })
    {
        return Some(Dispatch::Loop);
    }

    if turn.creature.home.is_some()
        && turn.ctx.rng.chance(0.2)
        && turn.creature.awakeness < turn.ctx.rng.uniform(0.0, 50.0)
        && turn.push(Action::Sleep)
    {
        return Some(Dispatch::Loop);
    }

    if turn.ctx.rng.chance(0.2)
        && turn.creature.hunger > turn.ctx.rng.uniform(50.0, 100.0)
        && turn.push(Action::Eat { forced: false })
    {
        return Some(Dispatch::Loop);
    }

    if turn.ctx.rng.chance(0.2)
        && turn.ctx.rng.uniform(0.0, 50.0) < turn.creature.awakeness
        && turn.ctx.rng.uniform(50.0, 100.0) > turn.creature.hunger
        && turn.push(Action::Job { forced: false })
    {
        return Some(Dispatch::Loop);
    }
    None
}

/// Weak creatures go to bed, find one, or run around.
fn weak_idle(turn: &mut Turn<'_, '_>) -> Dispatch {
    match turn.creature.home {
        Some(home) => {
            if can_reach(turn, home.tile) && turn.push(Action::Sleep) {
                return Dispatch::Loop;
            }
        }
        None => {
            if reachable_dormitory(turn) && !turn.is_action_in_list(ActionKind::FindHome) {
                turn.clear_action_queue();
                turn.push_forced(Action::Sleep);
                turn.push_forced(Action::FindHome { forced: false });
                return Dispatch::Loop;
            }
        }
    }
    wander_randomly(turn, AnimationState::Flee);
    Dispatch::Done
}

fn reachable_dormitory(turn: &Turn<'_, '_>) -> bool {
    turn.world
        .rooms_of(turn.creature.seat, RoomKind::Dormitory)
        .into_iter()
        .filter_map(|id| turn.world.building(id))
        .filter_map(|b| b.covered_tile(0))
        .any(|tile| can_reach(turn, tile))
}

// ============================================================================
// Wandering
// ============================================================================

fn wander(turn: &mut Turn<'_, '_>) -> Dispatch {
    if turn.ctx.rng.next_f64() >= STAY_PUT_ROLL {
        return Dispatch::Done;
    }
    let len = turn.creature.visibility.visible_tiles.len();
    if len == 0 {
        return Dispatch::Done;
    }

    let destination = if turn.creature.is_worker() {
        Some(far_tile(turn))
    } else if turn.ctx.rng.chance(FOLLOW_WORKER_CHANCE) {
        // Nobody to follow: head somewhere far instead.
        worker_to_follow(turn).or_else(|| Some(far_tile(turn)))
    } else {
        let idx = (len as f64 * turn.ctx.rng.uniform(0.1, 0.3)) as usize;
        Some(turn.creature.visibility.visible_tiles[idx.min(len - 1)])
    };

    match destination {
        Some(tile) if set_destination(turn, tile) => Dispatch::Loop,
        _ => Dispatch::Done,
    }
}

/// A random tile from the farther half of what the creature sees.
fn far_tile(turn: &mut Turn<'_, '_>) -> Position {
    let len = turn.creature.visibility.visible_tiles.len();
    let idx = turn.ctx.rng.int((len / 2) as i64, (len - 1) as i64) as usize;
    turn.creature.visibility.visible_tiles[idx.min(len - 1)]
}

/// A tile near a random reachable allied worker; closer to it while it digs.
fn worker_to_follow(turn: &mut Turn<'_, '_>) -> Option<Position> {
    let workers: Vec<(Position, bool)> = turn
        .creature
        .visibility
        .reachable_allies
        .iter()
        .filter_map(|id| turn.world.creature(*id))
        .filter(|c| c.is_worker() && c.seat == turn.creature.seat)
        .map(|c| (c.position, c.ai.stack.top_kind() == Some(ActionKind::DigTile)))
        .collect();
    if workers.is_empty() {
        return None;
    }
    let (anchor, digging) = workers[turn.ctx.rng.index(workers.len())];
    let spread = if digging { 3.0 } else { 8.0 };
    let dx = turn.ctx.rng.gaussian(0.0, spread).round() as i32;
    let dy = turn.ctx.rng.gaussian(0.0, spread).round() as i32;
    Some(anchor.offset(dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AiConfig;
    use crate::context::SimulationContext;
    use crate::creature::{CreatureDefinition, compute_visibility};
    use crate::env::{GridPathfinder, PcgRng, RngOracle, ScriptedRng};
    use crate::map::{Tile, TileKind, TileMap};
    use crate::types::{EntityId, SeatId, Tick};
    use crate::world::{BuildingKind, ObjectKind, Seat, World};

    const KEEPER: SeatId = SeatId(1);
    const DROP_AT: Position = Position { x: 2, y: 2 };

    fn claimed_world() -> World {
        let mut world = World::new(TileMap::new(6, 5, Tile::claimed(KEEPER)));
        world.add_seat(Seat::new(KEEPER, 1).human());
        world
    }

    fn dropped_worker(world: &mut World) -> EntityId {
        let id = world
            .spawn_creature(
                "Kobold1",
                KEEPER,
                Arc::new(CreatureDefinition::worker("Kobold")),
                DROP_AT,
            )
            .expect("spawn");
        if let Some(worker) = world.creature_mut(id) {
            worker.ai.forced_drop = true;
        }
        id
    }

    /// Runs one Idle step for `id` and returns the action it pushed, if any.
    fn idle_once(world: &mut World, id: EntityId, rng: &mut dyn RngOracle) -> Option<Action> {
        let config = AiConfig::default();
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, rng, &pathfinder, Tick(1));
        world
            .with_creature_out(id, |creature, world| {
                creature.visibility = compute_visibility(creature, world, &pathfinder);
                let mut turn = Turn::new(creature, world, &mut ctx);
                idle(&mut turn);
                assert!(!turn.creature.ai.forced_drop);
                turn.top()
                    .map(|r| r.action.clone())
                    .filter(|a| *a != Action::Idle)
            })
            .expect("worker")
    }

    fn marked_wall() -> Tile {
        let mut wall = Tile::wall(TileKind::Dirt);
        wall.set_marked_for_digging(KEEPER, true);
        wall
    }

    #[test]
    fn dropped_on_treasury_deposits_gold() {
        let mut world = claimed_world();
        world
            .add_building(BuildingKind::Room(RoomKind::Treasury), KEEPER, vec![DROP_AT])
            .expect("treasury");
        let id = dropped_worker(&mut world);
        if let Some(worker) = world.creature_mut(id) {
            worker.gold_carried = 40;
        }
        // A marked wall next door loses to the deposit.
        world.map.set_tile(Position::new(3, 2), marked_wall());

        let pushed = idle_once(&mut world, id, &mut PcgRng::new(1));
        assert_eq!(world.creature(id).map(|c| c.gold_carried), Some(0));
        assert_eq!(world.seat_gold(KEEPER), 40);
        assert!(!matches!(pushed, Some(Action::SearchTileToDig { .. })));
    }

    #[test]
    fn dropped_next_to_marked_tile_digs_before_claiming() {
        let mut world = claimed_world();
        world.map.set_tile(Position::new(3, 2), marked_wall());
        world
            .map
            .set_tile(Position::new(1, 2), Tile::floor(TileKind::Dirt));
        let id = dropped_worker(&mut world);

        let pushed = idle_once(&mut world, id, &mut PcgRng::new(1));
        assert_eq!(pushed, Some(Action::SearchTileToDig { forced: true }));
    }

    #[test]
    fn dropped_on_unclaimed_ground_claims_it() {
        let mut world = claimed_world();
        world.map.set_tile(DROP_AT, Tile::floor(TileKind::Dirt));
        let id = dropped_worker(&mut world);

        let pushed = idle_once(&mut world, id, &mut PcgRng::new(1));
        assert_eq!(pushed, Some(Action::SearchGroundTileToClaim { forced: true }));
    }

    #[test]
    fn dropped_on_claimed_ground_claims_the_unclaimed_neighbor() {
        let mut world = claimed_world();
        world
            .map
            .set_tile(Position::new(3, 2), Tile::floor(TileKind::Dirt));
        let id = dropped_worker(&mut world);

        let pushed = idle_once(&mut world, id, &mut PcgRng::new(1));
        assert_eq!(pushed, Some(Action::SearchGroundTileToClaim { forced: true }));
    }

    #[test]
    fn dropped_next_to_unclaimed_wall_claims_the_wall() {
        let mut world = claimed_world();
        world
            .map
            .set_tile(Position::new(2, 1), Tile::wall(TileKind::Dirt));
        let id = dropped_worker(&mut world);

        let pushed = idle_once(&mut world, id, &mut PcgRng::new(1));
        assert_eq!(pushed, Some(Action::SearchWallTileToClaim { forced: true }));
    }

    #[test]
    fn unclaimed_wall_is_ignored_when_standing_on_unclaimed_rock_floor() {
        let mut world = claimed_world();
        world.map.set_tile(DROP_AT, Tile::floor(TileKind::Rock));
        world
            .map
            .set_tile(Position::new(2, 1), Tile::wall(TileKind::Dirt));
        let id = dropped_worker(&mut world);

        let pushed = idle_once(&mut world, id, &mut ScriptedRng::constant(0.99));
        assert_ne!(pushed, Some(Action::SearchWallTileToClaim { forced: true }));
    }

    #[test]
    fn dropped_on_loose_gold_carries_it() {
        let mut world = claimed_world();
        world.spawn_object(ObjectKind::TreasuryGold { amount: 100 }, DROP_AT);
        let id = dropped_worker(&mut world);

        let pushed = idle_once(&mut world, id, &mut PcgRng::new(1));
        assert_eq!(pushed, Some(Action::SearchEntityToCarry { forced: true }));
    }

    #[test]
    fn fighter_with_nobody_to_follow_heads_far() {
        let mut world = World::new(TileMap::new(9, 9, Tile::claimed(KEEPER)));
        world.add_seat(Seat::new(KEEPER, 1));
        let id = world
            .spawn_creature(
                "Troll1",
                KEEPER,
                Arc::new(CreatureDefinition::fighter("Troll")),
                Position::new(4, 4),
            )
            .expect("spawn");

        let config = AiConfig::default();
        let pathfinder = GridPathfinder::new();
        let mut rng = ScriptedRng::constant(0.0);
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let visible = creature.visibility.visible_tiles.clone();
            let mut turn = Turn::new(creature, world, &mut ctx);
            assert_eq!(wander(&mut turn), Dispatch::Loop);
            assert_eq!(turn.creature.ai.stack.top_kind(), Some(ActionKind::WalkToTile));
            let goal = turn.creature.walk_path.back().copied().expect("path");
            let rank = visible.iter().position(|t| *t == goal).expect("visible goal");
            assert!(rank >= visible.len() / 2);
        });
    }
}
