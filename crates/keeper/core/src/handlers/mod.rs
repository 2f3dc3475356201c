//! Per-action handlers.
//!
//! Each handler runs the active action of one creature for one dispatch step
//! and answers whether the driver should dispatch again this tick. Handlers
//! never fail: a target that vanished or a path that closed pops the action
//! and lets the next step pick something else.
mod carry;
mod claim;
mod combat;
mod dig;
mod eat;
mod fee;
mod home;
mod idle;
mod job;
mod movement;

pub use movement::{set_destination, set_destination_with, start_walk, wander_randomly};

pub(crate) use dig::deposit_carried_gold;
pub(crate) use home::release_home;

use crate::action::Action;
use crate::context::{Dispatch, Turn};
use crate::types::{EntityId, Position};
use crate::world::EntityCarryType;

/// Runs `action`, the payload of the record on top of the stack.
pub fn dispatch(turn: &mut Turn<'_, '_>, action: Action) -> Dispatch {
    match action {
        Action::Idle => idle::idle(turn),
        Action::WalkToTile => movement::walk_to_tile(turn),
        Action::Fight { target, ko } => combat::fight(turn, target, ko),
        Action::FightArena { opponent } => combat::fight_arena(turn, opponent),
        Action::AttackObject {
            target,
            target_tile,
            ko,
        } => combat::attack_object(turn, target, target_tile, ko),
        Action::Flee => combat::flee(turn),
        Action::SearchTileToDig { forced } => dig::search_tile_to_dig(turn, forced),
        Action::DigTile { tile, from } => dig::dig_tile(turn, tile, from),
        Action::SearchGroundTileToClaim { forced } => claim::search_ground_tile(turn, forced),
        Action::ClaimGroundTile { tile } => claim::claim_ground_tile(turn, tile),
        Action::SearchWallTileToClaim { forced } => claim::search_wall_tile(turn, forced),
        Action::ClaimWallTile { tile, from } => claim::claim_wall_tile(turn, tile, from),
        Action::SearchEntityToCarry { forced } => carry::search_entity_to_carry(turn, forced),
        Action::GrabEntity { entity } => carry::grab_entity(turn, entity),
        Action::CarryEntity {
            entity,
            building,
            drop_tile,
        } => carry::carry_entity(turn, entity, building, drop_tile),
        Action::FindHome { forced } => home::find_home(turn, forced),
        Action::Sleep => home::sleep(turn),
        Action::Job { forced } => job::job(turn, forced),
        Action::SearchJob { forced } => job::search_job(turn, forced),
        Action::UseRoom {
            room,
            forced,
            fee_tried,
        } => job::use_room(turn, room, forced, fee_tried),
        Action::Eat { forced } => eat::eat(turn, forced),
        Action::SearchFood { forced } => eat::search_food(turn, forced),
        Action::EatChicken { chicken } => eat::eat_chicken(turn, chicken),
        Action::UseHatchery { hatchery, forced } => eat::use_hatchery(turn, hatchery, forced),
        Action::GetFee => fee::get_fee(turn),
        Action::LeaveDungeon => fee::leave_dungeon(turn),
        Action::StealFreeGold => fee::steal_free_gold(turn),
    }
}

// ============================================================================
// Shared queries
// ============================================================================

/// Whether the creature can walk to `to`, counting its own tile as reachable.
pub(crate) fn can_reach(turn: &Turn<'_, '_>, to: Position) -> bool {
    let from = turn.creature.position;
    from == to
        || turn.ctx.pathfinder.path_exists(
            &turn.world.map,
            turn.creature.movement_profile(),
            from,
            to,
        )
}

pub(crate) fn path_to(turn: &Turn<'_, '_>, to: Position) -> Option<Vec<Position>> {
    turn.ctx.pathfinder.path(
        &turn.world.map,
        turn.creature.movement_profile(),
        turn.creature.position,
        to,
    )
}

/// Own buildings with a free spot for `carry`, with the tile a carrier heads to.
pub(crate) fn buildings_wanting(
    turn: &Turn<'_, '_>,
    carry: EntityCarryType,
) -> Vec<(EntityId, Position)> {
    turn.world
        .buildings()
        .filter(|b| b.seat == turn.creature.seat && b.has_carry_entity_spot(carry))
        .filter_map(|b| b.covered_tile(0).map(|tile| (b.id, tile)))
        .filter(|(_, tile)| can_reach(turn, *tile))
        .collect()
}

/// Own building whose footprint covers the creature's tile.
pub(crate) fn own_building_here(turn: &Turn<'_, '_>) -> Option<EntityId> {
    turn.world
        .building_at(turn.creature.position)
        .filter(|b| b.seat == turn.creature.seat)
        .map(|b| b.id)
}
