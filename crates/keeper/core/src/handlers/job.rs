//! Working in rooms.
use super::movement::set_destination;
use super::{can_reach, own_building_here};
use crate::action::Action;
use crate::context::{Dispatch, Turn};
use crate::creature::MoodLevel;
use crate::env::shuffle;
use crate::event::AnimationState;
use crate::types::EntityId;
use crate::world::RoomKind;

const TRAINING_EXP_PER_TURN: f64 = 0.5;
const RESEARCH_POINTS_PER_TURN: f64 = 2.0;
const MANA_PER_TURN: f64 = 0.5;

/// Mood check shared by every job step. True when the creature refuses to work.
fn refuses_work(turn: &mut Turn<'_, '_>) -> bool {
    match turn.creature.mood() {
        MoodLevel::Upset => turn.ctx.rng.chance(turn.config().upset_quit_job_chance),
        MoodLevel::Angry | MoodLevel::Furious => true,
        MoodLevel::Happy | MoodLevel::Neutral => false,
    }
}

fn too_tired(turn: &mut Turn<'_, '_>) -> bool {
    turn.ctx.rng.uniform(10.0, 30.0) > turn.creature.awakeness
}

fn too_hungry(turn: &mut Turn<'_, '_>) -> bool {
    turn.ctx.rng.uniform(70.0, 80.0) < turn.creature.hunger
}

/// Replaces the active action with a trip to bed.
fn go_to_sleep(turn: &mut Turn<'_, '_>) {
    turn.pop();
    turn.push_forced(Action::Sleep);
    if turn.creature.home.is_none() {
        turn.push_forced(Action::FindHome { forced: false });
    }
}

fn go_to_eat(turn: &mut Turn<'_, '_>) {
    turn.pop();
    turn.push_forced(Action::Eat { forced: false });
}

pub(super) fn job(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if !forced {
        if refuses_work(turn) {
            turn.pop();
            return Dispatch::Loop;
        }
        if too_tired(turn) {
            go_to_sleep(turn);
            return Dispatch::Loop;
        }
        if too_hungry(turn) {
            go_to_eat(turn);
            return Dispatch::Loop;
        }
    }
    if !turn.push(Action::SearchJob { forced }) {
        turn.pop();
    }
    Dispatch::Loop
}

pub(super) fn search_job(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if forced {
        return search_forced_job(turn);
    }
    if turn.top_turns() >= turn.config().nb_turns_before_checking_task {
        turn.pop();
        return Dispatch::Loop;
    }

    let id = turn.creature.id;
    let seat = turn.creature.seat;
    let here = own_building_here(turn).and_then(|b| {
        turn.world
            .building(b)
            .and_then(|room| room.room_kind().map(|kind| (b, kind)))
    });
    let affinities = turn.creature.definition.room_affinities.clone();

    for affinity in affinities.iter().filter(|a| a.likeness > 0) {
        if let Some((room, kind)) = here.filter(|(_, kind)| *kind == affinity.room) {
            if affinity.efficiency <= 0.0 || kind == RoomKind::Hatchery {
                wander_in_room(turn, room);
                return Dispatch::Done;
            }
            if turn
                .world
                .building(room)
                .is_some_and(|b| b.has_open_creature_spot(id))
            {
                turn.pop();
                turn.push_forced(Action::UseRoom {
                    room: Some(room),
                    forced: false,
                    fee_tried: false,
                });
                return Dispatch::Loop;
            }
        }

        let mut rooms: Vec<EntityId> = turn
            .world
            .rooms_of(seat, affinity.room)
            .into_iter()
            .filter(|r| here.is_none_or(|(current, _)| current != *r))
            .collect();
        shuffle(turn.ctx.rng, &mut rooms);
        for room in rooms {
            let Some(building) = turn.world.building(room) else {
                continue;
            };
            if affinity.efficiency > 0.0 && !building.has_open_creature_spot(id) {
                continue;
            }
            let Some(entry) = building.covered_tile(0) else {
                continue;
            };
            if !can_reach(turn, entry) {
                continue;
            }
            if wander_in_room(turn, room) {
                return Dispatch::Loop;
            }
        }
    }

    turn.pop();
    Dispatch::Loop
}

/// A creature dropped in a room works there if it can.
fn search_forced_job(turn: &mut Turn<'_, '_>) -> Dispatch {
    let id = turn.creature.id;
    let room = own_building_here(turn).filter(|room| {
        turn.world.building(*room).is_some_and(|b| {
            b.room_kind()
                .and_then(|kind| turn.creature.definition.affinity_for(kind))
                .is_some_and(|a| a.efficiency > 0.0)
                && b.has_open_creature_spot(id)
        })
    });
    turn.pop();
    if let Some(room) = room {
        turn.push_forced(Action::UseRoom {
            room: Some(room),
            forced: true,
            fee_tried: false,
        });
    }
    Dispatch::Loop
}

/// Walks to a random tile of `room`.
fn wander_in_room(turn: &mut Turn<'_, '_>, room: EntityId) -> bool {
    let Some(tiles) = turn.world.building(room).map(|b| b.tiles.clone()) else {
        return false;
    };
    if tiles.is_empty() {
        return false;
    }
    let tile = tiles[turn.ctx.rng.index(tiles.len())];
    set_destination(turn, tile)
}

pub(super) fn use_room(
    turn: &mut Turn<'_, '_>,
    room: Option<EntityId>,
    forced: bool,
    fee_tried: bool,
) -> Dispatch {
    if turn.creature.ai.job_cooldown > 0 {
        turn.creature.ai.job_cooldown -= 1;
        return Dispatch::Done;
    }
    let Some(room) = room else {
        turn.pop();
        return Dispatch::Loop;
    };
    let Some((kind, entry, inside)) = turn.world.building(room).and_then(|b| {
        let kind = b.room_kind()?;
        let entry = b.covered_tile(0)?;
        Some((kind, entry, b.covers(turn.creature.position)))
    }) else {
        turn.pop();
        return Dispatch::Loop;
    };

    if !forced && refuses_work(turn) {
        turn.pop();
        return Dispatch::Loop;
    }

    if !inside {
        if !set_destination(turn, entry) {
            turn.pop();
        }
        return Dispatch::Loop;
    }

    if !forced {
        let seat_gold = turn.world.seat_gold(turn.creature.seat);
        if turn.creature.fee_owed > 0 && !fee_tried && seat_gold > 0 {
            turn.replace_top(Action::UseRoom {
                room: Some(room),
                forced,
                fee_tried: true,
            });
            turn.push_forced(Action::GetFee);
            return Dispatch::Loop;
        }
        if too_tired(turn) {
            go_to_sleep(turn);
            return Dispatch::Loop;
        }
        if too_hungry(turn) {
            go_to_eat(turn);
            return Dispatch::Loop;
        }
    }

    let efficiency = turn
        .creature
        .definition
        .affinity_for(kind)
        .map_or(0.0, |a| a.efficiency);
    work_in(turn, room, kind, efficiency)
}

/// One turn of work; what it yields depends on the room.
fn work_in(turn: &mut Turn<'_, '_>, room: EntityId, kind: RoomKind, efficiency: f64) -> Dispatch {
    let seat = turn.creature.seat;
    match kind {
        RoomKind::TrainingHall => {
            turn.creature.receive_exp(TRAINING_EXP_PER_TURN * efficiency);
            turn.creature.ai.turns_without_fight = 0;
            turn.creature.ai.job_cooldown = turn.creature.definition.base.attack_warmup;
            turn.set_animation(AnimationState::Attack, true);
        }
        RoomKind::Library => {
            if let Some(owner) = turn.world.seat_mut(seat) {
                owner.research_points += (RESEARCH_POINTS_PER_TURN * efficiency).round() as u64;
            }
            turn.set_animation(AnimationState::Idle, true);
        }
        RoomKind::Workshop => {
            if let Some(owner) = turn.world.seat_mut(seat) {
                owner.mana += MANA_PER_TURN * efficiency;
            }
            turn.set_animation(AnimationState::Idle, true);
        }
        RoomKind::Arena => {
            let me = turn.creature.id;
            let opponent = turn
                .world
                .building(room)
                .and_then(|b| b.users().iter().copied().find(|u| *u != me));
            if let Some(opponent) = opponent {
                tracing::debug!("Job: arena fight creature={}, opponent={}", me, opponent);
                turn.push_forced(Action::FightArena {
                    opponent: Some(opponent),
                });
                return Dispatch::Loop;
            }
            turn.set_animation(AnimationState::Idle, true);
        }
        _ => {
            turn.set_animation(AnimationState::Idle, true);
        }
    }
    Dispatch::Done
}
