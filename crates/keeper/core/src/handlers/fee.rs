//! Wages, leaving the dungeon and stealing loose gold.
use super::home::release_home;
use super::movement::set_destination;
use super::{can_reach, own_building_here};
use crate::context::{Dispatch, Turn};
use crate::event::SimEvent;
use crate::types::{EntityId, Position};
use crate::world::{ObjectKind, RoomKind};

pub(super) fn get_fee(turn: &mut Turn<'_, '_>) -> Dispatch {
    let position = turn.creature.position;
    let seat = turn.creature.seat;

    let treasury_here = own_building_here(turn).filter(|b| {
        turn.world
            .building(*b)
            .is_some_and(|room| room.is_room(RoomKind::Treasury))
    });
    if let Some(treasury) = treasury_here {
        let wanted = turn
            .creature
            .fee_owed
            .min(turn.creature.gold_capacity_left());
        let taken = turn
            .world
            .building_mut(treasury)
            .map_or(0, |b| b.withdraw_gold(wanted));
        if taken > 0 {
            turn.creature.fee_owed -= taken;
            turn.creature.add_gold(taken);
            let message = if turn.creature.fee_owed == 0 {
                format!("{} took its fee: {}", turn.creature.name, taken)
            } else {
                format!("{} took {} from its fee", turn.creature.name, taken)
            };
            turn.chat(message);
            tracing::debug!(
                "Fee: creature={} took={}, owed={}",
                turn.creature.id,
                taken,
                turn.creature.fee_owed
            );
        }
    }

    if turn.creature.fee_owed == 0 || turn.creature.gold_capacity_left() == 0 {
        turn.pop();
        return Dispatch::Loop;
    }

    let treasuries: Vec<Position> = turn
        .world
        .rooms_of(seat, RoomKind::Treasury)
        .into_iter()
        .filter_map(|id| turn.world.building(id))
        .filter(|b| b.stored_gold() > 0 && !b.covers(position))
        .filter_map(|b| b.covered_tile(0))
        .filter(|tile| can_reach(turn, *tile))
        .collect();
    if treasuries.is_empty() {
        turn.pop();
        return Dispatch::Loop;
    }
    let tile = treasuries[turn.ctx.rng.index(treasuries.len())];
    if !set_destination(turn, tile) {
        turn.pop();
        return Dispatch::Loop;
    }
    Dispatch::Loop
}

pub(super) fn leave_dungeon(turn: &mut Turn<'_, '_>) -> Dispatch {
    let position = turn.creature.position;
    let seat = turn.creature.seat;

    let at_portal_center = own_building_here(turn)
        .and_then(|b| turn.world.building(b))
        .is_some_and(|b| b.is_room(RoomKind::Portal) && b.central_tile() == Some(position));
    if at_portal_center {
        tracing::info!(
            "Creature left the dungeon: creature={}, seat={}",
            turn.creature.id,
            seat
        );
        turn.emit(SimEvent::LeftDungeon {
            creature: turn.creature.id,
        });
        release_home(turn.creature, turn.world);
        turn.clear_action_queue();
        turn.world.retire_creature(turn.creature);
        return Dispatch::Done;
    }

    let portals: Vec<Position> = turn
        .world
        .rooms_of(seat, RoomKind::Portal)
        .into_iter()
        .filter_map(|id| turn.world.building(id))
        .filter_map(|b| b.central_tile())
        .filter(|tile| can_reach(turn, *tile))
        .collect();
    if portals.is_empty() {
        turn.pop();
        return Dispatch::Loop;
    }
    let tile = portals[turn.ctx.rng.index(portals.len())];
    if !set_destination(turn, tile) {
        turn.pop();
    }
    Dispatch::Loop
}

pub(super) fn steal_free_gold(turn: &mut Turn<'_, '_>) -> Dispatch {
    let position = turn.creature.position;
    if turn.creature.gold_capacity_left() == 0 {
        turn.pop();
        return Dispatch::Loop;
    }

    let visible = &turn.creature.visibility.visible_tiles;
    let mut best: Option<(i64, EntityId, Position)> = None;
    for pile in turn.world.objects() {
        if !matches!(pile.kind, ObjectKind::TreasuryGold { .. })
            || !pile.on_map
            || pile.carry_lock
            || !visible.contains(&pile.position)
        {
            continue;
        }
        let dist = position.distance_sq(pile.position);
        if best.is_some_and(|(best_dist, _, _)| best_dist <= dist) {
            continue;
        }
        if !can_reach(turn, pile.position) {
            continue;
        }
        best = Some((dist, pile.id, pile.position));
    }
    let Some((_, pile, at)) = best else {
        turn.pop();
        return Dispatch::Loop;
    };

    if at != position {
        if !set_destination(turn, at) {
            turn.pop();
        }
        return Dispatch::Loop;
    }

    let amount = turn.world.object(pile).map_or(0, |o| o.gold());
    let wanted = amount
        .min(turn.config().steal_gold_amount)
        .min(turn.creature.gold_capacity_left());
    let taken = turn.creature.add_gold(wanted);
    let left = amount - taken;
    if left == 0 {
        if turn.world.remove_object(pile).is_ok() {
            turn.emit(SimEvent::EntityRemoved { entity: pile });
        }
    } else if let Some(object) = turn.world.object_mut(pile) {
        object.kind = ObjectKind::TreasuryGold { amount: left };
    }
    tracing::debug!(
        "Fee: creature={} stole={} from pile={}",
        turn.creature.id,
        taken,
        pile
    );
    turn.pop();
    Dispatch::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::action::{Action, ActionKind};
    use crate::config::AiConfig;
    use crate::context::SimulationContext;
    use crate::creature::{CreatureDefinition, compute_visibility};
    use crate::env::{GridPathfinder, PcgRng};
    use crate::map::{Tile, TileMap};
    use crate::types::{SeatId, Tick};
    use crate::world::{BuildingKind, Seat, World};

    fn world() -> World {
        let mut world = World::new(TileMap::new(5, 3, Tile::claimed(SeatId(1))));
        world.add_seat(Seat::new(SeatId(1), 1).human());
        world
    }

    #[test]
    fn fee_is_withdrawn_and_announced() {
        let mut world = world();
        let treasury = world
            .add_building(
                BuildingKind::Room(RoomKind::Treasury),
                SeatId(1),
                vec![Position::new(2, 1)],
            )
            .expect("treasury");
        if let Some(t) = world.building_mut(treasury) {
            t.deposit_gold(30, Position::new(2, 1));
        }
        let config = AiConfig::default();
        let mut rng = PcgRng::new(5);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature(
                "Troll1",
                SeatId(1),
                Arc::new(CreatureDefinition::fighter("Troll")),
                Position::new(2, 1),
            )
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            creature.fee_owed = 50;
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push_forced(Action::GetFee);
            assert_eq!(get_fee(&mut turn), Dispatch::Loop);
            assert_eq!(turn.creature.fee_owed, 20);
            assert_eq!(turn.creature.gold_carried, 30);
            // Nothing left anywhere: the fee stays owed.
            assert_eq!(turn.creature.ai.stack.kinds(), vec![ActionKind::Idle]);
        });
        assert!(ctx.events.iter().any(|e| matches!(
            e,
            SimEvent::Chat { message, .. } if message == "Troll1 took 30 from its fee"
        )));
    }

    #[test]
    fn leaving_through_the_portal_removes_the_creature() {
        let mut world = world();
        world
            .add_building(
                BuildingKind::Room(RoomKind::Portal),
                SeatId(1),
                vec![Position::new(3, 1)],
            )
            .expect("portal");
        let config = AiConfig::default();
        let mut rng = PcgRng::new(5);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature(
                "Troll1",
                SeatId(1),
                Arc::new(CreatureDefinition::fighter("Troll")),
                Position::new(3, 1),
            )
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push_forced(Action::LeaveDungeon);
            assert_eq!(leave_dungeon(&mut turn), Dispatch::Done);
        });
        assert!(world.creature(id).is_none());
        assert!(ctx
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::LeftDungeon { creature } if *creature == id)));
    }

    #[test]
    fn thief_takes_part_of_a_large_pile() {
        let mut world = world();
        let pile = world.spawn_object(ObjectKind::TreasuryGold { amount: 900 }, Position::new(1, 1));
        let config = AiConfig::default();
        let mut rng = PcgRng::new(5);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let def = Arc::new(CreatureDefinition::fighter("Thief").with_steals_gold(true));
        let id = world
            .spawn_creature("Thief1", SeatId(1), def, Position::new(1, 1))
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push_forced(Action::StealFreeGold);
            assert_eq!(steal_free_gold(&mut turn), Dispatch::Done);
            assert_eq!(turn.creature.gold_carried, config.steal_gold_amount);
        });
        assert_eq!(world.object(pile).map(|o| o.gold()), Some(900 - config.steal_gold_amount));
    }
}
