//! Picking up loose entities and bringing them to the buildings that want them.
use super::movement::set_destination;
use super::{buildings_wanting, can_reach};
use crate::action::Action;
use crate::context::{Dispatch, Turn};
use crate::types::{EntityId, Position};
use crate::world::EntityCarryType;

pub(super) fn search_entity_to_carry(turn: &mut Turn<'_, '_>, forced: bool) -> Dispatch {
    if turn.creature.carried_entity.is_some() {
        tracing::warn!(
            "Carry: searching while already carrying creature={}",
            turn.creature.id
        );
        turn.pop();
        return Dispatch::Loop;
    }

    let position = turn.creature.position;
    let in_sight = &turn.creature.visibility.tiles_in_sight;
    let candidates: Vec<(EntityId, Position, EntityCarryType)> = turn
        .world
        .objects()
        .filter(|o| o.is_available_to_carry() && in_sight.contains(&o.position))
        .filter(|o| !forced || o.position == position)
        .map(|o| (o.id, o.position, o.carry_type()))
        .collect();

    // Only the highest priority type some building wants is considered;
    // among those an entity on our own tile wins.
    let mut highest = EntityCarryType::NotCarryable;
    let mut available: Vec<EntityId> = Vec::new();
    let mut on_my_tile: Option<EntityId> = None;
    for (id, at, carry) in candidates {
        if carry < highest || !can_reach(turn, at) {
            continue;
        }
        if buildings_wanting(turn, carry).is_empty() {
            continue;
        }
        if carry > highest {
            highest = carry;
            available.clear();
            on_my_tile = None;
        }
        available.push(id);
        if at == position && on_my_tile.is_none() {
            on_my_tile = Some(id);
        }
    }

    if available.is_empty() {
        turn.pop();
        return Dispatch::Loop;
    }

    let entity = match on_my_tile {
        Some(id) => id,
        None => available[turn.ctx.rng.index(available.len())],
    };
    tracing::debug!(
        "Carry: going for entity={}, creature={}",
        entity,
        turn.creature.id
    );
    turn.push_forced(Action::GrabEntity {
        entity: Some(entity),
    });
    Dispatch::Loop
}

pub(super) fn grab_entity(turn: &mut Turn<'_, '_>, entity: Option<EntityId>) -> Dispatch {
    let Some(id) = entity else {
        turn.pop();
        return Dispatch::Done;
    };
    let Some((at, carry)) = turn
        .world
        .object(id)
        .filter(|o| o.on_map)
        .map(|o| (o.position, o.carry_type()))
    else {
        turn.pop();
        return Dispatch::Done;
    };

    if at != turn.creature.position {
        if !set_destination(turn, at) {
            turn.pop();
            return Dispatch::Loop;
        }
        return Dispatch::Loop;
    }

    let wanting = buildings_wanting(turn, carry);
    let tiles: Vec<Position> = wanting.iter().map(|(_, tile)| *tile).collect();
    let best = turn.ctx.pathfinder.find_best_path(
        &turn.world.map,
        turn.creature.movement_profile(),
        turn.creature.position,
        &tiles,
    );
    let Some((_, idx)) = best else {
        turn.pop();
        return Dispatch::Loop;
    };
    let building = wanting[idx].0;

    turn.pop();
    turn.push_forced(Action::CarryEntity {
        entity: Some(id),
        building: Some(building),
        drop_tile: None,
    });
    Dispatch::Loop
}

pub(super) fn carry_entity(
    turn: &mut Turn<'_, '_>,
    entity: Option<EntityId>,
    building: Option<EntityId>,
    drop_tile: Option<Position>,
) -> Dispatch {
    let (Some(_), Some(_), Some(drop_tile)) = (entity, building, drop_tile) else {
        turn.pop();
        return Dispatch::Loop;
    };

    if turn.creature.position != drop_tile {
        if !set_destination(turn, drop_tile) {
            tracing::debug!(
                "Carry: drop tile unreachable tile={}, creature={}",
                drop_tile,
                turn.creature.id
            );
            turn.pop();
        }
        return Dispatch::Loop;
    }

    // Releasing the action hands the entity to the building.
    turn.pop();
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
    use crate::map::{Tile, TileMap};
    use crate::types::{SeatId, Tick};
    use crate::world::{BuildingKind, ObjectKind, RoomKind, Seat, World};

    #[test]
    fn prefers_higher_priority_entities() {
        let mut world = World::new(TileMap::new(5, 5, Tile::claimed(SeatId(1))));
        world.add_seat(Seat::new(SeatId(1), 1));
        world
            .add_building(
                BuildingKind::Room(RoomKind::Treasury),
                SeatId(1),
                vec![Position::new(4, 4)],
            )
            .expect("treasury");
        world
            .add_building(
                BuildingKind::Room(RoomKind::Crypt),
                SeatId(1),
                vec![Position::new(4, 0)],
            )
            .expect("crypt");
        world.spawn_object(ObjectKind::Corpse, Position::new(1, 1));
        let gold = world.spawn_object(ObjectKind::TreasuryGold { amount: 30 }, Position::new(2, 2));

        let config = AiConfig::default();
        let mut rng = PcgRng::new(4);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature(
                "Kobold1",
                SeatId(1),
                Arc::new(CreatureDefinition::worker("Kobold")),
                Position::new(1, 1),
            )
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, &pathfinder);
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push(Action::SearchEntityToCarry { forced: false });
            assert_eq!(search_entity_to_carry(&mut turn, false), Dispatch::Loop);
            assert_eq!(
                turn.top().map(|r| r.action.clone()),
                Some(Action::GrabEntity { entity: Some(gold) })
            );
        });
        assert!(world.object(gold).is_some_and(|o| o.carry_lock));
    }

    #[test]
    fn delivering_gold_fills_the_treasury() {
        let mut world = World::new(TileMap::new(3, 1, Tile::claimed(SeatId(1))));
        world.add_seat(Seat::new(SeatId(1), 1));
        let treasury = world
            .add_building(
                BuildingKind::Room(RoomKind::Treasury),
                SeatId(1),
                vec![Position::new(2, 0)],
            )
            .expect("treasury");
        let pile = world.spawn_object(ObjectKind::TreasuryGold { amount: 70 }, Position::new(0, 0));

        let config = AiConfig::default();
        let mut rng = PcgRng::new(4);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature(
                "Kobold1",
                SeatId(1),
                Arc::new(CreatureDefinition::worker("Kobold")),
                Position::new(0, 0),
            )
            .expect("spawn");

        world.with_creature_out(id, |creature, world| {
            let mut turn = Turn::new(creature, world, &mut ctx);
            turn.push_forced(Action::GrabEntity { entity: Some(pile) });
            assert_eq!(grab_entity(&mut turn, Some(pile)), Dispatch::Loop);
            assert_eq!(turn.creature.carried_entity, Some(pile));
            assert_eq!(
                turn.creature.ai.stack.top_kind(),
                Some(ActionKind::CarryEntity)
            );
            turn.creature.position = Position::new(2, 0);
            let Some(Action::CarryEntity {
                entity,
                building,
                drop_tile,
            }) = turn.top().map(|r| r.action.clone())
            else {
                panic!("expected a carry");
            };
            assert_eq!(drop_tile, Some(Position::new(2, 0)));
            assert_eq!(carry_entity(&mut turn, entity, building, drop_tile), Dispatch::Done);
            assert_eq!(turn.creature.carried_entity, None);
        });
        assert!(world.object(pile).is_none());
        assert_eq!(world.building(treasury).map(|b| b.stored_gold()), Some(70));
    }
}
