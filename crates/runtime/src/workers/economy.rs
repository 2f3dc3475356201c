//! Dungeon-level upkeep that runs between creature turns: wages and chickens.
use keeper_core::{BuildingKind, EntityId, ObjectKind, Position, RngOracle, RoomKind, SimEvent, World};

/// Adds each paid creature's fee to what it is owed. Returns how many were paid.
pub(crate) fn pay_wages(world: &mut World) -> usize {
    let mut paid = 0;
    for id in world.creature_ids() {
        let Some(creature) = world.creature_mut(id) else {
            continue;
        };
        let fee = creature.definition.fee;
        if fee == 0 || !creature.is_alive() {
            continue;
        }
        creature.fee_owed = creature.fee_owed.saturating_add(fee);
        paid += 1;
    }
    paid
}

/// Lets every hatchery with room to spare hatch one chicken on a random tile.
pub(crate) fn breed_chickens(world: &mut World, rng: &mut dyn RngOracle) -> Vec<SimEvent> {
    let hatcheries: Vec<(EntityId, Vec<Position>)> = world
        .buildings()
        .filter(|b| b.kind == BuildingKind::Room(RoomKind::Hatchery))
        .map(|b| (b.id, b.tiles.clone()))
        .collect();

    let mut events = Vec::new();
    for (hatchery, tiles) in hatcheries {
        if tiles.is_empty() {
            continue;
        }
        let chickens = world
            .objects()
            .filter(|o| {
                o.on_map && o.kind == ObjectKind::Chicken {
                    hatchery: Some(hatchery),
                }
            })
            .count();
        if chickens >= tiles.len() {
            continue;
        }
        let position = tiles[rng.index(tiles.len())];
        let chicken = world.spawn_object(
            ObjectKind::Chicken {
                hatchery: Some(hatchery),
            },
            position,
        );
        tracing::debug!(
            "Economy: hatchery={} hatched chicken={} at={}",
            hatchery,
            chicken,
            position
        );
        events.push(SimEvent::EntitySpawned {
            entity: chicken,
            position,
        });
    }
    events
}
