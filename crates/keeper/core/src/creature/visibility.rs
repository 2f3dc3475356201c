use super::Creature;
use crate::env::Pathfinder;
use crate::types::{EntityId, Position};
use crate::world::{Attackable, World};

/// What a creature perceives this tick. Recomputed once per upkeep and only
/// read by handlers afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Visibility {
    /// Tiles within sight radius, nearest first.
    pub tiles_in_sight: Vec<Position>,
    /// Subset of `tiles_in_sight` with a clear line of sight.
    pub visible_tiles: Vec<Position>,
    pub visible_enemies: Vec<Attackable>,
    pub reachable_enemies: Vec<Attackable>,
    /// Reachable enemy creatures; only workers when the viewer is a worker.
    pub reachable_enemy_creatures: Vec<EntityId>,
    pub visible_allies: Vec<EntityId>,
    pub reachable_allies: Vec<EntityId>,
    /// Visible walls marked for digging by the viewer's seat.
    pub visible_marked_tiles: Vec<Position>,
    pub visible_claimable_walls: Vec<Position>,
}

impl Visibility {
    pub fn can_see(&self, position: Position) -> bool {
        self.visible_tiles.contains(&position)
    }
}

/// Recomputes what `creature` sees and can reach.
pub fn compute_visibility(
    creature: &Creature,
    world: &World,
    pathfinder: &dyn Pathfinder,
) -> Visibility {
    let map = &world.map;
    let origin = creature.position;
    let profile = creature.movement_profile();
    let tiles_in_sight = map.tiles_within(origin, creature.definition.sight_radius);
    let visible_tiles: Vec<Position> = tiles_in_sight
        .iter()
        .copied()
        .filter(|p| map.line_of_sight(origin, *p))
        .collect();

    let mut vis = Visibility {
        tiles_in_sight,
        ..Visibility::default()
    };

    for other in world.creatures() {
        if other.id == creature.id || !other.on_map || !other.is_alive() {
            continue;
        }
        if !visible_tiles.contains(&other.position) {
            continue;
        }
        if world.are_enemies(creature.seat, other.seat) {
            if other.is_ko() {
                continue;
            }
            let target = Attackable::Creature(other.id);
            vis.visible_enemies.push(target);
            if pathfinder
                .path_to_best_fighting_position(
                    map,
                    profile,
                    origin,
                    &[other.position],
                    creature.attack_range,
                )
                .is_some()
            {
                vis.reachable_enemies.push(target);
                if !creature.is_worker() || other.is_worker() {
                    vis.reachable_enemy_creatures.push(other.id);
                }
            }
        } else {
            vis.visible_allies.push(other.id);
            if pathfinder.path_exists(map, profile, origin, other.position) {
                vis.reachable_allies.push(other.id);
            }
        }
    }

    for building in world.buildings() {
        if !world.are_enemies(creature.seat, building.seat) {
            continue;
        }
        if !building.tiles.iter().any(|t| visible_tiles.contains(t)) {
            continue;
        }
        let target = Attackable::Building(building.id);
        vis.visible_enemies.push(target);
        if pathfinder
            .path_to_best_fighting_position(
                map,
                profile,
                origin,
                &building.tiles,
                creature.attack_range,
            )
            .is_some()
        {
            vis.reachable_enemies.push(target);
        }
    }

    for position in &visible_tiles {
        let Some(tile) = map.tile(*position) else {
            continue;
        };
        if creature.dig_rate > 0.0 && tile.is_marked_for_digging(creature.seat) {
            vis.visible_marked_tiles.push(*position);
        }
        if creature.claim_rate > 0.0 && map.is_wall_claimable(*position, creature.seat) {
            vis.visible_claimable_walls.push(*position);
        }
    }

    vis.visible_tiles = visible_tiles;
    vis
}
