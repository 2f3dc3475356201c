//! Shared fixtures for the keeper-core integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use keeper_core::creature::compute_visibility;
use keeper_core::{
    AiConfig, CreatureDefinition, EntityId, GridPathfinder, PcgRng, Seat, SeatId,
    SimulationContext, Tick, Tile, TileMap, Turn, World,
};

pub const KEEPER: SeatId = SeatId(1);
pub const RIVAL: SeatId = SeatId(2);

/// A fully claimed floor owned by [`KEEPER`], with a rival seat on another team.
pub fn flat_world(width: u32, height: u32) -> World {
    world_on(TileMap::new(width, height, Tile::claimed(KEEPER)))
}

pub fn world_on(map: TileMap) -> World {
    let mut world = World::new(map);
    world.add_seat(Seat::new(KEEPER, 1).human());
    world.add_seat(Seat::new(RIVAL, 2));
    world
}

pub fn kobold() -> Arc<CreatureDefinition> {
    Arc::new(CreatureDefinition::worker("Kobold"))
}

pub fn troll() -> Arc<CreatureDefinition> {
    Arc::new(CreatureDefinition::fighter("Troll"))
}

/// Tunables, randomness and pathfinding for one test.
pub struct Services {
    pub config: AiConfig,
    pub rng: PcgRng,
    pub pathfinder: GridPathfinder,
}

impl Services {
    pub fn new(seed: u64) -> Self {
        Self::with_config(AiConfig::default(), seed)
    }

    pub fn with_config(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: PcgRng::new(seed),
            pathfinder: GridPathfinder::new(),
        }
    }

    pub fn ctx(&mut self, tick: Tick) -> SimulationContext<'_> {
        SimulationContext::new(&self.config, &mut self.rng, &self.pathfinder, tick)
    }
}

/// Runs `f` against creature `id` with a fresh perception snapshot.
pub fn with_turn<R>(
    world: &mut World,
    id: EntityId,
    ctx: &mut SimulationContext<'_>,
    f: impl FnOnce(&mut Turn<'_, '_>) -> R,
) -> R {
    world
        .with_creature_out(id, |creature, world| {
            creature.visibility = compute_visibility(creature, world, ctx.pathfinder);
            let mut turn = Turn::new(creature, world, ctx);
            f(&mut turn)
        })
        .expect("creature is in the world")
}
