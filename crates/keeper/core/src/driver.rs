//! Per-tick creature upkeep.
//!
//! [`do_upkeep`] runs one creature's whole turn: death and knock-out counters,
//! vitals, mood, perception, the priority decision and finally the bounded
//! dispatch loop over the action stack. Handler failures never surface here;
//! only structural problems (a creature off the grid, an empty stack) do.
use crate::action::{Action, ActionKind, FightTarget};
use crate::context::{Dispatch, SimulationContext, Turn};
use crate::creature::{MoodInputs, MoodLevel, compute_mood_points, compute_visibility};
use crate::error::{ErrorContext, UpkeepError, WorldError};
use crate::event::{AnimationState, SimEvent, SoundEffect};
use crate::handlers;
use crate::types::EntityId;
use crate::world::World;

/// What a creature's upkeep amounted to this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpkeepOutcome {
    /// The creature is held in hand or otherwise off the map.
    Skipped,
    /// Dead, waiting for its body to disappear.
    Dying { turns_left: u32 },
    /// The creature left the world during this upkeep.
    Removed,
    KnockedOut { turns_left: u32 },
    /// Handlers ran `loops` dispatch steps.
    Acted { loops: u32 },
}

/// Runs one tick of upkeep for creature `id`.
///
/// Structural errors are logged here; the caller may keep simulating the
/// other creatures.
pub fn do_upkeep(
    world: &mut World,
    id: EntityId,
    ctx: &mut SimulationContext<'_>,
) -> Result<UpkeepOutcome, UpkeepError> {
    let result = world
        .with_creature_out(id, |creature, world| {
            let mut turn = Turn::new(creature, world, ctx);
            upkeep(&mut turn)
        })
        .ok_or(WorldError::CreatureNotFound { id })?;

    if let Err(err) = &result {
        tracing::error!("Upkeep: creature={} failed: {}", id, err);
    }
    result
}

fn upkeep(turn: &mut Turn<'_, '_>) -> Result<UpkeepOutcome, UpkeepError> {
    if !turn.creature.on_map {
        return Ok(UpkeepOutcome::Skipped);
    }
    if !turn.creature.is_alive() {
        return Ok(run_death_counter(turn));
    }
    if turn.creature.is_ko() {
        turn.creature.ko_turns -= 1;
        return Ok(UpkeepOutcome::KnockedOut {
            turns_left: turn.creature.ko_turns,
        });
    }

    let position = turn.creature.position;
    if turn.world.map.tile(position).is_none() {
        return Err(UpkeepError::NoPositionTile {
            creature: turn.creature.id,
            position,
            context: ErrorContext::new(turn.ctx.tick)
                .with_actor(turn.creature.id)
                .with_position(position),
        });
    }

    turn.creature.ai.stack.reset_tried();
    turn.creature.ai.stack.tick_turns();

    update_vitals(turn);
    update_mood(turn);

    turn.creature.visibility = compute_visibility(turn.creature, turn.world, turn.ctx.pathfinder);
    decide_priority_action(turn);
    run_actions(turn)
}

fn run_death_counter(turn: &mut Turn<'_, '_>) -> UpkeepOutcome {
    match turn.creature.death_counter {
        None => {
            let turns_left = turn.config().death_counter_turns;
            turn.creature.death_counter = Some(turns_left);
            turn.clear_action_queue();
            turn.set_animation(AnimationState::Die, false);
            turn.emit(SimEvent::Sound {
                position: turn.creature.position,
                effect: SoundEffect::Die,
            });
            tracing::info!(
                "Upkeep: creature died id={}, seat={}",
                turn.creature.id,
                turn.creature.seat
            );
            UpkeepOutcome::Dying { turns_left }
        }
        Some(0) => {
            handlers::release_home(turn.creature, turn.world);
            turn.clear_action_queue();
            turn.emit(SimEvent::CreatureDied {
                creature: turn.creature.id,
            });
            turn.world.retire_creature(turn.creature);
            UpkeepOutcome::Removed
        }
        Some(n) => {
            turn.creature.death_counter = Some(n - 1);
            UpkeepOutcome::Dying { turns_left: n - 1 }
        }
    }
}

fn update_vitals(turn: &mut Turn<'_, '_>) {
    let config = turn.config();
    if turn.creature.check_level_up(config) {
        tracing::info!(
            "Upkeep: level up creature={}, level={}",
            turn.creature.id,
            turn.creature.level
        );
        turn.emit(SimEvent::LevelUp {
            creature: turn.creature.id,
            level: turn.creature.level,
        });
    }

    let creature = &mut *turn.creature;
    creature.regenerate();
    creature.attack_warmup = creature.attack_warmup.saturating_sub(1);
    creature.ai.turns_without_fight = creature.ai.turns_without_fight.saturating_add(1);
}

fn update_mood(turn: &mut Turn<'_, '_>) {
    let config = turn.config();
    if turn.creature.ai.mood.cooldown > 0 {
        turn.creature.ai.mood.cooldown -= 1;
    } else {
        let points = {
            let creature = &*turn.creature;
            let classes: Vec<&str> = creature
                .visibility
                .visible_allies
                .iter()
                .filter_map(|id| turn.world.creature(*id))
                .map(|c| c.class_name())
                .collect();
            let inputs = MoodInputs {
                awakeness: creature.awakeness,
                hunger: creature.hunger,
                hp: creature.hp,
                max_hp: creature.max_hp,
                fee_owed: creature.fee_owed,
                turns_without_fight: creature.ai.turns_without_fight,
                visible_ally_classes: &classes,
            };
            compute_mood_points(&creature.definition.mood_modifiers, &inputs)
        };
        let level = MoodLevel::from_points(points, config);
        let id = turn.creature.id;
        let mood = &mut turn.creature.ai.mood;
        if mood.level != level {
            tracing::debug!(
                "Upkeep: mood creature={} {} -> {}, points={}",
                id,
                mood.level,
                level,
                points
            );
        }
        mood.points = points;
        mood.level = level;
        mood.cooldown = config.mood_recompute_turns;
    }

    let tick = turn.ctx.tick;
    if turn.creature.mood() != MoodLevel::Furious {
        turn.creature.ai.mood.first_turn_furious = None;
        return;
    }
    let since = *turn.creature.ai.mood.first_turn_furious.get_or_insert(tick);
    if tick.since(since) > config.nb_turns_furious_max
        && !turn.is_action_in_list(ActionKind::LeaveDungeon)
    {
        defect(turn);
    }
}

/// Hands a furious creature over to the rogue seat.
fn defect(turn: &mut Turn<'_, '_>) {
    let Some(rogue) = turn.world.rogue_seat else {
        return;
    };
    let from = turn.creature.seat;
    if from == rogue {
        return;
    }
    turn.clear_action_queue();
    handlers::release_home(turn.creature, turn.world);
    turn.creature.seat = rogue;
    turn.creature.fee_owed = 0;
    turn.creature.ai.mood.first_turn_furious = None;
    tracing::info!(
        "Upkeep: creature defected id={}, from={}, to={}",
        turn.creature.id,
        from,
        rogue
    );
    turn.emit(SimEvent::Defected {
        creature: turn.creature.id,
        from,
        to: rogue,
    });
}

/// Preempts the stack when danger or a very bad mood calls for it.
pub fn decide_priority_action(turn: &mut Turn<'_, '_>) {
    let config = turn.config();
    let fighting_or_fleeing =
        turn.is_action_in_list(ActionKind::Fight) || turn.is_action_in_list(ActionKind::Flee);
    let enemies_reachable = !turn.creature.visibility.reachable_enemies.is_empty();

    if turn.creature.is_weak(config) {
        if enemies_reachable && !turn.is_action_in_list(ActionKind::Flee) {
            tracing::debug!("Priority: weak creature={} flees", turn.creature.id);
            turn.clear_action_queue();
            turn.push_forced(Action::Flee);
        }
        return;
    }

    let ko = turn
        .world
        .seat(turn.creature.seat)
        .is_some_and(|s| s.ko_creatures);

    if !turn.creature.is_worker() && enemies_reachable {
        if fighting_or_fleeing {
            return;
        }
        turn.clear_action_queue();
        if turn.creature.mood().is_very_bad() && turn.ctx.rng.chance(config.bad_mood_flee_chance) {
            tracing::debug!("Priority: creature={} refuses to fight", turn.creature.id);
            turn.push_forced(Action::Flee);
        } else {
            turn.push_forced(Action::Fight {
                target: FightTarget::Any,
                ko,
            });
        }
        return;
    }

    if turn.creature.is_worker() && !turn.creature.visibility.reachable_enemy_creatures.is_empty()
    {
        if fighting_or_fleeing {
            return;
        }
        turn.clear_action_queue();
        turn.push_forced(Action::Fight {
            target: FightTarget::Any,
            ko,
        });
        return;
    }

    let mood = turn.creature.mood();
    if !mood.is_bad()
        || fighting_or_fleeing
        || turn.is_action_in_list(ActionKind::LeaveDungeon)
        || !turn.ctx.rng.chance(config.allied_natural_enemy_chance)
    {
        return;
    }

    if mood == MoodLevel::Furious && turn.ctx.rng.chance(config.furious_leave_chance) {
        tracing::info!("Priority: creature={} leaves the dungeon", turn.creature.id);
        turn.clear_action_queue();
        turn.push_forced(Action::LeaveDungeon);
        return;
    }

    let definition = &turn.creature.definition;
    let enemy = turn
        .creature
        .visibility
        .reachable_allies
        .iter()
        .copied()
        .find(|id| {
            turn.world
                .creature(*id)
                .is_some_and(|c| c.on_map && definition.is_natural_enemy(c.class_name()))
        });
    if let Some(enemy) = enemy {
        tracing::debug!(
            "Priority: creature={} attacks natural enemy={}",
            turn.creature.id,
            enemy
        );
        turn.clear_action_queue();
        turn.push_forced(Action::Fight {
            target: FightTarget::Specific(enemy),
            ko,
        });
    }
}

/// Dispatches the top action until a handler is done, the creature leaves
/// the world or the loop cap is hit.
fn run_actions(turn: &mut Turn<'_, '_>) -> Result<UpkeepOutcome, UpkeepError> {
    let max_loops = turn.config().max_dispatch_loops.max(1);
    let mut loops = 0;
    loop {
        let Some(action) = turn.top().map(|r| r.action.clone()) else {
            turn.creature.ai.stack.insert(Action::Idle);
            return Err(UpkeepError::EmptyStack {
                creature: turn.creature.id,
                context: ErrorContext::new(turn.ctx.tick).with_actor(turn.creature.id),
            });
        };
        let step = handlers::dispatch(turn, action);
        turn.world.deliver_pending(turn.creature);
        loops += 1;

        if turn.creature.removed {
            return Ok(UpkeepOutcome::Removed);
        }
        if step == Dispatch::Done {
            break;
        }
        if loops >= max_loops {
            tracing::warn!(
                "Upkeep: dispatch cap reached creature={}, loops={}, top={:?}",
                turn.creature.id,
                loops,
                turn.creature.ai.stack.top_kind()
            );
            break;
        }
    }
    Ok(UpkeepOutcome::Acted { loops })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AiConfig;
    use crate::creature::CreatureDefinition;
    use crate::env::{GridPathfinder, PcgRng, ScriptedRng};
    use crate::map::{Tile, TileMap};
    use crate::types::{Position, SeatId, Tick};
    use crate::world::Seat;

    fn world() -> World {
        let mut world = World::new(TileMap::new(8, 4, Tile::claimed(SeatId(1))));
        world.add_seat(Seat::new(SeatId(1), 1).human());
        world.add_seat(Seat::new(SeatId(2), 2));
        world
    }

    fn troll() -> Arc<CreatureDefinition> {
        Arc::new(CreatureDefinition::fighter("Troll"))
    }

    #[test]
    fn unknown_creature_is_a_world_error() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(1);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let err = do_upkeep(&mut world, EntityId(99), &mut ctx).expect_err("missing");
        assert_eq!(
            err,
            UpkeepError::World(WorldError::CreatureNotFound { id: EntityId(99) })
        );
    }

    #[test]
    fn dead_creature_counts_down_then_is_removed() {
        let mut world = world();
        let config = AiConfig::default().with_death_counter_turns(1);
        let mut rng = PcgRng::new(1);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature("Troll1", SeatId(1), troll(), Position::new(1, 1))
            .expect("spawn");
        if let Some(c) = world.creature_mut(id) {
            c.hp = 0.0;
        }

        assert_eq!(
            do_upkeep(&mut world, id, &mut ctx),
            Ok(UpkeepOutcome::Dying { turns_left: 1 })
        );
        assert_eq!(
            do_upkeep(&mut world, id, &mut ctx),
            Ok(UpkeepOutcome::Dying { turns_left: 0 })
        );
        assert_eq!(do_upkeep(&mut world, id, &mut ctx), Ok(UpkeepOutcome::Removed));
        assert!(world.creature(id).is_none());
        assert!(ctx
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::CreatureDied { creature } if *creature == id)));
    }

    #[test]
    fn knocked_out_creature_only_counts_down() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(1);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature("Troll1", SeatId(1), troll(), Position::new(1, 1))
            .expect("spawn");
        if let Some(c) = world.creature_mut(id) {
            c.ko_turns = 2;
        }
        assert_eq!(
            do_upkeep(&mut world, id, &mut ctx),
            Ok(UpkeepOutcome::KnockedOut { turns_left: 1 })
        );
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn held_creature_is_skipped() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(1);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let id = world
            .spawn_creature("Troll1", SeatId(1), troll(), Position::new(1, 1))
            .expect("spawn");
        world.pick_up_creature(id).expect("pick up");
        assert_eq!(do_upkeep(&mut world, id, &mut ctx), Ok(UpkeepOutcome::Skipped));
    }

    #[test]
    fn healthy_fighter_engages_reachable_enemy() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(1);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let me = world
            .spawn_creature("Troll1", SeatId(1), troll(), Position::new(1, 1))
            .expect("spawn");
        world
            .spawn_creature("Troll2", SeatId(2), troll(), Position::new(6, 1))
            .expect("spawn");

        let outcome = do_upkeep(&mut world, me, &mut ctx).expect("upkeep");
        assert!(matches!(outcome, UpkeepOutcome::Acted { .. }));
        let stack = &world.creature(me).expect("alive").ai.stack;
        assert!(stack.contains(ActionKind::Fight));
    }

    #[test]
    fn long_fury_defects_to_the_rogue_seat() {
        let mut world = world();
        world.add_seat(Seat::new(SeatId(9), 9));
        world.rogue_seat = Some(SeatId(9));
        let config = AiConfig::default();
        // Never roll into the allied-enemy branch.
        let mut rng = ScriptedRng::constant(0.99);
        let pathfinder = GridPathfinder::new();
        let id = world
            .spawn_creature("Troll1", SeatId(1), troll(), Position::new(1, 1))
            .expect("spawn");
        if let Some(c) = world.creature_mut(id) {
            c.ai.mood.level = MoodLevel::Furious;
            c.ai.mood.cooldown = 1000;
            c.ai.mood.first_turn_furious = Some(Tick(0));
        }

        let tick = Tick(config.nb_turns_furious_max + 1);
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, tick);
        do_upkeep(&mut world, id, &mut ctx).expect("upkeep");
        assert_eq!(world.creature(id).map(|c| c.seat), Some(SeatId(9)));
        assert!(ctx.events.iter().any(|e| matches!(
            e,
            SimEvent::Defected {
                from: SeatId(1),
                to: SeatId(9),
                ..
            }
        )));
    }
}
