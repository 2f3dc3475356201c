//! Damage rolls, damage application and experience awards.
use crate::action::Action;
use crate::context::Turn;
use crate::creature::Creature;
use crate::env::RngOracle;
use crate::event::{SimEvent, SoundEffect};
use crate::types::{EntityId, Position};

/// Experience fraction granted to a creature that got hit.
pub const VICTIM_EXP_SHARE: f64 = 0.15;

// ============================================================================
// Damage Roll
// ============================================================================

/// Raw damage of one attack, split by type so each defense applies separately.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DamageRoll {
    pub physical: f64,
    pub magical: f64,
}

impl DamageRoll {
    pub fn total(&self) -> f64 {
        self.physical + self.magical
    }
}

/// Rolls the attacker's damage against a target `distance` tiles away.
///
/// # Formula
///
/// ```text
/// physical = uniform(min(1, attack), attack)
/// magical  = uniform(0, magical_attack)
/// ```
///
/// Both components are zero when the target is out of range.
pub fn roll_damage(rng: &mut dyn RngOracle, attacker: &Creature, distance: f64) -> DamageRoll {
    if distance > attacker.attack_range {
        return DamageRoll::default();
    }
    let physical = if attacker.physical_attack > 0.0 {
        rng.uniform(attacker.physical_attack.min(1.0), attacker.physical_attack)
    } else {
        0.0
    };
    let magical = if attacker.magical_attack > 0.0 {
        rng.uniform(0.0, attacker.magical_attack)
    } else {
        0.0
    };
    DamageRoll { physical, magical }
}

/// Damage left after defenses, clamped to the victim's remaining hp.
///
/// Each defense is subtracted from its own component and floored at zero
/// before the components are summed.
pub fn mitigate(roll: DamageRoll, physical_defense: f64, magical_defense: f64, hp: f64) -> f64 {
    let physical = (roll.physical - physical_defense).max(0.0);
    let magical = (roll.magical - magical_defense).max(0.0);
    (physical + magical).min(hp.max(0.0))
}

/// Experience earned by an attacker for dealing `damage`.
///
/// # Formula
///
/// ```text
/// exp  = 1 + 0.2 * damage^1.3
/// diff = |victim_level - attacker_level|
/// exp *= 1 + diff / 10    if victim_level >= attacker_level
/// exp /= 1 + diff / 10    otherwise
/// ```
///
/// Targets without a level (buildings) get no level adjustment.
pub fn attack_experience(damage: f64, attacker_level: u32, victim_level: Option<u32>) -> f64 {
    let exp = 1.0 + 0.2 * damage.max(0.0).powf(1.3);
    let Some(victim_level) = victim_level else {
        return exp;
    };
    let diff = f64::from(victim_level.abs_diff(attacker_level));
    let factor = 1.0 + diff / 10.0;
    if victim_level >= attacker_level {
        exp * factor
    } else {
        exp / factor
    }
}

// ============================================================================
// Damage Application
// ============================================================================

/// Applies `damage` to the creature owning `turn`.
///
/// A KO hit that would kill leaves the victim at 1 hp and knocked out. A
/// worker hit by a non-worker drops everything and flees; a worker hit by a
/// worker keeps its stack and fights back through the priority step.
pub fn take_damage(turn: &mut Turn<'_, '_>, damage: f64, attacker_is_worker: bool, ko: bool) {
    let victim = &mut *turn.creature;
    victim.hp -= damage;
    victim.ai.turns_without_fight = 0;

    if victim.hp <= 0.0 {
        if ko {
            victim.hp = 1.0;
            victim.ko_turns = turn.ctx.config.ko_turns;
            tracing::debug!(
                "Combat: knocked out creature={}, ko_turns={}",
                victim.id,
                victim.ko_turns
            );
            turn.clear_action_queue();
        }
        return;
    }

    if victim.is_worker() && !attacker_is_worker {
        turn.clear_action_queue();
        turn.push_forced(Action::Flee);
    }
}

/// What a strike did to its target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StrikeOutcome {
    pub damage: f64,
    /// Level of the creature hit; `None` for buildings.
    pub victim_level: Option<u32>,
    pub destroyed: bool,
}

/// Hits the creature `victim` with `attacker`'s roll.
///
/// The victim is checked out of the world for the duration of the hit so its
/// own stack can react. Returns `None` if the victim no longer exists.
pub fn strike_creature(
    turn: &mut Turn<'_, '_>,
    victim: EntityId,
    roll: DamageRoll,
    ko: bool,
) -> Option<StrikeOutcome> {
    let attacker_is_worker = turn.creature.is_worker();
    let attacker_level = turn.creature.level;
    let ctx = &mut *turn.ctx;
    turn.world.with_creature_out(victim, |target, world| {
        let damage = mitigate(
            roll,
            target.physical_defense,
            target.magical_defense,
            target.hp,
        );
        let victim_level = target.level;
        let mut victim_turn = Turn::new(target, world, ctx);
        take_damage(&mut victim_turn, damage, attacker_is_worker, ko);
        let exp = attack_experience(damage, attacker_level, Some(victim_level));
        victim_turn.creature.receive_exp(exp * VICTIM_EXP_SHARE);
        StrikeOutcome {
            damage,
            victim_level: Some(victim_level),
            destroyed: false,
        }
    })
}

/// Hits a building. A building brought to 0 hp is removed from the world.
pub fn strike_building(
    turn: &mut Turn<'_, '_>,
    building: EntityId,
    roll: DamageRoll,
) -> Option<StrikeOutcome> {
    let target = turn.world.building_mut(building)?;
    let damage = roll.total().min(target.hp.max(0.0));
    target.hp -= damage;
    let destroyed = target.hp <= 0.0;
    if destroyed {
        match turn.world.remove_building(building) {
            Ok(_) => {
                tracing::info!("Combat: building destroyed id={}", building);
                turn.emit(SimEvent::EntityRemoved { entity: building });
            }
            Err(err) => tracing::warn!("Combat: failed to remove building: {}", err),
        }
    }
    Some(StrikeOutcome {
        damage,
        victim_level: None,
        destroyed,
    })
}

/// Attack sound at the target tile.
pub(crate) fn emit_attack_sound(turn: &mut Turn<'_, '_>, at: Position) {
    turn.emit(SimEvent::Sound {
        position: at,
        effect: SoundEffect::Attack,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AiConfig;
    use crate::context::SimulationContext;
    use crate::creature::CreatureDefinition;
    use crate::env::{GridPathfinder, PcgRng};
    use crate::map::{Tile, TileKind, TileMap};
    use crate::types::{SeatId, Tick};
    use crate::world::{BuildingKind, RoomKind, Seat, World};

    fn world() -> World {
        let mut world = World::new(TileMap::new(6, 6, Tile::claimed(SeatId(1))));
        world.add_seat(Seat::new(SeatId(1), 1));
        world.add_seat(Seat::new(SeatId(2), 2));
        world
    }

    #[test]
    fn out_of_range_rolls_nothing() {
        let mut rng = PcgRng::new(3);
        let attacker = Creature::new(
            EntityId(1),
            "Troll",
            SeatId(1),
            Arc::new(CreatureDefinition::fighter("Troll")),
            Position::ORIGIN,
        );
        assert_eq!(roll_damage(&mut rng, &attacker, 5.0), DamageRoll::default());
        let roll = roll_damage(&mut rng, &attacker, 1.0);
        assert!(roll.physical >= 1.0 && roll.physical <= attacker.physical_attack);
    }

    #[test]
    fn defenses_apply_per_component_and_clamp_to_hp() {
        let roll = DamageRoll {
            physical: 5.0,
            magical: 1.0,
        };
        assert_eq!(mitigate(roll, 2.0, 4.0, 100.0), 3.0);
        assert_eq!(mitigate(roll, 0.0, 0.0, 2.5), 2.5);
    }

    #[test]
    fn experience_favours_hitting_stronger_targets() {
        let even = attack_experience(10.0, 3, Some(3));
        let up = attack_experience(10.0, 3, Some(5));
        let down = attack_experience(10.0, 5, Some(3));
        assert!((up - even * 1.2).abs() < 1e-9);
        assert!((down - even / 1.2).abs() < 1e-9);
        assert_eq!(attack_experience(0.0, 1, None), 1.0);
    }

    #[test]
    fn ko_hit_leaves_victim_standing() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(1);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let def = Arc::new(CreatureDefinition::fighter("Troll"));
        let id = world
            .spawn_creature("Troll1", SeatId(2), def, Position::new(1, 1))
            .expect("spawn");
        world.with_creature_out(id, |creature, world| {
            let mut turn = Turn::new(creature, world, &mut ctx);
            let hp = turn.creature.hp;
            take_damage(&mut turn, hp + 10.0, false, true);
            assert_eq!(turn.creature.hp, 1.0);
            assert_eq!(turn.creature.ko_turns, config.ko_turns);
        });
    }

    #[test]
    fn building_at_zero_hp_is_removed() {
        let mut world = world();
        let config = AiConfig::default();
        let mut rng = PcgRng::new(1);
        let pathfinder = GridPathfinder::new();
        let mut ctx = SimulationContext::new(&config, &mut rng, &pathfinder, Tick(1));
        let room = world
            .add_building(
                BuildingKind::Room(RoomKind::Library),
                SeatId(2),
                vec![Position::new(3, 3)],
            )
            .expect("room");
        let def = Arc::new(CreatureDefinition::fighter("Troll"));
        let id = world
            .spawn_creature("Troll1", SeatId(1), def, Position::new(2, 3))
            .expect("spawn");
        let roll = DamageRoll {
            physical: 1000.0,
            magical: 0.0,
        };
        let outcome = world
            .with_creature_out(id, |creature, world| {
                let mut turn = Turn::new(creature, world, &mut ctx);
                strike_building(&mut turn, room, roll)
            })
            .flatten()
            .expect("strike");
        assert!(outcome.destroyed);
        assert!(world.building(room).is_none());
        assert!(ctx.events.contains(&SimEvent::EntityRemoved { entity: room }));
    }
}
