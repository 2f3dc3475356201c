//! Creatures: species templates, mutable simulation state and AI state.
mod definition;
mod mood;
mod visibility;

use std::collections::VecDeque;
use std::sync::Arc;

pub use definition::{BaseStats, CreatureDefinition, LevelGains, MoodModifier, RoomAffinity};
pub use mood::{MoodInputs, MoodLevel, MoodState, compute_mood_points};
pub use visibility::{Visibility, compute_visibility};

use crate::action::{ActionKind, ActionStack};
use crate::config::AiConfig;
use crate::env::MovementProfile;
use crate::types::{EntityId, Position, SeatId};

/// Where a creature sleeps: a bed anchored in a dormitory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Home {
    pub room: EntityId,
    pub tile: Position,
}

/// Decision state of one creature, kept apart from its vitals.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AiState {
    pub stack: ActionStack,
    pub mood: MoodState,
    pub job_cooldown: u32,
    pub eat_cooldown: u32,
    /// Set when the owner drops a worker by hand; consumed by the next Idle.
    pub forced_drop: bool,
    pub turns_without_fight: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Creature {
    pub id: EntityId,
    pub name: String,
    pub seat: SeatId,
    pub definition: Arc<CreatureDefinition>,
    pub position: Position,
    pub on_map: bool,
    /// Set once the creature left the world; it is not reinserted after its turn.
    pub removed: bool,

    pub hp: f64,
    pub max_hp: f64,
    pub level: u32,
    pub exp: f64,
    pub awakeness: f64,
    pub hunger: f64,

    pub dig_rate: f64,
    pub claim_rate: f64,
    pub ground_speed: f64,
    pub water_speed: f64,
    pub lava_speed: f64,
    pub physical_attack: f64,
    pub magical_attack: f64,
    pub physical_defense: f64,
    pub magical_defense: f64,
    pub attack_range: f64,
    /// Turns left before the next attack can fire.
    pub attack_warmup: u32,

    pub gold_carried: u32,
    pub carried_entity: Option<EntityId>,
    pub job_room: Option<EntityId>,
    pub eat_room: Option<EntityId>,
    pub home: Option<Home>,
    pub fee_owed: u32,

    pub walk_path: VecDeque<Position>,
    pub death_counter: Option<u32>,
    pub ko_turns: u32,

    pub ai: AiState,
    pub visibility: Visibility,
}

impl Creature {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        seat: SeatId,
        definition: Arc<CreatureDefinition>,
        position: Position,
    ) -> Self {
        let base = definition.base.clone();
        let fee_owed = 0;
        Self {
            id,
            name: name.into(),
            seat,
            position,
            on_map: true,
            removed: false,
            hp: base.hp,
            max_hp: base.hp,
            level: 1,
            exp: 0.0,
            awakeness: 100.0,
            hunger: 0.0,
            dig_rate: base.dig_rate,
            claim_rate: base.claim_rate,
            ground_speed: base.ground_speed,
            water_speed: base.water_speed,
            lava_speed: base.lava_speed,
            physical_attack: base.physical_attack,
            magical_attack: base.magical_attack,
            physical_defense: base.physical_defense,
            magical_defense: base.magical_defense,
            attack_range: base.attack_range,
            attack_warmup: 0,
            gold_carried: 0,
            carried_entity: None,
            job_room: None,
            eat_room: None,
            home: None,
            fee_owed,
            walk_path: VecDeque::new(),
            death_counter: None,
            ko_turns: 0,
            ai: AiState::default(),
            visibility: Visibility::default(),
            definition,
        }
    }

    pub fn is_worker(&self) -> bool {
        self.definition.is_worker
    }

    pub fn class_name(&self) -> &str {
        &self.definition.class_name
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_ko(&self) -> bool {
        self.ko_turns > 0
    }

    pub fn is_weak(&self, config: &AiConfig) -> bool {
        self.hp < self.max_hp * config.weak_coefficient
    }

    pub fn movement_profile(&self) -> MovementProfile {
        MovementProfile::from_speeds(self.ground_speed, self.water_speed, self.lava_speed)
    }

    pub fn max_gold(&self) -> u32 {
        self.definition.max_gold_carryable
    }

    pub fn gold_capacity_left(&self) -> u32 {
        self.max_gold().saturating_sub(self.gold_carried)
    }

    /// Adds gold up to the carry cap. Returns the amount actually taken.
    pub fn add_gold(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.gold_capacity_left());
        self.gold_carried += taken;
        taken
    }

    pub fn is_action_in_list(&self, kind: ActionKind) -> bool {
        self.ai.stack.contains(kind)
    }

    pub fn mood(&self) -> MoodLevel {
        self.ai.mood.level
    }

    /// Negative amounts are ignored.
    pub fn receive_exp(&mut self, amount: f64) {
        if amount > 0.0 {
            self.exp += amount;
        }
    }

    /// Experience needed to leave the current level.
    pub fn exp_for_next_level(&self) -> f64 {
        let level = f64::from(self.level);
        5.0 * (level + (level / 3.0).powi(2))
    }

    /// Applies one pending level-up. Returns true if the creature leveled.
    pub fn check_level_up(&mut self, config: &AiConfig) -> bool {
        if self.level >= config.max_level || self.exp < self.exp_for_next_level() {
            return false;
        }
        self.level += 1;
        self.exp = 0.0;
        let gains = self.definition.per_level.clone();
        if self.is_worker() {
            self.dig_rate += gains.dig_rate;
            self.claim_rate += gains.claim_rate;
        }
        self.max_hp += gains.hp;
        self.ground_speed += gains.ground_speed;
        self.water_speed += gains.water_speed;
        self.lava_speed += gains.lava_speed;
        self.physical_attack += gains.physical_attack;
        self.magical_attack += gains.magical_attack;
        self.physical_defense += gains.physical_defense;
        self.magical_defense += gains.magical_defense;
        self.attack_range += gains.attack_range;
        true
    }

    /// Per-turn heal, tiredness and hunger.
    pub fn regenerate(&mut self) {
        let def = &self.definition;
        self.hp = (self.hp + def.hp_heal_per_turn).min(self.max_hp);
        self.awakeness = (self.awakeness - def.awakeness_lost_per_turn).max(0.0);
        self.hunger = (self.hunger + def.hunger_growth_per_turn).min(100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker() -> Creature {
        Creature::new(
            EntityId(1),
            "Kobold1",
            SeatId(1),
            Arc::new(CreatureDefinition::worker("Kobold")),
            Position::ORIGIN,
        )
    }

    #[test]
    fn negative_experience_is_ignored() {
        let mut c = worker();
        c.receive_exp(-3.0);
        assert_eq!(c.exp, 0.0);
        c.receive_exp(1.5);
        assert_eq!(c.exp, 1.5);
    }

    #[test]
    fn level_up_resets_exp_and_grows_worker_rates() {
        let config = AiConfig::default();
        let mut c = worker();
        let dig = c.dig_rate;
        c.receive_exp(c.exp_for_next_level() - 0.1);
        assert!(!c.check_level_up(&config));
        c.receive_exp(0.2);
        assert!(c.check_level_up(&config));
        assert_eq!(c.level, 2);
        assert_eq!(c.exp, 0.0);
        assert!(c.dig_rate > dig);
    }

    #[test]
    fn gold_never_exceeds_cap() {
        let mut c = worker();
        let cap = c.max_gold();
        assert_eq!(c.add_gold(cap + 10), cap);
        assert_eq!(c.add_gold(5), 0);
        assert_eq!(c.gold_carried, cap);
    }
}
