//! Species templates shared by every creature of a class.
use crate::world::RoomKind;

/// How much a class likes a room type and how well it works there.
///
/// A zero `efficiency` room is only wandered in, never worked.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomAffinity {
    pub room: RoomKind,
    pub likeness: i32,
    pub efficiency: f64,
}

impl RoomAffinity {
    pub fn new(room: RoomKind, likeness: i32, efficiency: f64) -> Self {
        Self {
            room,
            likeness,
            efficiency,
        }
    }
}

/// One contribution to a creature's mood points.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoodModifier {
    /// Applies while awakeness is below `start`.
    Awakeness { start: f64, modifier: i32 },
    /// Applies while hunger is above `start`.
    Hunger { start: f64, modifier: i32 },
    /// Scaled by the missing hp fraction.
    HpLoss { modifier: i32 },
    /// Applies while part of the fee is still owed.
    Fee { modifier: i32 },
    /// Ramps from 0 at `min` turns to `modifier` at `max` turns without fighting.
    TurnsWithoutFight { min: u32, max: u32, modifier: i32 },
    /// Applies once per visible allied creature of `class`.
    Creature { class: String, modifier: i32 },
}

/// Base values at level 1.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseStats {
    pub hp: f64,
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
    /// Turns between two attacks.
    pub attack_warmup: u32,
}

/// Stat increments granted on each level-up.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelGains {
    pub hp: f64,
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
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreatureDefinition {
    pub class_name: String,
    pub is_worker: bool,
    pub max_gold_carryable: u32,
    pub base: BaseStats,
    pub per_level: LevelGains,
    pub hp_heal_per_turn: f64,
    pub awakeness_lost_per_turn: f64,
    pub hunger_growth_per_turn: f64,
    pub sight_radius: u32,
    pub bed_footprint: (u32, u32),
    /// Rooms in order of preference.
    pub room_affinities: Vec<RoomAffinity>,
    /// Classes this one fights even when they share a seat.
    pub natural_enemies: Vec<String>,
    pub mood_modifiers: Vec<MoodModifier>,
    pub fee: u32,
    pub steals_gold: bool,
}

impl CreatureDefinition {
    pub const DEFAULT_SIGHT_RADIUS: u32 = 10;

    /// Digging, claiming and carrying creature.
    pub fn worker(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            is_worker: true,
            max_gold_carryable: 1500,
            base: BaseStats {
                hp: 50.0,
                dig_rate: 6.0,
                claim_rate: 0.35,
                ground_speed: 1.0,
                water_speed: 0.0,
                lava_speed: 0.0,
                physical_attack: 2.0,
                magical_attack: 0.0,
                physical_defense: 1.0,
                magical_defense: 0.0,
                attack_range: 1.0,
                attack_warmup: 1,
            },
            per_level: LevelGains {
                hp: 5.0,
                dig_rate: 0.5,
                claim_rate: 0.02,
                physical_attack: 0.3,
                ..LevelGains::default()
            },
            hp_heal_per_turn: 0.1,
            awakeness_lost_per_turn: 0.0,
            hunger_growth_per_turn: 0.0,
            sight_radius: Self::DEFAULT_SIGHT_RADIUS,
            bed_footprint: (1, 1),
            room_affinities: Vec::new(),
            natural_enemies: Vec::new(),
            mood_modifiers: Vec::new(),
            fee: 0,
            steals_gold: false,
        }
    }

    /// Non-worker creature that eats, sleeps, works rooms and fights.
    pub fn fighter(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            is_worker: false,
            max_gold_carryable: 500,
            base: BaseStats {
                hp: 100.0,
                dig_rate: 0.0,
                claim_rate: 0.0,
                ground_speed: 1.0,
                water_speed: 0.0,
                lava_speed: 0.0,
                physical_attack: 8.0,
                magical_attack: 2.0,
                physical_defense: 3.0,
                magical_defense: 1.0,
                attack_range: 1.0,
                attack_warmup: 2,
            },
            per_level: LevelGains {
                hp: 10.0,
                physical_attack: 1.0,
                magical_attack: 0.3,
                physical_defense: 0.5,
                magical_defense: 0.2,
                ..LevelGains::default()
            },
            hp_heal_per_turn: 0.1,
            awakeness_lost_per_turn: 0.1,
            hunger_growth_per_turn: 0.1,
            sight_radius: Self::DEFAULT_SIGHT_RADIUS,
            bed_footprint: (1, 2),
            room_affinities: vec![
                RoomAffinity::new(RoomKind::TrainingHall, 10, 1.0),
                RoomAffinity::new(RoomKind::Hatchery, 0, 0.0),
            ],
            natural_enemies: Vec::new(),
            mood_modifiers: vec![
                MoodModifier::Awakeness {
                    start: 20.0,
                    modifier: -100,
                },
                MoodModifier::Hunger {
                    start: 80.0,
                    modifier: -100,
                },
                MoodModifier::HpLoss { modifier: -100 },
                MoodModifier::Fee { modifier: -150 },
            ],
            fee: 50,
            steals_gold: false,
        }
    }

    pub fn with_base(mut self, base: BaseStats) -> Self {
        self.base = base;
        self
    }

    pub fn with_max_gold(mut self, max_gold_carryable: u32) -> Self {
        self.max_gold_carryable = max_gold_carryable;
        self
    }

    pub fn with_dig_rate(mut self, dig_rate: f64) -> Self {
        self.base.dig_rate = dig_rate;
        self
    }

    pub fn with_claim_rate(mut self, claim_rate: f64) -> Self {
        self.base.claim_rate = claim_rate;
        self
    }

    pub fn with_hp(mut self, hp: f64) -> Self {
        self.base.hp = hp;
        self
    }

    pub fn with_sight_radius(mut self, sight_radius: u32) -> Self {
        self.sight_radius = sight_radius;
        self
    }

    pub fn with_room_affinities(mut self, affinities: Vec<RoomAffinity>) -> Self {
        self.room_affinities = affinities;
        self
    }

    pub fn with_natural_enemies(mut self, classes: Vec<String>) -> Self {
        self.natural_enemies = classes;
        self
    }

    pub fn with_mood_modifiers(mut self, modifiers: Vec<MoodModifier>) -> Self {
        self.mood_modifiers = modifiers;
        self
    }

    pub fn with_fee(mut self, fee: u32) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_steals_gold(mut self, steals_gold: bool) -> Self {
        self.steals_gold = steals_gold;
        self
    }

    pub fn with_upkeep_rates(mut self, awakeness_lost: f64, hunger_growth: f64, heal: f64) -> Self {
        self.awakeness_lost_per_turn = awakeness_lost;
        self.hunger_growth_per_turn = hunger_growth;
        self.hp_heal_per_turn = heal;
        self
    }

    pub fn affinity_for(&self, room: RoomKind) -> Option<&RoomAffinity> {
        self.room_affinities.iter().find(|a| a.room == room)
    }

    pub fn is_natural_enemy(&self, class_name: &str) -> bool {
        self.natural_enemies.iter().any(|c| c == class_name)
    }
}
