use super::definition::MoodModifier;
use crate::config::AiConfig;
use crate::types::Tick;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum MoodLevel {
    Happy,
    #[default]
    Neutral,
    Upset,
    Angry,
    Furious,
}

impl MoodLevel {
    pub fn from_points(points: i32, config: &AiConfig) -> Self {
        if points > config.mood_neutral_points {
            Self::Happy
        } else if points > config.mood_upset_points {
            Self::Neutral
        } else if points > config.mood_angry_points {
            Self::Upset
        } else if points > config.mood_furious_points {
            Self::Angry
        } else {
            Self::Furious
        }
    }

    /// Upset or worse.
    pub fn is_bad(self) -> bool {
        self >= Self::Upset
    }

    /// Angry or worse.
    pub fn is_very_bad(self) -> bool {
        self >= Self::Angry
    }
}

/// Mood bookkeeping of one creature.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoodState {
    pub level: MoodLevel,
    pub points: i32,
    /// Turns left until the next recompute.
    pub cooldown: u32,
    pub first_turn_furious: Option<Tick>,
}

/// Inputs a mood recompute reads from the creature.
#[derive(Clone, Copy, Debug)]
pub struct MoodInputs<'a> {
    pub awakeness: f64,
    pub hunger: f64,
    pub hp: f64,
    pub max_hp: f64,
    pub fee_owed: u32,
    pub turns_without_fight: u32,
    /// Classes of the allied creatures currently in sight.
    pub visible_ally_classes: &'a [&'a str],
}

/// Sums the modifiers that currently apply.
pub fn compute_mood_points(modifiers: &[MoodModifier], inputs: &MoodInputs<'_>) -> i32 {
    modifiers
        .iter()
        .map(|modifier| match modifier {
            MoodModifier::Awakeness { start, modifier } => {
                if inputs.awakeness < *start { *modifier } else { 0 }
            }
            MoodModifier::Hunger { start, modifier } => {
                if inputs.hunger > *start { *modifier } else { 0 }
            }
            MoodModifier::HpLoss { modifier } => {
                if inputs.max_hp <= 0.0 {
                    return 0;
                }
                let missing = (1.0 - inputs.hp / inputs.max_hp).clamp(0.0, 1.0);
                (f64::from(*modifier) * missing).round() as i32
            }
            MoodModifier::Fee { modifier } => {
                if inputs.fee_owed > 0 { *modifier } else { 0 }
            }
            MoodModifier::TurnsWithoutFight { min, max, modifier } => {
                let turns = inputs.turns_without_fight;
                if turns <= *min {
                    0
                } else if turns >= *max || max <= min {
                    *modifier
                } else {
                    let ratio = f64::from(turns - min) / f64::from(max - min);
                    (f64::from(*modifier) * ratio).round() as i32
                }
            }
            MoodModifier::Creature { class, modifier } => {
                let count = inputs
                    .visible_ally_classes
                    .iter()
                    .filter(|c| **c == class.as_str())
                    .count() as i32;
                modifier * count
            }
        })
        .sum()
}
