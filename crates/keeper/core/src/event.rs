//! Declarative side effects emitted by the AI.
//!
//! The core never plays animations, sends packets or writes chat itself; it
//! appends [`SimEvent`]s to the simulation context and the runtime routes them.
use crate::types::{EntityId, Position, SeatId};

/// Animation states requested for a creature.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AnimationState {
    Idle,
    Walk,
    Dig,
    Claim,
    Attack,
    Eat,
    Sleep,
    Flee,
    Die,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SoundEffect {
    Dig,
    Claim,
    Attack,
    Eat,
    Die,
}

/// Advisory messages shown to a human keeper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum PlayerNotice {
    NoTreasuryAvailable,
    CannotFindFood { creature: EntityId },
    CannotFindBed { creature: EntityId },
}

impl PlayerNotice {
    /// Discriminant used by rate limiters, ignoring the payload.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimEvent {
    Animation {
        creature: EntityId,
        state: AnimationState,
        looping: bool,
        facing: Option<Position>,
    },
    Sound {
        position: Position,
        effect: SoundEffect,
    },
    Notify {
        seat: SeatId,
        notice: PlayerNotice,
    },
    Chat {
        seat: SeatId,
        message: String,
    },
    EntitySpawned {
        entity: EntityId,
        position: Position,
    },
    EntityRemoved {
        entity: EntityId,
    },
    CreatureMoved {
        creature: EntityId,
        from: Position,
        to: Position,
    },
    TileDug {
        position: Position,
        by: EntityId,
        amount: f64,
        finished: bool,
    },
    TileClaimed {
        position: Position,
        seat: SeatId,
        finished: bool,
    },
    LevelUp {
        creature: EntityId,
        level: u32,
    },
    Defected {
        creature: EntityId,
        from: SeatId,
        to: SeatId,
    },
    CreatureDied {
        creature: EntityId,
    },
    LeftDungeon {
        creature: EntityId,
    },
}
