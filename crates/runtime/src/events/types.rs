//! Event types for different topics.

use keeper_core::{PlayerNotice, SeatId, SimEvent, Tick};
use serde::{Deserialize, Serialize};

/// A side effect the AI requested during a tick (animation, movement, digging...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub tick: Tick,
    pub event: SimEvent,
}

/// Messages for a human keeper, already rate limited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationEvent {
    Notice {
        tick: Tick,
        seat: SeatId,
        notice: PlayerNotice,
    },
    Chat {
        tick: Tick,
        seat: SeatId,
        message: String,
    },
}

impl NotificationEvent {
    pub fn seat(&self) -> SeatId {
        match self {
            Self::Notice { seat, .. } | Self::Chat { seat, .. } => *seat,
        }
    }
}
