//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and world mutations so clients can
//! bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use keeper_core::{EntityId, SeatId, WorldError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a world to be configured before building")]
    MissingWorld,

    #[error("creature {id} is not in the world")]
    UnknownCreature { id: EntityId },

    #[error("seat {seat} does not exist")]
    UnknownSeat { seat: SeatId },

    #[error(transparent)]
    World(#[from] WorldError),

    #[error("failed to encode world snapshot")]
    Snapshot(#[source] serde_json::Error),
}
