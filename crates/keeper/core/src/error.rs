//! Common error infrastructure for keeper-core.
//!
//! Handler-level target invalidity (a target died, a tile was finished by
//! someone else, a path vanished) is never an error: handlers pop and let the
//! creature pick something else. The types here cover structural failures that
//! indicate a bug or a bad request from the runtime, and they all share the
//! [`GameError`] classification so callers can decide how loudly to report them.

use crate::types::{EntityId, Position, Tick};

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition; retrying later may succeed.
    Recoverable,

    /// Invalid request, should not be retried unchanged.
    ///
    /// Examples: unknown creature id, position outside the map
    Validation,

    /// Unexpected state inconsistency that must be investigated.
    ///
    /// Examples: empty action stack during upkeep, creature without a tile
    Internal,

    /// The world can no longer be simulated.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for debugging and diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Creature or entity that triggered the error.
    pub actor: Option<EntityId>,

    /// Position where the error occurred.
    pub position: Option<Position>,

    /// Simulation tick at the time of error.
    pub tick: Tick,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(tick: Tick) -> Self {
        Self {
            actor: None,
            position: None,
            tick,
            message: None,
        }
    }

    #[must_use]
    pub const fn with_actor(mut self, actor: EntityId) -> Self {
        self.actor = Some(actor);
        self
    }

    #[must_use]
    pub const fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all keeper-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for the Display/Error impl
/// - Classify severity by recoverability, not by impact
/// - Error codes are SCREAMING_SNAKE_CASE and stable across releases
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Failures of world lookups and world mutations requested by the runtime.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("creature {id} not found")]
    CreatureNotFound { id: EntityId },

    #[error("entity {id} not found")]
    EntityNotFound { id: EntityId },

    #[error("building {id} not found")]
    BuildingNotFound { id: EntityId },

    #[error("position {position} is outside the map")]
    OutOfBounds { position: Position },

    #[error("creature {id} is not on the map")]
    NotOnMap { id: EntityId },

    #[error("tile {position} cannot hold a creature")]
    NotPassable { position: Position },
}

impl GameError for WorldError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CreatureNotFound { .. }
            | Self::EntityNotFound { .. }
            | Self::BuildingNotFound { .. }
            | Self::OutOfBounds { .. }
            | Self::NotPassable { .. } => ErrorSeverity::Validation,
            Self::NotOnMap { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CreatureNotFound { .. } => "WORLD_CREATURE_NOT_FOUND",
            Self::EntityNotFound { .. } => "WORLD_ENTITY_NOT_FOUND",
            Self::BuildingNotFound { .. } => "WORLD_BUILDING_NOT_FOUND",
            Self::OutOfBounds { .. } => "WORLD_OUT_OF_BOUNDS",
            Self::NotOnMap { .. } => "WORLD_NOT_ON_MAP",
            Self::NotPassable { .. } => "WORLD_NOT_PASSABLE",
        }
    }
}

/// Structural failures detected while running a creature's upkeep.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum UpkeepError {
    #[error(transparent)]
    World(#[from] WorldError),

    #[error("action stack of {creature} was empty")]
    EmptyStack {
        creature: EntityId,
        context: ErrorContext,
    },

    #[error("creature {creature} stands on no tile at {position}")]
    NoPositionTile {
        creature: EntityId,
        position: Position,
        context: ErrorContext,
    },
}

impl GameError for UpkeepError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::World(err) => err.severity(),
            Self::EmptyStack { .. } | Self::NoPositionTile { .. } => ErrorSeverity::Internal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::World(_) => None,
            Self::EmptyStack { context, .. } | Self::NoPositionTile { context, .. } => {
                Some(context)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::World(err) => err.error_code(),
            Self::EmptyStack { .. } => "UPKEEP_EMPTY_STACK",
            Self::NoPositionTile { .. } => "UPKEEP_NO_POSITION_TILE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upkeep_error_inherits_world_classification() {
        let err = UpkeepError::from(WorldError::CreatureNotFound { id: EntityId(3) });
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.error_code(), "WORLD_CREATURE_NOT_FOUND");
        assert!(err.context().is_none());
    }

    #[test]
    fn structural_errors_are_internal() {
        let err = UpkeepError::EmptyStack {
            creature: EntityId(1),
            context: ErrorContext::new(Tick(7)).with_actor(EntityId(1)),
        };
        assert!(err.severity().is_internal());
        assert_eq!(err.context().map(|c| c.tick), Some(Tick(7)));
    }
}
