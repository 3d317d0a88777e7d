//! Arena errors.

use crate::error::{ErrorSeverity, GameError};
use crate::skill::BindError;
use crate::state::ActorId;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ArenaError {
    #[error("actor {0} is not in the arena")]
    ActorNotFound(ActorId),

    #[error("arena already holds {max} actors")]
    ArenaFull { max: usize },

    #[error("invalid kit: {0}")]
    InvalidKit(#[from] BindError),

    #[error("spawn position is not walkable")]
    BlockedSpawn,
}

impl GameError for ArenaError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActorNotFound(_) | Self::ArenaFull { .. } | Self::BlockedSpawn => {
                ErrorSeverity::Recoverable
            }
            Self::InvalidKit(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActorNotFound(_) => "ARENA_ACTOR_NOT_FOUND",
            Self::ArenaFull { .. } => "ARENA_FULL",
            Self::InvalidKit(_) => "ARENA_INVALID_KIT",
            Self::BlockedSpawn => "ARENA_BLOCKED_SPAWN",
        }
    }
}
