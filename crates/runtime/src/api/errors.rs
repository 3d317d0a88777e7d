//! Error type surfaced by the room API.
//!
//! Channel plumbing failures and membership rule violations share one enum so
//! callers can bubble them up with `?`.
use thiserror::Error;
use tokio::sync::oneshot;

use arena_core::{ArenaError, CharacterKey};

use crate::events::Topic;
use crate::room::{ClientId, RoomPhase};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("room worker command channel closed")]
    CommandChannelClosed,

    #[error("room worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("room worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("room is full ({max} players)")]
    RoomFull { max: usize },

    #[error("client {0} already joined")]
    AlreadyJoined(ClientId),

    #[error("client {0} is not in the room")]
    UnknownClient(ClientId),

    #[error("client {client} is not the host")]
    NotHost { client: ClientId },

    #[error("room is in {actual} phase, expected {expected}")]
    WrongPhase {
        expected: RoomPhase,
        actual: RoomPhase,
    },

    #[error("no kit registered for {0}")]
    UnknownCharacter(CharacterKey),

    #[error("event bus has no channel for {0:?}")]
    UnknownTopic(Topic),

    #[error("event bus lock is contended")]
    EventBusBusy,

    #[error(transparent)]
    Arena(#[from] ArenaError),
}
