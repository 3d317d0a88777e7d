//! Event payloads that are specific to the room layer.

use serde::{Deserialize, Serialize};

use arena_core::{ActorId, CharacterKey};

use crate::room::{ClientId, RoomPhase};

/// Membership and lobby changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MembershipEvent {
    Joined {
        client: ClientId,
        nickname: String,
        actor: ActorId,
    },
    Left {
        client: ClientId,
    },
    /// `None` once the last member has left.
    HostChanged {
        host: Option<ClientId>,
    },
    CharacterSelected {
        client: ClientId,
        character: CharacterKey,
        actor: ActorId,
    },
    PhaseChanged {
        phase: RoomPhase,
    },
}
