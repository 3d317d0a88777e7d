//! Actor state: identity types, timed statuses and the actor record.

mod actor;
mod common;
mod status;

pub use actor::{Actor, Vitals};
pub use common::{ActorId, CharacterKey, Facing, SlotId, Timestamp};
pub use status::{ActorFlags, ActorStatus, AimLock, Haste, Slow, UNTIL_CLEARED};
