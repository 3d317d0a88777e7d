//! Topic-based event bus for room events.
//!
//! The worker publishes combat events, per-tick snapshots and membership
//! changes to separate topics so consumers subscribe only to what they need.

mod bus;
mod types;

pub use bus::{EventBus, RoomEvent, Topic};
pub use types::MembershipEvent;
