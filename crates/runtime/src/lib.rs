//! Room runtime for the arena combat core.
//!
//! Each room runs one worker task that owns an [`arena_core::Arena`], applies
//! every client's latest input once per tick and publishes what happened on a
//! topic-based event bus. Consumers drive a room through [`RoomHandle`].
//!
//! Modules are organized by responsibility:
//! - [`room`] hosts the orchestrator, configuration and snapshot types
//! - [`api`] exposes the handle and error types clients interact with
//! - [`events`] provides the topic-based event bus
//! - `workers` keeps the room task internal to the crate
pub mod api;
pub mod events;
pub mod room;

mod workers;

pub use api::{Result, RoomHandle, RuntimeError};
pub use events::{EventBus, MembershipEvent, RoomEvent, Topic};
pub use room::{ClientId, MemberView, Room, RoomConfig, RoomPhase, RoomSnapshot};
