//! Worker tasks that back a room.
//!
//! Each room runs exactly one worker, which owns the arena and is the only
//! place combat state is mutated.

mod room;

pub(crate) use room::{Command, RoomWorker};
