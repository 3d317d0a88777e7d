//! Public room API surface.
//!
//! Everything a transport needs to drive a room lives here; worker internals
//! stay private to the crate.

pub mod errors;
pub mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::RoomHandle;
