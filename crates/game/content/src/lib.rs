//! Data-driven arena content and loaders.
//!
//! This crate provides:
//! - The character kit catalog (built-ins plus per-character overrides)
//! - Combat configuration (data-driven via TOML)
//! - Arena maps with spawn points (data-driven via RON)
//!
//! Content is read once when a room is created and never changes while the
//! room runs.

pub mod kits;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use kits::{KitCatalog, KitOverride};

#[cfg(feature = "loaders")]
pub use loaders::{ArenaMap, ConfigLoader, ContentFactory, KitLoader, LoadResult, MapLoader};
