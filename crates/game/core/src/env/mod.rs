//! Walkability oracles queried by knockback, dashes and locomotion.
//!
//! The tilemap itself is owned by the loading layer; the simulation only asks
//! whether a disk of a given radius fits at a point.

mod grid;

pub use grid::{TerrainKind, TileGrid};

use crate::geometry::Vec2;

/// Collision oracle for actor-sized disks.
pub trait Walkability: Send + Sync {
    /// Returns true when a disk of `radius` centred at `point` touches no wall.
    fn is_walkable(&self, point: Vec2, radius: f64) -> bool;
}

/// Unobstructed plane, optionally bounded by an axis-aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenField {
    pub bounds: Option<(Vec2, Vec2)>,
}

impl OpenField {
    pub const fn unbounded() -> Self {
        Self { bounds: None }
    }

    pub const fn bounded(min: Vec2, max: Vec2) -> Self {
        Self {
            bounds: Some((min, max)),
        }
    }
}

impl Walkability for OpenField {
    fn is_walkable(&self, point: Vec2, radius: f64) -> bool {
        if !point.is_finite() {
            return false;
        }
        match self.bounds {
            None => true,
            Some((min, max)) => {
                point.x - radius >= min.x
                    && point.y - radius >= min.y
                    && point.x + radius <= max.x
                    && point.y + radius <= max.y
            }
        }
    }
}

impl<W: Walkability + ?Sized> Walkability for &W {
    fn is_walkable(&self, point: Vec2, radius: f64) -> bool {
        (**self).is_walkable(point, radius)
    }
}

impl<W: Walkability + ?Sized> Walkability for std::sync::Arc<W> {
    fn is_walkable(&self, point: Vec2, radius: f64) -> bool {
        (**self).is_walkable(point, radius)
    }
}

impl<W: Walkability + ?Sized> Walkability for Box<W> {
    fn is_walkable(&self, point: Vec2, radius: f64) -> bool {
        (**self).is_walkable(point, radius)
    }
}
