//! Stepped displacement through a walkability oracle.
//!
//! Knockback, recoil, pulls and dash probes all move a disk along a straight
//! line in small fixed steps and stop at the last free step, so nothing ever
//! tunnels through a wall. A fully walled-in disk simply stays put.

use crate::env::Walkability;
use crate::geometry::Vec2;

/// Direction rule of a push.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PushDirection {
    /// Along a fixed angle (usually the attack's aim).
    Fixed(f64),
    /// From the attacker's position toward the target.
    AwayFromOwner,
    /// From a world point (explosion centre) toward the target.
    AwayFromPoint(Vec2),
}

/// Knockback applied to targets hit by a volume.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Push {
    pub direction: PushDirection,
    pub distance: f64,
}

impl Push {
    pub const fn new(direction: PushDirection, distance: f64) -> Self {
        Self {
            direction,
            distance,
        }
    }

    /// Displacement for a target at `target` hit by an attacker at `owner`.
    ///
    /// Coincident points give no displacement for the "away" rules.
    pub fn displacement(&self, owner: Vec2, target: Vec2) -> Vec2 {
        if !(self.distance > 0.0) {
            return Vec2::ZERO;
        }
        let unit = match self.direction {
            PushDirection::Fixed(angle) => Some(Vec2::from_angle(angle)),
            PushDirection::AwayFromOwner => (target - owner).normalized(),
            PushDirection::AwayFromPoint(point) => (target - point).normalized(),
        };
        unit.map_or(Vec2::ZERO, |dir| dir * self.distance)
    }
}

/// Moves a disk of `radius` from `from` by `delta`, in steps of at most
/// `step` units, stopping before the first blocked step.
pub fn stepped_advance<W: Walkability + ?Sized>(
    walk: &W,
    from: Vec2,
    delta: Vec2,
    radius: f64,
    step: f64,
) -> Vec2 {
    let dist = delta.length();
    if !(dist > 0.0) || !dist.is_finite() {
        return from;
    }
    let step = if step > 0.0 { step } else { 2.0 };
    let steps = ((dist / step).ceil() as u64).max(1);
    let inc = delta * (1.0 / steps as f64);

    let mut last_free = from;
    for i in 1..=steps {
        let candidate = from + inc * i as f64;
        if walk.is_walkable(candidate, radius) {
            last_free = candidate;
        } else {
            break;
        }
    }
    last_free
}

/// Distance a point probe can travel along `angle` before hitting a wall,
/// capped at `max`.
pub fn ray_length<W: Walkability + ?Sized>(
    walk: &W,
    origin: Vec2,
    angle: f64,
    max: f64,
    step: f64,
) -> f64 {
    if !(max > 0.0) {
        return 0.0;
    }
    let step = if step > 0.0 { step } else { 4.0 };
    let dir = Vec2::from_angle(angle);
    let mut travelled = 0.0;
    while travelled < max {
        let next = (travelled + step).min(max);
        if !walk.is_walkable(origin + dir * next, 0.0) {
            break;
        }
        travelled = next;
    }
    travelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{OpenField, TileGrid};

    #[test]
    fn open_field_moves_the_full_distance() {
        let end = stepped_advance(
            &OpenField::unbounded(),
            Vec2::ZERO,
            Vec2::new(20.0, 0.0),
            6.0,
            2.0,
        );
        assert!((end.x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn push_toward_wall_stops_at_last_free_step() {
        // Floor spans x in [16, 80); a radius-6 disk fits up to x = 74.
        let grid = TileGrid::from_rows(&["######", "#....#", "#....#", "######"], 16.0);
        let start = Vec2::new(40.0, 32.0);
        let end = stepped_advance(&grid, start, Vec2::new(100.0, 0.0), 6.0, 2.0);

        assert!(end.x <= 74.0, "crossed the wall: {end:?}");
        assert!(end.x > 71.0, "stopped too early: {end:?}");
        assert!(grid.is_walkable(end, 6.0));
        assert_eq!(end.y, 32.0);
    }

    #[test]
    fn walled_in_disk_does_not_move() {
        let grid = TileGrid::from_rows(&["###", "#.#", "###"], 16.0);
        let start = Vec2::new(24.0, 24.0);
        let end = stepped_advance(&grid, start, Vec2::new(30.0, 0.0), 6.0, 2.0);
        assert_eq!(end, start);
    }

    #[test]
    fn away_push_from_coincident_points_is_zero() {
        let push = Push::new(PushDirection::AwayFromOwner, 20.0);
        assert_eq!(push.displacement(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0)), Vec2::ZERO);
        let d = push.displacement(Vec2::ZERO, Vec2::new(0.0, 3.0));
        assert!((d.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn ray_stops_at_wall() {
        let grid = TileGrid::from_rows(&["########", "#......#", "########"], 16.0);
        let len = ray_length(&grid, Vec2::new(24.0, 24.0), 0.0, 600.0, 4.0);
        // Wall column starts at x = 112.
        assert!(len < 112.0 - 24.0 + 1e-9);
        assert!(len >= 112.0 - 24.0 - 4.0);
    }
}
