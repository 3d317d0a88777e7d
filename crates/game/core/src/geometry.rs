//! Continuous-space primitives and hit-shape discretisation.
//!
//! Every hit shape is reduced to a list of circles so the resolver needs a
//! single overlap primitive: circle against circle. Arcs become rings of
//! dots, beams become a row of thick dots, and lines become evenly spaced
//! dots along the segment.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// 2D vector in world units. +y points down.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    /// Heading of this vector in radians.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Unit vector in the same direction, or `None` for (near) zero vectors.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len.is_finite() && len > f64::EPSILON {
            Some(Vec2::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Circle used both as an actor body and as a hit sample.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

impl Circle {
    pub const fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// A circle with a non-finite or non-positive radius cannot overlap anything.
    pub fn is_degenerate(&self) -> bool {
        !(self.radius.is_finite() && self.radius > 0.0 && self.center.is_finite())
    }

    /// Touching circles count as overlapping.
    pub fn overlaps(&self, other: &Circle) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        self.center.distance(other.center) <= self.radius + other.radius
    }
}

/// Geometric footprint of a hit volume.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitShape {
    Circle(Circle),

    /// Circular sector filled with rings of dots, each dot kept fully inside
    /// the sector.
    Arc {
        center: Vec2,
        radius: f64,
        base_angle: f64,
        sweep: f64,
        rings: u32,
        dots_per_ring: u32,
        dot_radius: f64,
    },

    /// Thick ray starting at `origin`.
    Beam {
        origin: Vec2,
        angle: f64,
        length: f64,
        thickness: f64,
    },

    /// Segment swept by a circle of `radius`, sampled every `spacing` units.
    Line {
        from: Vec2,
        to: Vec2,
        radius: f64,
        spacing: f64,
    },
}

impl HitShape {
    /// Discretises the shape into circles.
    ///
    /// Degenerate inputs (zero radius, zero rings, NaN) produce no samples.
    pub fn samples(&self) -> Vec<Circle> {
        match *self {
            HitShape::Circle(circle) => {
                if circle.is_degenerate() {
                    Vec::new()
                } else {
                    vec![circle]
                }
            }
            HitShape::Arc {
                center,
                radius,
                base_angle,
                sweep,
                rings,
                dots_per_ring,
                dot_radius,
            } => arc_samples(center, radius, base_angle, sweep, rings, dots_per_ring, dot_radius),
            HitShape::Beam {
                origin,
                angle,
                length,
                thickness,
            } => beam_samples(origin, angle, length, thickness),
            HitShape::Line {
                from,
                to,
                radius,
                spacing,
            } => line_samples(from, to, radius, spacing),
        }
    }

    /// True when any sample overlaps `body`.
    pub fn overlaps(&self, body: &Circle) -> bool {
        self.samples().iter().any(|sample| sample.overlaps(body))
    }

    /// Moves the shape by `delta` (projectiles).
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            HitShape::Circle(circle) => circle.center += delta,
            HitShape::Arc { center, .. } => *center += delta,
            HitShape::Beam { origin, .. } => *origin += delta,
            HitShape::Line { from, to, .. } => {
                *from += delta;
                *to += delta;
            }
        }
    }

    /// Reference point of the shape.
    pub fn anchor(&self) -> Vec2 {
        match *self {
            HitShape::Circle(circle) => circle.center,
            HitShape::Arc { center, .. } => center,
            HitShape::Beam { origin, .. } => origin,
            HitShape::Line { from, .. } => from,
        }
    }
}

fn arc_samples(
    center: Vec2,
    radius: f64,
    base_angle: f64,
    sweep: f64,
    rings: u32,
    dots: u32,
    dot_radius: f64,
) -> Vec<Circle> {
    let mut out = Vec::new();
    if rings == 0 || dots == 0 || !(dot_radius > 0.0) || !radius.is_finite() || !sweep.is_finite() {
        return out;
    }

    let inner = dot_radius;
    let outer = (radius - dot_radius).max(inner);
    for ring in 1..=rings {
        let ring_radius = inner + (outer - inner) * (f64::from(ring) / f64::from(rings));
        let margin = (dot_radius / ring_radius.max(1e-4)).min(1.0).asin();
        let start = base_angle - sweep / 2.0 + margin;
        let end = base_angle + sweep / 2.0 - margin;
        if end <= start {
            continue;
        }
        for i in 0..dots {
            let t = if dots == 1 {
                0.5
            } else {
                f64::from(i) / f64::from(dots - 1)
            };
            let angle = start + t * (end - start);
            out.push(Circle::new(
                center + Vec2::from_angle(angle) * ring_radius,
                dot_radius,
            ));
        }
    }
    out
}

fn beam_samples(origin: Vec2, angle: f64, length: f64, thickness: f64) -> Vec<Circle> {
    if !(length > 0.0) || !(thickness > 0.0) || !length.is_finite() {
        return Vec::new();
    }
    let step = (thickness * 0.8).floor().max(6.0);
    let radius = (thickness / 2.0).floor().max(4.0);
    let count = ((length / step).floor() as u64).max(1);
    let dir = Vec2::from_angle(angle);

    (0..=count)
        .map(|i| {
            let along = (i as f64 * step).min(length);
            Circle::new(origin + dir * along, radius)
        })
        .collect()
}

fn line_samples(from: Vec2, to: Vec2, radius: f64, spacing: f64) -> Vec<Circle> {
    if !(radius > 0.0) || !(spacing > 0.0) || !from.is_finite() || !to.is_finite() {
        return Vec::new();
    }
    let span = to - from;
    let len = span.length();
    let count = (len / spacing).ceil().max(0.0) as u64;
    if count == 0 {
        return vec![Circle::new(from, radius)];
    }
    (0..=count)
        .map(|i| {
            let t = i as f64 / count as f64;
            Circle::new(from + span * t, radius)
        })
        .collect()
}
