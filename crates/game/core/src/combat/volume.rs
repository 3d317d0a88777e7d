use crate::combat::{FieldSpec, Push};
use crate::geometry::{HitShape, Vec2};
use crate::ledger::SegmentId;
use crate::state::{ActorId, Timestamp};

/// Handle of a live hit volume, stable for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeId(pub u64);

/// How long a volume survives after producing hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VolumeLifetime {
    /// Destroyed right after its first landed hit.
    SingleShot,
    /// Stays until `expires_at`; dedup keeps each target to one hit.
    #[default]
    Lingering,
}

/// Projectile explosion that turns into a persistent field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detonation {
    /// Travel before contact with a target may trigger the explosion.
    pub arm_distance: f64,
    /// Travel at which the projectile explodes on its own.
    pub detonate_distance: f64,
    pub field: FieldSpec,
}

/// Straight-line motion of a volume.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Projectile {
    /// Units per second.
    pub velocity: Vec2,
    /// Destroyed on contact with a wall.
    pub wall_blocked: bool,
    pub travelled: f64,
    pub detonation: Option<Detonation>,
}

impl Projectile {
    pub fn new(angle: f64, speed: f64) -> Self {
        Self {
            velocity: Vec2::from_angle(angle) * speed,
            wall_blocked: true,
            travelled: 0.0,
            detonation: None,
        }
    }

    pub fn piercing(mut self) -> Self {
        self.wall_blocked = false;
        self
    }

    pub fn detonating(mut self, detonation: Detonation) -> Self {
        self.detonation = Some(detonation);
        self
    }

    pub fn is_armed(&self) -> bool {
        self.detonation
            .as_ref()
            .is_some_and(|d| self.travelled >= d.arm_distance)
    }
}

/// An ephemeral shape that damages the targets it overlaps.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitVolume {
    pub id: VolumeId,
    pub owner: ActorId,
    pub segment: SegmentId,
    pub shape: HitShape,
    pub damage: f64,
    pub stagger_ms: u64,
    pub push: Option<Push>,
    pub lifetime: VolumeLifetime,
    pub expires_at: Timestamp,
    pub projectile: Option<Projectile>,
    pub(crate) spent: bool,
}

impl HitVolume {
    /// A lingering, damage-free volume. The id is assigned on spawn.
    pub fn new(owner: ActorId, segment: SegmentId, shape: HitShape, expires_at: Timestamp) -> Self {
        Self {
            id: VolumeId(0),
            owner,
            segment,
            shape,
            damage: 0.0,
            stagger_ms: 0,
            push: None,
            lifetime: VolumeLifetime::Lingering,
            expires_at,
            projectile: None,
            spent: false,
        }
    }

    pub fn with_damage(mut self, damage: f64) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_stagger(mut self, stagger_ms: u64) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    pub fn with_push(mut self, push: Push) -> Self {
        self.push = Some(push);
        self
    }

    pub fn single_shot(mut self) -> Self {
        self.lifetime = VolumeLifetime::SingleShot;
        self
    }

    pub fn with_projectile(mut self, projectile: Projectile) -> Self {
        self.projectile = Some(projectile);
        self
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Detonating projectiles never damage directly.
    pub fn detonates(&self) -> bool {
        self.projectile
            .as_ref()
            .is_some_and(|p| p.detonation.is_some())
    }
}
