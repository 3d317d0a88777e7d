//! Effect handlers: one variant per skill behaviour, each carrying its own
//! tuning numbers so a kit is plain data.

use crate::combat::FieldSpec;
use crate::skill::BindError;
use crate::state::SlotId;

// ============================================================================
// Projectile skills
// ============================================================================

/// Fan of single-shot projectiles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConeVolley {
    pub count: u32,
    /// Full fan width in radians.
    pub spread: f64,
    pub speed: f64,
    pub life_ms: u64,
    pub damage: f64,
    pub stagger_ms: u64,
    pub radius: f64,
}

/// Wall-piercing projectile that opens a field where it goes off.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VortexShot {
    pub speed: f64,
    pub radius: f64,
    pub arm_distance: f64,
    pub detonate_distance: f64,
    pub field: FieldSpec,
}

/// Delayed explosions thrown at a point near the caster.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArcBurst {
    pub shots: u32,
    pub interval_ms: u64,
    /// The aimed point is clamped to this distance from the caster.
    pub max_range: f64,
    pub travel_ms: u64,
    pub radius: f64,
    pub damage: f64,
    pub stagger_ms: u64,
    pub push: f64,
}

// ============================================================================
// Melee and area skills
// ============================================================================

/// Vanish, then reappear behind the nearest target and strike it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ambush {
    pub range: f64,
    pub miss_cooldown_ms: u64,
    pub lock_ms: u64,
    pub vanish_ms: u64,
    pub damage: f64,
    pub stagger_ms: u64,
}

/// Channelled line that stops at the first wall.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Beam {
    pub precast_ms: u64,
    pub recoil: f64,
    pub thickness: f64,
    pub duration_ms: u64,
    pub max_length: f64,
    pub damage: f64,
    pub stagger_ms: u64,
}

/// Arc swing in front of the caster.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sweep {
    pub radius: f64,
    pub rings: u32,
    pub dots_per_ring: u32,
    pub dot_radius: f64,
    /// Arc width in radians.
    pub sweep: f64,
    pub life_ms: u64,
    pub damage: f64,
    pub stagger_ms: u64,
    pub lock_ms: u64,
    pub session_end_ms: u64,
}

/// Stealth with invincibility and a movement boost.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stealth {
    pub duration_ms: u64,
    pub haste: f64,
}

// ============================================================================
// Movement skills
// ============================================================================

/// What a dash does about walls on its path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WallMode {
    /// Stop before the first wall.
    BlockAll,
    /// Pass through walls but land on the last free spot.
    #[default]
    BlockLanding,
    /// Ignore walls; the landing is pushed out of any wall.
    Always,
}

/// Hit line left behind a dash.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DashTrail {
    pub damage: f64,
    pub stagger_ms: u64,
    pub radius: f64,
    /// Lifetime of the trail after the dash ends.
    pub linger_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dash {
    pub distance: f64,
    pub speed: f64,
    pub wall: WallMode,
    pub invincible: bool,
    pub trail: Option<DashTrail>,
}

/// Hold to charge a lunge; release to dash and latch onto the first target.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoldLunge {
    pub max_hold_ms: u64,
    pub min_length: f64,
    pub max_length: f64,
    pub grow_ms: u64,
    pub speed: f64,
    pub stun_ms: u64,
    pub ticks: u32,
    pub tick_damage: f64,
    pub tick_interval_ms: u64,
}

impl HoldLunge {
    /// Lunge length after holding for `held_ms`.
    pub fn length_after(&self, held_ms: u64) -> f64 {
        let ratio = if self.grow_ms == 0 {
            1.0
        } else {
            (held_ms as f64 / self.grow_ms as f64).min(1.0)
        };
        self.min_length + (self.max_length - self.min_length) * ratio
    }
}

/// Accelerating, steerable advance that rams the first target or wall.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Surge {
    pub start_multiplier: f64,
    pub max_multiplier: f64,
    pub accel_step: f64,
    pub accel_interval_ms: u64,
    /// Largest heading change per turn, radians.
    pub turn_limit: f64,
    pub turn_interval_ms: u64,
    pub min_damage: f64,
    pub max_damage: f64,
    pub stun_ms: u64,
    pub knockback: f64,
    pub self_bump: f64,
    pub wall_radius: f64,
    pub wall_stun_ms: u64,
    pub wall_knockback: f64,
    pub wall_self_bump: f64,
}

impl Surge {
    /// Ram damage at speed multiplier `mul`, linear between the bounds.
    pub fn damage_at(&self, mul: f64) -> f64 {
        let min = self.start_multiplier;
        let max = self.max_multiplier;
        let mul = mul.clamp(min, max.max(min));
        let ratio = (mul - min) / (max - min).max(1e-4);
        (self.min_damage + ratio * (self.max_damage - self.min_damage)).round()
    }
}

// ============================================================================
// Handler
// ============================================================================

/// The behaviour bound to a slot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EffectHandler {
    ConeVolley(ConeVolley),
    Ambush(Ambush),
    VortexShot(VortexShot),
    ArcBurst(ArcBurst),
    Dash(Dash),
    Beam(Beam),
    Sweep(Sweep),
    Stealth(Stealth),
    HoldLunge(HoldLunge),
    Surge(Surge),
}

impl EffectHandler {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConeVolley(_) => "cone_volley",
            Self::Ambush(_) => "ambush",
            Self::VortexShot(_) => "vortex_shot",
            Self::ArcBurst(_) => "arc_burst",
            Self::Dash(_) => "dash",
            Self::Beam(_) => "beam",
            Self::Sweep(_) => "sweep",
            Self::Stealth(_) => "stealth",
            Self::HoldLunge(_) => "hold_lunge",
            Self::Surge(_) => "surge",
        }
    }

    /// Whether releasing the slot matters after activation.
    pub fn is_held(&self) -> bool {
        matches!(self, Self::HoldLunge(_))
    }

    /// Parameter sanity checks run at bind time.
    pub fn validate(&self, slot: SlotId) -> Result<(), BindError> {
        let invalid = |reason| Err(BindError::InvalidHandler { slot, reason });
        match self {
            Self::ConeVolley(p) => {
                if p.count == 0 {
                    return invalid("cone volley fires no projectiles");
                }
                if !(p.speed > 0.0) || !(p.radius > 0.0) {
                    return invalid("projectile speed and radius must be positive");
                }
            }
            Self::Ambush(p) => {
                if !(p.range > 0.0) {
                    return invalid("ambush range must be positive");
                }
            }
            Self::VortexShot(p) => {
                if !(p.speed > 0.0) || p.detonate_distance < p.arm_distance {
                    return invalid("vortex shot must arm before it detonates");
                }
                if !(p.field.radius > 0.0) || p.field.tick_interval_ms == 0 {
                    return invalid("field needs a radius and a tick interval");
                }
            }
            Self::ArcBurst(p) => {
                if p.shots == 0 || !(p.radius > 0.0) {
                    return invalid("arc burst needs shots with a radius");
                }
            }
            Self::Dash(p) => {
                if !(p.distance > 0.0) || !(p.speed > 0.0) {
                    return invalid("dash distance and speed must be positive");
                }
            }
            Self::Beam(p) => {
                if !(p.thickness > 0.0) || !(p.max_length > 0.0) {
                    return invalid("beam needs thickness and length");
                }
            }
            Self::Sweep(p) => {
                if p.rings == 0 || p.dots_per_ring == 0 || !(p.radius > 0.0) {
                    return invalid("sweep needs rings and dots");
                }
            }
            Self::Stealth(p) => {
                if p.duration_ms == 0 {
                    return invalid("stealth needs a duration");
                }
            }
            Self::HoldLunge(p) => {
                if !(p.speed > 0.0) || p.max_length < p.min_length {
                    return invalid("lunge length range is inverted");
                }
            }
            Self::Surge(p) => {
                if !(p.start_multiplier > 0.0) || p.max_multiplier < p.start_multiplier {
                    return invalid("surge multiplier range is inverted");
                }
            }
        }
        Ok(())
    }
}
