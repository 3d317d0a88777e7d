//! Hit volumes, persistent fields, knockback and the hit resolution engine.
//!
//! This module is responsible for:
//! - Describing what a skill puts into the world ([`HitVolume`], [`FieldEffect`])
//! - Walking displacement through walkability ([`stepped_advance`])
//! - Applying each (segment, target) hit at most once ([`resolve_volumes`])

mod field;
mod knockback;
mod resolve;
mod volume;

pub use field::{FieldEffect, FieldSpec, Pull};
pub use knockback::{Push, PushDirection, ray_length, stepped_advance};
pub use resolve::{
    Detonated, HitEnv, Strike, StrikeOutcome, deliver_strike, resolve_volumes, tick_fields,
};
pub use volume::{Detonation, HitVolume, Projectile, VolumeId, VolumeLifetime};

pub(crate) use resolve::detonation_of;
