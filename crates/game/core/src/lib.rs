//! Deterministic combat core for a small real-time arena.
//!
//! `arena-core` owns the rules of a fight: skill activation gating, cooldown
//! and charge accounting, hit volumes with exactly-once damage per attack
//! segment, knockback and stagger, and persistent fields. It has no clock and
//! no I/O; the room runtime drives it with [`engine::Arena::step`] and
//! forwards the returned [`event::CombatEvent`]s wherever they need to go.
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod event;
pub mod geometry;
pub mod ledger;
pub mod skill;
pub mod state;

pub use combat::{
    Detonated, Detonation, FieldEffect, FieldSpec, HitEnv, HitVolume, Projectile, Pull, Push,
    PushDirection, Strike, StrikeOutcome, VolumeId, VolumeLifetime, deliver_strike, ray_length,
    resolve_volumes, stepped_advance, tick_fields,
};
pub use config::{CombatConfig, ConfigError};
pub use engine::{ActorView, Arena, ArenaError, ArenaSnapshot, FieldView, InputFrame, SlotView};
pub use env::{OpenField, TerrainKind, TileGrid, Walkability};
pub use error::{ErrorSeverity, GameError};
pub use event::CombatEvent;
pub use geometry::{Circle, HitShape, Vec2};
pub use ledger::{AttackSessions, ChargeState, CooldownLedger, SegmentId, SessionId};
pub use skill::{
    Activation, AimMode, AimSource, Ambush, ArcBurst, Beam, BindError, CharacterKit, ConeVolley,
    Dash, DashTrail, EffectHandler, HoldLunge, RejectReason, SkillBinding, SkillConfig,
    SkillContext, SkillRegistry, Stealth, Surge, Sweep, VortexShot, WallMode, try_activate,
};
pub use state::{
    Actor, ActorFlags, ActorId, ActorStatus, AimLock, CharacterKey, Facing, Haste, SlotId, Slow,
    Timestamp, UNTIL_CLEARED, Vitals,
};
