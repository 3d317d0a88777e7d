//! Skill activation gate.
//!
//! Decides whether a slot may fire and, when it may, performs the state
//! transition: charge or cooldown bookkeeping, aim snapshot, facing snap,
//! aim lock, and the handler call. Rejections are ordinary values; callers
//! simply try again on a later tick.

use std::collections::BTreeMap;

use crate::engine::Arena;
use crate::error::{ErrorSeverity, GameError};
use crate::event::CombatEvent;
use crate::geometry::Vec2;
use crate::ledger::SessionId;
use crate::skill::{AimMode, SkillContext};
use crate::state::{Actor, ActorId, Facing, SlotId, Timestamp};

/// Why an activation did not happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectReason {
    #[error("actor not found")]
    ActorNotFound,

    #[error("actor is down")]
    ActorDown,

    #[error("slot has no skill bound")]
    UnboundSlot,

    #[error("actor is staggered")]
    Staggered,

    #[error("actor is skill-locked")]
    SkillLocked,

    #[error("no target in range")]
    NoTargetInRange,

    #[error("no charges left")]
    NoCharges,

    #[error("skill is on cooldown")]
    OnCooldown,
}

impl GameError for RejectReason {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnboundSlot => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActorNotFound => "GATE_ACTOR_NOT_FOUND",
            Self::ActorDown => "GATE_ACTOR_DOWN",
            Self::UnboundSlot => "GATE_UNBOUND_SLOT",
            Self::Staggered => "GATE_STAGGERED",
            Self::SkillLocked => "GATE_SKILL_LOCKED",
            Self::NoTargetInRange => "GATE_NO_TARGET_IN_RANGE",
            Self::NoCharges => "GATE_NO_CHARGES",
            Self::OnCooldown => "GATE_ON_COOLDOWN",
        }
    }
}

/// A successful activation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Activation {
    pub slot: SlotId,
    pub session: SessionId,
    pub aim_angle: f64,
    pub facing: Facing,
}

/// Supplies the pointer position used by mouse-aimed skills.
pub trait AimSource {
    fn aim_point(&self, actor: ActorId) -> Option<Vec2>;
}

impl AimSource for Option<Vec2> {
    fn aim_point(&self, _actor: ActorId) -> Option<Vec2> {
        *self
    }
}

impl AimSource for Vec2 {
    fn aim_point(&self, _actor: ActorId) -> Option<Vec2> {
        Some(*self)
    }
}

impl AimSource for BTreeMap<ActorId, Vec2> {
    fn aim_point(&self, actor: ActorId) -> Option<Vec2> {
        self.get(&actor).copied()
    }
}

/// Angle a skill with `mode` fires at.
fn snapshot_aim(actor: &Actor, mode: AimMode, pointer: Option<Vec2>, now: Timestamp) -> f64 {
    match mode {
        AimMode::Facing => actor.facing_aim(now),
        AimMode::MouseAim => pointer
            .and_then(|p| (p - actor.position).normalized())
            .map_or_else(|| actor.facing_aim(now), Vec2::angle),
    }
}

/// Attempts to activate `slot` of `caster` at `now`.
pub fn try_activate(
    arena: &mut Arena,
    caster: ActorId,
    slot: SlotId,
    now: Timestamp,
    aim: &dyn AimSource,
    events: &mut Vec<CombatEvent>,
) -> Result<Activation, RejectReason> {
    let actor = arena.actor(caster).ok_or(RejectReason::ActorNotFound)?;
    if !actor.is_alive() {
        return Err(RejectReason::ActorDown);
    }
    let binding = actor
        .skills
        .get(slot)
        .cloned()
        .ok_or(RejectReason::UnboundSlot)?;
    if actor.status.is_staggered(now) {
        return Err(RejectReason::Staggered);
    }
    if actor.status.is_locked(now) {
        return Err(RejectReason::SkillLocked);
    }

    let config = &binding.config;
    let range = config.require_target_in_range;
    if range > 0.0 {
        let origin = actor.position;
        let any_in_range = arena
            .actors()
            .any(|t| t.id != caster && t.is_alive() && t.position.distance(origin) <= range);
        if !any_in_range {
            return Err(RejectReason::NoTargetInRange);
        }
    }

    if config.charged {
        let charges = actor.cooldowns.charges(slot).map_or(0, |c| c.charges);
        if charges == 0 {
            return Err(RejectReason::NoCharges);
        }
    }
    if !actor.cooldowns.is_off_cooldown(slot, now) {
        return Err(RejectReason::OnCooldown);
    }

    let pointer = aim.aim_point(caster);
    let aim_angle = snapshot_aim(actor, config.aim_mode, pointer, now);
    let facing = Facing::from_angle(aim_angle);

    let actor = arena
        .actor_mut(caster)
        .ok_or(RejectReason::ActorNotFound)?;
    if config.charged && !actor.cooldowns.try_consume_charge(slot, now, events) {
        return Err(RejectReason::NoCharges);
    }
    actor.facing = facing;
    if config.aim_lock_ms > 0 {
        actor.status.lock_aim(aim_angle, now + config.aim_lock_ms);
    }

    let mut ctx = SkillContext::new(
        arena,
        events,
        caster,
        binding.config.clone(),
        now,
        aim_angle,
        pointer,
    );
    if binding.config.charged && binding.config.use_cooldown_ms > 0 {
        ctx.start_cooldown(binding.config.use_cooldown_ms);
    }
    binding.handler.fire(&mut ctx);
    let session = ctx.finish();

    events.push(CombatEvent::SkillActivated {
        actor: caster,
        slot,
        session,
        aim_angle,
        facing,
    });
    Ok(Activation {
        slot,
        session,
        aim_angle,
        facing,
    })
}
