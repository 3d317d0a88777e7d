//! Structured outcomes produced by the combat core.
//!
//! The core never talks to a renderer or an event bus. Every operation that
//! changes observable state pushes a [`CombatEvent`] into the caller's buffer
//! and the outer loop decides where to forward it.

use crate::geometry::Vec2;
use crate::ledger::{SegmentId, SessionId};
use crate::state::{ActorId, Facing, SlotId, Timestamp};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum CombatEvent {
    CooldownStarted {
        actor: ActorId,
        slot: SlotId,
        ends_at: Timestamp,
        duration_ms: u64,
    },
    ChargesChanged {
        actor: ActorId,
        slot: SlotId,
        charges: u32,
        max_charges: u32,
        next_recharge_at: Option<Timestamp>,
    },
    SkillActivated {
        actor: ActorId,
        slot: SlotId,
        session: SessionId,
        aim_angle: f64,
        facing: Facing,
    },
    HitLanded {
        attacker: ActorId,
        target: ActorId,
        segment: SegmentId,
        damage: f64,
    },
    HpChanged {
        actor: ActorId,
        hp: f64,
        max_hp: f64,
    },
    Died {
        actor: ActorId,
    },
    Staggered {
        actor: ActorId,
        until: Timestamp,
    },
    Displaced {
        actor: ActorId,
        from: Vec2,
        to: Vec2,
    },
    SessionEnded {
        session: SessionId,
    },
}

impl CombatEvent {
    /// Actor the event is primarily about.
    pub fn subject(&self) -> ActorId {
        match self {
            Self::CooldownStarted { actor, .. }
            | Self::ChargesChanged { actor, .. }
            | Self::SkillActivated { actor, .. }
            | Self::HpChanged { actor, .. }
            | Self::Died { actor }
            | Self::Staggered { actor, .. }
            | Self::Displaced { actor, .. } => *actor,
            Self::HitLanded { target, .. } => *target,
            Self::SessionEnded { session } => session.actor,
        }
    }
}
