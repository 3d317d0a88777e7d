//! Read-only views published to a transport once per step.

use crate::geometry::Vec2;
use crate::state::{Actor, ActorFlags, ActorId, CharacterKey, Facing, SlotId, Timestamp};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotView {
    pub slot: SlotId,
    pub cooldown_remaining_ms: u64,
    /// `(charges, max_charges)` for charged slots.
    pub charges: Option<(u32, u32)>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorView {
    pub id: ActorId,
    pub character: CharacterKey,
    pub position: Vec2,
    pub facing: Facing,
    pub radius: f64,
    pub hp: f64,
    pub max_hp: f64,
    pub flags: ActorFlags,
    pub slots: Vec<SlotView>,
}

impl ActorView {
    pub fn of(actor: &Actor, now: Timestamp) -> Self {
        let slots = actor
            .skills
            .iter()
            .map(|binding| {
                let slot = binding.slot();
                SlotView {
                    slot,
                    cooldown_remaining_ms: actor.cooldowns.cooldown_remaining(slot, now),
                    charges: actor
                        .cooldowns
                        .charges(slot)
                        .map(|c| (c.charges, c.max_charges)),
                }
            })
            .collect();
        Self {
            id: actor.id,
            character: actor.character,
            position: actor.position,
            facing: actor.facing,
            radius: actor.radius,
            hp: actor.hp(),
            max_hp: actor.max_hp(),
            flags: actor.flags(now),
            slots,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldView {
    pub owner: ActorId,
    pub center: Vec2,
    pub radius: f64,
    pub expires_at: Timestamp,
}

/// Authoritative state of the arena at one instant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArenaSnapshot {
    pub now: Timestamp,
    pub actors: Vec<ActorView>,
    pub fields: Vec<FieldView>,
    pub live_volumes: usize,
}

impl ArenaSnapshot {
    pub fn actor(&self, id: ActorId) -> Option<&ActorView> {
        self.actors.iter().find(|view| view.id == id)
    }
}
