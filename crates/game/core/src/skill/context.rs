//! Execution context handed to an effect handler for one activation.

use crate::combat::{FieldEffect, HitVolume, VolumeId};
use crate::engine::{Arena, Motion, TimedAction};
use crate::env::Walkability;
use crate::event::CombatEvent;
use crate::geometry::Vec2;
use crate::ledger::{SegmentId, SessionId};
use crate::skill::SkillConfig;
use crate::state::{Actor, ActorId, SlotId, Timestamp};

/// Everything a handler may touch while firing.
///
/// The context owns the activation's session: [`Self::start_cooldown`] opens
/// it when none is open yet, and the first segment request does the same, so
/// one activation never produces two sessions.
pub struct SkillContext<'a> {
    arena: &'a mut Arena,
    events: &'a mut Vec<CombatEvent>,
    session: Option<SessionId>,
    config: SkillConfig,

    /// The activating actor.
    pub caster: ActorId,
    pub slot: SlotId,
    pub now: Timestamp,
    /// Angle snapshotted by the gate.
    pub aim_angle: f64,
    /// Pointer position at activation, if one was known.
    pub aim_point: Option<Vec2>,
    /// Caster position at activation.
    pub origin: Vec2,
}

impl<'a> SkillContext<'a> {
    pub(crate) fn new(
        arena: &'a mut Arena,
        events: &'a mut Vec<CombatEvent>,
        caster: ActorId,
        config: SkillConfig,
        now: Timestamp,
        aim_angle: f64,
        aim_point: Option<Vec2>,
    ) -> Self {
        let origin = arena
            .actor(caster)
            .map_or(Vec2::ZERO, |actor| actor.position);
        Self {
            arena,
            events,
            session: None,
            slot: config.slot,
            config,
            caster,
            now,
            aim_angle,
            aim_point,
            origin,
        }
    }

    pub fn config(&self) -> &SkillConfig {
        &self.config
    }

    pub fn caster(&self) -> Option<&Actor> {
        self.arena.actor(self.caster)
    }

    pub fn caster_mut(&mut self) -> Option<&mut Actor> {
        self.arena.actors.get_mut(&self.caster)
    }

    pub fn walk(&self) -> &dyn Walkability {
        &*self.arena.walk
    }

    pub fn arena(&self) -> &Arena {
        &*self.arena
    }

    pub fn events(&mut self) -> &mut Vec<CombatEvent> {
        &mut *self.events
    }

    // ========================================================================
    // Session and cooldown
    // ========================================================================

    /// Whether a session was opened during this activation.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// The activation's session, opened on first use.
    pub fn session(&mut self) -> SessionId {
        if let Some(session) = self.session {
            return session;
        }
        let (slot, now) = (self.slot, self.now);
        let session = match self.arena.actors.get_mut(&self.caster) {
            Some(actor) => actor.sessions.begin_session(slot, now),
            // Gate guarantees the caster; keep a well-formed id regardless.
            None => SessionId {
                actor: self.caster,
                slot,
                sequence: 0,
            },
        };
        self.session = Some(session);
        session
    }

    pub fn segment(&mut self, index: u32) -> SegmentId {
        self.session().segment(index)
    }

    /// Starts the slot cooldown, opening the session first if needed.
    pub fn start_cooldown(&mut self, duration_ms: u64) -> Timestamp {
        self.session();
        let (slot, now) = (self.slot, self.now);
        match self.arena.actors.get_mut(&self.caster) {
            Some(actor) => actor
                .cooldowns
                .start_cooldown(slot, duration_ms, now, &mut *self.events),
            None => now,
        }
    }

    /// The configured cooldown for plain slots. Charged slots already paid
    /// with a charge and their use cooldown, so only the session is opened.
    pub fn start_slot_cooldown(&mut self) {
        if self.config.charged {
            self.session();
        } else {
            self.start_cooldown(self.config.cooldown_ms);
        }
    }

    // ========================================================================
    // Caster state
    // ========================================================================

    pub fn lock(&mut self, duration_ms: u64) {
        let now = self.now;
        if let Some(actor) = self.caster_mut() {
            actor.status.lock_for(now, duration_ms);
        }
    }

    /// Nearest living actor other than the caster within `range` of the
    /// caster, by centre distance.
    pub fn nearest_target(&self, range: f64) -> Option<&Actor> {
        self.arena
            .actors
            .values()
            .filter(|t| t.id != self.caster && t.is_alive())
            .map(|t| (t, t.position.distance(self.origin)))
            .filter(|(_, d)| *d <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(t, _)| t)
    }

    // ========================================================================
    // World
    // ========================================================================

    pub fn spawn_volume(&mut self, volume: HitVolume) -> VolumeId {
        self.arena.insert_volume(volume)
    }

    pub fn spawn_field(&mut self, field: FieldEffect) {
        self.arena.fields.push(field);
    }

    pub(crate) fn schedule(&mut self, delay_ms: u64, action: TimedAction) {
        self.arena
            .timeline
            .schedule(self.now + delay_ms, self.caster, action);
    }

    /// Ends the activation's session `delay_ms` from now.
    pub fn end_session_after(&mut self, delay_ms: u64) {
        let session = self.session();
        self.schedule(delay_ms, TimedAction::EndSession(session));
    }

    pub(crate) fn begin_motion(&mut self, motion: Motion) {
        self.arena.begin_motion(self.caster, motion);
    }

    /// Moves the caster by `delta` through walkability.
    pub fn push_caster(&mut self, delta: Vec2) {
        self.arena.push_actor(self.caster, delta, &mut *self.events);
    }

    /// Closes the context and returns the activation's session.
    pub(crate) fn finish(mut self) -> SessionId {
        self.session()
    }
}
