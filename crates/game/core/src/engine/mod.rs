//! The arena: one authoritative combat simulation.
//!
//! All actor, volume and field mutation happens inside [`Arena::step`] (and
//! the activation calls it makes), on whatever single thread owns the arena.
//! Timers are deadlines compared against the step's `now`, so a step is a pure
//! function of the previous state, the inputs and the elapsed time.

mod errors;
mod input;
mod motion;
mod snapshot;
mod timeline;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

pub use errors::ArenaError;
pub use input::InputFrame;
pub use snapshot::{ActorView, ArenaSnapshot, FieldView, SlotView};

pub(crate) use motion::{DashMotion, HoldMotion, Motion, SurgeMotion, dash_reach};
pub(crate) use timeline::{TimedAction, Timeline};

use crate::combat::{
    Detonated, FieldEffect, HitEnv, HitVolume, Push, PushDirection, Strike, VolumeId,
    deliver_strike, detonation_of, ray_length, resolve_volumes, stepped_advance, tick_fields,
};
use crate::config::CombatConfig;
use crate::env::{OpenField, Walkability};
use crate::event::CombatEvent;
use crate::geometry::{Circle, HitShape, Vec2};
use crate::ledger::SessionId;
use crate::skill::{Activation, CharacterKit, RejectReason, reappear_point, try_activate};
use crate::state::{Actor, ActorId, Facing, SlotId, Timestamp};

/// Probe spacing for beam length.
const BEAM_PROBE_STEP: f64 = 4.0;

/// Lifetime of one arc-burst explosion.
const ARC_EXPLOSION_MS: u64 = 1;

/// A room's combat simulation.
pub struct Arena {
    pub(crate) config: CombatConfig,
    pub(crate) walk: Box<dyn Walkability>,
    pub(crate) actors: BTreeMap<ActorId, Actor>,
    pub(crate) volumes: Vec<HitVolume>,
    pub(crate) fields: Vec<FieldEffect>,
    pub(crate) timeline: Timeline,
    pub(crate) motions: BTreeMap<ActorId, Motion>,
    pub(crate) pointers: BTreeMap<ActorId, Vec2>,
    pub(crate) held: BTreeMap<ActorId, BTreeSet<SlotId>>,
    next_actor: u32,
    next_volume: u64,
    now: Timestamp,
}

impl Arena {
    pub fn new(config: CombatConfig, walk: impl Walkability + 'static) -> Self {
        Self {
            config,
            walk: Box::new(walk),
            actors: BTreeMap::new(),
            volumes: Vec::new(),
            fields: Vec::new(),
            timeline: Timeline::default(),
            motions: BTreeMap::new(),
            pointers: BTreeMap::new(),
            held: BTreeMap::new(),
            next_actor: 1,
            next_volume: 1,
            now: Timestamp::ZERO,
        }
    }

    /// An arena without walls.
    pub fn open(config: CombatConfig) -> Self {
        Self::new(config, OpenField::unbounded())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn walkability(&self) -> &dyn Walkability {
        &*self.walk
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn volumes(&self) -> &[HitVolume] {
        &self.volumes
    }

    pub fn fields(&self) -> &[FieldEffect] {
        &self.fields
    }

    /// Whether the actor is in the middle of a dash, hold, lunge or surge.
    pub fn in_motion(&self, id: ActorId) -> bool {
        self.motions.contains_key(&id)
    }

    pub fn pending_actions(&self) -> usize {
        self.timeline.len()
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            now: self.now,
            actors: self
                .actors
                .values()
                .map(|actor| ActorView::of(actor, self.now))
                .collect(),
            fields: self
                .fields
                .iter()
                .map(|field| FieldView {
                    owner: field.owner,
                    center: field.center,
                    radius: field.spec.radius,
                    expires_at: field.expires_at,
                })
                .collect(),
            live_volumes: self.volumes.len(),
        }
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Adds an actor built from `kit` at `position`.
    pub fn spawn(&mut self, kit: &CharacterKit, position: Vec2) -> Result<ActorId, ArenaError> {
        kit.validate()?;
        if self.actors.len() >= CombatConfig::MAX_ACTORS {
            return Err(ArenaError::ArenaFull {
                max: CombatConfig::MAX_ACTORS,
            });
        }
        if !self.walk.is_walkable(position, kit.radius) {
            return Err(ArenaError::BlockedSpawn);
        }
        let id = ActorId(self.next_actor);
        self.next_actor += 1;
        let actor = Actor::from_kit(id, kit, position)?;
        self.actors.insert(id, actor);
        debug!(actor = %id, character = %kit.key, "actor spawned");
        Ok(id)
    }

    /// Removes the actor and everything it still has in flight.
    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        let actor = self.actors.remove(&id)?;
        self.volumes.retain(|v| v.owner != id);
        self.fields.retain(|f| f.owner != id);
        self.motions.remove(&id);
        self.timeline.cancel_owner(id);
        self.pointers.remove(&id);
        self.held.remove(&id);
        debug!(actor = %id, "actor despawned");
        Some(actor)
    }

    pub fn set_pointer(&mut self, id: ActorId, point: Vec2) {
        self.pointers.insert(id, point);
    }

    /// Activates `slot` right away, aiming at the last known pointer.
    pub fn activate(
        &mut self,
        id: ActorId,
        slot: SlotId,
        events: &mut Vec<CombatEvent>,
    ) -> Result<Activation, RejectReason> {
        let pointer = self.pointers.get(&id).copied();
        let now = self.now;
        try_activate(self, id, slot, now, &pointer, events)
    }

    // ========================================================================
    // Step
    // ========================================================================

    /// Advances the simulation to `now`. `dt_ms` is clamped to the maximum
    /// step before it drives any movement.
    pub fn step(
        &mut self,
        now: Timestamp,
        dt_ms: u64,
        inputs: &BTreeMap<ActorId, InputFrame>,
    ) -> Vec<CombatEvent> {
        let dt_ms = self.config.clamp_step(dt_ms);
        self.now = self.now.max(now);
        let now = self.now;
        let mut events = Vec::new();

        for actor in self.actors.values_mut() {
            actor.status.expire(now);
            actor.cooldowns.advance_all(now, &mut events);
        }

        let ids: Vec<ActorId> = self.actors.keys().copied().collect();
        for id in ids {
            let frame = inputs.get(&id).cloned().unwrap_or_default();
            self.apply_input(id, &frame, dt_ms, &mut events);
        }

        self.run_timeline(&mut events);
        self.advance_motions(dt_ms, &mut events);
        self.move_projectiles(dt_ms);

        let env = HitEnv {
            walk: &*self.walk,
            now,
            knockback_step: self.config.knockback_step,
        };
        let detonated = resolve_volumes(&mut self.actors, &mut self.volumes, &env, &mut events);
        tick_fields(&mut self.actors, &mut self.fields, &env, &mut events);
        self.open_fields(detonated);
        self.volumes.retain(|v| !v.is_spent() && !v.is_expired(now));

        self.evict_stale_sessions();
        events
    }

    fn apply_input(
        &mut self,
        id: ActorId,
        frame: &InputFrame,
        dt_ms: u64,
        events: &mut Vec<CombatEvent>,
    ) {
        if let Some(point) = frame.aim {
            self.pointers.insert(id, point);
        }
        let previous = self.held.insert(id, frame.held.clone()).unwrap_or_default();

        for &slot in &frame.held {
            let auto_hold = self
                .actors
                .get(&id)
                .and_then(|a| a.skills.get(slot))
                .map(|b| b.config.auto_hold);
            let Some(auto_hold) = auto_hold else {
                continue;
            };
            if !auto_hold && previous.contains(&slot) {
                continue;
            }
            if let Err(reason) = self.activate(id, slot, events) {
                trace!(actor = %id, %slot, %reason, "activation rejected");
            }
        }

        self.locomote(id, frame.move_intent, dt_ms);
    }

    /// Walks the actor along its intent unless it is down, locked, staggered
    /// or carried by a motion. Facing follows the intent unless aim-locked.
    fn locomote(&mut self, id: ActorId, intent: Vec2, dt_ms: u64) {
        let now = self.now;
        let step = self.config.knockback_step;
        let walk = &*self.walk;
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        if !actor.is_alive() || !actor.accepts_input(now) || self.motions.contains_key(&id) {
            return;
        }
        let Some(dir) = intent.normalized() else {
            return;
        };
        let distance = actor.speed(now) * dt_ms as f64 / 1000.0;
        actor.position = stepped_advance(walk, actor.position, dir * distance, actor.radius, step);
        if actor.status.locked_aim(now).is_none()
            && let Some(facing) = Facing::from_vector(dir)
        {
            actor.facing = facing;
        }
    }

    // ========================================================================
    // Timeline
    // ========================================================================

    fn run_timeline(&mut self, events: &mut Vec<CombatEvent>) {
        while let Some((_, entry)) = self.timeline.pop_due(self.now) {
            self.run_action(entry.owner, entry.action, events);
        }
    }

    fn run_action(&mut self, owner: ActorId, action: TimedAction, events: &mut Vec<CombatEvent>) {
        let now = self.now;
        let owner_pos = self
            .actors
            .get(&owner)
            .filter(|a| a.is_alive())
            .map(|a| a.position);

        match action {
            TimedAction::ArcShot {
                segment,
                offset,
                burst,
                last,
            } => {
                let Some(pos) = owner_pos else {
                    if last {
                        self.end_session(segment.session, events);
                    }
                    return;
                };
                let center = pos + offset;
                let volume = HitVolume::new(
                    owner,
                    segment,
                    HitShape::Circle(Circle::new(center, burst.radius)),
                    now,
                )
                .with_damage(burst.damage)
                .with_stagger(burst.stagger_ms)
                .with_push(Push::new(PushDirection::AwayFromPoint(center), burst.push));
                self.timeline.schedule(
                    now + burst.travel_ms,
                    owner,
                    TimedAction::SpawnVolume {
                        volume,
                        life_ms: ARC_EXPLOSION_MS,
                        ends_session: last,
                    },
                );
            }
            TimedAction::SpawnVolume {
                mut volume,
                life_ms,
                ends_session,
            } => {
                volume.expires_at = now + life_ms.max(1);
                if ends_session {
                    // Due after this step has resolved the volume.
                    self.timeline.schedule(
                        volume.expires_at + 1,
                        owner,
                        TimedAction::EndSession(volume.segment.session),
                    );
                }
                self.insert_volume(volume);
            }
            TimedAction::Reappear {
                target,
                target_pos,
                segment,
                ambush,
            } => {
                let Some(pos) = owner_pos else {
                    return;
                };
                self.reappear(owner, pos, target, target_pos, events);
                let strike = Strike {
                    attacker: owner,
                    segment,
                    damage: ambush.damage,
                    stagger_ms: ambush.stagger_ms,
                    push: None,
                };
                self.strike(&strike, target, events);
                self.end_session(segment.session, events);
            }
            TimedAction::FireBeam {
                segment,
                angle,
                beam,
            } => {
                if owner_pos.is_none() {
                    return;
                }
                self.push_actor(owner, Vec2::from_angle(angle) * -beam.recoil, events);
                let Some(origin) = self.actors.get(&owner).map(|a| a.position) else {
                    return;
                };
                let length =
                    ray_length(&*self.walk, origin, angle, beam.max_length, BEAM_PROBE_STEP);
                let shape = HitShape::Beam {
                    origin,
                    angle,
                    length,
                    thickness: beam.thickness,
                };
                let volume = HitVolume::new(owner, segment, shape, now + beam.duration_ms)
                    .with_damage(beam.damage)
                    .with_stagger(beam.stagger_ms);
                self.insert_volume(volume);
                self.timeline.schedule(
                    now + beam.duration_ms,
                    owner,
                    TimedAction::EndSession(segment.session),
                );
            }
            TimedAction::Strike { target, strike } => {
                self.strike(&strike, target, events);
            }
            TimedAction::EndSession(session) => self.end_session(session, events),
        }
    }

    /// Places an ambushing actor behind its target and faces it.
    fn reappear(
        &mut self,
        owner: ActorId,
        from: Vec2,
        target: ActorId,
        target_pos: Vec2,
        events: &mut Vec<CombatEvent>,
    ) {
        let target_radius = self.actors.get(&target).map_or(0.0, |t| t.radius);
        let walk = &*self.walk;
        let Some(actor) = self.actors.get_mut(&owner) else {
            return;
        };
        let fallback = Vec2::from_angle(actor.facing.angle());
        let spot = reappear_point(walk, from, target_pos, target_radius, actor.radius, fallback)
            .unwrap_or(from);
        actor.relocate(spot, events);
        if let Some(facing) = Facing::from_vector(target_pos - spot) {
            actor.facing = facing;
        }
    }

    fn strike(&mut self, strike: &Strike, target: ActorId, events: &mut Vec<CombatEvent>) {
        let env = HitEnv {
            walk: &*self.walk,
            now: self.now,
            knockback_step: self.config.knockback_step,
        };
        deliver_strike(&mut self.actors, strike, target, &env, events);
    }

    // ========================================================================
    // Projectiles and fields
    // ========================================================================

    fn move_projectiles(&mut self, dt_ms: u64) {
        let dt = dt_ms as f64 / 1000.0;
        let mut detonated = Vec::new();
        for volume in self.volumes.iter_mut() {
            if volume.spent {
                continue;
            }
            let Some(projectile) = volume.projectile.as_mut() else {
                continue;
            };
            let delta = projectile.velocity * dt;
            projectile.travelled += delta.length();
            let blocked_by_walls = projectile.wall_blocked;
            let due = projectile
                .detonation
                .as_ref()
                .is_some_and(|d| projectile.travelled >= d.detonate_distance);
            volume.shape.translate(delta);

            if blocked_by_walls && !self.walk.is_walkable(volume.shape.anchor(), 0.0) {
                volume.spent = true;
                continue;
            }
            if due {
                detonated.extend(detonation_of(volume));
                volume.spent = true;
            }
        }
        if !detonated.is_empty() {
            trace!(count = detonated.len(), "projectiles detonated in flight");
        }
        self.open_fields(detonated);
    }

    /// Opens a field per detonation; each field ends its session on expiry.
    fn open_fields(&mut self, detonated: Vec<Detonated>) {
        for hit in detonated {
            let field = FieldEffect::new(hit.owner, hit.session, hit.center, hit.field, self.now);
            self.timeline.schedule(
                field.expires_at,
                hit.owner,
                TimedAction::EndSession(hit.session),
            );
            self.fields.push(field);
        }
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    pub(crate) fn insert_volume(&mut self, mut volume: HitVolume) -> VolumeId {
        let id = VolumeId(self.next_volume);
        self.next_volume += 1;
        volume.id = id;
        self.volumes.push(volume);
        id
    }

    /// Ends `session`; reported only when it still held records.
    pub(crate) fn end_session(&mut self, session: SessionId, events: &mut Vec<CombatEvent>) {
        if let Some(actor) = self.actors.get_mut(&session.actor)
            && actor.sessions.end(session)
        {
            events.push(CombatEvent::SessionEnded { session });
        }
    }

    /// Moves an actor by `delta` through walkability, as knockback does.
    pub(crate) fn push_actor(&mut self, id: ActorId, delta: Vec2, events: &mut Vec<CombatEvent>) {
        let step = self.config.knockback_step;
        let walk = &*self.walk;
        if let Some(actor) = self.actors.get_mut(&id) {
            let to = stepped_advance(walk, actor.position, delta, actor.radius, step);
            actor.relocate(to, events);
        }
    }

    /// Starts the configured cooldown of a plain slot.
    pub(crate) fn start_slot_cooldown(
        &mut self,
        id: ActorId,
        slot: SlotId,
        events: &mut Vec<CombatEvent>,
    ) {
        let now = self.now;
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let Some(config) = actor.skills.get(slot).map(|b| b.config.clone()) else {
            return;
        };
        if !config.charged {
            actor
                .cooldowns
                .start_cooldown(slot, config.cooldown_ms, now, events);
        }
    }

    /// Drops dedup records of sessions nothing refers to any more once they
    /// outlive the configured TTL.
    fn evict_stale_sessions(&mut self) {
        let mut live: BTreeSet<SessionId> =
            self.volumes.iter().map(|v| v.segment.session).collect();
        live.extend(self.fields.iter().map(|f| f.session));
        live.extend(self.motions.values().map(Motion::session));

        let now = self.now;
        let ttl = self.config.session_ttl_ms;
        let timeline = &self.timeline;
        for actor in self.actors.values_mut() {
            actor
                .sessions
                .evict_stale(now, ttl, |s| live.contains(s) || timeline.references(*s));
        }
    }
}

#[cfg(test)]
mod tests;
