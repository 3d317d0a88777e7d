//! Multi-tick movement skills: dashes, the charged lunge and the surge.
//!
//! An actor runs at most one motion. Motions hold the skill lock until they
//! finish, so the activation gate rejects new skills in the meantime.
//! Stagger interrupts every motion except a dash.

use tracing::debug;

use crate::combat::{Push, PushDirection, Strike, VolumeId, deliver_strike};
use crate::combat::{HitEnv, HitVolume};
use crate::engine::{Arena, TimedAction};
use crate::env::Walkability;
use crate::event::CombatEvent;
use crate::geometry::{Circle, HitShape, Vec2};
use crate::ledger::SessionId;
use crate::skill::{DashTrail, HoldLunge, Surge, WallMode};
use crate::state::{ActorId, Facing, SlotId, Timestamp, UNTIL_CLEARED};

/// Sub-step length for contact and wall checks of lunges and surges.
const CONTACT_STEP: f64 = 2.0;
/// Wall impact of a surge is checked twice, 120ms apart.
const SURGE_IMPACT_MS: u64 = 121;
const PUSH_OUT_ITERATIONS: u32 = 14;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DashMotion {
    pub session: SessionId,
    pub start: Vec2,
    pub dir: Vec2,
    pub distance: f64,
    pub travelled: f64,
    pub speed: f64,
    pub invincible: bool,
    pub trail: Option<DashTrail>,
    pub trail_volume: Option<VolumeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HoldMotion {
    pub session: SessionId,
    pub slot: SlotId,
    pub started_at: Timestamp,
    pub angle: f64,
    pub params: HoldLunge,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LungeMotion {
    pub session: SessionId,
    pub dir: Vec2,
    pub remaining: f64,
    pub params: HoldLunge,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SurgeMotion {
    pub session: SessionId,
    pub slot: SlotId,
    pub angle: f64,
    pub multiplier: f64,
    pub next_accel_at: Timestamp,
    pub next_turn_at: Timestamp,
    pub params: Surge,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Motion {
    Dash(DashMotion),
    Hold(HoldMotion),
    Lunge(LungeMotion),
    Surge(SurgeMotion),
}

impl Motion {
    pub(crate) fn session(&self) -> SessionId {
        match self {
            Self::Dash(m) => m.session,
            Self::Hold(m) => m.session,
            Self::Lunge(m) => m.session,
            Self::Surge(m) => m.session,
        }
    }

    fn survives_stagger(&self) -> bool {
        matches!(self, Self::Dash(_))
    }
}

/// How far a dash may go along `dir` under `mode`.
///
/// Probes the centre point every `step` units. `BlockAll` stops at the last
/// free probe before the first wall. `BlockLanding` keeps the full distance
/// when the destination is free and otherwise falls back to the last free
/// probe anywhere on the path.
pub(crate) fn dash_reach<W: Walkability + ?Sized>(
    walk: &W,
    start: Vec2,
    dir: Vec2,
    distance: f64,
    step: f64,
    mode: WallMode,
) -> f64 {
    if mode == WallMode::Always {
        return distance;
    }
    let step = step.max(1.0);
    let probes = ((distance / step).ceil() as u64).max(1);
    let mut last_free = 0.0;
    let mut blocked_once = false;
    for i in 0..=probes {
        let d = (i as f64 * step).min(distance);
        if walk.is_walkable(start + dir * d, 0.0) {
            if !(mode == WallMode::BlockAll && blocked_once) {
                last_free = d;
            }
        } else {
            blocked_once = true;
        }
    }
    match mode {
        WallMode::BlockLanding if walk.is_walkable(start + dir * distance, 0.0) => distance,
        _ => last_free,
    }
}

/// Nudges a disk overlapping walls away from the blocked rim points, one
/// unit at a time.
pub(crate) fn push_out_of_walls<W: Walkability + ?Sized>(walk: &W, pos: Vec2, radius: f64) -> Vec2 {
    let diag = std::f64::consts::FRAC_1_SQRT_2;
    let rim = [
        Vec2::new(1.0, 0.0),
        Vec2::new(-1.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(0.0, -1.0),
        Vec2::new(diag, diag),
        Vec2::new(diag, -diag),
        Vec2::new(-diag, diag),
        Vec2::new(-diag, -diag),
    ];
    let mut current = pos;
    for _ in 0..PUSH_OUT_ITERATIONS {
        if walk.is_walkable(current, radius) {
            break;
        }
        let mut away = Vec2::ZERO;
        for dir in rim {
            if !walk.is_walkable(current + dir * radius, 0.0) {
                away += -dir;
            }
        }
        match away.normalized() {
            Some(unit) => current += unit,
            None => break,
        }
    }
    current
}

/// Rotates `current` toward `target` by at most `limit` radians.
fn turn_toward(current: f64, target: f64, limit: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let mut delta = (target - current).rem_euclid(tau);
    if delta > std::f64::consts::PI {
        delta -= tau;
    }
    current + delta.clamp(-limit, limit)
}

impl Arena {
    pub(crate) fn begin_motion(&mut self, actor: ActorId, motion: Motion) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.status.hold_lock();
        }
        if let Some(previous) = self.motions.insert(actor, motion) {
            debug!(%actor, session = %previous.session(), "motion replaced");
        }
    }

    fn release_motion(&mut self, actor: ActorId) -> Option<Motion> {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.status.release_lock_hold();
        }
        self.motions.remove(&actor)
    }

    /// Advances every motion by `dt_ms`.
    pub(crate) fn advance_motions(&mut self, dt_ms: u64, events: &mut Vec<CombatEvent>) {
        let ids: Vec<ActorId> = self.motions.keys().copied().collect();
        for id in ids {
            let Some(motion) = self.motions.get(&id).cloned() else {
                continue;
            };
            let (alive, staggered) = match self.actors.get(&id) {
                Some(a) => (a.is_alive(), a.status.is_staggered(self.now)),
                None => (false, false),
            };
            if !alive || (staggered && !motion.survives_stagger()) {
                self.interrupt_motion(id, motion, events);
                continue;
            }
            match motion {
                Motion::Dash(m) => self.advance_dash(id, m, dt_ms, events),
                Motion::Hold(m) => self.advance_hold(id, m, events),
                Motion::Lunge(m) => self.advance_lunge(id, m, dt_ms, events),
                Motion::Surge(m) => self.advance_surge(id, m, dt_ms, events),
            }
        }
    }

    fn interrupt_motion(&mut self, id: ActorId, motion: Motion, events: &mut Vec<CombatEvent>) {
        self.release_motion(id);
        match &motion {
            Motion::Dash(m) => self.finish_dash(id, m, events),
            Motion::Hold(m) => {
                self.start_slot_cooldown(id, m.slot, events);
                self.end_session(m.session, events);
            }
            Motion::Surge(m) => {
                self.start_slot_cooldown(id, m.slot, events);
                self.end_session(m.session, events);
            }
            Motion::Lunge(m) => self.end_session(m.session, events),
        }
        debug!(actor = %id, session = %motion.session(), "motion interrupted");
    }

    // ========================================================================
    // Dash
    // ========================================================================

    fn advance_dash(
        &mut self,
        id: ActorId,
        mut m: DashMotion,
        dt_ms: u64,
        events: &mut Vec<CombatEvent>,
    ) {
        m.travelled = (m.travelled + m.speed * dt_ms as f64 / 1000.0).min(m.distance);
        let to = m.start + m.dir * m.travelled;
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.relocate(to, events);
        }

        if let Some(trail) = m.trail {
            let shape = HitShape::Line {
                from: m.start,
                to,
                radius: trail.radius,
                spacing: trail.radius * 1.2,
            };
            let existing = m
                .trail_volume
                .and_then(|vid| self.volumes.iter_mut().find(|v| v.id == vid));
            match existing {
                Some(volume) => volume.shape = shape,
                None => {
                    let volume = HitVolume::new(id, m.session.segment(0), shape, UNTIL_CLEARED)
                        .with_damage(trail.damage)
                        .with_stagger(trail.stagger_ms);
                    m.trail_volume = Some(self.insert_volume(volume));
                }
            }
        }

        if m.travelled >= m.distance {
            self.release_motion(id);
            self.finish_dash(id, &m, events);
        } else {
            self.motions.insert(id, Motion::Dash(m));
        }
    }

    fn finish_dash(&mut self, id: ActorId, m: &DashMotion, events: &mut Vec<CombatEvent>) {
        let walk = &*self.walk;
        if let Some(actor) = self.actors.get_mut(&id) {
            if m.invincible {
                actor.status.clear_invincible();
            }
            let landed = push_out_of_walls(walk, actor.position, actor.radius);
            actor.relocate(landed, events);
        }
        let linger = m.trail.map_or(0, |t| t.linger_ms);
        if let Some(vid) = m.trail_volume {
            let expires_at = self.now + linger;
            if let Some(volume) = self.volumes.iter_mut().find(|v| v.id == vid) {
                volume.expires_at = expires_at;
            }
        }
        if linger > 0 {
            self.timeline
                .schedule(self.now + linger, id, TimedAction::EndSession(m.session));
        } else {
            self.end_session(m.session, events);
        }
    }

    // ========================================================================
    // Hold and lunge
    // ========================================================================

    fn advance_hold(&mut self, id: ActorId, mut m: HoldMotion, events: &mut Vec<CombatEvent>) {
        let pointer = self.pointers.get(&id).copied();
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        if let Some(dir) = pointer.and_then(|p| (p - actor.position).normalized()) {
            m.angle = dir.angle();
            actor.facing = Facing::from_angle(m.angle);
        }

        let held_ms = self.now.saturating_since(m.started_at);
        let still_held = self.held.get(&id).is_some_and(|held| held.contains(&m.slot));
        if held_ms < m.params.max_hold_ms && still_held {
            self.motions.insert(id, Motion::Hold(m));
            return;
        }

        self.start_slot_cooldown(id, m.slot, events);
        let length = m.params.length_after(held_ms);
        debug!(actor = %id, held_ms, length, "lunge released");
        self.motions.insert(
            id,
            Motion::Lunge(LungeMotion {
                session: m.session,
                dir: Vec2::from_angle(m.angle),
                remaining: length,
                params: m.params,
            }),
        );
    }

    fn advance_lunge(
        &mut self,
        id: ActorId,
        mut m: LungeMotion,
        dt_ms: u64,
        events: &mut Vec<CombatEvent>,
    ) {
        let travel = m.remaining.min(m.params.speed * dt_ms as f64 / 1000.0);
        let Some((mut pos, radius)) = self.actors.get(&id).map(|a| (a.position, a.radius)) else {
            return;
        };
        let steps = ((travel / CONTACT_STEP).ceil() as u64).max(1);
        let inc = travel / steps as f64;

        for _ in 0..steps {
            let candidate = pos + m.dir * inc;
            if let Some(target) = self.contact_at(id, candidate, radius * 1.2) {
                self.set_position(id, pos, events);
                self.release_motion(id);
                self.latch(id, target, &m, events);
                return;
            }
            if !self.walk.is_walkable(candidate, radius) {
                self.set_position(id, pos, events);
                self.release_motion(id);
                self.end_session(m.session, events);
                return;
            }
            pos = candidate;
            m.remaining -= inc;
        }
        self.set_position(id, pos, events);

        if m.remaining <= 1e-9 {
            self.release_motion(id);
            self.end_session(m.session, events);
        } else {
            self.motions.insert(id, Motion::Lunge(m));
        }
    }

    /// Stun on segment 0, then damage ticks on segments 1..=ticks.
    fn latch(
        &mut self,
        id: ActorId,
        target: ActorId,
        m: &LungeMotion,
        events: &mut Vec<CombatEvent>,
    ) {
        let stun = Strike {
            attacker: id,
            segment: m.session.segment(0),
            damage: 0.0,
            stagger_ms: m.params.stun_ms,
            push: None,
        };
        let env = HitEnv {
            walk: &*self.walk,
            now: self.now,
            knockback_step: self.config.knockback_step,
        };
        deliver_strike(&mut self.actors, &stun, target, &env, events);

        let mut last = self.now;
        for i in 0..m.params.ticks {
            let at = self.now + u64::from(i) * m.params.tick_interval_ms;
            let strike = Strike {
                attacker: id,
                segment: m.session.segment(i + 1),
                damage: m.params.tick_damage,
                stagger_ms: 0,
                push: None,
            };
            self.timeline
                .schedule(at, id, TimedAction::Strike { target, strike });
            last = at;
        }
        self.timeline
            .schedule(last, id, TimedAction::EndSession(m.session));
    }

    // ========================================================================
    // Surge
    // ========================================================================

    fn advance_surge(
        &mut self,
        id: ActorId,
        mut m: SurgeMotion,
        dt_ms: u64,
        events: &mut Vec<CombatEvent>,
    ) {
        let now = self.now;
        while now >= m.next_accel_at && m.params.accel_interval_ms > 0 {
            m.multiplier = (m.multiplier + m.params.accel_step).min(m.params.max_multiplier);
            m.next_accel_at = m.next_accel_at + m.params.accel_interval_ms;
        }

        let pointer = self.pointers.get(&id).copied();
        let Some((mut pos, radius, speed)) = self
            .actors
            .get(&id)
            .map(|a| (a.position, a.radius, a.speed(now)))
        else {
            return;
        };
        if now >= m.next_turn_at {
            if let Some(dir) = pointer.and_then(|p| (p - pos).normalized()) {
                m.angle = turn_toward(m.angle, dir.angle(), m.params.turn_limit);
            }
            m.next_turn_at = now + m.params.turn_interval_ms;
        }
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.facing = Facing::from_angle(m.angle);
        }

        let travel = (speed * m.multiplier * dt_ms as f64 / 1000.0).max(0.001);
        let steps = ((travel / CONTACT_STEP).ceil() as u64).max(1);
        let dir = Vec2::from_angle(m.angle);
        let inc = travel / steps as f64;

        for _ in 0..steps {
            let candidate = pos + dir * inc;
            if let Some(target) = self.contact_at(id, candidate, radius * 1.5) {
                self.set_position(id, pos, events);
                self.ram(id, target, &m, events);
                return;
            }
            if !self.walk.is_walkable(candidate, radius) {
                self.set_position(id, pos, events);
                self.wall_impact(id, &m, events);
                return;
            }
            pos = candidate;
        }
        self.set_position(id, pos, events);
        self.motions.insert(id, Motion::Surge(m));
    }

    fn ram(
        &mut self,
        id: ActorId,
        target: ActorId,
        m: &SurgeMotion,
        events: &mut Vec<CombatEvent>,
    ) {
        let strike = Strike {
            attacker: id,
            segment: m.session.segment(0),
            damage: m.params.damage_at(m.multiplier),
            stagger_ms: m.params.stun_ms,
            push: Some(Push::new(PushDirection::Fixed(m.angle), m.params.knockback)),
        };
        let env = HitEnv {
            walk: &*self.walk,
            now: self.now,
            knockback_step: self.config.knockback_step,
        };
        deliver_strike(&mut self.actors, &strike, target, &env, events);
        self.push_actor(id, Vec2::from_angle(m.angle) * -m.params.self_bump, events);
        self.release_motion(id);
        self.start_slot_cooldown(id, m.slot, events);
        self.end_session(m.session, events);
    }

    fn wall_impact(&mut self, id: ActorId, m: &SurgeMotion, events: &mut Vec<CombatEvent>) {
        let Some(center) = self.actors.get(&id).map(|a| a.position) else {
            return;
        };
        let volume = HitVolume::new(
            id,
            m.session.segment(1),
            HitShape::Circle(Circle::new(center, m.params.wall_radius)),
            self.now + SURGE_IMPACT_MS,
        )
        .with_stagger(m.params.wall_stun_ms)
        .with_push(Push::new(PushDirection::Fixed(m.angle), m.params.wall_knockback));
        self.insert_volume(volume);
        self.push_actor(id, Vec2::from_angle(m.angle) * -m.params.wall_self_bump, events);
        self.release_motion(id);
        self.start_slot_cooldown(id, m.slot, events);
        self.timeline.schedule(
            self.now + SURGE_IMPACT_MS,
            id,
            TimedAction::EndSession(m.session),
        );
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// First living non-self actor whose body touches a disk of `reach`
    /// around `point`, in id order.
    fn contact_at(&self, id: ActorId, point: Vec2, reach: f64) -> Option<ActorId> {
        self.actors
            .values()
            .filter(|t| t.id != id && t.is_alive())
            .find(|t| t.position.distance(point) <= reach + t.radius)
            .map(|t| t.id)
    }

    fn set_position(&mut self, id: ActorId, to: Vec2, events: &mut Vec<CombatEvent>) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.relocate(to, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{OpenField, TileGrid};

    #[test]
    fn block_all_stops_before_first_wall() {
        // Wall column at x in [48, 64).
        let grid = TileGrid::from_rows(&["........", "...#....", "........"], 16.0);
        let start = Vec2::new(8.0, 24.0);
        let reach = dash_reach(
            &grid,
            start,
            Vec2::new(1.0, 0.0),
            100.0,
            16.0 / 3.0,
            WallMode::BlockAll,
        );
        assert!(start.x + reach < 48.0);
        assert!(reach > 30.0);
    }

    #[test]
    fn block_landing_passes_walls_when_destination_is_free() {
        let grid = TileGrid::from_rows(&["........", "...#....", "........"], 16.0);
        let start = Vec2::new(8.0, 24.0);
        let reach = dash_reach(
            &grid,
            start,
            Vec2::new(1.0, 0.0),
            80.0,
            16.0 / 3.0,
            WallMode::BlockLanding,
        );
        assert_eq!(reach, 80.0);

        // Destination at x = 128 is off the grid, so it falls back.
        let reach = dash_reach(
            &grid,
            start,
            Vec2::new(1.0, 0.0),
            120.0,
            16.0 / 3.0,
            WallMode::BlockLanding,
        );
        assert!(reach < 120.0 && start.x + reach >= 64.0);
    }

    #[test]
    fn open_field_never_limits_reach() {
        let walk = OpenField::unbounded();
        let reach = dash_reach(
            &walk,
            Vec2::ZERO,
            Vec2::new(0.0, 1.0),
            80.0,
            5.0,
            WallMode::BlockAll,
        );
        assert_eq!(reach, 80.0);
    }

    #[test]
    fn push_out_moves_off_the_wall_edge() {
        let grid = TileGrid::from_rows(&["......", "......", "......", "....##"], 16.0);
        // Body overlaps the wall row below.
        let pos = Vec2::new(72.0, 44.0);
        assert!(!grid.is_walkable(pos, 6.0));
        let out = push_out_of_walls(&grid, pos, 6.0);
        assert!(grid.is_walkable(out, 6.0), "still stuck at {out:?}");
        assert!(out.y < pos.y);
    }

    #[test]
    fn turning_is_limited_per_step() {
        let limit = 15.0_f64.to_radians();
        let turned = turn_toward(0.0, std::f64::consts::FRAC_PI_2, limit);
        assert!((turned - limit).abs() < 1e-12);
        let turned = turn_toward(0.1, 0.05, limit);
        assert!((turned - 0.05).abs() < 1e-12);
        // Shortest way around the wrap.
        let turned = turn_toward(3.1, -3.1, limit);
        assert!(turned > 3.1);
    }
}
