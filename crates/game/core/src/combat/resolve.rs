//! Per-step hit resolution.
//!
//! Volumes are evaluated in spawn order and targets in actor-id order, so a
//! step is deterministic. For every (volume, target) pair the checks run in
//! a fixed order:
//!
//! 1. the owner never hits itself
//! 2. dead targets are skipped
//! 3. sampled overlap
//! 4. invincible targets are skipped before the dedup gate is consulted
//! 5. `mark_hit_if_new` on the attacker's session ledger
//! 6. damage, then stagger (replace), then push
//!
//! Single-shot volumes are spent by their first landed hit.

use std::collections::BTreeMap;

use crate::combat::{FieldEffect, FieldSpec, HitVolume, Push, VolumeLifetime, stepped_advance};
use crate::env::Walkability;
use crate::event::CombatEvent;
use crate::geometry::Vec2;
use crate::ledger::{SegmentId, SessionId};
use crate::state::{Actor, ActorId, Timestamp};

/// One damage application candidate, independent of the shape that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strike {
    pub attacker: ActorId,
    pub segment: SegmentId,
    pub damage: f64,
    pub stagger_ms: u64,
    pub push: Option<Push>,
}

/// Shared step parameters.
pub struct HitEnv<'a, W: Walkability + ?Sized> {
    pub walk: &'a W,
    pub now: Timestamp,
    pub knockback_step: f64,
}

/// A detonating projectile that went off this step.
#[derive(Clone, Debug, PartialEq)]
pub struct Detonated {
    pub owner: ActorId,
    pub session: SessionId,
    pub center: Vec2,
    pub field: FieldSpec,
}

/// Outcome of offering a strike to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrikeOutcome {
    Landed,
    /// Target dead, missing, the attacker itself, or invincible.
    Ineligible,
    /// The (segment, target) pair already produced its hit.
    Duplicate,
}

/// Offers `strike` to `target` after overlap has been established.
pub fn deliver_strike<W: Walkability + ?Sized>(
    actors: &mut BTreeMap<ActorId, Actor>,
    strike: &Strike,
    target: ActorId,
    env: &HitEnv<'_, W>,
    events: &mut Vec<CombatEvent>,
) -> StrikeOutcome {
    if target == strike.attacker {
        return StrikeOutcome::Ineligible;
    }
    match actors.get(&target) {
        Some(t) if t.is_alive() && !t.status.is_invincible(env.now) => {}
        _ => return StrikeOutcome::Ineligible,
    }

    let Some(attacker) = actors.get_mut(&strike.attacker) else {
        return StrikeOutcome::Ineligible;
    };
    if !attacker
        .sessions
        .mark_hit_if_new(strike.segment, target, env.now)
    {
        return StrikeOutcome::Duplicate;
    }
    let origin = attacker.position;

    let Some(victim) = actors.get_mut(&target) else {
        return StrikeOutcome::Ineligible;
    };
    events.push(CombatEvent::HitLanded {
        attacker: strike.attacker,
        target,
        segment: strike.segment,
        damage: strike.damage,
    });
    if strike.damage > 0.0 {
        victim.take_damage(strike.damage, events);
    }
    victim.stagger(env.now, strike.stagger_ms, events);
    if let Some(push) = strike.push {
        let delta = push.displacement(origin, victim.position);
        let to = stepped_advance(
            env.walk,
            victim.position,
            delta,
            victim.radius,
            env.knockback_step,
        );
        victim.relocate(to, events);
    }
    StrikeOutcome::Landed
}

/// Evaluates every live volume against every actor.
///
/// Detonating projectiles never deal damage here: once armed, contact with
/// any living non-owner actor sets them off and they are reported back so the
/// caller can open the field.
pub fn resolve_volumes<W: Walkability + ?Sized>(
    actors: &mut BTreeMap<ActorId, Actor>,
    volumes: &mut [HitVolume],
    env: &HitEnv<'_, W>,
    events: &mut Vec<CombatEvent>,
) -> Vec<Detonated> {
    let ids: Vec<ActorId> = actors.keys().copied().collect();
    let mut detonated = Vec::new();

    for volume in volumes.iter_mut() {
        if volume.spent || volume.is_expired(env.now) {
            continue;
        }
        let samples = volume.shape.samples();
        if samples.is_empty() {
            continue;
        }
        let overlaps = |actor: &Actor| {
            let body = actor.body();
            samples.iter().any(|s| s.overlaps(&body))
        };

        if volume.detonates() {
            let armed = volume.projectile.as_ref().is_some_and(|p| p.is_armed());
            let contact = armed
                && actors
                    .values()
                    .any(|a| a.id != volume.owner && a.is_alive() && overlaps(a));
            if contact {
                if let Some(hit) = detonation_of(volume) {
                    detonated.push(hit);
                }
                volume.spent = true;
            }
            continue;
        }

        let strike = Strike {
            attacker: volume.owner,
            segment: volume.segment,
            damage: volume.damage,
            stagger_ms: volume.stagger_ms,
            push: volume.push,
        };
        for &id in &ids {
            let in_range = actors
                .get(&id)
                .is_some_and(|a| a.id != volume.owner && a.is_alive() && overlaps(a));
            if !in_range {
                continue;
            }
            if deliver_strike(actors, &strike, id, env, events) == StrikeOutcome::Landed
                && volume.lifetime == VolumeLifetime::SingleShot
            {
                volume.spent = true;
                break;
            }
        }
    }
    detonated
}

pub(crate) fn detonation_of(volume: &HitVolume) -> Option<Detonated> {
    let detonation = volume.projectile.as_ref()?.detonation.as_ref()?;
    Some(Detonated {
        owner: volume.owner,
        session: volume.segment.session,
        center: volume.shape.anchor(),
        field: detonation.field.clone(),
    })
}

/// Runs due pulls and damage ticks of every field, then drops expired fields.
pub fn tick_fields<W: Walkability + ?Sized>(
    actors: &mut BTreeMap<ActorId, Actor>,
    fields: &mut Vec<FieldEffect>,
    env: &HitEnv<'_, W>,
    events: &mut Vec<CombatEvent>,
) {
    let ids: Vec<ActorId> = actors.keys().copied().collect();

    for field in fields.iter_mut() {
        while let Some(distance) = field.take_pull(env.now) {
            for &id in &ids {
                let Some(target) = actors.get_mut(&id) else {
                    continue;
                };
                if id == field.owner || !target.is_alive() || !field.contains(target.position) {
                    continue;
                }
                let to_center = field.center - target.position;
                let Some(dir) = to_center.normalized() else {
                    continue;
                };
                let step = distance.min(to_center.length());
                let to = stepped_advance(
                    env.walk,
                    target.position,
                    dir * step,
                    target.radius,
                    env.knockback_step,
                );
                target.relocate(to, events);
            }
        }

        while let Some(segment) = field.take_tick(env.now) {
            let strike = Strike {
                attacker: field.owner,
                segment,
                damage: field.spec.tick_damage,
                stagger_ms: field.spec.stagger_ms,
                push: None,
            };
            for &id in &ids {
                let inside = actors
                    .get(&id)
                    .is_some_and(|t| {
                        id != field.owner && t.is_alive() && field.contains(t.position)
                    });
                if !inside {
                    continue;
                }
                deliver_strike(actors, &strike, id, env, events);
                // The slow lands even on invincible targets.
                if let Some(target) = actors.get_mut(&id) {
                    target
                        .status
                        .apply_slow(field.spec.slow_percent, env.now + field.spec.slow_ms);
                }
            }
        }
    }

    fields.retain(|field| !field.is_expired(env.now));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{PushDirection, VolumeId};
    use crate::env::{OpenField, TileGrid};
    use crate::geometry::{Circle, HitShape};
    use crate::state::{CharacterKey, SlotId};

    fn world() -> (BTreeMap<ActorId, Actor>, SessionId) {
        let mut actors = BTreeMap::new();
        let mut attacker = Actor::new(ActorId(1), CharacterKey::Player3, 30.0, Vec2::ZERO);
        let session = attacker.sessions.begin_session(SlotId::Z, Timestamp(0));
        actors.insert(ActorId(1), attacker);
        actors.insert(
            ActorId(2),
            Actor::new(ActorId(2), CharacterKey::Player2, 25.0, Vec2::new(30.0, 0.0)),
        );
        (actors, session)
    }

    fn env(walk: &OpenField) -> HitEnv<'_, OpenField> {
        HitEnv {
            walk,
            now: Timestamp(10),
            knockback_step: 2.0,
        }
    }

    fn circle_volume(session: SessionId, center: Vec2, radius: f64) -> HitVolume {
        HitVolume::new(
            ActorId(1),
            session.segment(0),
            HitShape::Circle(Circle::new(center, radius)),
            Timestamp(100),
        )
    }

    #[test]
    fn overlapping_samples_of_one_segment_hit_once() {
        let (mut actors, session) = world();
        let walk = OpenField::unbounded();
        let mut volumes: Vec<HitVolume> = (0..5)
            .map(|i| circle_volume(session, Vec2::new(28.0 + i as f64, 0.0), 6.0).with_damage(3.0))
            .collect();
        let mut events = Vec::new();

        resolve_volumes(&mut actors, &mut volumes, &env(&walk), &mut events);

        assert_eq!(actors[&ActorId(2)].hp(), 22.0);
        let hits = events
            .iter()
            .filter(|e| matches!(e, CombatEvent::HitLanded { .. }))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn owner_is_never_hit() {
        let (mut actors, session) = world();
        let walk = OpenField::unbounded();
        let mut volumes = vec![circle_volume(session, Vec2::ZERO, 10.0).with_damage(5.0)];
        let mut events = Vec::new();
        resolve_volumes(&mut actors, &mut volumes, &env(&walk), &mut events);
        assert_eq!(actors[&ActorId(1)].hp(), 30.0);
        assert!(events.is_empty());
    }

    #[test]
    fn invincible_target_is_skipped_before_dedup() {
        let (mut actors, session) = world();
        let walk = OpenField::unbounded();
        if let Some(target) = actors.get_mut(&ActorId(2)) {
            target.status.set_invincible(Timestamp(50));
        }
        let mut volumes = vec![circle_volume(session, Vec2::new(30.0, 0.0), 6.0).with_damage(5.0)];
        let mut events = Vec::new();
        resolve_volumes(&mut actors, &mut volumes, &env(&walk), &mut events);

        assert_eq!(actors[&ActorId(2)].hp(), 25.0);
        assert!(!actors[&ActorId(1)].sessions.was_hit(session.segment(0), ActorId(2)));
    }

    #[test]
    fn zero_damage_volume_still_staggers_once() {
        let (mut actors, session) = world();
        let walk = OpenField::unbounded();
        let mut volumes = vec![circle_volume(session, Vec2::new(30.0, 0.0), 6.0).with_stagger(900)];
        let mut events = Vec::new();
        let env = env(&walk);
        resolve_volumes(&mut actors, &mut volumes, &env, &mut events);
        resolve_volumes(&mut actors, &mut volumes, &env, &mut events);

        let target = &actors[&ActorId(2)];
        assert_eq!(target.hp(), 25.0);
        assert!(target.status.is_staggered(Timestamp(909)));
        let staggers = events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Staggered { .. }))
            .count();
        assert_eq!(staggers, 1);
    }

    #[test]
    fn single_shot_volume_is_spent_after_first_hit() {
        let (mut actors, session) = world();
        actors.insert(
            ActorId(3),
            Actor::new(ActorId(3), CharacterKey::Player1, 30.0, Vec2::new(32.0, 0.0)),
        );
        let walk = OpenField::unbounded();
        let mut volumes = vec![
            circle_volume(session, Vec2::new(31.0, 0.0), 6.0)
                .with_damage(6.0)
                .single_shot(),
        ];
        let mut events = Vec::new();
        resolve_volumes(&mut actors, &mut volumes, &env(&walk), &mut events);

        assert!(volumes[0].is_spent());
        assert_eq!(actors[&ActorId(2)].hp(), 19.0);
        assert_eq!(actors[&ActorId(3)].hp(), 30.0);
    }

    #[test]
    fn push_stops_at_the_wall() {
        let (mut actors, session) = world();
        let grid = TileGrid::from_rows(&["######", "#....#", "######"], 16.0);
        if let Some(a) = actors.get_mut(&ActorId(1)) {
            a.position = Vec2::new(24.0, 24.0);
        }
        if let Some(t) = actors.get_mut(&ActorId(2)) {
            t.position = Vec2::new(40.0, 24.0);
        }
        let mut volumes = vec![
            circle_volume(session, Vec2::new(40.0, 24.0), 6.0)
                .with_push(Push::new(PushDirection::AwayFromOwner, 200.0)),
        ];
        let env = HitEnv {
            walk: &grid,
            now: Timestamp(10),
            knockback_step: 2.0,
        };
        let mut events = Vec::new();
        resolve_volumes(&mut actors, &mut volumes, &env, &mut events);

        let pos = actors[&ActorId(2)].position;
        assert!(pos.x + 6.0 < 80.0, "target pushed into the wall: {pos:?}");
        assert!(pos.x > 68.0);
    }

    #[test]
    fn field_ticks_each_land_and_slow_invincible_targets() {
        let (mut actors, session) = world();
        if let Some(t) = actors.get_mut(&ActorId(2)) {
            t.position = Vec2::new(100.0, 0.0);
        }
        let spec = FieldSpec {
            radius: 20.0,
            duration_ms: 200,
            tick_interval_ms: 50,
            tick_damage: 0.25,
            stagger_ms: 0,
            slow_percent: 0.2,
            slow_ms: 50,
            pull: None,
        };
        let mut fields = vec![FieldEffect::new(
            ActorId(1),
            session,
            Vec2::new(100.0, 0.0),
            spec,
            Timestamp(0),
        )];
        let walk = OpenField::unbounded();
        let mut events = Vec::new();
        for now in [50, 100, 150] {
            let env = HitEnv {
                walk: &walk,
                now: Timestamp(now),
                knockback_step: 2.0,
            };
            tick_fields(&mut actors, &mut fields, &env, &mut events);
        }
        assert!((actors[&ActorId(2)].hp() - 24.25).abs() < 1e-9);

        if let Some(t) = actors.get_mut(&ActorId(2)) {
            t.status.set_invincible(Timestamp(1000));
        }
        let env = HitEnv {
            walk: &walk,
            now: Timestamp(199),
            knockback_step: 2.0,
        };
        // No tick is due at 199; advance to the last one.
        tick_fields(&mut actors, &mut fields, &env, &mut events);
        let env = HitEnv {
            walk: &walk,
            now: Timestamp(200),
            knockback_step: 2.0,
        };
        tick_fields(&mut actors, &mut fields, &env, &mut events);
        assert!(fields.is_empty());

        let mut fields = vec![FieldEffect::new(
            ActorId(1),
            session,
            Vec2::new(100.0, 0.0),
            FieldSpec {
                radius: 20.0,
                duration_ms: 200,
                tick_interval_ms: 50,
                tick_damage: 0.25,
                stagger_ms: 0,
                slow_percent: 0.2,
                slow_ms: 50,
                pull: None,
            },
            Timestamp(300),
        )];
        let env = HitEnv {
            walk: &walk,
            now: Timestamp(350),
            knockback_step: 2.0,
        };
        tick_fields(&mut actors, &mut fields, &env, &mut events);
        let target = &actors[&ActorId(2)];
        assert!((target.hp() - 24.25).abs() < 1e-9);
        assert!((target.status.speed_multiplier(Timestamp(360)) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn armed_projectile_detonates_instead_of_damaging() {
        use crate::combat::{Detonation, Projectile};

        let (mut actors, session) = world();
        let spec = FieldSpec {
            radius: 50.0,
            duration_ms: 3000,
            tick_interval_ms: 50,
            tick_damage: 0.25,
            stagger_ms: 0,
            slow_percent: 0.2,
            slow_ms: 50,
            pull: None,
        };
        let mut projectile = Projectile::new(0.0, 600.0).piercing().detonating(Detonation {
            arm_distance: 120.0,
            detonate_distance: 160.0,
            field: spec,
        });
        let mut volumes = vec![
            circle_volume(session, Vec2::new(30.0, 0.0), 6.0).with_projectile(projectile.clone()),
        ];
        let walk = OpenField::unbounded();
        let mut events = Vec::new();

        // Not armed yet: passes through.
        assert!(resolve_volumes(&mut actors, &mut volumes, &env(&walk), &mut events).is_empty());

        projectile.travelled = 130.0;
        volumes[0].projectile = Some(projectile);
        volumes[0].id = VolumeId(9);
        let blown = resolve_volumes(&mut actors, &mut volumes, &env(&walk), &mut events);
        assert_eq!(blown.len(), 1);
        assert_eq!(blown[0].center, Vec2::new(30.0, 0.0));
        assert!(volumes[0].is_spent());
        assert_eq!(actors[&ActorId(2)].hp(), 25.0);
    }
}
