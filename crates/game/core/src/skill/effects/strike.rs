use crate::combat::HitVolume;
use crate::engine::TimedAction;
use crate::env::Walkability;
use crate::geometry::{HitShape, Vec2};
use crate::skill::{Ambush, Beam, SkillContext, Stealth, Sweep};

/// Backtracking step when the spot behind the target is blocked.
const REAPPEAR_BACKTRACK: f64 = 2.0;

/// Vanish next to the nearest target, then strike it from behind.
///
/// Without a target in range only the miss cooldown runs.
pub(super) fn ambush(ctx: &mut SkillContext<'_>, p: &Ambush) {
    let Some((target, target_pos)) = ctx.nearest_target(p.range).map(|t| (t.id, t.position)) else {
        ctx.start_cooldown(p.miss_cooldown_ms);
        return;
    };
    ctx.start_slot_cooldown();
    ctx.lock(p.lock_ms);
    let until = ctx.now + p.vanish_ms;
    if let Some(caster) = ctx.caster_mut() {
        caster.status.set_stealthed(until);
        caster.status.set_invincible(until);
    }
    let segment = ctx.segment(0);
    ctx.schedule(
        p.vanish_ms,
        TimedAction::Reappear {
            target,
            target_pos,
            segment,
            ambush: p.clone(),
        },
    );
}

/// Free spot just past `target_pos`, seen from `from`.
///
/// The ideal spot is `max(8, target_radius + self_radius + 2)` beyond the
/// target; blocked spots are walked back toward the target two units at a
/// time. `None` when every candidate is blocked.
pub(crate) fn reappear_point<W: Walkability + ?Sized>(
    walk: &W,
    from: Vec2,
    target_pos: Vec2,
    target_radius: f64,
    self_radius: f64,
    fallback_dir: Vec2,
) -> Option<Vec2> {
    let dir = (target_pos - from).normalized().unwrap_or(fallback_dir);
    let offset = (target_radius + self_radius + 2.0).max(8.0);
    let mut back = 0.0;
    while back <= offset {
        let candidate = target_pos + dir * (offset - back);
        if walk.is_walkable(candidate, self_radius) {
            return Some(candidate);
        }
        back += REAPPEAR_BACKTRACK;
    }
    None
}

/// Pre-cast lock; recoil and the beam itself follow after `precast_ms`.
pub(super) fn beam(ctx: &mut SkillContext<'_>, p: &Beam) {
    ctx.start_slot_cooldown();
    ctx.lock(p.precast_ms);
    let segment = ctx.segment(0);
    let angle = ctx.aim_angle;
    ctx.schedule(
        p.precast_ms,
        TimedAction::FireBeam {
            segment,
            angle,
            beam: p.clone(),
        },
    );
}

pub(super) fn sweep(ctx: &mut SkillContext<'_>, p: &Sweep) {
    ctx.start_slot_cooldown();
    ctx.lock(p.lock_ms);
    let segment = ctx.segment(0);
    let shape = HitShape::Arc {
        center: ctx.origin,
        radius: p.radius,
        base_angle: ctx.aim_angle,
        sweep: p.sweep,
        rings: p.rings,
        dots_per_ring: p.dots_per_ring,
        dot_radius: p.dot_radius,
    };
    let volume = HitVolume::new(ctx.caster, segment, shape, ctx.now + p.life_ms)
        .with_damage(p.damage)
        .with_stagger(p.stagger_ms);
    ctx.spawn_volume(volume);
    ctx.end_session_after(p.session_end_ms.max(p.life_ms));
}

pub(super) fn stealth(ctx: &mut SkillContext<'_>, p: &Stealth) {
    ctx.start_slot_cooldown();
    let until = ctx.now + p.duration_ms;
    if let Some(caster) = ctx.caster_mut() {
        caster.status.set_stealthed(until);
        caster.status.set_invincible(until);
        caster.status.apply_haste(p.haste, until);
    }
    ctx.end_session_after(p.duration_ms);
}
