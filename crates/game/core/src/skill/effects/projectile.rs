use crate::combat::{Detonation, HitVolume, Projectile};
use crate::engine::TimedAction;
use crate::geometry::{Circle, HitShape, Vec2};
use crate::skill::{ArcBurst, ConeVolley, SkillContext, VortexShot};

/// Evenly spread single-shot projectiles, one segment each.
pub(super) fn cone_volley(ctx: &mut SkillContext<'_>, p: &ConeVolley) {
    ctx.start_slot_cooldown();
    let (start, step) = if p.count > 1 {
        (ctx.aim_angle - p.spread / 2.0, p.spread / f64::from(p.count - 1))
    } else {
        (ctx.aim_angle, 0.0)
    };
    for i in 0..p.count {
        let angle = start + step * f64::from(i);
        let segment = ctx.segment(i);
        let volume = HitVolume::new(
            ctx.caster,
            segment,
            HitShape::Circle(Circle::new(ctx.origin, p.radius)),
            ctx.now + p.life_ms,
        )
        .with_damage(p.damage)
        .with_stagger(p.stagger_ms)
        .with_projectile(Projectile::new(angle, p.speed))
        .single_shot();
        ctx.spawn_volume(volume);
    }
    ctx.end_session_after(p.life_ms);
}

/// Piercing shot that becomes a field; the field's end closes the session.
pub(super) fn vortex_shot(ctx: &mut SkillContext<'_>, p: &VortexShot) {
    ctx.start_slot_cooldown();
    let flight_ms = (p.detonate_distance / p.speed * 1000.0).ceil() as u64;
    let projectile = Projectile::new(ctx.aim_angle, p.speed)
        .piercing()
        .detonating(Detonation {
            arm_distance: p.arm_distance,
            detonate_distance: p.detonate_distance,
            field: p.field.clone(),
        });
    let segment = ctx.segment(0);
    let volume = HitVolume::new(
        ctx.caster,
        segment,
        HitShape::Circle(Circle::new(ctx.origin, p.radius)),
        ctx.now + flight_ms * 2 + 1,
    )
    .with_projectile(projectile);
    ctx.spawn_volume(volume);
}

/// Shots leave every `interval_ms` toward a point clamped to `max_range`.
/// Each explosion lands on its own segment.
pub(super) fn arc_burst(ctx: &mut SkillContext<'_>, p: &ArcBurst) {
    ctx.start_slot_cooldown();
    let aimed = ctx
        .aim_point
        .map(|point| point - ctx.origin)
        .unwrap_or_else(|| Vec2::from_angle(ctx.aim_angle) * p.max_range);
    let offset = match aimed.normalized() {
        Some(dir) if aimed.length() > p.max_range => dir * p.max_range,
        _ => aimed,
    };
    for i in 0..p.shots {
        let segment = ctx.segment(i);
        ctx.schedule(
            u64::from(i) * p.interval_ms,
            TimedAction::ArcShot {
                segment,
                offset,
                burst: p.clone(),
                last: i + 1 == p.shots,
            },
        );
    }
    if p.shots == 0 {
        ctx.end_session_after(0);
    }
}
