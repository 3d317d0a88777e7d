use crate::engine::{DashMotion, HoldMotion, Motion, SurgeMotion, dash_reach};
use crate::geometry::Vec2;
use crate::skill::{Dash, HoldLunge, SkillContext, Surge};
use crate::state::UNTIL_CLEARED;

/// Centre probes of a dash are a third of a tile apart.
const DASH_PROBES_PER_TILE: f64 = 3.0;

pub(super) fn dash(ctx: &mut SkillContext<'_>, p: &Dash) {
    ctx.start_slot_cooldown();
    let dir = Vec2::from_angle(ctx.aim_angle);
    let step = ctx.arena().config().tile_size / DASH_PROBES_PER_TILE;
    let distance = dash_reach(ctx.walk(), ctx.origin, dir, p.distance, step, p.wall);
    if p.invincible {
        if let Some(caster) = ctx.caster_mut() {
            caster.status.set_invincible(UNTIL_CLEARED);
        }
    }
    let session = ctx.session();
    ctx.begin_motion(Motion::Dash(DashMotion {
        session,
        start: ctx.origin,
        dir,
        distance,
        travelled: 0.0,
        speed: p.speed,
        invincible: p.invincible,
        trail: p.trail,
        trail_volume: None,
    }));
}

/// Starts the hold phase; the cooldown runs from the release.
pub(super) fn hold_lunge(ctx: &mut SkillContext<'_>, p: &HoldLunge) {
    let session = ctx.session();
    ctx.begin_motion(Motion::Hold(HoldMotion {
        session,
        slot: ctx.slot,
        started_at: ctx.now,
        angle: ctx.aim_angle,
        params: p.clone(),
    }));
}

/// Starts the surge; the cooldown runs once it rams something.
pub(super) fn surge(ctx: &mut SkillContext<'_>, p: &Surge) {
    let session = ctx.session();
    ctx.begin_motion(Motion::Surge(SurgeMotion {
        session,
        slot: ctx.slot,
        angle: ctx.aim_angle,
        multiplier: p.start_multiplier,
        next_accel_at: ctx.now + p.accel_interval_ms,
        next_turn_at: ctx.now,
        params: p.clone(),
    }));
}
