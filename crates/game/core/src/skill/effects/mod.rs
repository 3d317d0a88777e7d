//! What each handler does when its slot activates.
//!
//! Handlers only describe the activation: they spawn volumes, schedule
//! follow-ups and start motions through [`SkillContext`]. Everything that
//! happens later runs inside the arena step.

mod movement;
mod projectile;
mod strike;

use crate::skill::{EffectHandler, SkillContext};

impl EffectHandler {
    /// Runs the handler for one successful activation.
    pub fn fire(&self, ctx: &mut SkillContext<'_>) {
        match self {
            Self::ConeVolley(p) => projectile::cone_volley(ctx, p),
            Self::VortexShot(p) => projectile::vortex_shot(ctx, p),
            Self::ArcBurst(p) => projectile::arc_burst(ctx, p),
            Self::Ambush(p) => strike::ambush(ctx, p),
            Self::Beam(p) => strike::beam(ctx, p),
            Self::Sweep(p) => strike::sweep(ctx, p),
            Self::Stealth(p) => strike::stealth(ctx, p),
            Self::Dash(p) => movement::dash(ctx, p),
            Self::HoldLunge(p) => movement::hold_lunge(ctx, p),
            Self::Surge(p) => movement::surge(ctx, p),
        }
    }
}

pub(crate) use strike::reappear_point;
