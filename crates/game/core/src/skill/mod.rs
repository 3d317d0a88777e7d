//! Skills: slot configuration, effect handlers, character kits and the
//! activation gate.
//!
//! A slot maps to a [`SkillBinding`] (immutable [`SkillConfig`] plus an
//! [`EffectHandler`]). Handlers are data, so kits can be loaded from content
//! files and evaluated identically wherever the arena runs.

mod config;
mod context;
mod effects;
mod gate;
mod handler;
mod kit;
mod registry;

pub use config::{AimMode, BindError, SkillConfig};
pub use context::SkillContext;
pub use gate::{Activation, AimSource, RejectReason, try_activate};
pub use handler::{
    Ambush, ArcBurst, Beam, ConeVolley, Dash, DashTrail, EffectHandler, HoldLunge, Stealth, Surge,
    Sweep, VortexShot, WallMode,
};
pub use kit::CharacterKit;
pub use registry::{SkillBinding, SkillRegistry};

pub(crate) use effects::reappear_point;
