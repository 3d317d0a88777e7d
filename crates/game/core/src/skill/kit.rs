//! Character kits: a stat block plus one skill per slot.
//!
//! A kit replaces per-character subclasses. The four built-in characters are
//! available through [`CharacterKit::builtin`]; content files may override any
//! of their numbers.

use std::f64::consts::PI;

use crate::combat::{FieldSpec, Pull};
use crate::config::CombatConfig;
use crate::skill::{
    Ambush, ArcBurst, BindError, Beam, ConeVolley, Dash, DashTrail, EffectHandler, HoldLunge,
    SkillBinding, SkillConfig, Stealth, Surge, Sweep, VortexShot, WallMode,
};
use crate::state::{CharacterKey, SlotId};

/// Stat block and slot bindings of a character.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterKit {
    pub key: CharacterKey,
    pub max_hp: f64,
    pub base_speed: f64,
    pub radius: f64,
    pub slots: Vec<SkillBinding>,
}

impl CharacterKit {
    /// Each slot may be bound once and every binding must validate.
    pub fn validate(&self) -> Result<(), BindError> {
        let mut seen = Vec::with_capacity(CombatConfig::MAX_SLOTS);
        for binding in &self.slots {
            let slot = binding.slot();
            if seen.contains(&slot) {
                return Err(BindError::DuplicateSlot { slot });
            }
            seen.push(slot);
            binding.config.validate()?;
            binding.handler.validate(slot)?;
        }
        Ok(())
    }

    pub fn binding(&self, slot: SlotId) -> Option<&SkillBinding> {
        self.slots.iter().find(|b| b.slot() == slot)
    }

    pub fn binding_mut(&mut self, slot: SlotId) -> Option<&mut SkillBinding> {
        self.slots.iter_mut().find(|b| b.slot() == slot)
    }

    pub fn builtin(key: CharacterKey) -> Self {
        match key {
            CharacterKey::Player1 => vortex(),
            CharacterKey::Player2 => lancer(),
            CharacterKey::Player3 => reaper(),
            CharacterKey::Player4 => shade(),
        }
    }
}

const PROJECTILE_RADIUS: f64 = 8.0;

fn kit(key: CharacterKey, max_hp: f64, base_speed: f64, slots: Vec<SkillBinding>) -> CharacterKit {
    CharacterKit {
        key,
        max_hp,
        base_speed,
        radius: CombatConfig::DEFAULT_RADIUS,
        slots,
    }
}

fn volley(damage: f64) -> EffectHandler {
    EffectHandler::ConeVolley(ConeVolley {
        count: 5,
        spread: 30.0_f64.to_radians(),
        speed: 500.0,
        life_ms: 1200,
        damage,
        stagger_ms: 0,
        radius: PROJECTILE_RADIUS,
    })
}

fn vortex() -> CharacterKit {
    kit(
        CharacterKey::Player1,
        30.0,
        150.0,
        vec![
            SkillBinding::new(SkillConfig::new(SlotId::Z, 1500).mouse_aim(), volley(6.6)),
            SkillBinding::new(
                SkillConfig::new(SlotId::X, 4000)
                    .mouse_aim()
                    .with_aim_lock(150)
                    .requiring_target_within(90.0),
                EffectHandler::Ambush(Ambush {
                    range: 90.0,
                    miss_cooldown_ms: 4000,
                    lock_ms: 350,
                    vanish_ms: 300,
                    damage: 3.6,
                    stagger_ms: 1000,
                }),
            ),
            SkillBinding::new(
                SkillConfig::new(SlotId::C, 2500).mouse_aim(),
                EffectHandler::VortexShot(VortexShot {
                    speed: 600.0,
                    radius: PROJECTILE_RADIUS,
                    arm_distance: 120.0,
                    detonate_distance: 160.0,
                    field: FieldSpec {
                        radius: FieldSpec::radius_for_square(80.0),
                        duration_ms: 3000,
                        tick_interval_ms: 50,
                        tick_damage: 0.25,
                        stagger_ms: 0,
                        slow_percent: 0.2,
                        slow_ms: 50,
                        pull: Some(Pull {
                            distance: 4.0,
                            interval_ms: 60,
                        }),
                    },
                }),
            ),
        ],
    )
}

fn lancer() -> CharacterKit {
    kit(
        CharacterKey::Player2,
        25.0,
        180.0,
        vec![
            SkillBinding::new(
                SkillConfig::new(SlotId::Z, 3000).mouse_aim(),
                EffectHandler::ArcBurst(ArcBurst {
                    shots: 4,
                    interval_ms: 500,
                    max_range: 90.0,
                    travel_ms: 350,
                    radius: 30.0,
                    damage: 8.0,
                    stagger_ms: 300,
                    push: 20.0,
                }),
            ),
            SkillBinding::new(
                SkillConfig::new(SlotId::X, 0)
                    .with_charges(3, 3000, 500)
                    .mouse_aim()
                    .with_aim_lock(120),
                EffectHandler::Dash(Dash {
                    distance: 80.0,
                    speed: 1000.0,
                    wall: WallMode::BlockLanding,
                    invincible: true,
                    trail: None,
                }),
            ),
            SkillBinding::new(
                SkillConfig::new(SlotId::C, 2000).mouse_aim().with_aim_lock(60),
                EffectHandler::Beam(Beam {
                    precast_ms: 130,
                    recoil: 20.0,
                    thickness: 30.0,
                    duration_ms: 300,
                    max_length: 600.0,
                    damage: 29.0,
                    stagger_ms: 0,
                }),
            ),
        ],
    )
}

fn reaper() -> CharacterKit {
    kit(
        CharacterKey::Player3,
        30.0,
        150.0,
        vec![
            SkillBinding::new(
                SkillConfig::new(SlotId::Z, 400).mouse_aim().with_aim_lock(120),
                EffectHandler::Sweep(Sweep {
                    radius: 48.0,
                    rings: 3,
                    dots_per_ring: 10,
                    dot_radius: 6.0,
                    sweep: PI,
                    life_ms: 50,
                    damage: 3.0,
                    stagger_ms: 100,
                    lock_ms: 50,
                    session_end_ms: 110,
                }),
            ),
            SkillBinding::new(
                SkillConfig::new(SlotId::X, 4000).mouse_aim().with_aim_lock(150),
                EffectHandler::Dash(Dash {
                    distance: 100.0,
                    speed: 900.0,
                    wall: WallMode::BlockLanding,
                    invincible: false,
                    trail: Some(DashTrail {
                        damage: 5.0,
                        stagger_ms: 100,
                        radius: CombatConfig::DEFAULT_RADIUS,
                        linger_ms: 200,
                    }),
                }),
            ),
            SkillBinding::new(SkillConfig::new(SlotId::C, 1500).mouse_aim(), volley(6.0)),
        ],
    )
}

fn shade() -> CharacterKit {
    kit(
        CharacterKey::Player4,
        30.0,
        150.0,
        vec![
            SkillBinding::new(
                SkillConfig::new(SlotId::Z, 6000).mouse_aim().with_aim_lock(80),
                EffectHandler::Surge(Surge {
                    start_multiplier: 0.7,
                    max_multiplier: 5.0,
                    accel_step: 0.1,
                    accel_interval_ms: 250,
                    turn_limit: 15.0_f64.to_radians(),
                    turn_interval_ms: 200,
                    min_damage: 3.0,
                    max_damage: 50.0,
                    stun_ms: 1200,
                    knockback: 50.0,
                    self_bump: 20.0,
                    wall_radius: 42.0,
                    wall_stun_ms: 900,
                    wall_knockback: 70.0,
                    wall_self_bump: 14.0,
                }),
            ),
            SkillBinding::new(
                SkillConfig::new(SlotId::X, 4000).mouse_aim().without_auto_hold(),
                EffectHandler::HoldLunge(HoldLunge {
                    max_hold_ms: 3000,
                    min_length: 10.0,
                    max_length: 200.0,
                    grow_ms: 2000,
                    speed: 900.0,
                    stun_ms: 900,
                    ticks: 3,
                    tick_damage: 4.0,
                    tick_interval_ms: 200,
                }),
            ),
            SkillBinding::new(
                SkillConfig::new(SlotId::C, 6000).without_auto_hold(),
                EffectHandler::Stealth(Stealth {
                    duration_ms: 1500,
                    haste: 1.5,
                }),
            ),
        ],
    )
}
