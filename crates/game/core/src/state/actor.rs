use crate::event::CombatEvent;
use crate::geometry::{Circle, Vec2};
use crate::ledger::{AttackSessions, CooldownLedger};
use crate::skill::{BindError, CharacterKit, EffectHandler, SkillConfig, SkillRegistry};
use crate::state::{ActorFlags, ActorId, ActorStatus, CharacterKey, Facing, Timestamp};

/// Health pool. `0 <= hp <= max_hp` always holds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vitals {
    hp: f64,
    max_hp: f64,
}

impl Vitals {
    pub fn new(max_hp: f64) -> Self {
        let max_hp = if max_hp.is_finite() { max_hp.max(0.0) } else { 0.0 };
        Self { hp: max_hp, max_hp }
    }

    pub fn hp(&self) -> f64 {
        self.hp
    }

    pub fn max_hp(&self) -> f64 {
        self.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Subtracts `amount` (clamped at zero hp) and returns the hp removed.
    pub fn apply_damage(&mut self, amount: f64) -> f64 {
        if !(amount > 0.0) || !amount.is_finite() {
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp - amount).max(0.0);
        before - self.hp
    }

    pub fn restore_full(&mut self) {
        self.hp = self.max_hp;
    }
}

/// A combatant owned by the room simulation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    pub id: ActorId,
    pub character: CharacterKey,
    pub vitals: Vitals,
    pub position: Vec2,
    pub facing: Facing,
    pub radius: f64,
    pub base_speed: f64,
    pub status: ActorStatus,
    pub cooldowns: CooldownLedger,
    pub sessions: AttackSessions,
    pub skills: SkillRegistry,
}

impl Actor {
    /// Creates an actor with no skills bound.
    pub fn new(id: ActorId, character: CharacterKey, max_hp: f64, position: Vec2) -> Self {
        Self {
            id,
            character,
            vitals: Vitals::new(max_hp),
            position,
            facing: Facing::default(),
            radius: crate::config::CombatConfig::DEFAULT_RADIUS,
            base_speed: crate::config::CombatConfig::DEFAULT_SPEED,
            status: ActorStatus::new(),
            cooldowns: CooldownLedger::new(id),
            sessions: AttackSessions::new(id),
            skills: SkillRegistry::new(),
        }
    }

    /// Creates an actor from a character kit, binding all three slots.
    pub fn from_kit(id: ActorId, kit: &CharacterKit, position: Vec2) -> Result<Self, BindError> {
        kit.validate()?;
        let mut actor = Self::new(id, kit.key, kit.max_hp, position);
        actor.radius = kit.radius;
        actor.base_speed = kit.base_speed;
        for binding in &kit.slots {
            actor.bind_skill(binding.config.clone(), binding.handler.clone())?;
        }
        Ok(actor)
    }

    /// Validates and binds a skill. Charged slots start with a full stack.
    pub fn bind_skill(
        &mut self,
        config: SkillConfig,
        handler: EffectHandler,
    ) -> Result<(), BindError> {
        let slot = config.slot;
        let charged = config.charged.then_some((config.max_charges, config.recharge_ms));
        self.skills.bind(config, handler)?;
        if let Some((max, recharge_ms)) = charged {
            self.cooldowns.register_charges(slot, max, recharge_ms);
        }
        Ok(())
    }

    pub fn hp(&self) -> f64 {
        self.vitals.hp()
    }

    pub fn max_hp(&self) -> f64 {
        self.vitals.max_hp()
    }

    pub fn is_alive(&self) -> bool {
        self.vitals.is_alive()
    }

    pub fn body(&self) -> Circle {
        Circle::new(self.position, self.radius)
    }

    pub fn flags(&self, now: Timestamp) -> ActorFlags {
        self.status.flags(now)
    }

    /// Movement and skill input are rejected while locked or staggered.
    pub fn accepts_input(&self, now: Timestamp) -> bool {
        !self.flags(now).intersects(ActorFlags::INPUT_BLOCKING)
    }

    pub fn speed(&self, now: Timestamp) -> f64 {
        self.base_speed * self.status.speed_multiplier(now)
    }

    /// Heading used by facing-aimed skills: the locked aim if any, else facing.
    pub fn facing_aim(&self, now: Timestamp) -> f64 {
        self.status
            .locked_aim(now)
            .unwrap_or_else(|| self.facing.angle())
    }

    /// Applies damage and pushes the resulting hp/death events.
    pub fn take_damage(&mut self, amount: f64, events: &mut Vec<CombatEvent>) -> f64 {
        let was_alive = self.is_alive();
        let applied = self.vitals.apply_damage(amount);
        events.push(CombatEvent::HpChanged {
            actor: self.id,
            hp: self.hp(),
            max_hp: self.max_hp(),
        });
        if was_alive && !self.is_alive() {
            events.push(CombatEvent::Died { actor: self.id });
        }
        applied
    }

    /// Enters stagger for `duration_ms`, replacing any remaining stagger.
    pub fn stagger(&mut self, now: Timestamp, duration_ms: u64, events: &mut Vec<CombatEvent>) {
        if let Some(until) = self.status.stagger_for(now, duration_ms) {
            events.push(CombatEvent::Staggered {
                actor: self.id,
                until,
            });
        }
    }

    /// Moves to `to`, reporting the displacement when it is non-zero.
    pub fn relocate(&mut self, to: Vec2, events: &mut Vec<CombatEvent>) {
        if to != self.position {
            events.push(CombatEvent::Displaced {
                actor: self.id,
                from: self.position,
                to,
            });
            self.position = to;
        }
    }
}
