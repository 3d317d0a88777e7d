//! Immutable per-slot skill configuration and bind-time validation.

use crate::error::{ErrorSeverity, GameError};
use crate::state::SlotId;

/// How a skill picks its direction at activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AimMode {
    /// Locked aim if any, else the actor's facing.
    #[default]
    Facing,
    /// Toward the last known pointer position.
    MouseAim,
}

/// Configuration bound to one slot. Never changes once bound.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkillConfig {
    pub slot: SlotId,
    pub cooldown_ms: u64,
    pub charged: bool,
    pub max_charges: u32,
    pub recharge_ms: u64,
    /// Short gate between uses of a charged slot.
    pub use_cooldown_ms: u64,
    pub aim_mode: AimMode,
    pub aim_lock_ms: u64,
    /// Retry activation every tick while the slot is held.
    pub auto_hold: bool,
    /// Radius that must contain a living target; 0 disables the check.
    pub require_target_in_range: f64,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            slot: SlotId::Z,
            cooldown_ms: 0,
            charged: false,
            max_charges: 0,
            recharge_ms: 0,
            use_cooldown_ms: 0,
            aim_mode: AimMode::Facing,
            aim_lock_ms: 0,
            auto_hold: true,
            require_target_in_range: 0.0,
        }
    }
}

impl SkillConfig {
    /// A plain cooldown skill on `slot`.
    pub fn new(slot: SlotId, cooldown_ms: u64) -> Self {
        Self {
            slot,
            cooldown_ms,
            ..Self::default()
        }
    }

    /// Turns the slot into a charge stack.
    pub fn with_charges(
        mut self,
        max_charges: u32,
        recharge_ms: u64,
        use_cooldown_ms: u64,
    ) -> Self {
        self.charged = true;
        self.max_charges = max_charges;
        self.recharge_ms = recharge_ms;
        self.use_cooldown_ms = use_cooldown_ms;
        self
    }

    pub fn mouse_aim(mut self) -> Self {
        self.aim_mode = AimMode::MouseAim;
        self
    }

    pub fn with_aim_lock(mut self, aim_lock_ms: u64) -> Self {
        self.aim_lock_ms = aim_lock_ms;
        self
    }

    pub fn without_auto_hold(mut self) -> Self {
        self.auto_hold = false;
        self
    }

    pub fn requiring_target_within(mut self, range: f64) -> Self {
        self.require_target_in_range = range;
        self
    }

    /// Rejects configurations that could never activate correctly.
    pub fn validate(&self) -> Result<(), BindError> {
        if self.charged {
            if self.max_charges == 0 {
                return Err(BindError::ZeroCharges { slot: self.slot });
            }
            if self.recharge_ms == 0 {
                return Err(BindError::ZeroRecharge { slot: self.slot });
            }
        }
        let range = self.require_target_in_range;
        if !range.is_finite() || range < 0.0 {
            return Err(BindError::InvalidRange {
                slot: self.slot,
                range,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Bind errors
// ============================================================================

/// Malformed skill configuration, reported when the skill is bound.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("slot {slot}: charged skill needs at least one charge")]
    ZeroCharges { slot: SlotId },

    #[error("slot {slot}: charged skill needs a non-zero recharge interval")]
    ZeroRecharge { slot: SlotId },

    #[error("slot {slot}: target range {range} must be finite and non-negative")]
    InvalidRange { slot: SlotId, range: f64 },

    #[error("slot {slot}: {reason}")]
    InvalidHandler { slot: SlotId, reason: &'static str },

    #[error("kit binds slot {slot} more than once")]
    DuplicateSlot { slot: SlotId },
}

impl GameError for BindError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroCharges { .. } => "BIND_ZERO_CHARGES",
            Self::ZeroRecharge { .. } => "BIND_ZERO_RECHARGE",
            Self::InvalidRange { .. } => "BIND_INVALID_RANGE",
            Self::InvalidHandler { .. } => "BIND_INVALID_HANDLER",
            Self::DuplicateSlot { .. } => "BIND_DUPLICATE_SLOT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charged_slot_needs_charges_and_recharge() {
        let cfg = SkillConfig::new(SlotId::X, 0).with_charges(0, 3000, 500);
        assert_eq!(cfg.validate(), Err(BindError::ZeroCharges { slot: SlotId::X }));

        let cfg = SkillConfig::new(SlotId::X, 0).with_charges(3, 0, 500);
        assert_eq!(cfg.validate(), Err(BindError::ZeroRecharge { slot: SlotId::X }));

        let cfg = SkillConfig::new(SlotId::X, 0).with_charges(3, 3000, 500);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn negative_or_nan_range_is_rejected() {
        let cfg = SkillConfig::new(SlotId::X, 4000).requiring_target_within(-1.0);
        assert!(matches!(cfg.validate(), Err(BindError::InvalidRange { .. })));
        let cfg = SkillConfig::new(SlotId::X, 4000).requiring_target_within(f64::NAN);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bind_errors_are_validation_errors() {
        let err = BindError::ZeroCharges { slot: SlotId::Z };
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.error_code(), "BIND_ZERO_CHARGES");
    }
}
