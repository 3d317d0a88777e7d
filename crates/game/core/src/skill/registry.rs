use std::collections::BTreeMap;

use crate::skill::{BindError, EffectHandler, SkillConfig};
use crate::state::SlotId;

/// A slot's configuration paired with its behaviour.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillBinding {
    pub config: SkillConfig,
    pub handler: EffectHandler,
}

impl SkillBinding {
    pub fn new(config: SkillConfig, handler: EffectHandler) -> Self {
        Self { config, handler }
    }

    pub fn slot(&self) -> SlotId {
        self.config.slot
    }
}

/// Slot to skill mapping of one actor.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillRegistry {
    slots: BTreeMap<SlotId, SkillBinding>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores the binding, replacing any previous one.
    pub fn bind(&mut self, config: SkillConfig, handler: EffectHandler) -> Result<(), BindError> {
        config.validate()?;
        handler.validate(config.slot)?;
        self.slots
            .insert(config.slot, SkillBinding::new(config, handler));
        Ok(())
    }

    pub fn get(&self, slot: SlotId) -> Option<&SkillBinding> {
        self.slots.get(&slot)
    }

    pub fn is_bound(&self, slot: SlotId) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillBinding> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::Stealth;

    #[test]
    fn invalid_config_is_not_stored() {
        let mut registry = SkillRegistry::new();
        let handler = EffectHandler::Stealth(Stealth {
            duration_ms: 1500,
            haste: 1.5,
        });
        let bad = SkillConfig::new(SlotId::C, 6000).with_charges(0, 1000, 0);
        assert!(registry.bind(bad, handler.clone()).is_err());
        assert!(!registry.is_bound(SlotId::C));

        registry
            .bind(SkillConfig::new(SlotId::C, 6000), handler)
            .unwrap();
        assert_eq!(registry.get(SlotId::C).map(|b| b.config.cooldown_ms), Some(6000));
    }
}
