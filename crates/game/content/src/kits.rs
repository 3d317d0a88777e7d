//! Character kit catalog and per-character overrides.
//!
//! The catalog starts from the built-in characters; content files only name
//! what they change. A slot listed in an override replaces the built-in
//! binding of that slot wholesale.

use std::collections::BTreeMap;

use arena_core::{BindError, CharacterKey, CharacterKit, SkillBinding};

/// Partial kit for one character.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KitOverride {
    pub key: CharacterKey,
    pub max_hp: Option<f64>,
    pub base_speed: Option<f64>,
    pub radius: Option<f64>,
    pub slots: Vec<SkillBinding>,
}

impl KitOverride {
    /// Applies the override on top of `kit`.
    pub fn apply(&self, kit: &mut CharacterKit) {
        if let Some(max_hp) = self.max_hp {
            kit.max_hp = max_hp;
        }
        if let Some(base_speed) = self.base_speed {
            kit.base_speed = base_speed;
        }
        if let Some(radius) = self.radius {
            kit.radius = radius;
        }
        for binding in &self.slots {
            match kit.binding_mut(binding.slot()) {
                Some(existing) => *existing = binding.clone(),
                None => kit.slots.push(binding.clone()),
            }
        }
    }
}

/// Every playable kit, keyed by character.
#[derive(Clone, Debug, PartialEq)]
pub struct KitCatalog {
    kits: BTreeMap<CharacterKey, CharacterKit>,
}

impl KitCatalog {
    /// The four built-in characters.
    pub fn builtin() -> Self {
        let kits = CharacterKey::ALL
            .into_iter()
            .map(|key| (key, CharacterKit::builtin(key)))
            .collect();
        Self { kits }
    }

    /// Built-in kits with `overrides` applied in order, each result validated.
    pub fn with_overrides(overrides: &[KitOverride]) -> Result<Self, BindError> {
        let mut catalog = Self::builtin();
        for entry in overrides {
            if let Some(kit) = catalog.kits.get_mut(&entry.key) {
                entry.apply(kit);
            }
        }
        for kit in catalog.kits.values() {
            kit.validate()?;
        }
        Ok(catalog)
    }

    pub fn get(&self, key: CharacterKey) -> Option<&CharacterKit> {
        self.kits.get(&key)
    }

    pub fn into_map(self) -> BTreeMap<CharacterKey, CharacterKit> {
        self.kits
    }
}

impl Default for KitCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
