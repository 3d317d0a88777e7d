use std::collections::BTreeSet;

use crate::geometry::Vec2;
use crate::state::SlotId;

/// Latest input of one actor for one step.
///
/// The room keeps one frame per actor and overwrites it on every message, so
/// a step always sees the newest intent and never a queue of stale ones.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputFrame {
    /// Desired direction; only its direction matters.
    pub move_intent: Vec2,
    /// World-space pointer used by mouse-aimed skills.
    pub aim: Option<Vec2>,
    /// Slots currently held down.
    pub held: BTreeSet<SlotId>,
}

impl InputFrame {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(mut self, intent: Vec2) -> Self {
        self.move_intent = intent;
        self
    }

    pub fn aiming(mut self, point: Vec2) -> Self {
        self.aim = Some(point);
        self
    }

    pub fn holding(mut self, slot: SlotId) -> Self {
        self.held.insert(slot);
        self
    }

    /// The same frame with every skill request dropped.
    pub fn without_skills(&self) -> Self {
        Self {
            move_intent: self.move_intent,
            aim: self.aim,
            held: BTreeSet::new(),
        }
    }

    pub fn is_holding(&self, slot: SlotId) -> bool {
        self.held.contains(&slot)
    }
}
