//! Per-actor cooldown and charge accounting.

use std::collections::BTreeMap;

use crate::event::CombatEvent;
use crate::state::{ActorId, SlotId, Timestamp};

/// Charge stack of a charged slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargeState {
    pub charges: u32,
    pub max_charges: u32,
    pub recharge_ms: u64,
    /// `None` while the stack is full.
    pub next_recharge_at: Option<Timestamp>,
}

impl ChargeState {
    /// A full stack.
    pub fn full(max_charges: u32, recharge_ms: u64) -> Self {
        Self {
            charges: max_charges,
            max_charges,
            recharge_ms,
            next_recharge_at: None,
        }
    }
}

/// Cooldown deadlines and charge stacks of one actor.
///
/// Starting a cooldown always overwrites the previous deadline; there is no
/// additive stacking.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownLedger {
    owner: ActorId,
    ends_at: BTreeMap<SlotId, Timestamp>,
    durations: BTreeMap<SlotId, u64>,
    charges: BTreeMap<SlotId, ChargeState>,
}

impl CooldownLedger {
    pub fn new(owner: ActorId) -> Self {
        Self {
            owner,
            ends_at: BTreeMap::new(),
            durations: BTreeMap::new(),
            charges: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    // ========================================================================
    // Cooldowns
    // ========================================================================

    /// Sets the slot's cooldown to end at `now + duration_ms`.
    pub fn start_cooldown(
        &mut self,
        slot: SlotId,
        duration_ms: u64,
        now: Timestamp,
        events: &mut Vec<CombatEvent>,
    ) -> Timestamp {
        let ends_at = now + duration_ms;
        self.ends_at.insert(slot, ends_at);
        self.durations.insert(slot, duration_ms);
        events.push(CombatEvent::CooldownStarted {
            actor: self.owner,
            slot,
            ends_at,
            duration_ms,
        });
        ends_at
    }

    pub fn is_off_cooldown(&self, slot: SlotId, now: Timestamp) -> bool {
        now >= self.ends_at.get(&slot).copied().unwrap_or(Timestamp::ZERO)
    }

    pub fn cooldown_ends_at(&self, slot: SlotId) -> Option<Timestamp> {
        self.ends_at.get(&slot).copied()
    }

    /// Duration of the most recently started cooldown of the slot.
    pub fn cooldown_duration(&self, slot: SlotId) -> Option<u64> {
        self.durations.get(&slot).copied()
    }

    pub fn cooldown_remaining(&self, slot: SlotId, now: Timestamp) -> u64 {
        self.ends_at
            .get(&slot)
            .map_or(0, |ends_at| ends_at.saturating_since(now))
    }

    // ========================================================================
    // Charges
    // ========================================================================

    /// Registers a charged slot with a full stack.
    pub fn register_charges(&mut self, slot: SlotId, max_charges: u32, recharge_ms: u64) {
        self.charges
            .insert(slot, ChargeState::full(max_charges, recharge_ms));
    }

    pub fn charges(&self, slot: SlotId) -> Option<&ChargeState> {
        self.charges.get(&slot)
    }

    /// Consumes one charge if any is left.
    ///
    /// A recharge is scheduled only when none is already running, so an
    /// in-flight recharge is never pushed back by further uses.
    pub fn try_consume_charge(
        &mut self,
        slot: SlotId,
        now: Timestamp,
        events: &mut Vec<CombatEvent>,
    ) -> bool {
        let Some(state) = self.charges.get_mut(&slot) else {
            return false;
        };
        if state.charges == 0 {
            return false;
        }
        state.charges -= 1;
        if state.charges < state.max_charges && state.next_recharge_at.is_none() {
            state.next_recharge_at = Some(now + state.recharge_ms);
        }
        events.push(charge_event(self.owner, slot, state));
        true
    }

    /// Restores one charge once the scheduled recharge is due.
    pub fn advance_recharge(
        &mut self,
        slot: SlotId,
        now: Timestamp,
        events: &mut Vec<CombatEvent>,
    ) {
        let Some(state) = self.charges.get_mut(&slot) else {
            return;
        };
        if state.charges >= state.max_charges {
            state.next_recharge_at = None;
            return;
        }
        let due = match state.next_recharge_at {
            Some(due) => due,
            None => {
                state.next_recharge_at = Some(now + state.recharge_ms);
                return;
            }
        };
        if now < due {
            return;
        }
        let recharge_ms = state.recharge_ms;
        state.charges = (state.charges + 1).min(state.max_charges);
        state.next_recharge_at = (state.charges < state.max_charges).then(|| now + recharge_ms);
        events.push(charge_event(self.owner, slot, state));
    }

    /// Runs [`Self::advance_recharge`] for every charged slot.
    pub fn advance_all(&mut self, now: Timestamp, events: &mut Vec<CombatEvent>) {
        let slots: Vec<SlotId> = self.charges.keys().copied().collect();
        for slot in slots {
            self.advance_recharge(slot, now, events);
        }
    }
}

fn charge_event(owner: ActorId, slot: SlotId, state: &ChargeState) -> CombatEvent {
    CombatEvent::ChargesChanged {
        actor: owner,
        slot,
        charges: state.charges,
        max_charges: state.max_charges,
        next_recharge_at: state.next_recharge_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> CooldownLedger {
        CooldownLedger::new(ActorId(1))
    }

    #[test]
    fn cooldown_is_monotonic_over_its_window() {
        let mut ledger = ledger();
        let mut events = Vec::new();
        ledger.start_cooldown(SlotId::Z, 400, Timestamp(1000), &mut events);

        for t in 1000..1400 {
            assert!(!ledger.is_off_cooldown(SlotId::Z, Timestamp(t)), "t={t}");
        }
        for t in 1400..1500 {
            assert!(ledger.is_off_cooldown(SlotId::Z, Timestamp(t)), "t={t}");
        }
        assert_eq!(
            events,
            vec![CombatEvent::CooldownStarted {
                actor: ActorId(1),
                slot: SlotId::Z,
                ends_at: Timestamp(1400),
                duration_ms: 400,
            }]
        );
    }

    #[test]
    fn restarting_a_cooldown_overwrites_it() {
        let mut ledger = ledger();
        let mut events = Vec::new();
        ledger.start_cooldown(SlotId::X, 4000, Timestamp(0), &mut events);
        ledger.start_cooldown(SlotId::X, 500, Timestamp(100), &mut events);
        assert_eq!(ledger.cooldown_ends_at(SlotId::X), Some(Timestamp(600)));
        assert_eq!(ledger.cooldown_duration(SlotId::X), Some(500));
    }

    #[test]
    fn unknown_slot_is_off_cooldown() {
        assert!(ledger().is_off_cooldown(SlotId::C, Timestamp::ZERO));
    }

    #[test]
    fn charges_deplete_and_reject_at_zero() {
        let mut ledger = ledger();
        let mut events = Vec::new();
        ledger.register_charges(SlotId::X, 3, 3000);

        for _ in 0..3 {
            assert!(ledger.try_consume_charge(SlotId::X, Timestamp(10), &mut events));
        }
        assert!(!ledger.try_consume_charge(SlotId::X, Timestamp(10), &mut events));

        let state = ledger.charges(SlotId::X).copied().unwrap();
        assert_eq!(state.charges, 0);
        // Scheduled by the first use and never pushed back.
        assert_eq!(state.next_recharge_at, Some(Timestamp(3010)));
    }

    #[test]
    fn recharge_restores_one_charge_and_reschedules_below_max() {
        let mut ledger = ledger();
        let mut events = Vec::new();
        ledger.register_charges(SlotId::X, 3, 3000);
        ledger.try_consume_charge(SlotId::X, Timestamp(0), &mut events);
        ledger.try_consume_charge(SlotId::X, Timestamp(0), &mut events);

        ledger.advance_recharge(SlotId::X, Timestamp(2999), &mut events);
        assert_eq!(ledger.charges(SlotId::X).unwrap().charges, 1);

        ledger.advance_recharge(SlotId::X, Timestamp(3000), &mut events);
        let state = *ledger.charges(SlotId::X).unwrap();
        assert_eq!(state.charges, 2);
        assert_eq!(state.next_recharge_at, Some(Timestamp(6000)));

        ledger.advance_recharge(SlotId::X, Timestamp(6000), &mut events);
        let state = *ledger.charges(SlotId::X).unwrap();
        assert_eq!(state.charges, 3);
        assert_eq!(state.next_recharge_at, None);

        // Full stacks never exceed the maximum.
        ledger.advance_recharge(SlotId::X, Timestamp(99_000), &mut events);
        assert_eq!(ledger.charges(SlotId::X).unwrap().charges, 3);
    }
}
