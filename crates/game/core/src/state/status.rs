//! Timed actor states.
//!
//! Every state is a deadline compared against simulation time, so all
//! transitions happen inside the room tick. Skill lock and stagger only clear
//! by expiry. Invincibility and stealth may also be held "until cleared" by
//! the skill that granted them (a dash clears its own invincibility when it
//! lands).
//!
//! # State Summary
//!
//! - **SkillLocked**: entered on activation of skills with a lock duration
//! - **Staggered**: entered on hits with `stagger_ms > 0`; re-entry replaces the timer
//! - **Invincible**: orthogonal, skips all damage in hit resolution
//! - **Stealthed**: orthogonal, visibility hint for presentation

use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::config::CombatConfig;
use crate::state::Timestamp;

bitflags! {
    /// Derived view of the timed states active at one instant.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ActorFlags: u8 {
        const SKILL_LOCKED = 1 << 0;
        const STAGGERED    = 1 << 1;
        const INVINCIBLE   = 1 << 2;
        const STEALTHED    = 1 << 3;
    }
}

impl ActorFlags {
    /// States that reject movement and skill input.
    pub const INPUT_BLOCKING: Self = Self::SKILL_LOCKED.union(Self::STAGGERED);
}

/// A movement slow; only the strongest active slow applies.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slow {
    pub multiplier: f64,
    pub until: Timestamp,
}

/// A movement speed boost.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Haste {
    pub multiplier: f64,
    pub until: Timestamp,
}

/// Aim frozen at a snapshotted angle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AimLock {
    pub angle: f64,
    pub until: Timestamp,
}

/// Deadline-driven status of one actor.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorStatus {
    locked_until: Option<Timestamp>,
    lock_held: bool,
    staggered_until: Option<Timestamp>,
    invincible_until: Option<Timestamp>,
    stealthed_until: Option<Timestamp>,
    aim_lock: Option<AimLock>,
    haste: Option<Haste>,
    slows: ArrayVec<Slow, { CombatConfig::MAX_SLOWS }>,
}

/// Deadline used for states held until explicitly cleared.
pub const UNTIL_CLEARED: Timestamp = Timestamp(u64::MAX);

fn active(deadline: Option<Timestamp>, now: Timestamp) -> bool {
    deadline.is_some_and(|until| now < until)
}

impl ActorStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self, now: Timestamp) -> ActorFlags {
        let mut flags = ActorFlags::empty();
        flags.set(ActorFlags::SKILL_LOCKED, self.is_locked(now));
        flags.set(ActorFlags::STAGGERED, self.is_staggered(now));
        flags.set(ActorFlags::INVINCIBLE, self.is_invincible(now));
        flags.set(ActorFlags::STEALTHED, self.is_stealthed(now));
        flags
    }

    // ========================================================================
    // Skill lock
    // ========================================================================

    pub fn is_locked(&self, now: Timestamp) -> bool {
        self.lock_held || active(self.locked_until, now)
    }

    /// Locks skills and movement for `duration_ms`. A longer running lock is kept.
    pub fn lock_for(&mut self, now: Timestamp, duration_ms: u64) {
        if duration_ms == 0 {
            return;
        }
        let until = now + duration_ms;
        self.locked_until = Some(self.locked_until.map_or(until, |prev| prev.max(until)));
    }

    pub fn locked_until(&self) -> Option<Timestamp> {
        self.locked_until
    }

    /// Holds the lock for the length of a motion. Timed locks are unaffected
    /// by the matching [`Self::release_lock_hold`].
    pub fn hold_lock(&mut self) {
        self.lock_held = true;
    }

    pub fn release_lock_hold(&mut self) {
        self.lock_held = false;
    }

    // ========================================================================
    // Stagger
    // ========================================================================

    pub fn is_staggered(&self, now: Timestamp) -> bool {
        active(self.staggered_until, now)
    }

    /// Enters stagger for exactly `duration_ms` from `now`, replacing any
    /// remaining stagger time.
    pub fn stagger_for(&mut self, now: Timestamp, duration_ms: u64) -> Option<Timestamp> {
        if duration_ms == 0 {
            return None;
        }
        let until = now + duration_ms;
        self.staggered_until = Some(until);
        Some(until)
    }

    pub fn stagger_remaining(&self, now: Timestamp) -> u64 {
        self.staggered_until
            .map_or(0, |until| until.saturating_since(now))
    }

    // ========================================================================
    // Invincibility / stealth
    // ========================================================================

    pub fn is_invincible(&self, now: Timestamp) -> bool {
        active(self.invincible_until, now)
    }

    /// Grants invincibility until `until` (use [`UNTIL_CLEARED`] for open-ended).
    pub fn set_invincible(&mut self, until: Timestamp) {
        self.invincible_until = Some(self.invincible_until.map_or(until, |prev| prev.max(until)));
    }

    pub fn clear_invincible(&mut self) {
        self.invincible_until = None;
    }

    pub fn is_stealthed(&self, now: Timestamp) -> bool {
        active(self.stealthed_until, now)
    }

    pub fn set_stealthed(&mut self, until: Timestamp) {
        self.stealthed_until = Some(self.stealthed_until.map_or(until, |prev| prev.max(until)));
    }

    pub fn clear_stealthed(&mut self) {
        self.stealthed_until = None;
    }

    // ========================================================================
    // Aim lock
    // ========================================================================

    pub fn locked_aim(&self, now: Timestamp) -> Option<f64> {
        self.aim_lock
            .filter(|lock| now < lock.until)
            .map(|lock| lock.angle)
    }

    pub fn lock_aim(&mut self, angle: f64, until: Timestamp) {
        self.aim_lock = Some(AimLock { angle, until });
    }

    // ========================================================================
    // Speed modifiers
    // ========================================================================

    /// Applies a slow of `percent` (0.0..=1.0) until `until`.
    ///
    /// When the list is full the slow expiring first is replaced, provided the
    /// new one outlasts it.
    pub fn apply_slow(&mut self, percent: f64, until: Timestamp) {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let slow = Slow {
            multiplier: (1.0 - percent).max(0.0),
            until,
        };
        if !self.slows.is_full() {
            self.slows.push(slow);
            return;
        }
        if let Some(earliest) = self.slows.iter_mut().min_by_key(|s| s.until) {
            if earliest.until < until {
                *earliest = slow;
            }
        }
    }

    pub fn apply_haste(&mut self, multiplier: f64, until: Timestamp) {
        if multiplier.is_finite() && multiplier > 0.0 {
            self.haste = Some(Haste { multiplier, until });
        }
    }

    /// Strongest active slow times any active haste; never negative.
    pub fn speed_multiplier(&self, now: Timestamp) -> f64 {
        let slow = self
            .slows
            .iter()
            .filter(|s| now < s.until)
            .map(|s| s.multiplier)
            .fold(1.0_f64, f64::min);
        let haste = self
            .haste
            .filter(|h| now < h.until)
            .map_or(1.0, |h| h.multiplier);
        (slow * haste).max(0.0)
    }

    // ========================================================================
    // Expiry
    // ========================================================================

    /// Drops every deadline that has passed.
    pub fn expire(&mut self, now: Timestamp) {
        for deadline in [
            &mut self.locked_until,
            &mut self.staggered_until,
            &mut self.invincible_until,
            &mut self.stealthed_until,
        ] {
            if deadline.is_some_and(|until| now >= until) {
                *deadline = None;
            }
        }
        if self.aim_lock.is_some_and(|lock| now >= lock.until) {
            self.aim_lock = None;
        }
        if self.haste.is_some_and(|h| now >= h.until) {
            self.haste = None;
        }
        self.slows.retain(|s| now < s.until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_stagger_replaces_remaining_time() {
        let mut status = ActorStatus::new();
        status.stagger_for(Timestamp(0), 1000);
        // 600ms remain at t=400; a 300ms stagger leaves exactly 300.
        status.stagger_for(Timestamp(400), 300);
        assert_eq!(status.stagger_remaining(Timestamp(400)), 300);
        assert!(status.is_staggered(Timestamp(699)));
        assert!(!status.is_staggered(Timestamp(700)));
    }

    #[test]
    fn zero_duration_stagger_is_ignored() {
        let mut status = ActorStatus::new();
        assert_eq!(status.stagger_for(Timestamp(5), 0), None);
        assert!(!status.is_staggered(Timestamp(5)));
    }

    #[test]
    fn strongest_slow_wins() {
        let mut status = ActorStatus::new();
        status.apply_slow(0.2, Timestamp(100));
        status.apply_slow(0.5, Timestamp(50));
        assert_eq!(status.speed_multiplier(Timestamp(10)), 0.5);
        assert!((status.speed_multiplier(Timestamp(60)) - 0.8).abs() < 1e-12);
        assert_eq!(status.speed_multiplier(Timestamp(100)), 1.0);
    }

    #[test]
    fn slow_percent_is_clamped() {
        let mut status = ActorStatus::new();
        status.apply_slow(3.0, Timestamp(100));
        assert_eq!(status.speed_multiplier(Timestamp(0)), 0.0);
    }

    #[test]
    fn haste_multiplies_with_slow() {
        let mut status = ActorStatus::new();
        status.apply_haste(1.5, Timestamp(100));
        status.apply_slow(0.5, Timestamp(100));
        assert_eq!(status.speed_multiplier(Timestamp(0)), 0.75);
    }

    #[test]
    fn flags_reflect_active_deadlines() {
        let mut status = ActorStatus::new();
        status.lock_for(Timestamp(0), 50);
        status.set_invincible(UNTIL_CLEARED);
        let flags = status.flags(Timestamp(10));
        assert!(flags.contains(ActorFlags::SKILL_LOCKED | ActorFlags::INVINCIBLE));
        assert!(flags.intersects(ActorFlags::INPUT_BLOCKING));

        status.expire(Timestamp(50));
        status.clear_invincible();
        assert_eq!(status.flags(Timestamp(50)), ActorFlags::empty());
    }

    #[test]
    fn aim_lock_expires() {
        let mut status = ActorStatus::new();
        status.lock_aim(1.0, Timestamp(120));
        assert_eq!(status.locked_aim(Timestamp(119)), Some(1.0));
        assert_eq!(status.locked_aim(Timestamp(120)), None);
    }

    #[test]
    fn lock_hold_outlives_timed_lock_until_released() {
        let mut status = ActorStatus::new();
        status.hold_lock();
        status.lock_for(Timestamp(0), 50);
        status.expire(Timestamp(60));
        assert!(status.is_locked(Timestamp(60)));
        status.release_lock_hold();
        assert!(!status.is_locked(Timestamp(60)));
    }
}
