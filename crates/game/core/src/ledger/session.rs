//! Attack session bookkeeping and the hit dedup gate.
//!
//! One skill activation opens one session. Hit volumes of the activation are
//! tagged with a [`SegmentId`] (session plus segment index), and a target can
//! be hit at most once per segment. Dedup records are bucketed per session so
//! ending a session drops the whole bucket at once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, warn};

use crate::state::{ActorId, SlotId, Timestamp};

/// One activation of one slot by one actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionId {
    pub actor: ActorId,
    pub slot: SlotId,
    pub sequence: u32,
}

impl SessionId {
    pub fn segment(self, index: u32) -> SegmentId {
        SegmentId {
            session: self,
            index,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.slot, self.sequence, self.actor.0)
    }
}

/// Sub-unit of a session with its own hit-once guarantee per target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentId {
    pub session: SessionId,
    pub index: u32,
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-seg{}", self.session, self.index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct SessionHits {
    opened_at: Timestamp,
    landed: BTreeSet<(u32, ActorId)>,
}

impl SessionHits {
    fn new(opened_at: Timestamp) -> Self {
        Self {
            opened_at,
            landed: BTreeSet::new(),
        }
    }
}

/// Session counters and dedup records of one attacker.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackSessions {
    owner: ActorId,
    sequences: BTreeMap<SlotId, u32>,
    current: BTreeMap<SlotId, SessionId>,
    hits: BTreeMap<SessionId, SessionHits>,
}

impl AttackSessions {
    pub fn new(owner: ActorId) -> Self {
        Self {
            owner,
            sequences: BTreeMap::new(),
            current: BTreeMap::new(),
            hits: BTreeMap::new(),
        }
    }

    fn next_session(&mut self, slot: SlotId) -> SessionId {
        let seq = self.sequences.entry(slot).or_insert(0);
        *seq += 1;
        SessionId {
            actor: self.owner,
            slot,
            sequence: *seq,
        }
    }

    /// Opens a new session for `slot` and makes it current.
    ///
    /// The previous session of the slot is superseded but its records stay
    /// until it is ended or evicted, so its volumes still in flight keep
    /// their dedup guarantee.
    pub fn begin_session(&mut self, slot: SlotId, now: Timestamp) -> SessionId {
        let id = self.next_session(slot);
        self.current.insert(slot, id);
        self.hits.insert(id, SessionHits::new(now));
        id
    }

    pub fn current(&self, slot: SlotId) -> Option<SessionId> {
        self.current.get(&slot).copied()
    }

    /// Segment `index` of the slot's current session.
    ///
    /// Without a current session a unique throwaway session is allocated.
    /// That path only exists as a fallback and is logged.
    pub fn segment_id(&mut self, slot: SlotId, index: u32, now: Timestamp) -> SegmentId {
        if let Some(session) = self.current(slot) {
            return session.segment(index);
        }
        let adhoc = self.next_session(slot);
        warn!(
            actor = %self.owner,
            slot = %slot,
            session = %adhoc,
            "segment requested without an open session; using ad-hoc session"
        );
        self.hits.insert(adhoc, SessionHits::new(now));
        adhoc.segment(index)
    }

    /// Records the (segment, target) pair; `true` only the first time.
    pub fn mark_hit_if_new(&mut self, segment: SegmentId, target: ActorId, now: Timestamp) -> bool {
        self.hits
            .entry(segment.session)
            .or_insert_with(|| SessionHits::new(now))
            .landed
            .insert((segment.index, target))
    }

    /// Whether the pair was already recorded.
    pub fn was_hit(&self, segment: SegmentId, target: ActorId) -> bool {
        self.hits
            .get(&segment.session)
            .is_some_and(|bucket| bucket.landed.contains(&(segment.index, target)))
    }

    /// Ends the slot's current session and drops its records.
    pub fn end_session(&mut self, slot: SlotId) -> Option<SessionId> {
        let id = self.current.remove(&slot)?;
        self.hits.remove(&id);
        Some(id)
    }

    /// Ends a specific session. The slot's current session is cleared only
    /// when it is this one; a newer activation keeps its own session.
    pub fn end(&mut self, session: SessionId) -> bool {
        if self.current.get(&session.slot) == Some(&session) {
            self.current.remove(&session.slot);
        }
        self.hits.remove(&session).is_some()
    }

    /// Drops sessions opened at least `ttl_ms` ago that `is_live` no longer
    /// references. Returns the evicted ids.
    pub fn evict_stale(
        &mut self,
        now: Timestamp,
        ttl_ms: u64,
        is_live: impl Fn(&SessionId) -> bool,
    ) -> Vec<SessionId> {
        let stale: Vec<SessionId> = self
            .hits
            .iter()
            .filter(|(id, bucket)| {
                now.saturating_since(bucket.opened_at) >= ttl_ms && !is_live(*id)
            })
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.hits.remove(id);
            if self.current.get(&id.slot) == Some(id) {
                self.current.remove(&id.slot);
            }
            debug!(session = %id, "evicted stale attack session");
        }
        stale
    }

    /// Number of sessions holding dedup records.
    pub fn tracked_sessions(&self) -> usize {
        self.hits.len()
    }

    /// Total recorded (segment, target) pairs.
    pub fn processed_hits(&self) -> usize {
        self.hits.values().map(|bucket| bucket.landed.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> AttackSessions {
        AttackSessions::new(ActorId(7))
    }

    #[test]
    fn sequences_increase_per_slot() {
        let mut s = sessions();
        let a = s.begin_session(SlotId::Z, Timestamp(0));
        let b = s.begin_session(SlotId::Z, Timestamp(5));
        let c = s.begin_session(SlotId::X, Timestamp(5));
        assert_eq!((a.sequence, b.sequence, c.sequence), (1, 2, 1));
        assert_eq!(s.current(SlotId::Z), Some(b));
        assert_eq!(a.segment(0).to_string(), "Z-1-7-seg0");
    }

    #[test]
    fn mark_hit_if_new_is_true_exactly_once() {
        let mut s = sessions();
        let seg = s.begin_session(SlotId::Z, Timestamp(0)).segment(0);
        let hits = (0..10)
            .filter(|_| s.mark_hit_if_new(seg, ActorId(2), Timestamp(1)))
            .count();
        assert_eq!(hits, 1);
        // Other segments and targets are independent.
        assert!(s.mark_hit_if_new(seg, ActorId(3), Timestamp(1)));
        assert!(s.mark_hit_if_new(seg.session.segment(1), ActorId(2), Timestamp(1)));
    }

    #[test]
    fn end_session_drops_only_that_sessions_records() {
        let mut s = sessions();
        let old = s.begin_session(SlotId::Z, Timestamp(0));
        s.mark_hit_if_new(old.segment(0), ActorId(2), Timestamp(0));
        let other = s.begin_session(SlotId::X, Timestamp(0));
        s.mark_hit_if_new(other.segment(0), ActorId(2), Timestamp(0));

        assert_eq!(s.end_session(SlotId::Z), Some(old));
        assert_eq!(s.current(SlotId::Z), None);
        assert!(!s.was_hit(old.segment(0), ActorId(2)));
        assert!(s.was_hit(other.segment(0), ActorId(2)));
        assert_eq!(s.processed_hits(), 1);
    }

    #[test]
    fn ending_a_superseded_session_keeps_the_new_one_current() {
        let mut s = sessions();
        let first = s.begin_session(SlotId::Z, Timestamp(0));
        let second = s.begin_session(SlotId::Z, Timestamp(10));
        assert!(s.end(first));
        assert_eq!(s.current(SlotId::Z), Some(second));
        assert_eq!(s.tracked_sessions(), 1);
    }

    #[test]
    fn segment_without_session_is_unique() {
        let mut s = sessions();
        let a = s.segment_id(SlotId::C, 0, Timestamp(0));
        let b = s.segment_id(SlotId::C, 0, Timestamp(0));
        assert_ne!(a, b);
        assert_eq!(s.current(SlotId::C), None);
    }

    #[test]
    fn stale_sessions_are_evicted_unless_live() {
        let mut s = sessions();
        let old = s.begin_session(SlotId::Z, Timestamp(0));
        let live = s.begin_session(SlotId::X, Timestamp(0));
        let fresh = s.begin_session(SlotId::C, Timestamp(9_000));

        let evicted = s.evict_stale(Timestamp(10_000), 10_000, |id| *id == live);
        assert_eq!(evicted, vec![old]);
        assert_eq!(s.current(SlotId::Z), None);
        assert_eq!(s.current(SlotId::X), Some(live));
        assert_eq!(s.current(SlotId::C), Some(fresh));
    }
}
