//! Deadline-ordered follow-up actions of skills.
//!
//! Delayed explosions, reappear strikes, beam fire and session ends are all
//! deadlines checked once per step. Entries due at the same time run in the
//! order they were scheduled.

use std::collections::BTreeMap;

use crate::combat::{HitVolume, Strike};
use crate::geometry::Vec2;
use crate::ledger::{SegmentId, SessionId};
use crate::skill::{Ambush, ArcBurst, Beam};
use crate::state::{ActorId, Timestamp};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TimedAction {
    /// Throws one arc-burst shot from the caster's current position.
    ArcShot {
        segment: SegmentId,
        offset: Vec2,
        burst: ArcBurst,
        /// The final shot also closes the session once its explosion is gone.
        last: bool,
    },
    /// Spawns a volume that lives `life_ms` from the moment it appears.
    /// With `ends_session` the session closes once the volume has expired.
    SpawnVolume {
        volume: HitVolume,
        life_ms: u64,
        ends_session: bool,
    },
    /// Ends an ambush vanish next to the snapshotted target position.
    Reappear {
        target: ActorId,
        target_pos: Vec2,
        segment: SegmentId,
        ambush: Ambush,
    },
    /// Recoil, then the beam itself.
    FireBeam {
        segment: SegmentId,
        angle: f64,
        beam: Beam,
    },
    /// A strike aimed at one target with no overlap test.
    Strike { target: ActorId, strike: Strike },
    EndSession(SessionId),
}

impl TimedAction {
    pub(crate) fn session(&self) -> SessionId {
        match self {
            Self::ArcShot { segment, .. }
            | Self::Reappear { segment, .. }
            | Self::FireBeam { segment, .. } => segment.session,
            Self::SpawnVolume { volume, .. } => volume.segment.session,
            Self::Strike { strike, .. } => strike.segment.session,
            Self::EndSession(session) => *session,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Scheduled {
    pub owner: ActorId,
    pub action: TimedAction,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Timeline {
    entries: BTreeMap<(Timestamp, u64), Scheduled>,
    next_seq: u64,
}

impl Timeline {
    pub(crate) fn schedule(&mut self, at: Timestamp, owner: ActorId, action: TimedAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert((at, seq), Scheduled { owner, action });
    }

    /// Removes and returns the earliest entry due at or before `now`.
    pub(crate) fn pop_due(&mut self, now: Timestamp) -> Option<(Timestamp, Scheduled)> {
        let (&(at, seq), _) = self.entries.first_key_value()?;
        if at > now {
            return None;
        }
        self.entries.remove(&(at, seq)).map(|entry| (at, entry))
    }

    /// Drops every pending action of `owner`.
    pub(crate) fn cancel_owner(&mut self, owner: ActorId) {
        self.entries.retain(|_, entry| entry.owner != owner);
    }

    /// Whether any pending action other than its own end still uses `session`.
    pub(crate) fn references(&self, session: SessionId) -> bool {
        self.entries.values().any(|entry| {
            !matches!(entry.action, TimedAction::EndSession(_)) && entry.action.session() == session
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SlotId;

    fn session(sequence: u32) -> SessionId {
        SessionId {
            actor: ActorId(1),
            slot: SlotId::Z,
            sequence,
        }
    }

    #[test]
    fn same_deadline_runs_in_schedule_order() {
        let mut timeline = Timeline::default();
        timeline.schedule(Timestamp(10), ActorId(1), TimedAction::EndSession(session(2)));
        timeline.schedule(Timestamp(5), ActorId(1), TimedAction::EndSession(session(1)));
        timeline.schedule(Timestamp(10), ActorId(1), TimedAction::EndSession(session(3)));

        assert!(timeline.pop_due(Timestamp(4)).is_none());
        let order: Vec<u32> = std::iter::from_fn(|| timeline.pop_due(Timestamp(10)))
            .map(|(_, entry)| entry.action.session().sequence)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn cancel_drops_only_that_owner() {
        let mut timeline = Timeline::default();
        timeline.schedule(Timestamp(10), ActorId(1), TimedAction::EndSession(session(1)));
        timeline.schedule(Timestamp(10), ActorId(2), TimedAction::EndSession(session(1)));
        timeline.cancel_owner(ActorId(1));
        assert_eq!(timeline.len(), 1);
    }
}
