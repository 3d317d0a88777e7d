use crate::geometry::Vec2;
use crate::ledger::{SegmentId, SessionId};
use crate::state::{ActorId, Timestamp};

/// Periodic pull toward the field centre.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pull {
    pub distance: f64,
    pub interval_ms: u64,
}

/// Parameters of a persistent area effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldSpec {
    pub radius: f64,
    pub duration_ms: u64,
    pub tick_interval_ms: u64,
    pub tick_damage: f64,
    pub stagger_ms: u64,
    pub slow_percent: f64,
    pub slow_ms: u64,
    pub pull: Option<Pull>,
}

impl FieldSpec {
    /// Hit radius of a square field of side `side`, trimmed to 90% of its
    /// circumscribed circle.
    pub fn radius_for_square(side: f64) -> f64 {
        std::f64::consts::SQRT_2 * (side / 2.0) * 0.9
    }
}

/// A live field. Each damage tick uses a fresh segment of the session, so
/// every tick can land once per target.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldEffect {
    pub owner: ActorId,
    pub session: SessionId,
    pub center: Vec2,
    pub spec: FieldSpec,
    pub expires_at: Timestamp,
    pub(crate) next_tick_at: Timestamp,
    pub(crate) next_pull_at: Option<Timestamp>,
    pub(crate) tick_index: u32,
}

impl FieldEffect {
    pub fn new(
        owner: ActorId,
        session: SessionId,
        center: Vec2,
        spec: FieldSpec,
        now: Timestamp,
    ) -> Self {
        let next_tick_at = now + spec.tick_interval_ms.max(1);
        let next_pull_at = spec.pull.map(|pull| now + pull.interval_ms.max(1));
        Self {
            owner,
            session,
            center,
            expires_at: now + spec.duration_ms,
            spec,
            next_tick_at,
            next_pull_at,
            tick_index: 0,
        }
    }

    /// Point-in-field test on the target's centre.
    pub fn contains(&self, point: Vec2) -> bool {
        self.spec.radius > 0.0 && self.center.distance(point) <= self.spec.radius
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn tick_index(&self) -> u32 {
        self.tick_index
    }

    /// Advances to the next damage tick if it is due and returns its segment.
    pub(crate) fn take_tick(&mut self, now: Timestamp) -> Option<SegmentId> {
        if now < self.next_tick_at || self.is_expired(now) {
            return None;
        }
        self.tick_index += 1;
        self.next_tick_at = self.next_tick_at + self.spec.tick_interval_ms.max(1);
        Some(self.session.segment(self.tick_index))
    }

    /// Returns the pull distance if a pull is due.
    pub(crate) fn take_pull(&mut self, now: Timestamp) -> Option<f64> {
        let pull = self.spec.pull?;
        let due = self.next_pull_at?;
        if now < due || self.is_expired(now) {
            return None;
        }
        self.next_pull_at = Some(due + pull.interval_ms.max(1));
        Some(pull.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SlotId;

    fn field() -> FieldEffect {
        let session = SessionId {
            actor: ActorId(1),
            slot: SlotId::C,
            sequence: 1,
        };
        let spec = FieldSpec {
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
        };
        FieldEffect::new(ActorId(1), session, Vec2::ZERO, spec, Timestamp(1000))
    }

    #[test]
    fn ticks_start_at_one_and_use_distinct_segments() {
        let mut f = field();
        assert_eq!(f.take_tick(Timestamp(1049)), None);
        let first = f.take_tick(Timestamp(1050)).unwrap();
        let second = f.take_tick(Timestamp(1100)).unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(second.index, 2);
        assert_eq!(f.take_tick(Timestamp(4000)), None);
    }

    #[test]
    fn square_side_maps_to_trimmed_radius() {
        let f = field();
        assert!((f.spec.radius - 50.911).abs() < 1e-3);
        assert!(f.contains(Vec2::new(50.0, 0.0)));
        assert!(!f.contains(Vec2::new(52.0, 0.0)));
    }

    #[test]
    fn pull_runs_on_its_own_interval() {
        let mut f = field();
        assert_eq!(f.take_pull(Timestamp(1059)), None);
        assert_eq!(f.take_pull(Timestamp(1060)), Some(4.0));
        assert_eq!(f.take_pull(Timestamp(1100)), None);
        assert_eq!(f.take_pull(Timestamp(1120)), Some(4.0));
    }
}
