use std::f64::consts::{FRAC_PI_4, PI};
use std::fmt;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::geometry::Vec2;

/// Stable identifier for a combatant in a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Simulation time in milliseconds since the room started.
///
/// All deadlines (cooldowns, stagger, volume expiry, session ends) are
/// expressed in this clock and checked once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl std::ops::AddAssign<u64> for Timestamp {
    fn add_assign(&mut self, rhs: u64) {
        self.0 = self.0.saturating_add(rhs);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A skill button an actor can bind one skill to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotId {
    Z,
    X,
    C,
}

impl SlotId {
    pub const ALL: [SlotId; 3] = [SlotId::Z, SlotId::X, SlotId::C];
}

/// One of eight compass directions in screen space (+y points down).
///
/// Declaration order follows increasing angle starting at "right", so the
/// discriminant times π/4 is the canonical heading.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[strum(serialize_all = "kebab-case")]
pub enum Facing {
    Right,
    DownRight,
    #[default]
    Down,
    DownLeft,
    Left,
    UpLeft,
    Up,
    UpRight,
}

impl Facing {
    pub const ALL: [Facing; 8] = [
        Facing::Right,
        Facing::DownRight,
        Facing::Down,
        Facing::DownLeft,
        Facing::Left,
        Facing::UpLeft,
        Facing::Up,
        Facing::UpRight,
    ];

    /// Snaps an angle in radians to the nearest of the eight directions.
    pub fn from_angle(angle: f64) -> Self {
        if !angle.is_finite() {
            return Facing::default();
        }
        let idx = (angle / FRAC_PI_4).round() as i64;
        Self::ALL[idx.rem_euclid(8) as usize]
    }

    /// Snaps a direction vector; a zero vector yields `None`.
    pub fn from_vector(v: Vec2) -> Option<Self> {
        if v.x == 0.0 && v.y == 0.0 {
            return None;
        }
        Some(Self::from_angle(v.y.atan2(v.x)))
    }

    /// Canonical heading in radians within `(-π, π]`.
    pub fn angle(self) -> f64 {
        let raw = (self as u8) as f64 * FRAC_PI_4;
        if raw > PI { raw - 2.0 * PI } else { raw }
    }
}

/// Built-in playable characters.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "lowercase")]
pub enum CharacterKey {
    #[default]
    Player1,
    Player2,
    Player3,
    Player4,
}

impl CharacterKey {
    pub const ALL: [CharacterKey; 4] = [
        CharacterKey::Player1,
        CharacterKey::Player2,
        CharacterKey::Player3,
        CharacterKey::Player4,
    ];
}
