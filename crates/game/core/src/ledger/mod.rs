//! Per-actor ledgers: cooldown/charge accounting and attack sessions.

mod cooldown;
mod session;

pub use cooldown::{ChargeState, CooldownLedger};
pub use session::{AttackSessions, SegmentId, SessionId};
