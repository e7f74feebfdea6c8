//! Timed Events
//!
//! Deadline tracking for work that must happen at a known future time:
//! an aura running out, a cooldown finishing, a tooltip expiring. The
//! [`TimerSet`] is built for hosts that poll it every frame while nothing
//! is due.

mod deadline;

pub use deadline::{Expired, TimerId, TimerSet, TimerStats};
