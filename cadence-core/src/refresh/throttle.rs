//! Throttle Gate
//!
//! A throttle gate limits how often an expensive operation may run, based on
//! elapsed time rather than on how often it is asked.
//!
//! # How the Gate Works
//!
//! 1. The first call to [`ThrottleGate::should_run`] always succeeds and
//!    schedules the next boundary at `now + interval`.
//!
//! 2. Later calls succeed only once `now` has reached that boundary.
//!
//! 3. A successful call moves the boundary to `now + interval`, measured from
//!    the current time rather than the stale boundary. When ticks are skipped
//!    (a stalled frame, a hidden window) the gate does not try to "catch up"
//!    with a burst of runs.
//!
//! # Boundary Tolerance
//!
//! Boundaries are kept in floating-point seconds, and an interval such as
//! 0.1 s is not exact in binary. A tick that lands on a boundary up to a
//! millionth of the interval early still counts as reaching it, so rounding
//! error never pushes a run to the following frame.
//!
//! # Time Regression
//!
//! Callers are expected to pass non-decreasing times. If a smaller time does
//! arrive, the gate clamps it to the largest time already observed, so the
//! boundary never moves backward.

use std::time::Duration;

use tracing::trace;

use crate::config::ThrottleConfig;

/// Fraction of the interval by which a tick may precede the boundary and
/// still be permitted.
const BOUNDARY_SLACK: f64 = 1e-6;

/// Time-based gate owned by the element whose work it throttles.
///
/// Times are seconds on the host's monotonic clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleGate {
    /// Minimum seconds between permitted runs. Zero means unthrottled.
    interval: f64,

    /// Earliest time at which the next run is permitted.
    /// `None` until the gate has run once.
    next_allowed: Option<f64>,

    /// Largest time observed so far, used to clamp regressions.
    latest: Option<f64>,
}

impl ThrottleGate {
    /// Create a gate that permits at most one run per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f64(),
            next_allowed: None,
            latest: None,
        }
    }

    /// Create a gate that never throttles.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Create a gate from host configuration.
    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.interval())
    }

    /// Decide whether the throttled operation may run at `now`.
    ///
    /// Returns `true` on the first call, and afterwards whenever `now` has
    /// reached the scheduled boundary. A `true` result schedules the next
    /// boundary at `now + interval`.
    pub fn should_run(&mut self, now: f64) -> bool {
        debug_assert!(now.is_finite(), "ThrottleGate driven with non-finite time {now}");

        let now = match self.latest {
            Some(latest) if now < latest => {
                trace!(now, latest, "time regression clamped");
                latest
            }
            _ => now,
        };
        self.latest = Some(now);

        match self.next_allowed {
            Some(next) if self.interval > 0.0 && now + self.interval * BOUNDARY_SLACK < next => {
                false
            }
            _ => {
                self.next_allowed = Some(now + self.interval);
                true
            }
        }
    }

    /// Forget the previous run, so the next call succeeds unconditionally.
    pub fn reset(&mut self) {
        self.next_allowed = None;
        self.latest = None;
    }

    /// Change the interval.
    ///
    /// An already scheduled boundary is kept; the new interval applies from
    /// the next permitted run.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.as_secs_f64();
    }

    /// The configured interval in seconds.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Earliest time of the next permitted run, or `None` if the gate has
    /// never run.
    pub fn next_allowed(&self) -> Option<f64> {
        self.next_allowed
    }
}

impl Default for ThrottleGate {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}
