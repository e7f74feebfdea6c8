//! Sparse Deadline Tracking
//!
//! A `TimerSet` holds pending deadlines, each with a payload, and caches the
//! earliest one. Most ticks arrive before that deadline and return after a
//! single comparison, without looking at any entry.
//!
//! # Tick Algorithm
//!
//! 1. If there is no pending deadline, or `now` is before the cached
//!    earliest deadline, return immediately.
//!
//! 2. Otherwise scan every entry and remove those whose deadline has
//!    passed (`deadline <= now`).
//!
//! 3. Recompute the earliest deadline from the remaining entries, or clear
//!    it when none remain.
//!
//! 4. Hand the removed payloads to the caller, earliest deadline first.
//!
//! Scheduling lowers the cached deadline when needed. Cancelling the entry
//! that holds the earliest deadline triggers a full rescan; cancellation is
//! rare enough that this stays cheap in practice.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Handle returned by [`TimerSet::schedule`], used to cancel an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Rebuild a handle from its raw value, for host bindings that pass
    /// handles across as integers.
    #[cfg_attr(not(feature = "python"), allow(dead_code))]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Expired entries handed back by [`TimerSet::expire`].
pub type Expired<P> = SmallVec<[(TimerId, P); 8]>;

/// Counters describing the work a timer set has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Calls to `expire` or `tick`.
    pub ticks: u64,

    /// Ticks that returned without inspecting any entry.
    pub idle_ticks: u64,

    /// Entries examined across all scans.
    pub inspected: u64,

    /// Entries that reached their deadline.
    pub fired: u64,

    /// Entries cancelled before firing.
    pub cancelled: u64,
}

#[derive(Debug, Clone)]
struct Timer<P> {
    deadline: f64,
    payload: P,
}

/// A set of pending deadlines that is cheap to poll when nothing is due.
#[derive(Debug, Clone)]
pub struct TimerSet<P> {
    /// Live entries by handle.
    entries: IndexMap<TimerId, Timer<P>>,

    /// Earliest deadline among `entries`, or `None` when empty.
    next_deadline: Option<f64>,

    /// Next handle to issue.
    next_id: u64,

    stats: TimerStats,
}

impl<P> TimerSet<P> {
    /// Create an empty timer set.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            next_deadline: None,
            next_id: 0,
            stats: TimerStats::default(),
        }
    }

    /// Schedule `payload` to fire once time reaches `deadline`.
    pub fn schedule(&mut self, deadline: f64, payload: P) -> TimerId {
        debug_assert!(deadline.is_finite(), "cannot schedule non-finite deadline {deadline}");

        let id = TimerId(self.next_id);
        self.next_id += 1;

        self.entries.insert(id, Timer { deadline, payload });

        match self.next_deadline {
            Some(next) if next <= deadline => {}
            _ => self.next_deadline = Some(deadline),
        }

        id
    }

    /// Cancel a pending entry, returning its payload.
    ///
    /// Unknown or already fired handles return `None`.
    pub fn cancel(&mut self, id: TimerId) -> Option<P> {
        let timer = self.entries.swap_remove(&id)?;
        self.stats.cancelled += 1;

        if self.next_deadline == Some(timer.deadline) {
            self.next_deadline = self.earliest();
        }

        Some(timer.payload)
    }

    /// Remove and return every entry whose deadline is at or before `now`,
    /// earliest deadline first.
    ///
    /// When nothing is due this inspects no entries.
    pub fn expire(&mut self, now: f64) -> Expired<P> {
        self.stats.ticks += 1;

        match self.next_deadline {
            Some(next) if now >= next => {}
            _ => {
                self.stats.idle_ticks += 1;
                trace!(now, next = ?self.next_deadline, "no deadline due");
                return Expired::new();
            }
        }

        self.stats.inspected += self.entries.len() as u64;

        let mut due: SmallVec<[(f64, TimerId); 8]> = self
            .entries
            .iter()
            .filter(|(_, timer)| timer.deadline <= now)
            .map(|(id, timer)| (timer.deadline, *id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let expired: Expired<P> = due
            .into_iter()
            .filter_map(|(_, id)| self.entries.swap_remove(&id).map(|timer| (id, timer.payload)))
            .collect();

        self.next_deadline = self.earliest();
        self.stats.fired += expired.len() as u64;

        debug!(
            now,
            fired = expired.len(),
            remaining = self.entries.len(),
            "deadlines expired"
        );

        expired
    }

    /// Expire due entries and pass each payload to `on_expired`.
    ///
    /// Returns the number of entries that fired.
    pub fn tick<F>(&mut self, now: f64, mut on_expired: F) -> usize
    where
        F: FnMut(TimerId, P),
    {
        let expired = self.expire(now);
        let fired = expired.len();
        for (id, payload) in expired {
            on_expired(id, payload);
        }
        fired
    }

    /// Earliest pending deadline, or `None` when nothing is scheduled.
    pub fn next_deadline(&self) -> Option<f64> {
        self.next_deadline
    }

    /// Deadline of a pending entry.
    pub fn deadline_of(&self, id: TimerId) -> Option<f64> {
        self.entries.get(&id).map(|timer| timer.deadline)
    }

    /// Check if an entry is still pending.
    pub fn contains(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending entry.
    pub fn clear(&mut self) {
        self.stats.cancelled += self.entries.len() as u64;
        self.entries.clear();
        self.next_deadline = None;
    }

    /// Work counters.
    pub fn stats(&self) -> TimerStats {
        self.stats
    }

    /// Full scan for the minimum deadline.
    fn earliest(&self) -> Option<f64> {
        self.entries
            .values()
            .map(|timer| timer.deadline)
            .min_by(f64::total_cmp)
    }
}

impl<P> Default for TimerSet<P> {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
