//! Refresh Engine
//!
//! The engine is the per-frame entry point. The host calls
//! [`RefreshEngine::tick`] once per render frame, and the engine decides how
//! much work that frame does.
//!
//! # How a Tick Works
//!
//! 1. The timer set is polled. When no deadline is due this costs a single
//!    comparison. Expired payloads are handed to the host together with the
//!    coalescer, so an expiry can raise the update kinds it affects.
//!
//! 2. The throttle gate decides whether element updates run this frame.
//!
//! 3. If they do, the coalesced kinds are dispatched over the element
//!    collection in one traversal. If not, raised kinds stay pending and
//!    merge with whatever is raised before the next permitted frame.

use tracing::trace;

use crate::config::EngineConfig;
use crate::refresh::{Coalescer, DispatchReport, ThrottleGate, UpdateKind};
use crate::timer::{TimerId, TimerSet};

/// Outcome of one [`RefreshEngine::tick`].
#[derive(Debug)]
pub struct TickReport<K: UpdateKind, E> {
    /// Time the tick was driven with.
    pub now: f64,

    /// Timed events that fired.
    pub expired: usize,

    /// The dispatch pass, or `None` when the gate held updates back.
    pub dispatch: Option<DispatchReport<K, E>>,
}

impl<K: UpdateKind, E> TickReport<K, E> {
    /// Check if the gate held element updates back this tick.
    pub fn throttled(&self) -> bool {
        self.dispatch.is_none()
    }
}

/// Drives the throttle gate, coalescer and timer set for one element
/// collection.
///
/// # Type Parameters
///
/// - `K`: The update kinds elements understand.
/// - `P`: Payload carried by timed events.
#[derive(Debug)]
pub struct RefreshEngine<K: UpdateKind, P> {
    config: EngineConfig,
    gate: ThrottleGate,
    coalescer: Coalescer<K>,
    timers: TimerSet<P>,
}

impl<K: UpdateKind, P> RefreshEngine<K, P> {
    /// Create an engine from host configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            gate: ThrottleGate::from_config(&config.throttle),
            coalescer: Coalescer::new(),
            timers: TimerSet::new(),
            config,
        }
    }

    /// Flag an update kind for the next permitted dispatch.
    pub fn raise(&mut self, kind: K) {
        self.coalescer.raise(kind);
    }

    /// Schedule a timed event.
    pub fn schedule(&mut self, deadline: f64, payload: P) -> TimerId {
        self.timers.schedule(deadline, payload)
    }

    /// Cancel a timed event before it fires.
    pub fn cancel(&mut self, id: TimerId) -> Option<P> {
        self.timers.cancel(id)
    }

    /// Run one frame.
    ///
    /// `on_expired` receives each fired payload and may raise update kinds,
    /// which are dispatched in this same tick if the gate permits.
    /// `apply` performs one update kind on one element; its errors are
    /// isolated and collected in the report.
    pub fn tick<I, T, F, E, G>(
        &mut self,
        now: f64,
        elements: I,
        apply: F,
        mut on_expired: G,
    ) -> TickReport<K, E>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&mut T, K) -> Result<(), E>,
        E: std::fmt::Display,
        G: FnMut(TimerId, P, &mut Coalescer<K>),
    {
        let expired = self.timers.expire(now);
        let fired = expired.len();
        for (id, payload) in expired {
            on_expired(id, payload, &mut self.coalescer);
        }

        let dispatch = if self.gate.should_run(now) {
            Some(self.coalescer.dispatch(elements, apply))
        } else {
            trace!(now, pending = ?self.coalescer.pending(), "element updates throttled");
            None
        };

        TickReport {
            now,
            expired: fired,
            dispatch,
        }
    }

    /// The configuration the engine was built with.
    ///
    /// The engine itself reads only `throttle`. The `cache` section is kept
    /// here for hosts building the per-element caches of the elements this
    /// engine drives, via [`MemoCache::with_config`](crate::refresh::MemoCache::with_config).
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The throttle gate guarding element updates.
    pub fn gate(&self) -> &ThrottleGate {
        &self.gate
    }

    /// The pending update kinds.
    pub fn coalescer(&self) -> &Coalescer<K> {
        &self.coalescer
    }

    /// The pending timed events.
    pub fn timers(&self) -> &TimerSet<P> {
        &self.timers
    }
}

impl<K: UpdateKind, P> Default for RefreshEngine<K, P> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, ThrottleConfig};
    use crate::refresh::{MemoCache, WholeUnits};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Update {
        Text,
        Color,
    }

    impl UpdateKind for Update {
        const ALL: &'static [Self] = &[Update::Text, Update::Color];

        fn index(self) -> usize {
            self as usize
        }
    }

    fn engine(interval_ms: u64) -> RefreshEngine<Update, &'static str> {
        RefreshEngine::new(EngineConfig {
            throttle: ThrottleConfig { interval_ms },
            ..EngineConfig::default()
        })
    }

    fn ignore(_: TimerId, _: &'static str, _: &mut Coalescer<Update>) {}

    fn bump(label: &mut &mut u32, _: Update) -> Result<(), String> {
        **label += 1;
        Ok(())
    }

    #[test]
    fn throttled_ticks_keep_kinds_pending() {
        let mut engine = engine(100);
        let mut labels = vec![0u32; 3];

        engine.raise(Update::Text);
        let first = engine.tick(0.0, labels.iter_mut(), bump, ignore);
        assert_eq!(first.dispatch.as_ref().map(|d| d.elements), Some(3));

        engine.raise(Update::Color);
        let second = engine.tick(0.05, labels.iter_mut(), bump, ignore);
        assert!(second.throttled());
        assert!(engine.coalescer().is_pending(Update::Color));

        let third = engine.tick(0.1, labels.iter_mut(), bump, ignore);
        assert!(!third.throttled());
        assert!(engine.coalescer().pending().is_empty());
        assert_eq!(labels, vec![2, 2, 2]);
    }

    #[test]
    fn expiries_can_raise_kinds_for_the_same_tick() {
        let mut engine = engine(0);
        engine.schedule(1.0, "aura faded");

        let mut applied = Vec::new();
        let report = engine.tick(
            1.0,
            [()],
            |_, kind| {
                applied.push(kind);
                Ok::<(), String>(())
            },
            |_, payload, coalescer| {
                assert_eq!(payload, "aura faded");
                coalescer.raise(Update::Color);
            },
        );

        assert_eq!(report.expired, 1);
        assert_eq!(applied, vec![Update::Color]);
        assert_eq!(engine.timers().next_deadline(), None);
    }

    #[test]
    fn cancelled_events_never_fire() {
        let mut engine = engine(0);
        let id = engine.schedule(1.0, "tooltip");
        assert_eq!(engine.cancel(id), Some("tooltip"));

        let report = engine.tick(2.0, Vec::<()>::new(), |_, _| Ok::<(), String>(()), ignore);
        assert_eq!(report.expired, 0);
    }

    #[test]
    fn cache_settings_reach_element_caches() {
        let engine: RefreshEngine<Update, ()> = RefreshEngine::new(EngineConfig {
            cache: CacheConfig {
                max_entries: Some(1),
            },
            ..EngineConfig::default()
        });

        let mut text: MemoCache<f64, WholeUnits, String, u8> =
            MemoCache::with_config(WholeUnits, |v: &f64| format!("{v}"), &engine.config().cache);

        text.get(&0, &1.0);
        text.get(&0, &2.0);
        assert_eq!(text.len(), 1);
        assert_eq!(text.stats().capacity_resets, 1);
    }
}
