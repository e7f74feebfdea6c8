//! Integration Tests for the Refresh Engine
//!
//! These tests drive elements the way a host UI does: once per frame, with
//! each element owning its own throttle gate and memo cache.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use cadence_core::graph::AssociationIndex;
use cadence_core::refresh::{
    Coalescer, MemoCache, SessionToken, Tenths, ThrottleGate, UpdateKind, WholeUnits,
};
use cadence_core::{EngineConfig, RefreshEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Update {
    Cooldown,
    Range,
}

impl UpdateKind for Update {
    const ALL: &'static [Self] = &[Update::Cooldown, Update::Range];

    fn index(self) -> usize {
        self as usize
    }
}

/// A cooldown countdown that owns its throttle and text cache.
struct CooldownLabel {
    gate: ThrottleGate,
    text: MemoCache<f64, Tenths, String>,
    cast: SessionToken,
    started: f64,
    duration: f64,
    shown: String,
}

impl CooldownLabel {
    fn new(formats: Rc<Cell<u32>>) -> Self {
        Self {
            gate: ThrottleGate::new(Duration::from_millis(100)),
            text: MemoCache::new(Tenths, move |remaining: &f64| {
                formats.set(formats.get() + 1);
                format!("{:.1}", (remaining * 10.0).floor() / 10.0)
            }),
            cast: SessionToken::next(),
            started: 0.0,
            duration: 0.0,
            shown: String::new(),
        }
    }

    fn start(&mut self, now: f64, duration: f64) {
        self.cast = SessionToken::next();
        self.started = now;
        self.duration = duration;
        self.gate.reset();
    }

    fn on_frame(&mut self, now: f64) {
        if !self.gate.should_run(now) {
            return;
        }
        let remaining = (self.duration - (now - self.started)).max(0.0);
        self.shown = self.text.get(&self.cast, &remaining).clone();
    }
}

#[test]
fn countdown_formats_once_per_tenth() {
    let formats = Rc::new(Cell::new(0));
    let mut label = CooldownLabel::new(formats.clone());
    label.start(0.0, 5.0);

    // Two seconds at 60 frames per second.
    for frame in 0..120 {
        label.on_frame(f64::from(frame) / 60.0);
    }

    // The gate admits roughly ten refreshes per second and each lands on a
    // new tenth, so formatting never exceeds the refresh count.
    let stats = label.text.stats();
    assert_eq!(u64::from(formats.get()), stats.misses);
    assert!(formats.get() <= 21, "formatted {} times", formats.get());
    assert!(label.shown.starts_with("3."));
}

#[test]
fn restarting_a_cooldown_refreshes_text() {
    let formats = Rc::new(Cell::new(0));
    let mut label = CooldownLabel::new(formats.clone());

    label.start(0.0, 3.0);
    label.on_frame(0.0);
    assert_eq!(label.shown, "3.0");
    let after_first = formats.get();

    // Same remaining value, new session: the text is computed again.
    label.start(10.0, 3.0);
    label.on_frame(10.0);
    assert_eq!(label.shown, "3.0");
    assert_eq!(formats.get(), after_first + 1);
    assert_eq!(label.text.stats().invalidations, 1);
}

#[test]
fn elements_do_not_share_caches() {
    let mut a: MemoCache<f64, WholeUnits, String> =
        MemoCache::new(WholeUnits, |v: &f64| format!("a{v}"));
    let mut b: MemoCache<f64, WholeUnits, String> =
        MemoCache::new(WholeUnits, |v: &f64| format!("b{v}"));
    let session = SessionToken::next();

    assert_eq!(a.get(&session, &1.0), "a1");
    assert_eq!(b.get(&session, &1.0), "b1");
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
}

#[derive(Debug, Default)]
struct Button {
    cooldown_updates: u32,
    range_updates: u32,
    in_range: bool,
}

impl Button {
    fn apply(&mut self, kind: Update) -> Result<(), String> {
        match kind {
            Update::Cooldown => self.cooldown_updates += 1,
            Update::Range => {
                self.range_updates += 1;
                self.in_range = !self.in_range;
            }
        }
        Ok(())
    }
}

#[test]
fn engine_coalesces_and_throttles() {
    let config = EngineConfig::from_json(r#"{ "throttle": { "interval_ms": 250 } }"#).unwrap();
    let mut engine: RefreshEngine<Update, usize> = RefreshEngine::new(config);
    let mut buttons: Vec<Button> = (0..12).map(|_| Button::default()).collect();

    let mut passes = 0;
    let mut visited = 0;
    for frame in 0..=60 {
        let now = f64::from(frame) / 60.0;

        // Many sources raise the same kinds every frame.
        engine.raise(Update::Cooldown);
        engine.raise(Update::Range);
        engine.raise(Update::Cooldown);

        let report = engine.tick(
            now,
            buttons.iter_mut(),
            |button, kind| button.apply(kind),
            |_, _, _| {},
        );
        if let Some(dispatch) = report.dispatch {
            passes += 1;
            visited += dispatch.elements;
        }
    }

    // One traversal per permitted tick, never one per kind.
    assert_eq!(passes, 5);
    assert_eq!(visited, passes * 12);
    assert!(buttons
        .iter()
        .all(|b| b.cooldown_updates == 5 && b.range_updates == 5));
}

#[test]
fn aura_expiry_drives_updates_and_index_cleanup() {
    // Contributors (casters) apply auras to targets (unit frames).
    let mut contributions: AssociationIndex<&str, usize, f64> = AssociationIndex::new();
    let mut engine: RefreshEngine<Update, (&str, usize)> = RefreshEngine::default();
    let mut frames: Vec<Button> = (0..3).map(|_| Button::default()).collect();

    contributions.upsert("priest", 0, 120.0);
    contributions.upsert("priest", 2, 80.0);
    contributions.upsert("druid", 2, 40.0);
    engine.schedule(1.0, ("priest", 2));
    engine.schedule(3.0, ("druid", 2));

    let mut expired = Vec::new();
    let report = engine.tick(
        1.5,
        frames.iter_mut(),
        |frame, kind| frame.apply(kind),
        |_, (sender, target), coalescer: &mut Coalescer<Update>| {
            expired.push((sender, target));
            coalescer.raise(Update::Range);
        },
    );

    assert_eq!(report.expired, 1);
    assert!(!report.throttled());
    for (sender, target) in expired {
        assert!(contributions.remove(&sender, &target).is_some());
    }

    assert_eq!(contributions.lookup(&2).map(|s| s.len()), Some(1));
    assert!(contributions.targets_of(&"priest").unwrap().contains(&0));
    assert_eq!(engine.timers().next_deadline(), Some(3.0));
    assert!(frames.iter().all(|f| f.range_updates == 1));

    // A caster leaving removes every contribution it made.
    assert_eq!(contributions.remove_by_sender(&"priest"), 1);
    assert!(contributions.is_consistent());
}
