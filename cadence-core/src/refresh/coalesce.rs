//! Event-Flag Coalescer
//!
//! Several independent sources may each decide that a collection of
//! elements needs some kind of update within the same tick: a cooldown
//! started, a range check changed, a resource ran low. Walking the
//! collection once per kind costs `kinds × elements`. The coalescer merges
//! the raised kinds and walks the collection once, applying every flagged
//! kind to each element before moving to the next.
//!
//! # Dispatch Rules
//!
//! 1. [`Coalescer::take`] snapshots the raised kinds and clears them in one
//!    step. Kinds raised afterwards belong to the next tick.
//!
//! 2. [`KindSet::dispatch`] walks the elements exactly once. For each element
//!    it applies the flagged kinds in the order of [`UpdateKind::ALL`].
//!
//! 3. A kind that was not raised is never dispatched, for any element.
//!
//! 4. An update that fails is recorded and logged. The remaining kinds and
//!    elements still run; nothing is rolled back.

use std::fmt::{self, Debug, Display};
use std::marker::PhantomData;

use smallvec::SmallVec;
use tracing::{debug, warn};

/// A small closed set of update kinds.
///
/// # Example
///
/// ```rust
/// use cadence_core::refresh::UpdateKind;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Update {
///     Cooldown,
///     Range,
/// }
///
/// impl UpdateKind for Update {
///     const ALL: &'static [Self] = &[Update::Cooldown, Update::Range];
///
///     fn index(self) -> usize {
///         self as usize
///     }
/// }
/// ```
pub trait UpdateKind: Copy + Eq + Debug + 'static {
    /// Every kind, in the order updates are applied. At most 64 kinds.
    const ALL: &'static [Self];

    /// Position of this kind in [`UpdateKind::ALL`].
    fn index(self) -> usize;
}

/// Compile-time check that a kind enumeration fits in the bit mask.
struct KindLimit<K>(PhantomData<K>);

impl<K: UpdateKind> KindLimit<K> {
    const FITS: () = assert!(K::ALL.len() <= 64, "an UpdateKind may declare at most 64 kinds");
}

/// A set of update kinds, stored as a bit mask.
pub struct KindSet<K> {
    bits: u64,
    _kind: PhantomData<K>,
}

impl<K: UpdateKind> KindSet<K> {
    /// Create an empty set.
    pub fn new() -> Self {
        let () = KindLimit::<K>::FITS;
        Self {
            bits: 0,
            _kind: PhantomData,
        }
    }

    fn bit(kind: K) -> u64 {
        let index = kind.index();
        assert!(
            index < K::ALL.len(),
            "update kind {kind:?} reports index {index}, outside its {} declared kinds",
            K::ALL.len()
        );
        1 << index
    }

    /// Add a kind. Adding a kind twice has no further effect.
    pub fn insert(&mut self, kind: K) {
        self.bits |= Self::bit(kind);
    }

    /// Check if a kind is in the set.
    pub fn contains(&self, kind: K) -> bool {
        self.bits & Self::bit(kind) != 0
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of kinds in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterate the kinds in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        K::ALL.iter().copied().filter(move |kind| self.contains(*kind))
    }

    /// Apply every kind in the set to every element, in one traversal.
    ///
    /// `apply` is called once per element and kind. Elements are visited in
    /// iteration order; for each element the kinds run in the order of
    /// [`UpdateKind::ALL`]. An empty set returns without touching
    /// `elements` at all.
    pub fn dispatch<I, T, F, E>(self, elements: I, mut apply: F) -> DispatchReport<K, E>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&mut T, K) -> Result<(), E>,
        E: Display,
    {
        let mut report = DispatchReport {
            kinds: self,
            elements: 0,
            updates: 0,
            failures: SmallVec::new(),
        };

        if self.is_empty() {
            return report;
        }

        let kinds: SmallVec<[K; 8]> = self.iter().collect();

        for (position, mut element) in elements.into_iter().enumerate() {
            report.elements += 1;

            for &kind in &kinds {
                report.updates += 1;

                if let Err(error) = apply(&mut element, kind) {
                    warn!(element = position, ?kind, %error, "element update failed");
                    report.failures.push(UpdateFailure {
                        element: position,
                        kind,
                        error,
                    });
                }
            }
        }

        debug!(
            kinds = report.kinds.len(),
            elements = report.elements,
            failures = report.failures.len(),
            "coalesced dispatch complete"
        );

        report
    }
}

impl<K> Clone for KindSet<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for KindSet<K> {}

impl<K> PartialEq for KindSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<K> Eq for KindSet<K> {}

impl<K: UpdateKind> Default for KindSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: UpdateKind> Debug for KindSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: UpdateKind> FromIterator<K> for KindSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

/// One update that returned an error during a dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure<K, E> {
    /// Position of the element in the traversal.
    pub element: usize,
    pub kind: K,
    pub error: E,
}

/// What a dispatch pass did.
#[derive(Debug, Clone)]
pub struct DispatchReport<K: UpdateKind, E> {
    /// Kinds that were dispatched.
    pub kinds: KindSet<K>,

    /// Elements visited. Zero when no kind was flagged.
    pub elements: usize,

    /// Per-element, per-kind updates attempted.
    pub updates: usize,

    /// Updates that returned an error.
    pub failures: SmallVec<[UpdateFailure<K, E>; 4]>,
}

impl<K: UpdateKind, E> DispatchReport<K, E> {
    /// Check if every attempted update succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Collects raised update kinds between dispatch passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coalescer<K: UpdateKind> {
    pending: KindSet<K>,
}

impl<K: UpdateKind> Default for Coalescer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: UpdateKind> Coalescer<K> {
    /// Create a coalescer with nothing raised.
    pub fn new() -> Self {
        Self {
            pending: KindSet::new(),
        }
    }

    /// Flag `kind` as due. Raising a kind repeatedly before the next
    /// dispatch is the same as raising it once.
    pub fn raise(&mut self, kind: K) {
        self.pending.insert(kind);
    }

    /// Check if `kind` is flagged for the next dispatch.
    pub fn is_pending(&self, kind: K) -> bool {
        self.pending.contains(kind)
    }

    /// The kinds flagged for the next dispatch.
    pub fn pending(&self) -> KindSet<K> {
        self.pending
    }

    /// Snapshot the flagged kinds and clear them.
    pub fn take(&mut self) -> KindSet<K> {
        std::mem::take(&mut self.pending)
    }

    /// Take the flagged kinds and dispatch them over `elements`.
    pub fn dispatch<I, T, F, E>(&mut self, elements: I, apply: F) -> DispatchReport<K, E>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&mut T, K) -> Result<(), E>,
        E: Display,
    {
        self.take().dispatch(elements, apply)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
