//! Bidirectional Association Index
//!
//! Records a many-to-many relation between *senders* (outside actors that
//! contribute something) and *targets* (the elements they affect), with a
//! value per pair.
//!
//! # Layout
//!
//! - `forward`: target → (sender → value)
//! - `reverse`: sender → set of targets
//!
//! Both maps are updated together by every mutating operation, so a pair is
//! present in `forward` exactly when it is present in `reverse`. Removing by
//! either side touches only the pairs that side participates in, never the
//! whole relation. Inner maps and sets are dropped as soon as they become
//! empty.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Many-to-many relation with O(1) lookup from either side.
#[derive(Debug, Clone)]
pub struct AssociationIndex<S, T, V> {
    /// Values by target, then sender.
    forward: IndexMap<T, IndexMap<S, V>>,

    /// Targets by sender.
    reverse: IndexMap<S, IndexSet<T>>,

    /// Number of (sender, target) pairs.
    pairs: usize,
}

impl<S, T, V> AssociationIndex<S, T, V>
where
    S: Hash + Eq + Clone,
    T: Hash + Eq + Clone,
{
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            forward: IndexMap::new(),
            reverse: IndexMap::new(),
            pairs: 0,
        }
    }

    /// Associate `sender` with `target`, storing `value` for the pair.
    ///
    /// Returns the value previously stored for the pair, if any. Repeating
    /// the call with the same pair only replaces the value.
    pub fn upsert(&mut self, sender: S, target: T, value: V) -> Option<V> {
        let previous = self
            .forward
            .entry(target.clone())
            .or_default()
            .insert(sender.clone(), value);

        if previous.is_none() {
            self.reverse.entry(sender).or_default().insert(target);
            self.pairs += 1;
        }

        previous
    }

    /// Remove a single pair, returning its value.
    pub fn remove(&mut self, sender: &S, target: &T) -> Option<V> {
        let senders = self.forward.get_mut(target)?;
        let value = senders.swap_remove(sender)?;
        if senders.is_empty() {
            self.forward.swap_remove(target);
        }

        if let Some(targets) = self.reverse.get_mut(sender) {
            targets.swap_remove(target);
            if targets.is_empty() {
                self.reverse.swap_remove(sender);
            }
        }

        self.pairs -= 1;
        Some(value)
    }

    /// Remove every pair involving `sender`.
    ///
    /// Runs in time proportional to the number of targets `sender` is
    /// associated with. Returns how many pairs were removed; an unknown
    /// sender removes nothing.
    pub fn remove_by_sender(&mut self, sender: &S) -> usize {
        let Some(targets) = self.reverse.swap_remove(sender) else {
            return 0;
        };

        let mut removed = 0;
        for target in &targets {
            if let Some(senders) = self.forward.get_mut(target) {
                if senders.swap_remove(sender).is_some() {
                    removed += 1;
                }
                if senders.is_empty() {
                    self.forward.swap_remove(target);
                }
            }
        }

        self.pairs -= removed;
        debug!(removed, "removed associations by sender");
        removed
    }

    /// Remove every pair involving `target`.
    ///
    /// Runs in time proportional to the number of senders associated with
    /// `target`. Returns the removed sender → value map, or `None` for an
    /// unknown target.
    pub fn remove_by_target(&mut self, target: &T) -> Option<IndexMap<S, V>> {
        let senders = self.forward.swap_remove(target)?;

        for sender in senders.keys() {
            if let Some(targets) = self.reverse.get_mut(sender) {
                targets.swap_remove(target);
                if targets.is_empty() {
                    self.reverse.swap_remove(sender);
                }
            }
        }

        self.pairs -= senders.len();
        debug!(removed = senders.len(), "removed associations by target");
        Some(senders)
    }

    /// All senders associated with `target`, with their values.
    pub fn lookup(&self, target: &T) -> Option<&IndexMap<S, V>> {
        self.forward.get(target)
    }

    /// All targets `sender` is associated with.
    pub fn targets_of(&self, sender: &S) -> Option<&IndexSet<T>> {
        self.reverse.get(sender)
    }

    /// The value stored for one pair.
    pub fn get(&self, sender: &S, target: &T) -> Option<&V> {
        self.forward.get(target)?.get(sender)
    }

    /// Check if a pair is present.
    pub fn contains(&self, sender: &S, target: &T) -> bool {
        self.get(sender, target).is_some()
    }

    /// Number of (sender, target) pairs.
    pub fn len(&self) -> usize {
        self.pairs
    }

    /// Check if the index holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs == 0
    }

    /// Number of targets with at least one sender.
    pub fn target_count(&self) -> usize {
        self.forward.len()
    }

    /// Number of senders with at least one target.
    pub fn sender_count(&self) -> usize {
        self.reverse.len()
    }

    /// Remove every pair.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
        self.pairs = 0;
    }

    /// Verify that `forward` and `reverse` describe the same relation.
    ///
    /// This walks the whole index and is meant for tests and debug checks.
    pub fn is_consistent(&self) -> bool {
        let forward_pairs: usize = self.forward.values().map(IndexMap::len).sum();
        let reverse_pairs: usize = self.reverse.values().map(IndexSet::len).sum();

        if forward_pairs != self.pairs || reverse_pairs != self.pairs {
            return false;
        }

        let forward_matches = self.forward.iter().all(|(target, senders)| {
            !senders.is_empty()
                && senders.keys().all(|sender| {
                    self.reverse
                        .get(sender)
                        .is_some_and(|targets| targets.contains(target))
                })
        });

        let reverse_matches = self.reverse.iter().all(|(sender, targets)| {
            !targets.is_empty()
                && targets.iter().all(|target| {
                    self.forward
                        .get(target)
                        .is_some_and(|senders| senders.contains_key(sender))
                })
        });

        forward_matches && reverse_matches
    }
}

impl<S, T, V> Default for AssociationIndex<S, T, V>
where
    S: Hash + Eq + Clone,
    T: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
