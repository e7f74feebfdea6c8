//! Memoization Cache
//!
//! A `MemoCache` skips recomputing a payload (usually a formatted string)
//! when the quantized form of its input has not changed.
//!
//! # How the Cache Works
//!
//! 1. Each lookup quantizes the raw input to a key with the cache's
//!    [`Quantizer`].
//!
//! 2. If the key was already computed in the current session, the cached
//!    payload is returned and the compute function is not called.
//!
//! 3. Otherwise the compute function runs on the raw value and its result is
//!    stored under the key.
//!
//! 4. When the caller presents a session token different from the one the
//!    entries were computed under, every entry is dropped first. Parts of a
//!    payload may depend on context outside the key (a direction arrow, a
//!    secondary field), and those must be refreshed at session boundaries
//!    even when the raw value repeats.
//!
//! # Growth
//!
//! Storage grows with the number of distinct keys seen in one session and is
//! reset at every session boundary. Hosts with small key ranges can leave the
//! cache uncapped; otherwise [`CacheConfig::max_entries`] bounds it by
//! clearing the cache before a miss would exceed the cap.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Debug;

use tracing::{debug, warn};

use super::quantize::Quantizer;
use super::session::SessionToken;
use crate::config::CacheConfig;

/// Counters describing how a cache has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,

    /// Lookups that ran the compute function.
    pub misses: u64,

    /// Session boundaries that discarded entries.
    pub invalidations: u64,

    /// Times the capacity cap forced a clear.
    pub capacity_resets: u64,
}

/// Change-detection cache keyed by a quantized input.
///
/// # Type Parameters
///
/// - `R`: The raw input type.
/// - `Q`: The quantization policy, fixed at construction.
/// - `V`: The computed payload.
/// - `S`: The session token type. Defaults to [`SessionToken`].
pub struct MemoCache<R, Q, V, S = SessionToken>
where
    Q: Quantizer<R>,
{
    /// Maps raw inputs to keys.
    quantizer: Q,

    /// Produces a payload on a miss.
    compute: Box<dyn Fn(&R) -> V>,

    /// Session the current entries were computed under.
    session: Option<S>,

    /// Payloads for the current session.
    entries: HashMap<Q::Key, V>,

    /// Optional cap on `entries.len()`.
    max_entries: Option<usize>,

    stats: CacheStats,
}

impl<R, Q, V, S> MemoCache<R, Q, V, S>
where
    Q: Quantizer<R>,
    S: PartialEq + Clone,
{
    /// Create an uncapped cache with the given policy and compute function.
    ///
    /// Nothing is computed until the first lookup.
    pub fn new<F>(quantizer: Q, compute: F) -> Self
    where
        F: Fn(&R) -> V + 'static,
    {
        Self {
            quantizer,
            compute: Box::new(compute),
            session: None,
            entries: HashMap::new(),
            max_entries: None,
            stats: CacheStats::default(),
        }
    }

    /// Create a cache honoring host configuration.
    pub fn with_config<F>(quantizer: Q, compute: F, config: &CacheConfig) -> Self
    where
        F: Fn(&R) -> V + 'static,
    {
        let mut cache = Self::new(quantizer, compute);
        cache.max_entries = config.max_entries;
        cache
    }

    /// Get the payload for `raw` under `session`, computing it on a miss.
    ///
    /// Within one session, inputs that quantize to the same key run the
    /// compute function at most once and all return the same payload.
    pub fn get(&mut self, session: &S, raw: &R) -> &V {
        self.enter_session(session);

        let key = self.quantizer.quantize(raw);

        if let Some(max) = self.max_entries {
            if self.entries.len() >= max && !self.entries.contains_key(&key) {
                warn!(max, "memo cache reached capacity, clearing");
                self.entries.clear();
                self.stats.capacity_resets += 1;
            }
        }

        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.stats.hits += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.stats.misses += 1;
                entry.insert((self.compute)(raw))
            }
        }
    }

    /// Look up a payload without computing.
    ///
    /// Returns `None` on a miss, and for every key when `session` is not the
    /// session the entries were computed under.
    pub fn peek(&self, session: &S, raw: &R) -> Option<&V> {
        if self.session.as_ref() != Some(session) {
            return None;
        }
        self.entries.get(&self.quantizer.quantize(raw))
    }

    /// Drop every entry, forcing recomputation on the next lookup.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.session = None;
    }

    /// Session the current entries belong to, if any.
    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    /// Number of cached keys in the current session.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Usage counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Switch to `session`, discarding entries from any other session.
    fn enter_session(&mut self, session: &S) {
        if self.session.as_ref() == Some(session) {
            return;
        }

        if self.session.is_some() {
            debug!(discarded = self.entries.len(), "session changed, invalidating memo cache");
            self.stats.invalidations += 1;
        }

        self.entries.clear();
        self.session = Some(session.clone());
    }
}

impl<R, Q, V, S> Debug for MemoCache<R, Q, V, S>
where
    Q: Quantizer<R>,
    S: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("session", &self.session)
            .field("len", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .field("stats", &self.stats)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
