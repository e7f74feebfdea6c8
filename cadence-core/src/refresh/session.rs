//! Session tokens for the memoization cache.
//!
//! A session is one run of whatever a cached value describes, such as a
//! single cooldown or a single cast. When a new session begins, everything
//! cached for the previous one is stale, even if the raw values repeat.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier for one logical session.
///
/// Tokens are cheap to copy and compare. Each call to [`SessionToken::next`]
/// yields a token distinct from every other token issued in this process.
/// Hosts with their own notion of identity can use any `PartialEq + Clone`
/// type with [`MemoCache`](super::MemoCache) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    /// Issue a new unique token.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw token value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::next()
    }
}
