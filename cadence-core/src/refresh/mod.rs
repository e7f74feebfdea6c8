//! Per-Element Refresh Primitives
//!
//! This module holds the pieces a UI element owns to keep its per-tick work
//! small: a throttle gate, a memoization cache, and the coalescer that
//! batches update signals over a collection of elements.
//!
//! # Concepts
//!
//! ## Throttle Gates
//!
//! A [`ThrottleGate`] bounds how often an expensive step runs, based on
//! elapsed time. A bar that is polled every frame but only needs to redraw
//! ten times a second keeps one gate as a field.
//!
//! ## Memoization Caches
//!
//! A [`MemoCache`] remembers the payload computed for each quantized input
//! within a session. A countdown that formats `"4.9"` every frame for a
//! tenth of a second formats it once.
//!
//! ## Coalescers
//!
//! A [`Coalescer`] collects update kinds raised during a tick and applies
//! all of them in one pass over the element collection.
//!
//! # Ownership
//!
//! Each element owns its gate and cache as plain fields. Their lifetime is
//! the element's lifetime, and there is no shared, name-keyed registry.

mod throttle;
mod quantize;
mod session;
mod memo;
mod coalesce;

pub use throttle::ThrottleGate;
pub use quantize::{Quantizer, Tenths, WholeUnits};
pub use session::SessionToken;
pub use memo::{MemoCache, CacheStats};
pub use coalesce::{Coalescer, DispatchReport, KindSet, UpdateFailure, UpdateKind};
