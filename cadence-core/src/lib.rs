//! Cadence Core
//!
//! This crate provides the incremental refresh primitives behind a real-time
//! UI layer that updates many small elements (timers, bars, buttons,
//! tooltips) on every render tick. It implements:
//!
//! - Throttle gates that bound how often expensive work runs
//! - Change-detection memoization keyed by quantized inputs
//! - Coalescing of update signals into one pass per tick
//! - A bidirectional association index with cheap removal from either side
//! - Sparse deadline tracking that is O(1) while nothing is due
//!
//! Everything is synchronous and single-threaded: the host drives the engine
//! once per frame and owns each instance exclusively. Nothing here renders,
//! persists, or touches the network.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `refresh`: Per-element primitives (throttle, memo cache, coalescer)
//! - `graph`: The bidirectional association index
//! - `timer`: Sparse deadline tracking
//! - `engine`: The per-frame driver composing the above
//! - `config`: Host configuration
//!
//! The crate can also be built as a Python extension module via PyO3 with the
//! `python` feature.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use cadence_core::refresh::{MemoCache, SessionToken, Tenths, ThrottleGate};
//!
//! struct CooldownText {
//!     gate: ThrottleGate,
//!     text: MemoCache<f64, Tenths, String>,
//! }
//!
//! let mut label = CooldownText {
//!     gate: ThrottleGate::new(Duration::from_millis(100)),
//!     text: MemoCache::new(Tenths, |remaining: &f64| format!("{remaining:.1}")),
//! };
//!
//! let cast = SessionToken::next();
//! if label.gate.should_run(0.0) {
//!     assert_eq!(label.text.get(&cast, &4.96), "5.0");
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod refresh;
pub mod timer;

#[cfg(feature = "python")]
mod python;

pub use config::EngineConfig;
pub use engine::{RefreshEngine, TickReport};
pub use error::{Error, Result};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyThrottleGate>()?;
    m.add_class::<python::PyTimerSet>()?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
