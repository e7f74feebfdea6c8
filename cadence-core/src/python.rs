//! Python host binding.
//!
//! Exposes the time-driven primitives to hosts scripted in Python. Inputs
//! crossing the boundary are validated here; the Rust types assume finite
//! times.

use std::time::Duration;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::DEFAULT_INTERVAL_MS;
use crate::refresh::ThrottleGate;
use crate::timer::{TimerId, TimerSet};

fn finite(name: &str, value: f64) -> PyResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PyValueError::new_err(format!("{name} must be finite, got {value}")))
    }
}

/// Python-exposed throttle gate.
#[pyclass(name = "ThrottleGate")]
pub struct PyThrottleGate {
    inner: ThrottleGate,
}

#[pymethods]
impl PyThrottleGate {
    #[new]
    #[pyo3(signature = (interval_ms = DEFAULT_INTERVAL_MS))]
    fn new(interval_ms: u64) -> Self {
        Self {
            inner: ThrottleGate::new(Duration::from_millis(interval_ms)),
        }
    }

    /// Return whether the throttled work may run at `now` (seconds).
    fn should_run(&mut self, now: f64) -> PyResult<bool> {
        Ok(self.inner.should_run(finite("now", now)?))
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    #[getter]
    fn next_allowed(&self) -> Option<f64> {
        self.inner.next_allowed()
    }

    fn __repr__(&self) -> String {
        format!(
            "ThrottleGate(interval={}s, next_allowed={:?})",
            self.inner.interval(),
            self.inner.next_allowed()
        )
    }
}

/// Python-exposed timer set carrying arbitrary Python payloads.
#[pyclass(name = "TimerSet")]
pub struct PyTimerSet {
    inner: TimerSet<PyObject>,
}

#[pymethods]
impl PyTimerSet {
    #[new]
    fn new() -> Self {
        Self {
            inner: TimerSet::new(),
        }
    }

    /// Schedule `payload` at `deadline`, returning a handle for `cancel`.
    fn schedule(&mut self, deadline: f64, payload: PyObject) -> PyResult<u64> {
        let deadline = finite("deadline", deadline)?;
        Ok(self.inner.schedule(deadline, payload).raw())
    }

    fn cancel(&mut self, handle: u64) -> Option<PyObject> {
        self.inner.cancel(TimerId::from_raw(handle))
    }

    /// Return the payloads whose deadline is at or before `now`.
    fn tick(&mut self, now: f64) -> PyResult<Vec<PyObject>> {
        let now = finite("now", now)?;
        Ok(self
            .inner
            .expire(now)
            .into_iter()
            .map(|(_, payload)| payload)
            .collect())
    }

    #[getter]
    fn next_deadline(&self) -> Option<f64> {
        self.inner.next_deadline()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}
