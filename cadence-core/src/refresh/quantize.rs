//! Quantization Policies
//!
//! A quantizer maps a raw input to the discrete key a [`MemoCache`] looks
//! up. Two raw values that quantize to the same key share one cached
//! payload, so the policy decides how often the payload is recomputed.
//!
//! The policy is chosen once, when the cache is built, and applies to every
//! lookup. Call sites never quantize by hand.
//!
//! # Floor, Not Round
//!
//! [`Tenths`] scales by ten and takes the floor. Rounding would flip the key
//! back and forth between two neighbours whenever a value hovers around an
//! `x.x5` boundary across successive ticks, which defeats the cache. How the
//! *displayed* value is rounded is up to the compute function.
//!
//! [`MemoCache`]: super::MemoCache

use std::hash::Hash;

/// Maps a raw value of type `R` to a hashable cache key.
pub trait Quantizer<R> {
    /// The discrete key type.
    type Key: Hash + Eq;

    /// Compute the key for `raw`.
    fn quantize(&self, raw: &R) -> Self::Key;
}

/// One decimal place: `floor(value * 10)`.
///
/// `4.96` and `4.94` share key `49`; `4.85` gets key `48`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tenths;

impl Quantizer<f64> for Tenths {
    type Key = i64;

    fn quantize(&self, raw: &f64) -> i64 {
        debug_assert!(raw.is_finite(), "cannot quantize non-finite value {raw}");
        (raw * 10.0).floor() as i64
    }
}

/// Whole units: `floor(value)`.
///
/// Suits countdowns that display whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WholeUnits;

impl Quantizer<f64> for WholeUnits {
    type Key = i64;

    fn quantize(&self, raw: &f64) -> i64 {
        debug_assert!(raw.is_finite(), "cannot quantize non-finite value {raw}");
        raw.floor() as i64
    }
}

/// Any `Fn(&R) -> K` closure is a quantizer.
impl<R, K, F> Quantizer<R> for F
where
    F: Fn(&R) -> K,
    K: Hash + Eq,
{
    type Key = K;

    fn quantize(&self, raw: &R) -> K {
        self(raw)
    }
}
