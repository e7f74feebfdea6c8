//! Error Types
//!
//! The primitives in this crate do not fail in steady state: lookups on
//! unknown keys return `None`, removals of unknown keys are no-ops. Errors
//! only arise at the configuration boundary, when a host hands us settings
//! we cannot honor.

use thiserror::Error;

/// Errors raised while building cadence components from host configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration field holds a value the runtime cannot use.
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human readable explanation.
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
