//! Runtime Configuration
//!
//! Hosts describe how their refresh engine should behave with a small JSON
//! document. Every field has a default, so an empty object is a valid
//! configuration:
//!
//! ```json
//! {
//!     "throttle": { "interval_ms": 100 },
//!     "cache": { "max_entries": 64 }
//! }
//! ```
//!
//! Intervals are expressed as whole milliseconds and surfaced as
//! [`Duration`]s, so a negative or non-finite interval cannot be configured.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default throttle interval: ten refreshes per second.
pub const DEFAULT_INTERVAL_MS: u64 = 100;

/// Settings for a [`ThrottleGate`](crate::refresh::ThrottleGate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum time between permitted runs. Zero disables throttling.
    pub interval_ms: u64,
}

impl ThrottleConfig {
    /// The configured interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

/// Settings for a [`MemoCache`](crate::refresh::MemoCache).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound on distinct keys held within one session.
    ///
    /// `None` leaves growth to the host, which is fine when the quantized
    /// range is small (countdown seconds, percentage bars).
    pub max_entries: Option<usize>,
}

/// Top-level configuration for a [`RefreshEngine`](crate::engine::RefreshEngine).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub throttle: ThrottleConfig,
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the runtime cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == Some(0) {
            return Err(Error::InvalidConfig {
                field: "cache.max_entries",
                reason: "must be greater than zero when set".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.throttle.interval(), Duration::from_millis(100));
        assert_eq!(config.cache.max_entries, None);
    }

    #[test]
    fn partial_document_fills_missing_fields() {
        let config = EngineConfig::from_json(r#"{ "cache": { "max_entries": 32 } }"#).unwrap();
        assert_eq!(config.throttle, ThrottleConfig::default());
        assert_eq!(config.cache.max_entries, Some(32));
    }

    #[test]
    fn zero_interval_is_allowed() {
        let config = EngineConfig::from_json(r#"{ "throttle": { "interval_ms": 0 } }"#).unwrap();
        assert_eq!(config.throttle.interval(), Duration::ZERO);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = EngineConfig::from_json(r#"{ "cache": { "max_entries": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfig {
                field: "cache.max_entries",
                ..
            }
        ));
    }

    #[test]
    fn negative_interval_fails_to_parse() {
        let err = EngineConfig::from_json(r#"{ "throttle": { "interval_ms": -5 } }"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
