//! # Rangefeed Configuration
//!
//! Configured externally (defaults, or environment), immutable once a
//! runner has been built from it.

use tokio::sync::Semaphore;

use super::errors::{RangefeedError, RangefeedResult};
use crate::observability::{log_event_with_fields, Event};

/// Environment variable overriding `max_concurrent_scans`
pub const ENV_MAX_CONCURRENT_SCANS: &str = "AEROFEED_MAX_CONCURRENT_SCANS";

/// Environment variable overriding `catch_up_buffer`
pub const ENV_CATCH_UP_BUFFER: &str = "AEROFEED_CATCH_UP_BUFFER";

/// Largest value either setting accepts. Both size a tokio semaphore (the
/// scan limiter, or the channel's permit pool), which rejects anything larger.
pub const MAX_SETTING: usize = Semaphore::MAX_PERMITS;

/// Backfill scan configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangefeedConfig {
    /// Scans allowed to iterate snapshots at the same time.
    ///
    /// Queued scans wait for a slot; they are cancelled if the runner stops
    /// first.
    pub max_concurrent_scans: usize,

    /// Capacity of a registration's event channel. A full channel blocks the
    /// catch-up scan feeding it.
    pub catch_up_buffer: usize,
}

impl Default for RangefeedConfig {
    fn default() -> Self {
        Self {
            max_concurrent_scans: 8,
            catch_up_buffer: 4096,
        }
    }
}

impl RangefeedConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> RangefeedResult<()> {
        check_range("max_concurrent_scans", self.max_concurrent_scans)?;
        check_range("catch_up_buffer", self.catch_up_buffer)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> RangefeedResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> RangefeedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_MAX_CONCURRENT_SCANS) {
            config.max_concurrent_scans = parse_count(ENV_MAX_CONCURRENT_SCANS, &v)?;
        }
        if let Some(v) = lookup(ENV_CATCH_UP_BUFFER) {
            config.catch_up_buffer = parse_count(ENV_CATCH_UP_BUFFER, &v)?;
        }
        config.validate()?;

        let catch_up_buffer = config.catch_up_buffer.to_string();
        let max_concurrent_scans = config.max_concurrent_scans.to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("catch_up_buffer", catch_up_buffer.as_str()),
                ("max_concurrent_scans", max_concurrent_scans.as_str()),
            ],
        );
        Ok(config)
    }
}

fn check_range(name: &str, value: usize) -> RangefeedResult<()> {
    if value == 0 {
        return Err(RangefeedError::ConfigError(format!(
            "{} must be at least 1",
            name
        )));
    }
    if value > MAX_SETTING {
        return Err(RangefeedError::ConfigError(format!(
            "{} must be at most {}, got {}",
            name, MAX_SETTING, value
        )));
    }
    Ok(())
}

fn parse_count(name: &str, value: &str) -> RangefeedResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| RangefeedError::ConfigError(format!("{}={:?}: {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let config = RangefeedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrent_scans, 8);
        assert_eq!(config.catch_up_buffer, 4096);
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = RangefeedConfig {
            max_concurrent_scans: 0,
            ..RangefeedConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RangefeedConfig {
            catch_up_buffer: 0,
            ..RangefeedConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_values_rejected() {
        let config = RangefeedConfig {
            max_concurrent_scans: MAX_SETTING + 1,
            ..RangefeedConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RangefeedError::ConfigError(_))
        ));

        let config = RangefeedConfig {
            catch_up_buffer: MAX_SETTING + 1,
            ..RangefeedConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RangefeedError::ConfigError(_))
        ));

        let config = RangefeedConfig {
            max_concurrent_scans: MAX_SETTING,
            catch_up_buffer: MAX_SETTING,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_rejects_usize_max() {
        let max = usize::MAX.to_string();

        let err = RangefeedConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENT_SCANS, max.as_str())]))
            .unwrap_err();
        assert!(matches!(err, RangefeedError::ConfigError(_)));

        let err = RangefeedConfig::from_lookup(lookup(&[(ENV_CATCH_UP_BUFFER, max.as_str())]))
            .unwrap_err();
        assert!(matches!(err, RangefeedError::ConfigError(_)));
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = RangefeedConfig::from_lookup(lookup(&[
            (ENV_MAX_CONCURRENT_SCANS, "3"),
            (ENV_CATCH_UP_BUFFER, " 16 "),
        ]))
        .unwrap();

        assert_eq!(config.max_concurrent_scans, 3);
        assert_eq!(config.catch_up_buffer, 16);
    }

    #[test]
    fn test_lookup_missing_uses_defaults() {
        let config = RangefeedConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RangefeedConfig::default());
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let err = RangefeedConfig::from_lookup(lookup(&[(ENV_CATCH_UP_BUFFER, "lots")]))
            .unwrap_err();
        assert!(matches!(err, RangefeedError::ConfigError(_)));

        let err = RangefeedConfig::from_lookup(lookup(&[(ENV_MAX_CONCURRENT_SCANS, "0")]))
            .unwrap_err();
        assert!(matches!(err, RangefeedError::ConfigError(_)));
    }
}
