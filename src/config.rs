//! Engine configuration.
//!
//! The engine itself takes a plain settings record (see [`EngineConfig`]); loading it
//! from a TOML file is a convenience identical in spirit to
//! `retina_core::config::load_config`, with one difference: this loader returns a
//! [`ConfigError`] instead of panicking, since spec-mandated error handling requires
//! the engine layer to never panic on input it can instead reject.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// "Infinite" history size, matching `HISTORY_SIZE_DEFAULT` in the source engine.
/// Approximately 6 GB of window-history entries at this crate's per-entry size.
pub const HISTORY_SIZE_DEFAULT: u64 = 30_000_000;

/// "Infinite" history timeout in seconds, matching `HISTORY_TIMEOUT_DEFAULT`.
pub const HISTORY_TIMEOUT_DEFAULT_SECS: f64 = 14_400.0;

/// Number of HyperLogLog register bits used by every sketch the engine creates.
/// Standard error is `1.04 / sqrt(2^bits)`, i.e. ~4.6% for `bits = 9`.
pub const HYPERLOGLOG_BITS: u8 = 9;

/// Settings for one [`crate::engine::Engine`] instance.
///
/// ## Example
/// ```toml
/// window_length = 1.0
/// history_min = 6
/// history_timeout = 120
/// packets_min = 15
/// samples_size = 40
/// history_size = 0
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Size of a window, in seconds. Informational: the engine does not decide when
    /// a window elapses on its own (see [`crate::driver::WindowDriver`]), but this
    /// value feeds the `intrawindow_activity_ratio` computation at retrieval.
    pub window_length: f64,

    /// Minimum number of historical window logs an IP must accumulate to be
    /// considered "ready". Defaults to `6`.
    #[serde(default = "default_history_min")]
    pub history_min: u32,

    /// Maximum age (in seconds) of a window log before it is considered expired.
    /// `0` means "infinite", internally treated as
    /// [`HISTORY_TIMEOUT_DEFAULT_SECS`]. Defaults to `120`.
    #[serde(default = "default_history_timeout")]
    pub history_timeout: f64,

    /// Minimum number of packets a window must contain to be recorded at all.
    /// Defaults to `15`.
    #[serde(default = "default_packets_min")]
    pub packets_min: u32,

    /// Number of reservoir samples kept per window for source-port entropy.
    /// Defaults to `40`.
    #[serde(default = "default_samples_size")]
    pub samples_size: usize,

    /// Maximum number of window-history entries retained across all IPs. `0` means
    /// "infinite", internally treated as [`HISTORY_SIZE_DEFAULT`]. Defaults to `0`.
    #[serde(default = "default_history_size")]
    pub history_size: u64,
}

fn default_history_min() -> u32 {
    6
}

fn default_history_timeout() -> f64 {
    120.0
}

fn default_packets_min() -> u32 {
    15
}

fn default_samples_size() -> usize {
    40
}

fn default_history_size() -> u64 {
    0
}

impl EngineConfig {
    /// Builds a config with only the mandatory field set, all else defaulted.
    pub fn new(window_length: f64) -> Self {
        EngineConfig {
            window_length,
            history_min: default_history_min(),
            history_timeout: default_history_timeout(),
            packets_min: default_packets_min(),
            samples_size: default_samples_size(),
            history_size: default_history_size(),
        }
    }

    /// Window length in nanoseconds.
    pub(crate) fn window_length_ns(&self) -> u64 {
        sec2nsec(self.window_length)
    }

    /// Effective history size, with `0` resolved to [`HISTORY_SIZE_DEFAULT`].
    pub(crate) fn effective_history_size(&self) -> u64 {
        if self.history_size > 0 {
            self.history_size
        } else {
            log::warn!(
                "history_size unset, falling back to default of {HISTORY_SIZE_DEFAULT} entries"
            );
            HISTORY_SIZE_DEFAULT
        }
    }

    /// Effective history timeout in nanoseconds, with `0` resolved to
    /// [`HISTORY_TIMEOUT_DEFAULT_SECS`].
    pub(crate) fn effective_history_timeout_ns(&self) -> u64 {
        let secs = if self.history_timeout > 0.0 {
            self.history_timeout
        } else {
            log::warn!(
                "history_timeout unset, falling back to default of {HISTORY_TIMEOUT_DEFAULT_SECS}s"
            );
            HISTORY_TIMEOUT_DEFAULT_SECS
        };
        sec2nsec(secs)
    }

    /// Validates that the settings are internally consistent.
    ///
    /// Corresponds to spec's *ConfigInvalid* error kind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_length <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "window_length",
                reason: "must be a positive number of seconds".to_string(),
            });
        }
        if self.history_min == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history_min",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.samples_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "samples_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Converts an available memory budget (in MB) into a `history_size` entry count,
    /// based on the fixed per-entry size of a flattened [`crate::types::WindowHistoryEntry`].
    ///
    /// Supplements the spec from the original implementation's
    /// `Logger.memory2history_elements` helper.
    pub fn history_elements_for_memory(memory_mb: u64) -> u64 {
        let bytes_available = memory_mb * 1024 * 1024;
        let entry_size = std::mem::size_of::<crate::types::WindowHistoryEntry>() as u64;
        bytes_available.div_ceil(entry_size)
    }
}

/// Loads an [`EngineConfig`] from a TOML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

/// Converts a floating-point number of seconds to nanoseconds.
pub(crate) fn sec2nsec(secs: f64) -> u64 {
    (secs * 1_000_000_000.0).round() as u64
}

/// Converts a whole number of nanoseconds to a floating-point number of seconds.
pub(crate) fn nsec2sec(nsecs: u64) -> f64 {
    nsecs as f64 / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_engine() {
        let cfg = EngineConfig::new(1.0);
        assert_eq!(cfg.history_min, 6);
        assert_eq!(cfg.history_timeout, 120.0);
        assert_eq!(cfg.packets_min, 15);
        assert_eq!(cfg.samples_size, 40);
        assert_eq!(cfg.history_size, 0);
        assert_eq!(cfg.effective_history_size(), HISTORY_SIZE_DEFAULT);
        assert_eq!(
            cfg.effective_history_timeout_ns(),
            sec2nsec(HISTORY_TIMEOUT_DEFAULT_SECS)
        );
    }

    #[test]
    fn rejects_non_positive_window_length() {
        let cfg = EngineConfig::new(0.0);
        assert!(cfg.validate().is_err());
        let cfg = EngineConfig::new(-1.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_history_min() {
        let mut cfg = EngineConfig::new(1.0);
        cfg.history_min = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_toml() {
        let toml_str = r#"
            window_length = 2.5
            history_min = 3
        "#;
        let cfg: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.window_length, 2.5);
        assert_eq!(cfg.history_min, 3);
        assert_eq!(cfg.packets_min, 15);
    }

    #[test]
    fn sec2nsec_roundtrips() {
        assert_eq!(sec2nsec(1.0), 1_000_000_000);
        assert_eq!(nsec2sec(1_000_000_000), 1.0);
    }
}
