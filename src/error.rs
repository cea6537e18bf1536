//! Error types.
//!
//! The engine itself never panics or errors on data-driven packet input (see
//! [`crate::engine`] docs) — these types only cover configuration loading and the
//! optional external-timestamp reader used by dataset-creation-mode driving code.

use thiserror::Error;

/// Errors produced while loading or validating an [`crate::config::EngineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing mandatory setting `{0}`")]
    MissingMandatory(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors produced while parsing externally supplied packet arrival timestamps.
///
/// Corresponds to spec's *TimestampUnparseable* error kind, which only arises in
/// dataset-creation mode when timestamps are supplied out-of-band rather than read
/// from packet metadata.
#[derive(Error, Debug)]
pub enum TimeError {
    #[error("could not parse timestamp from line {0:?}")]
    Unparseable(String),
}
