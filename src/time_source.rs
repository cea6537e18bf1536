//! External timestamp ingestion for dataset-creation mode.
//!
//! Grounded in `original_source`'s `dataset_creator/packet_handler.py`, which reads
//! one decimal-seconds timestamp per line from an external source file (used when
//! the packet capture itself carries unreliable or truncated timestamps) and
//! converts it via `Decimal` for precision lost by `float`.

use crate::error::TimeError;

/// Parses one line of an external timestamp source (decimal seconds, e.g.
/// `"1690000000.123456789"`) into nanoseconds.
pub fn parse_external_timestamp(line: &str) -> Result<u64, TimeError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(TimeError::Unparseable(line.to_string()));
    }

    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| TimeError::Unparseable(line.to_string()))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(TimeError::Unparseable(line.to_string()));
    }

    Ok((seconds * 1_000_000_000.0).round() as u64)
}
