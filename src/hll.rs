//! HyperLogLog cardinality sketch.
//!
//! A fixed-precision (p = 9, 512 registers) HyperLogLog estimator, adapted from the
//! register-update and bias-correction math in `sketch_oxide`'s `SlidingHyperLogLog`
//! (see `other_examples/`), stripped of its time-windowing machinery since this engine
//! only ever asks for a single all-time cardinality per `IPWindow`.
//!
//! Reference: Flajolet et al., "HyperLogLog: the analysis of a near-optimal
//! cardinality estimation algorithm" (2007).

use std::hash::Hasher;
use twox_hash::XxHash64;

/// Register precision in bits. 512 registers, ~4.6% standard error.
pub const PRECISION: u8 = 9;

const HASH_SEED: u64 = 0;

/// Cardinality estimator for a single, unbounded stream of strings.
#[derive(Debug, Clone)]
pub struct HyperLogLog {
    registers: Vec<u8>,
}

impl HyperLogLog {
    pub fn new() -> Self {
        HyperLogLog {
            registers: vec![0u8; 1 << PRECISION],
        }
    }

    /// Folds `value` into the sketch.
    pub fn add(&mut self, value: &str) {
        let hash = Self::hash(value);
        let idx = (hash >> (64 - PRECISION)) as usize;
        let w = hash << PRECISION | (1u64 << (PRECISION - 1));
        let rho = (w.leading_zeros() + 1) as u8;
        if rho > self.registers[idx] {
            self.registers[idx] = rho;
        }
    }

    #[inline]
    fn hash(value: &str) -> u64 {
        let mut hasher = XxHash64::with_seed(HASH_SEED);
        hasher.write(value.as_bytes());
        hasher.finish()
    }

    /// Estimated number of distinct values added so far.
    pub fn cardinality(&self) -> u64 {
        let m = self.registers.len() as f64;
        let mut sum = 0.0;
        let mut zeros = 0u32;
        for &r in &self.registers {
            sum += 2.0_f64.powi(-(r as i32));
            if r == 0 {
                zeros += 1;
            }
        }

        let alpha_m = Self::alpha(self.registers.len());
        let raw_estimate = alpha_m * m * m / sum;

        let estimate = if raw_estimate <= 2.5 * m && zeros > 0 {
            m * (m / zeros as f64).ln()
        } else if raw_estimate <= (1u64 << 32) as f64 / 30.0 {
            raw_estimate
        } else {
            // Large-range correction for hashes approaching the 2^32 boundary.
            let two32 = (1u64 << 32) as f64;
            -two32 * (1.0 - raw_estimate / two32).ln()
        };

        estimate.round().max(0.0) as u64
    }

    fn alpha(m: usize) -> f64 {
        match m {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m as f64),
        }
    }
}

impl Default for HyperLogLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sketch_has_zero_cardinality() {
        let hll = HyperLogLog::new();
        assert_eq!(hll.cardinality(), 0);
    }

    #[test]
    fn distinct_values_estimated_within_tolerance() {
        let mut hll = HyperLogLog::new();
        for i in 0..10_000u32 {
            hll.add(&i.to_string());
        }
        let estimate = hll.cardinality() as f64;
        let error = (estimate - 10_000.0).abs() / 10_000.0;
        assert!(error < 0.10, "estimate={estimate}, error={error}");
    }

    #[test]
    fn repeated_values_do_not_inflate_cardinality() {
        let mut hll = HyperLogLog::new();
        for _ in 0..1000 {
            hll.add("same-value");
        }
        assert!(hll.cardinality() <= 2);
    }

    #[test]
    fn small_unique_set_is_roughly_accurate() {
        let mut hll = HyperLogLog::new();
        for port in 1..=100u16 {
            hll.add(&port.to_string());
        }
        let estimate = hll.cardinality() as f64;
        assert!((estimate - 100.0).abs() / 100.0 < 0.15, "estimate={estimate}");
    }
}
