//! Shannon entropy over a sample of discrete values.
//!
//! Mirrors `Entropy` in `original_source`'s `streaming/statistics.py`.

use std::collections::HashMap;
use std::hash::Hash;

/// Shannon entropy (in bits) of `elems`. Returns `0.0` for zero or one samples, or
/// when every sample is identical.
pub fn shannon<T: Eq + Hash>(elems: &[T]) -> f64 {
    let n = elems.len();
    if n <= 1 {
        return 0.0;
    }

    let mut freq: HashMap<&T, u64> = HashMap::new();
    for e in elems {
        *freq.entry(e).or_insert(0) += 1;
    }
    if freq.len() <= 1 {
        return 0.0;
    }

    let n = n as f64;
    let mut entropy = 0.0;
    for &count in freq.values() {
        let p = count as f64 / n;
        entropy -= p * p.log2();
    }
    entropy
}

/// Normalised Shannon entropy, in `[0, 1]`. Divides [`shannon`] by `log2(n)`; returns
/// `0.0` for `n == 1` (matching the source, which treats a single sample as
/// zero-information rather than dividing by `log2(1) == 0`).
pub fn shannon_norm<T: Eq + Hash>(elems: &[T]) -> f64 {
    let n = elems.len();
    if n == 1 {
        return 0.0;
    }
    if n == 0 {
        return 0.0;
    }
    shannon(elems) / (n as f64).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_identical_is_zero() {
        let samples = vec![1u16; 10];
        assert_eq!(shannon(&samples), 0.0);
        assert_eq!(shannon_norm(&samples), 0.0);
    }

    #[test]
    fn single_sample_is_zero() {
        assert_eq!(shannon(&[1u16]), 0.0);
        assert_eq!(shannon_norm(&[1u16]), 0.0);
    }

    #[test]
    fn empty_is_zero() {
        let empty: [u16; 0] = [];
        assert_eq!(shannon(&empty), 0.0);
        assert_eq!(shannon_norm(&empty), 0.0);
    }

    #[test]
    fn all_distinct_normalised_is_one() {
        let samples: Vec<u16> = (0..100).collect();
        let h = shannon_norm(&samples);
        assert!((h - 1.0).abs() < 1e-9, "h={h}");
    }

    #[test]
    fn bounded_in_unit_interval() {
        let samples = vec![1u16, 1, 1, 2, 2, 3, 4, 5, 5, 5, 5];
        let h = shannon_norm(&samples);
        assert!((0.0..=1.0).contains(&h));
    }

    #[test]
    fn two_equally_likely_values_is_one_bit() {
        let samples = vec![1u16, 2, 1, 2];
        assert!((shannon(&samples) - 1.0).abs() < 1e-9);
    }
}
