//! Streaming data average computation.
//!
//! Mirrors `Average` in `original_source`'s `streaming/statistics.py`.

/// Running mean of a stream of `f64` values, computed without storing any history.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningAverage {
    avg: f64,
    count: u64,
}

impl RunningAverage {
    pub fn new() -> Self {
        RunningAverage { avg: 0.0, count: 0 }
    }

    /// Folds `elem` into the running average and returns the updated mean.
    pub fn update(&mut self, elem: f64) -> f64 {
        self.count += 1;
        self.avg = Self::stateless(elem, self.avg, self.count);
        self.avg
    }

    pub fn get(&self) -> f64 {
        self.avg
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// (Re)computes a running average without keeping any class state.
    ///
    /// `new_elems_cnt` must include `new_elem_val` in its count.
    #[inline]
    pub fn stateless(new_elem_val: f64, prev_avg: f64, new_elems_cnt: u64) -> f64 {
        prev_avg + (new_elem_val - prev_avg) / new_elems_cnt as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_arithmetic_mean() {
        let mut avg = RunningAverage::new();
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        for v in values {
            avg.update(v);
        }
        let expected: f64 = values.iter().sum::<f64>() / values.len() as f64;
        assert!((avg.get() - expected).abs() < 1e-9);
        assert_eq!(avg.count(), values.len() as u64);
    }

    #[test]
    fn empty_average_is_zero() {
        let avg = RunningAverage::new();
        assert_eq!(avg.get(), 0.0);
    }

    #[test]
    fn stateless_matches_stateful() {
        let mut stateful = RunningAverage::new();
        let mut prev = 0.0;
        for (i, v) in [1.0, 3.0, 5.0, 100.0].into_iter().enumerate() {
            stateful.update(v);
            prev = RunningAverage::stateless(v, prev, i as u64 + 1);
        }
        assert!((stateful.get() - prev).abs() < 1e-9);
    }
}
