//! Welford's streaming variance algorithm.
//!
//! Mirrors `Variance` in `original_source`'s `streaming/statistics.py`, itself citing
//! John D. Cook, "Accurately computing running variance"
//! (<https://www.johndcook.com/blog/standard_deviation/>).
//!
//! Naive `E[X^2] - E[X]^2` is avoided since it is numerically unstable for streams
//! with a large mean relative to their spread (see spec's design notes).

/// Accumulates the Welford auxiliary value `S` for a running variance computation.
///
/// Unlike [`crate::streaming::average::RunningAverage`], this type does not track the
/// mean itself: callers that also need the mean (every caller in this crate does, to
/// report `*_avg` fields) keep it in a [`crate::streaming::average::RunningAverage`]
/// and pass both the pre- and post-update mean into [`Self::update`], matching the
/// source's `var_aux_stateless` call sites in `logger.py`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WelfordAccumulator {
    aux: f64,
    count: u64,
}

impl WelfordAccumulator {
    pub fn new() -> Self {
        WelfordAccumulator { aux: 0.0, count: 0 }
    }

    /// Folds a new element into the accumulator.
    ///
    /// `prev_mean` is the mean *before* `elem` was included, `new_mean` the mean
    /// *after*. The order matters: `S_k = S_{k-1} + (x_k - m_{k-1})(x_k - m_k)`.
    pub fn update(&mut self, elem: f64, prev_mean: f64, new_mean: f64) {
        self.count += 1;
        self.aux = aux_stateless(elem, self.aux, prev_mean, new_mean);
    }

    /// Sample variance (divisor `n - 1`), `0.0` for fewer than 2 samples.
    pub fn variance(&self) -> f64 {
        variance_stateless(self.aux, self.count)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Computes sample variance from an auxiliary value `S` and an element count,
/// without keeping any class state. `0.0` for `elems_cnt <= 1`.
#[inline]
pub fn variance_stateless(aux: f64, elems_cnt: u64) -> f64 {
    if elems_cnt > 1 {
        aux / (elems_cnt - 1) as f64
    } else {
        0.0
    }
}

/// Recomputes the Welford auxiliary value `S_k` for one new element, without keeping
/// any class state.
#[inline]
pub fn aux_stateless(new_elem_val: f64, prev_aux: f64, prev_mean: f64, new_mean: f64) -> f64 {
    prev_aux + (new_elem_val - prev_mean) * (new_elem_val - new_mean)
}
