//! Reservoir sampling.
//!
//! Mirrors `ReservoirSampler` in `original_source`'s `streaming/sampling.py`, citing
//! Lahiri & Tirthapura, "Stream Sampling", *Encyclopedia of Database Systems* (2009).

use rand::Rng;

/// Fixed-size uniform random subsample of a stream of unknown length.
#[derive(Debug, Clone)]
pub struct ReservoirSampler<T> {
    samples: Vec<T>,
    capacity: usize,
    elems_processed: u64,
}

impl<T: Clone + Default> ReservoirSampler<T> {
    pub fn new(capacity: usize) -> Self {
        ReservoirSampler {
            samples: vec![T::default(); capacity],
            capacity,
            elems_processed: 0,
        }
    }

    /// Folds one more stream element into the reservoir.
    pub fn sample(&mut self, elem: T) {
        self.sample_with_rng(elem, &mut rand::thread_rng());
    }

    /// Same as [`Self::sample`] but with an injectable RNG, for deterministic tests.
    pub fn sample_with_rng<R: Rng + ?Sized>(&mut self, elem: T, rng: &mut R) {
        Self::sample_stateless(elem, &mut self.samples, self.capacity, self.elems_processed, rng);
        self.elems_processed += 1;
    }

    /// The samples collected so far, truncated to the number of elements actually
    /// seen (which may be less than `capacity`).
    pub fn samples(&self) -> &[T] {
        &self.samples[..self.samples_count()]
    }

    pub fn samples_count(&self) -> usize {
        std::cmp::min(self.capacity, self.elems_processed as usize)
    }

    pub fn elems_processed(&self) -> u64 {
        self.elems_processed
    }

    /// Procedural form of the reservoir-sampling update, operating directly on a
    /// caller-owned backing array. `elem_id` is the 0-indexed position of `elem` in
    /// the stream.
    pub fn sample_stateless<R: Rng + ?Sized>(
        elem: T,
        storage: &mut [T],
        capacity: usize,
        elem_id: u64,
        rng: &mut R,
    ) {
        if (elem_id as usize) < capacity {
            storage[elem_id as usize] = elem;
        } else {
            let replace_idx = rng.gen_range(0..=elem_id);
            if (replace_idx as usize) < capacity {
                storage[replace_idx as usize] = elem;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    #[test]
    fn first_r_elements_always_kept_when_stream_matches_capacity() {
        let mut sampler: ReservoirSampler<u32> = ReservoirSampler::new(5);
        let mut rng = StdRng::seed_from_u64(42);
        for i in 0..5 {
            sampler.sample_with_rng(i, &mut rng);
        }
        let mut got: Vec<u32> = sampler.samples().to_vec();
        got.sort_unstable();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
        assert_eq!(sampler.samples_count(), 5);
    }

    #[test]
    fn samples_count_caps_at_capacity() {
        let mut sampler: ReservoirSampler<u32> = ReservoirSampler::new(3);
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..10 {
            sampler.sample_with_rng(i, &mut rng);
        }
        assert_eq!(sampler.samples_count(), 3);
        assert_eq!(sampler.elems_processed(), 10);
    }

    #[test]
    fn first_element_always_lands_at_index_zero() {
        let mut sampler: ReservoirSampler<u32> = ReservoirSampler::new(4);
        let mut rng = StdRng::seed_from_u64(1);
        sampler.sample_with_rng(999, &mut rng);
        assert_eq!(sampler.samples()[0], 999);
    }

    #[test]
    fn inclusion_probability_is_roughly_uniform() {
        // With R=10 samples and N=1000 unique elements, each element should appear
        // in the final reservoir with probability ~R/N across many independent runs.
        const TRIALS: usize = 2000;
        const N: u32 = 1000;
        const R: usize = 10;
        let mut hits: HashMap<u32, u32> = HashMap::new();

        for trial in 0..TRIALS {
            let mut sampler: ReservoirSampler<u32> = ReservoirSampler::new(R);
            let mut rng = StdRng::seed_from_u64(trial as u64);
            for i in 0..N {
                sampler.sample_with_rng(i, &mut rng);
            }
            for &s in sampler.samples() {
                *hits.entry(s).or_insert(0) += 1;
            }
        }

        let expected = TRIALS as f64 * R as f64 / N as f64;
        // Spot-check a handful of elements; allow generous statistical slack.
        for elem in [0u32, 1, 500, 999] {
            let observed = *hits.get(&elem).unwrap_or(&0) as f64;
            assert!(
                (observed - expected).abs() < expected * 2.0 + 5.0,
                "elem {elem}: observed {observed}, expected ~{expected}"
            );
        }
    }
}
