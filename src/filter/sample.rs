use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{
    Binomial,
    Distribution,
};

use crate::data_structs::Read;
use crate::error::{
    Result,
    ViewError,
};

/// Mixing constant used to derive independent per-stream seeds.
const STREAM_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Checks that `rate` is a probability.
pub fn validate_rate(rate: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ViewError::InvalidSampleRate(rate))
    }
}

/// Seed for stream `stream` derived from a base seed.
pub fn stream_seed(
    seed: u64,
    stream: u64,
) -> u64 {
    seed ^ stream.wrapping_add(1).wrapping_mul(STREAM_SEED_MIX)
}

/// Binomial thinning of read counts: each of the `count` observations is
/// kept with probability `rate`. Reads left with no observation are
/// dropped.
#[derive(Debug, Clone)]
pub struct ReadSampler {
    rate: f64,
    rng:  StdRng,
}

impl ReadSampler {
    pub fn new(
        rate: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        let rate = validate_rate(rate)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { rate, rng })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn sample_count(
        &mut self,
        count: u64,
    ) -> u64 {
        // Degenerate rates are exact and never touch the rng.
        if self.rate >= 1.0 {
            return count;
        }
        if self.rate <= 0.0 || count == 0 {
            return 0;
        }
        match Binomial::new(count, self.rate) {
            Ok(binomial) => binomial.sample(&mut self.rng),
            Err(_) => count,
        }
    }

    pub fn apply(
        &mut self,
        reads: Vec<Read>,
    ) -> Vec<Read> {
        reads
            .into_iter()
            .filter_map(|mut read| {
                read.count = self.sample_count(read.count);
                (read.count > 0).then_some(read)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rstest::rstest;

    use super::*;

    fn reads() -> Vec<Read> {
        (1..=50)
            .map(|i| Read::new("chr1", i, "CT", i))
            .collect()
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_invalid_rate(#[case] rate: f64) {
        assert!(matches!(
            ReadSampler::new(rate, None),
            Err(ViewError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_rate_one_conserves_counts() {
        let mut sampler = ReadSampler::new(1.0, Some(1)).unwrap();
        assert_eq!(sampler.apply(reads()), reads());
    }

    #[test]
    fn test_rate_zero_drops_all() {
        let mut sampler = ReadSampler::new(0.0, Some(1)).unwrap();
        assert!(sampler.apply(reads()).is_empty());
    }

    #[test]
    fn test_same_seed_reproducible() {
        let first = ReadSampler::new(0.3, Some(42)).unwrap().apply(reads());
        let second = ReadSampler::new(0.3, Some(42)).unwrap().apply(reads());
        assert_eq!(first, second);
    }

    #[test]
    fn test_counts_never_grow() {
        let mut sampler = ReadSampler::new(0.5, Some(7)).unwrap();
        let original = reads();
        for read in sampler.apply(original.clone()) {
            let source = original.iter().find(|r| r.start == read.start).unwrap();
            assert!(read.count <= source.count);
        }
    }

    #[test]
    fn test_mean_converges() {
        let rate = 0.3;
        let count = 20u64;
        let trials = 20_000;
        let mut sampler = ReadSampler::new(rate, Some(2024)).unwrap();
        let total: u64 = (0..trials).map(|_| sampler.sample_count(count)).sum();
        let mean = total as f64 / trials as f64;
        // sd of the mean is sqrt(20 * 0.3 * 0.7 / 20000) ~ 0.015
        assert_approx_eq!(mean, count as f64 * rate, 0.1);
    }

    #[test]
    fn test_stream_seeds_differ() {
        assert_ne!(stream_seed(1, 0), stream_seed(1, 1));
        assert_eq!(stream_seed(1, 5), stream_seed(1, 5));
    }
}
