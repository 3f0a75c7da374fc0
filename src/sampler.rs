//! Geometric sampling: tosses until the first head.
//!
//! A sample is the 1-indexed number of independent Bernoulli(p) trials needed
//! to observe the first success, so
//!
//! \[
//! P(K = k) = (1 - p)^{k - 1} p, \quad k = 1, 2, 3, \dots
//! \]
//!
//! Two methods produce this distribution:
//! - [`SamplingMethod::Direct`]: draw Bernoulli(p) until a success (reference).
//! - [`SamplingMethod::InverseCdf`]: \( k = \lceil \ln U / \ln(1 - p) \rceil \), one uniform per sample.
//!
//! Notes:
//! - Every entrypoint has a `*_with_rng` form so tests can inject the entropy source.
//! - Functions that call `rand::rng()` internally are convenience wrappers and are not
//!   reproducible across processes.

use rand::distr::{Bernoulli, Distribution};
use rand::prelude::*;
use serde::Serialize;

/// Errors raised while sampling.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    /// Success probability outside (0, 1] (or NaN).
    InvalidProbability(f64),
    /// A direct sample needed more than `limit` trials.
    TrialLimitExceeded {
        /// Configured cutoff.
        limit: u64,
    },
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProbability(p) => {
                write!(f, "success probability must lie in (0, 1] (got {p})")
            }
            Self::TrialLimitExceeded { limit } => write!(
                f,
                "no success within {limit} trials; the entropy source looks broken"
            ),
        }
    }
}

impl std::error::Error for SampleError {}

/// How a [`Geometric`] sampler turns entropy into trial counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SamplingMethod {
    /// Toss until the first head.
    #[default]
    Direct,
    /// Invert the geometric CDF from a single uniform draw.
    InverseCdf,
}

/// Check that `p` is a usable success probability.
pub fn check_probability(p: f64) -> Result<f64, SampleError> {
    // NaN fails both comparisons.
    if p > 0.0 && p <= 1.0 {
        Ok(p)
    } else {
        Err(SampleError::InvalidProbability(p))
    }
}

/// A validated geometric sampler.
#[derive(Debug, Clone)]
pub struct Geometric {
    p: f64,
    bernoulli: Bernoulli,
    method: SamplingMethod,
    trial_limit: Option<u64>,
}

impl Geometric {
    /// Create a direct sampler with success probability `p`.
    pub fn new(p: f64) -> Result<Self, SampleError> {
        let p = check_probability(p)?;
        let bernoulli = Bernoulli::new(p).map_err(|_| SampleError::InvalidProbability(p))?;
        Ok(Self {
            p,
            bernoulli,
            method: SamplingMethod::Direct,
            trial_limit: None,
        })
    }

    /// Switch the sampling method.
    pub fn with_method(mut self, method: SamplingMethod) -> Self {
        self.method = method;
        self
    }

    /// Fail direct samples that need more than `limit` trials.
    ///
    /// For any valid `p` the toss loop terminates almost surely, so hitting
    /// the limit means the RNG is not producing independent draws.
    pub fn with_trial_limit(mut self, limit: u64) -> Self {
        self.trial_limit = Some(limit);
        self
    }

    /// Success probability.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Sampling method in use.
    pub fn method(&self) -> SamplingMethod {
        self.method
    }

    /// Configured trial limit, if any.
    pub fn trial_limit(&self) -> Option<u64> {
        self.trial_limit
    }

    /// Draw one outcome using the thread-local RNG.
    pub fn sample(&self) -> Result<u64, SampleError> {
        let mut rng = rand::rng();
        self.sample_with_rng(&mut rng)
    }

    /// Draw one outcome from a caller-supplied RNG.
    #[inline]
    pub fn sample_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u64, SampleError> {
        match self.method {
            SamplingMethod::Direct => self.toss_until_head(rng),
            SamplingMethod::InverseCdf => Ok(self.invert_cdf(rng)),
        }
    }

    /// Endless stream of outcomes drawn from `rng`.
    pub fn sample_iter<'a, R: Rng + ?Sized>(
        &'a self,
        rng: &'a mut R,
    ) -> impl Iterator<Item = Result<u64, SampleError>> + 'a {
        std::iter::repeat_with(move || self.sample_with_rng(&mut *rng))
    }

    fn toss_until_head<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u64, SampleError> {
        let mut tosses = 0u64;
        loop {
            tosses += 1;
            if self.bernoulli.sample(rng) {
                return Ok(tosses);
            }
            if let Some(limit) = self.trial_limit {
                if tosses >= limit {
                    return Err(SampleError::TrialLimitExceeded { limit });
                }
            }
        }
    }

    fn invert_cdf<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        if self.p >= 1.0 {
            return 1;
        }
        // U in (0, 1] keeps ln(U) finite.
        let u = 1.0 - rng.random::<f64>();
        let k = (u.ln() / (-self.p).ln_1p()).ceil();
        if k < 1.0 {
            1
        } else {
            // Saturating float-to-int cast.
            k as u64
        }
    }
}

/// Toss a coin with head probability `p` until the first head, using the thread-local RNG.
pub fn sample(p: f64) -> Result<u64, SampleError> {
    let mut rng = rand::rng();
    sample_with_rng(p, &mut rng)
}

/// [`sample`] with a caller-supplied RNG (for tests/benchmarks).
pub fn sample_with_rng<R: Rng + ?Sized>(p: f64, rng: &mut R) -> Result<u64, SampleError> {
    Geometric::new(p)?.sample_with_rng(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Replays a fixed list of `u64` words, then repeats the last one.
    struct Scripted {
        words: Vec<u64>,
        pos: usize,
    }

    impl Scripted {
        fn new(words: Vec<u64>) -> Self {
            Self { words, pos: 0 }
        }
    }

    impl RngCore for Scripted {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            let w = self.words[self.pos.min(self.words.len() - 1)];
            self.pos += 1;
            w
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            for chunk in dst.chunks_mut(8) {
                let bytes = self.next_u64().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }
    }

    #[test]
    fn success_on_third_draw_gives_three() {
        // Bernoulli(0.5) succeeds when the drawn word is below 2^63.
        let mut rng = Scripted::new(vec![u64::MAX, u64::MAX, 0]);
        assert_eq!(sample_with_rng(0.5, &mut rng), Ok(3));
    }

    #[test]
    fn certain_success_is_always_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for method in [SamplingMethod::Direct, SamplingMethod::InverseCdf] {
            let g = Geometric::new(1.0).unwrap().with_method(method);
            for _ in 0..1_000 {
                assert_eq!(g.sample_with_rng(&mut rng), Ok(1));
            }
        }
    }

    #[test]
    fn rejects_out_of_range_probabilities() {
        for p in [0.0, -0.25, 1.5, f64::NAN, f64::INFINITY] {
            let err = sample(p).expect_err("bad p rejected");
            assert!(matches!(err, SampleError::InvalidProbability(_)), "p={p}");
        }
    }

    #[test]
    fn trial_limit_trips_on_a_stuck_source() {
        let mut rng = Scripted::new(vec![u64::MAX]);
        let g = Geometric::new(0.5).unwrap().with_trial_limit(64);
        assert_eq!(
            g.sample_with_rng(&mut rng),
            Err(SampleError::TrialLimitExceeded { limit: 64 })
        );
    }

    #[test]
    fn outcomes_are_at_least_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for p in [0.01, 0.2, 0.5, 0.9] {
            let g = Geometric::new(p).unwrap();
            for _ in 0..500 {
                assert!(g.sample_with_rng(&mut rng).unwrap() >= 1);
            }
        }
    }

    #[test]
    fn inverse_cdf_matches_direct_mean() {
        let p = 0.3;
        let n = 40_000;
        let expected = 1.0 / p;

        for method in [SamplingMethod::Direct, SamplingMethod::InverseCdf] {
            let g = Geometric::new(p).unwrap().with_method(method);
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            let total: u64 = g
                .sample_iter(&mut rng)
                .take(n)
                .map(|r| r.expect("valid sampler"))
                .sum();
            let mean = total as f64 / n as f64;
            // SE = sqrt((1-p)/p^2 / n) ~= 0.015
            assert!(
                (mean - expected).abs() < 0.1,
                "{method:?}: mean {mean:.4} vs {expected:.4}"
            );
        }
    }
}
