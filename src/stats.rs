//! Moments: empirical (from outcomes) and closed-form (geometric).
//!
//! For \( K \sim \mathrm{Geometric}(p) \) on \( \{1, 2, \dots\} \):
//!
//! \[
//! \mathbb{E}[K] = \frac{1}{p}, \qquad \mathrm{Var}[K] = \frac{1 - p}{p^2}
//! \]
//!
//! The empirical variance uses Bessel's correction (divide by \( n - 1 \)).

use serde::Serialize;

/// Mean, variance and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Moments {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl Moments {
    /// Closed-form moments of a geometric distribution with success probability `p`.
    ///
    /// `p` is assumed to lie in (0, 1]; see [`crate::sampler::check_probability`].
    pub fn geometric(p: f64) -> Self {
        let variance = (1.0 - p) / (p * p);
        Self {
            mean: 1.0 / p,
            variance,
            std_dev: variance.sqrt(),
        }
    }

    /// Sample moments of `outcomes` (Bessel-corrected variance).
    ///
    /// Returns `None` for fewer than two outcomes: the corrected variance is undefined there.
    pub fn empirical(outcomes: &[u64]) -> Option<Self> {
        let n = outcomes.len();
        if n < 2 {
            return None;
        }

        let mut acc = Accumulator::new();
        for &x in outcomes {
            acc.add(x as f64);
        }
        let variance = acc.variance()?;
        Some(Self {
            mean: acc.mean(),
            variance,
            std_dev: variance.sqrt(),
        })
    }
}

/// Welford running mean / sum of squared deviations.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    n: usize,
    mean: f64,
    m2: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.n
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Bessel-corrected variance, `None` below two observations.
    pub fn variance(&self) -> Option<f64> {
        if self.n < 2 {
            None
        } else {
            Some(self.m2 / (self.n - 1) as f64)
        }
    }
}

/// Geometric probability mass \( (1 - p)^{k - 1} p \); zero for `k == 0`.
pub fn geometric_pmf(p: f64, k: u64) -> f64 {
    if k == 0 {
        return 0.0;
    }
    // powf keeps huge k from overflowing an i32 exponent.
    (1.0 - p).powf((k - 1) as f64) * p
}
