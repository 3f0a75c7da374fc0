//! Simulation analysis: run the sampler `n` times and compare against theory.
//!
//! An [`Analysis`] holds three things:
//! - the outcome sequence (immutable once produced),
//! - a [`SummaryRecord`]: theoretical vs. simulated mean / variance / std, with absolute differences,
//! - a [`FrequencyTable`]: empirical relative frequency vs. geometric pmf for every distinct outcome,
//!   of which the smallest `display_limit` values are shown.
//!
//! Rendering is left to [`crate::report`].

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::{ConfigError, ExperimentConfig, DEFAULT_DISPLAY_LIMIT};
use crate::parallel::sample_parallel;
use crate::sampler::{check_probability, Geometric, SampleError};
use crate::stats::{geometric_pmf, Moments};

/// Errors for analysis runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeError {
    /// `n == 0`.
    NoTrials,
    /// Fewer than two trials: the corrected variance is undefined.
    TooFewTrials(usize),
    /// A supplied outcome was 0 (outcomes count trials and start at 1).
    ZeroOutcome {
        /// Position in the outcome sequence.
        index: usize,
    },
    /// Sampler failure (invalid `p`, trial limit).
    Sample(SampleError),
    /// Invalid experiment settings.
    Config(ConfigError),
}

impl std::fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTrials => write!(f, "number of trials must be > 0"),
            Self::TooFewTrials(n) => {
                write!(f, "sample variance needs at least 2 trials (got {n})")
            }
            Self::ZeroOutcome { index } => {
                write!(f, "outcome at index {index} is 0; outcomes must be >= 1")
            }
            Self::Sample(e) => write!(f, "sampling failed: {e}"),
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for AnalyzeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sample(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SampleError> for AnalyzeError {
    fn from(e: SampleError) -> Self {
        Self::Sample(e)
    }
}

impl From<ConfigError> for AnalyzeError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Probability(e) => Self::Sample(e),
            e => Self::Config(e),
        }
    }
}

/// Summary metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    Mean,
    Variance,
    StdDev,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::Variance => "Variance",
            Self::StdDev => "Standard Deviation",
        }
    }
}

/// One line of the summary record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricRow {
    pub metric: Metric,
    pub theoretical: f64,
    pub simulated: f64,
    /// `|simulated - theoretical|`
    pub difference: f64,
}

impl MetricRow {
    fn new(metric: Metric, theoretical: f64, simulated: f64) -> Self {
        Self {
            metric,
            theoretical,
            simulated,
            difference: (simulated - theoretical).abs(),
        }
    }
}

/// Theoretical vs. simulated moments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub theoretical: Moments,
    pub simulated: Moments,
    pub rows: [MetricRow; 3],
}

impl SummaryRecord {
    pub fn new(theoretical: Moments, simulated: Moments) -> Self {
        let rows = [
            MetricRow::new(Metric::Mean, theoretical.mean, simulated.mean),
            MetricRow::new(Metric::Variance, theoretical.variance, simulated.variance),
            MetricRow::new(Metric::StdDev, theoretical.std_dev, simulated.std_dev),
        ];
        Self {
            theoretical,
            simulated,
            rows,
        }
    }

    pub fn get(&self, metric: Metric) -> &MetricRow {
        match metric {
            Metric::Mean => &self.rows[0],
            Metric::Variance => &self.rows[1],
            Metric::StdDev => &self.rows[2],
        }
    }
}

/// Frequency of one distinct outcome value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub value: u64,
    pub count: usize,
    /// `count / n`
    pub empirical: f64,
    /// \( (1 - p)^{k - 1} p \)
    pub theoretical: f64,
}

/// Frequencies of all distinct outcomes, ascending by value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    total: usize,
    rows: Vec<FrequencyRow>,
}

impl FrequencyTable {
    pub fn from_outcomes(outcomes: &[u64], p: f64) -> Self {
        let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
        for &k in outcomes {
            *counts.entry(k).or_insert(0) += 1;
        }

        let total = outcomes.len();
        let rows = counts
            .into_iter()
            .map(|(value, count)| FrequencyRow {
                value,
                count,
                empirical: count as f64 / total as f64,
                theoretical: geometric_pmf(p, value),
            })
            .collect();

        Self { total, rows }
    }

    /// Number of outcomes tabulated.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Every distinct value.
    pub fn rows(&self) -> &[FrequencyRow] {
        &self.rows
    }

    /// The `limit` smallest distinct values.
    pub fn smallest(&self, limit: usize) -> &[FrequencyRow] {
        &self.rows[..limit.min(self.rows.len())]
    }

    /// Sum of empirical frequencies over all values (1.0 up to rounding).
    pub fn empirical_total(&self) -> f64 {
        self.rows.iter().map(|r| r.empirical).sum()
    }

    /// Largest `|empirical - theoretical|` among the `limit` smallest values.
    pub fn max_deviation(&self, limit: usize) -> f64 {
        self.smallest(limit)
            .iter()
            .map(|r| (r.empirical - r.theoretical).abs())
            .fold(0.0, f64::max)
    }
}

/// Result of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub p: f64,
    pub trials: usize,
    #[serde(skip_serializing)]
    outcomes: Vec<u64>,
    pub summary: SummaryRecord,
    pub frequencies: FrequencyTable,
    pub display_limit: usize,
}

impl Analysis {
    /// The outcome sequence, in sampling order.
    pub fn outcomes(&self) -> &[u64] {
        &self.outcomes
    }

    /// Rows shown in the frequency table.
    pub fn displayed_frequencies(&self) -> &[FrequencyRow] {
        self.frequencies.smallest(self.display_limit)
    }

    /// Take ownership of the outcome sequence.
    pub fn into_outcomes(self) -> Vec<u64> {
        self.outcomes
    }
}

fn check_trials(n: usize) -> Result<(), AnalyzeError> {
    match n {
        0 => Err(AnalyzeError::NoTrials),
        1 => Err(AnalyzeError::TooFewTrials(1)),
        _ => Ok(()),
    }
}

/// Analyze a given outcome sequence against Geometric(`p`).
pub fn analyze_outcomes(outcomes: Vec<u64>, p: f64) -> Result<Analysis, AnalyzeError> {
    let p = check_probability(p)?;
    check_trials(outcomes.len())?;
    if let Some(index) = outcomes.iter().position(|&k| k == 0) {
        return Err(AnalyzeError::ZeroOutcome { index });
    }
    Ok(build(outcomes, p, DEFAULT_DISPLAY_LIMIT))
}

/// Run `n` experiments with head probability `p`, using the thread-local RNG.
pub fn analyze(n: usize, p: f64) -> Result<Analysis, AnalyzeError> {
    let mut rng = rand::rng();
    analyze_with_rng(n, p, &mut rng)
}

/// [`analyze`] with a caller-supplied RNG.
pub fn analyze_with_rng<R: Rng + ?Sized>(
    n: usize,
    p: f64,
    rng: &mut R,
) -> Result<Analysis, AnalyzeError> {
    check_trials(n)?;
    let sampler = Geometric::new(p)?;
    let outcomes = draw(&sampler, n, rng)?;
    Ok(build(outcomes, p, DEFAULT_DISPLAY_LIMIT))
}

fn draw<R: Rng + ?Sized>(
    sampler: &Geometric,
    n: usize,
    rng: &mut R,
) -> Result<Vec<u64>, SampleError> {
    sampler.sample_iter(rng).take(n).collect()
}

fn build(outcomes: Vec<u64>, p: f64, display_limit: usize) -> Analysis {
    let theoretical = Moments::geometric(p);
    // Callers have checked n >= 2.
    let simulated = Moments::empirical(&outcomes).unwrap_or(Moments {
        mean: f64::NAN,
        variance: f64::NAN,
        std_dev: f64::NAN,
    });
    let frequencies = FrequencyTable::from_outcomes(&outcomes, p);

    Analysis {
        p,
        trials: outcomes.len(),
        outcomes,
        summary: SummaryRecord::new(theoretical, simulated),
        frequencies,
        display_limit,
    }
}

/// Configured simulation driver.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: ExperimentConfig,
    sampler: Geometric,
}

impl Analyzer {
    pub fn new(config: ExperimentConfig) -> Result<Self, AnalyzeError> {
        config.validate()?;
        check_trials(config.trials)?;

        let mut sampler = Geometric::new(config.p)?.with_method(config.method);
        if let Some(limit) = config.trial_limit {
            sampler = sampler.with_trial_limit(limit);
        }
        Ok(Self { config, sampler })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run the experiment.
    ///
    /// A configured seed makes the run reproducible; without one, entropy comes
    /// from the thread RNG (parallel runs draw their base seed from it).
    pub fn run(&self) -> Result<Analysis, AnalyzeError> {
        let cfg = &self.config;
        debug!(
            "running {} trials (p={}, method={:?}, seed={:?}, parallel={})",
            cfg.trials, cfg.p, cfg.method, cfg.seed, cfg.parallel
        );

        let outcomes = if cfg.parallel {
            let seed = cfg.seed.unwrap_or_else(|| rand::rng().random());
            sample_parallel(&self.sampler, cfg.trials, seed, cfg.chunk_size)?
        } else {
            match cfg.seed {
                Some(seed) => {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    draw(&self.sampler, cfg.trials, &mut rng)?
                }
                None => draw(&self.sampler, cfg.trials, &mut rand::rng())?,
            }
        };

        Ok(self.finish(outcomes))
    }

    /// Run the experiment sequentially on a caller-supplied RNG.
    pub fn run_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Analysis, AnalyzeError> {
        let outcomes = draw(&self.sampler, self.config.trials, rng)?;
        Ok(self.finish(outcomes))
    }

    fn finish(&self, outcomes: Vec<u64>) -> Analysis {
        let analysis = build(outcomes, self.config.p, self.config.display_limit);

        let mean = analysis.summary.get(Metric::Mean);
        // Four standard errors of the mean.
        let tolerance =
            4.0 * analysis.summary.theoretical.std_dev / (analysis.trials as f64).sqrt();
        if mean.difference > tolerance {
            warn!(
                "simulated mean {:.4} is {:.4} from theory (> {:.4}); check the entropy source",
                mean.simulated, mean.difference, tolerance
            );
        }
        info!(
            "{} trials done: mean {:.4} (theory {:.4}), {} distinct outcomes",
            analysis.trials,
            mean.simulated,
            mean.theoretical,
            analysis.frequencies.rows().len()
        );
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::SamplingMethod;

    #[test]
    fn contrived_outcomes_match_theory() {
        let a = analyze_outcomes(vec![1, 2, 1, 4], 0.5).expect("valid outcomes");
        let s = &a.summary;
        assert!((s.get(Metric::Mean).simulated - 2.0).abs() < 1e-12);
        assert!((s.get(Metric::Variance).simulated - 2.0).abs() < 1e-12);
        assert!((s.get(Metric::StdDev).simulated - 2.0_f64.sqrt()).abs() < 1e-12);
        for row in &s.rows {
            assert!(row.difference < 1e-12, "{row:?}");
        }
    }

    #[test]
    fn contrived_frequency_table() {
        let a = analyze_outcomes(vec![1, 2, 1, 4], 0.5).unwrap();
        let rows = a.displayed_frequencies();
        let values: Vec<u64> = rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1, 2, 4]);
        assert_eq!(rows[0].count, 2);
        assert!((rows[0].empirical - 0.5).abs() < 1e-12);
        assert!((rows[0].theoretical - 0.5).abs() < 1e-12);
        assert!((rows[2].theoretical - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_arguments() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(analyze_with_rng(0, 0.5, &mut rng), Err(AnalyzeError::NoTrials));
        assert_eq!(analyze_with_rng(1, 0.5, &mut rng), Err(AnalyzeError::TooFewTrials(1)));
        assert!(matches!(
            analyze_with_rng(10, 0.0, &mut rng),
            Err(AnalyzeError::Sample(SampleError::InvalidProbability(_)))
        ));
        assert_eq!(
            analyze_outcomes(vec![1, 0, 3], 0.5),
            Err(AnalyzeError::ZeroOutcome { index: 1 })
        );
    }

    #[test]
    fn display_limit_caps_rows() {
        let outcomes: Vec<u64> = (1..=30).collect();
        let a = analyze_outcomes(outcomes, 0.5).unwrap();
        assert_eq!(a.frequencies.rows().len(), 30);
        assert_eq!(a.displayed_frequencies().len(), 10);
        assert_eq!(a.displayed_frequencies().last().map(|r| r.value), Some(10));
    }

    #[test]
    fn full_table_frequencies_sum_to_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let a = analyze_with_rng(5_000, 0.2, &mut rng).unwrap();
        assert_eq!(a.frequencies.total(), 5_000);
        assert!((a.frequencies.empirical_total() - 1.0).abs() < 1e-9);
        let counted: usize = a.frequencies.rows().iter().map(|r| r.count).sum();
        assert_eq!(counted, 5_000);
    }

    #[test]
    fn seeded_analyzer_is_reproducible() {
        let cfg = ExperimentConfig::new(2_000, 0.5).with_seed(99);
        let a = Analyzer::new(cfg.clone()).unwrap().run().unwrap();
        let b = Analyzer::new(cfg).unwrap().run().unwrap();
        assert_eq!(a.outcomes(), b.outcomes());

        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let c = analyze_with_rng(2_000, 0.5, &mut rng).unwrap();
        assert_eq!(a.outcomes(), c.outcomes());
    }

    #[test]
    fn analyzer_rejects_bad_config() {
        assert_eq!(
            Analyzer::new(ExperimentConfig::new(0, 0.5)).err(),
            Some(AnalyzeError::NoTrials)
        );
        assert!(matches!(
            Analyzer::new(ExperimentConfig::new(10, 1.5)).err(),
            Some(AnalyzeError::Sample(SampleError::InvalidProbability(_)))
        ));
        assert_eq!(
            Analyzer::new(ExperimentConfig::new(10, 0.5).with_parallel(0)).err(),
            Some(AnalyzeError::Config(ConfigError::ZeroChunkSize))
        );
    }

    #[test]
    fn analyzer_honours_method_and_display_limit() {
        let cfg = ExperimentConfig::new(20_000, 0.25)
            .with_method(SamplingMethod::InverseCdf)
            .with_display_limit(5);
        let analyzer = Analyzer::new(cfg).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let a = analyzer.run_with_rng(&mut rng).unwrap();

        assert_eq!(a.displayed_frequencies().len(), 5);
        assert_eq!(a.summary.theoretical.mean, 4.0);
        // SE of the mean is sqrt(12 / 20_000) ~= 0.025.
        assert!(a.summary.get(Metric::Mean).difference < 0.15);
    }

    #[test]
    fn parallel_run_converges() {
        let cfg = ExperimentConfig::new(50_000, 0.5)
            .with_seed(1)
            .with_parallel(1_024);
        let a = Analyzer::new(cfg).unwrap().run().unwrap();
        assert_eq!(a.outcomes().len(), 50_000);
        // SE of the mean is sqrt(2 / 50_000) ~= 0.0063.
        assert!(a.summary.get(Metric::Mean).difference < 0.05);
    }
}
