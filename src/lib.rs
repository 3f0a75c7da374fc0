//! `first_head`: coin tosses until the first head.
//!
//! Simulates the number of Bernoulli(p) trials needed for the first success and
//! checks the sample moments against the closed-form geometric distribution.
//!
//! Exposed modules:
//! - `sampler`: geometric sampling (direct toss loop or inverse CDF), injectable RNG.
//! - `stats`: empirical (Bessel-corrected) and theoretical moments, geometric pmf.
//! - `analyze`: run `n` experiments, build the summary record and frequency table.
//! - `parallel`: chunked rayon sampling with one ChaCha8 stream per chunk.
//! - `config`: experiment settings and defaults.
//! - `report`: plain-text rendering.
//!
//! ```
//! use first_head::{analyze_with_rng, Metric};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(0);
//! let analysis = analyze_with_rng(10_000, 0.5, &mut rng)?;
//! assert!(analysis.summary.get(Metric::Mean).difference < 0.1);
//! # Ok::<(), first_head::AnalyzeError>(())
//! ```

#![forbid(unsafe_code)]

pub mod analyze;
pub mod config;
pub mod parallel;
pub mod report;
pub mod sampler;
pub mod stats;

pub use analyze::{
    analyze, analyze_outcomes, analyze_with_rng, Analysis, AnalyzeError, Analyzer,
    FrequencyRow, FrequencyTable, Metric, MetricRow, SummaryRecord,
};
pub use config::{ConfigError, ExperimentConfig};
pub use parallel::sample_parallel;
pub use report::{render_report, Report};
pub use sampler::{sample, sample_with_rng, Geometric, SampleError, SamplingMethod};
pub use stats::{geometric_pmf, Moments};
