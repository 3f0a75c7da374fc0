//! Experiment configuration.

use serde::Serialize;

use crate::sampler::{check_probability, SampleError, SamplingMethod};

/// Default number of simulated experiments.
pub const DEFAULT_TRIALS: usize = 50_000;
/// Default head probability (fair coin).
pub const DEFAULT_P: f64 = 0.5;
/// Default number of frequency rows shown.
pub const DEFAULT_DISPLAY_LIMIT: usize = 10;
/// Default samples per parallel chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4_096;

/// Errors for invalid experiment settings.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Parallel chunks must hold at least one sample.
    ZeroChunkSize,
    /// At least one frequency row must be shown.
    ZeroDisplayLimit,
    /// A trial limit of zero would reject every sample.
    ZeroTrialLimit,
    /// Invalid head probability.
    Probability(SampleError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroChunkSize => write!(f, "chunk size must be > 0"),
            Self::ZeroDisplayLimit => write!(f, "display limit must be > 0"),
            Self::ZeroTrialLimit => write!(f, "trial limit must be > 0"),
            Self::Probability(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Probability(e) => Some(e),
            _ => None,
        }
    }
}

/// Settings for one simulation run.
///
/// Trial-count validation (`n > 1`) happens in the analyzer so that direct
/// callers of [`crate::analyze`] get the same errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentConfig {
    /// Number of experiments (samples) to run.
    pub trials: usize,
    /// Head probability.
    pub p: f64,
    /// Seed for a reproducible ChaCha8 stream; `None` uses the thread RNG.
    pub seed: Option<u64>,
    /// Number of smallest outcome values shown in the frequency table.
    pub display_limit: usize,
    /// Sampling method.
    pub method: SamplingMethod,
    /// Spread sampling over rayon workers.
    pub parallel: bool,
    /// Samples per parallel chunk (each chunk owns an RNG stream).
    pub chunk_size: usize,
    /// Optional cutoff on tosses per sample.
    pub trial_limit: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            p: DEFAULT_P,
            seed: None,
            display_limit: DEFAULT_DISPLAY_LIMIT,
            method: SamplingMethod::Direct,
            parallel: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            trial_limit: None,
        }
    }
}

impl ExperimentConfig {
    pub fn new(trials: usize, p: f64) -> Self {
        Self {
            trials,
            p,
            ..Self::default()
        }
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_method(mut self, method: SamplingMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_display_limit(mut self, limit: usize) -> Self {
        self.display_limit = limit;
        self
    }

    /// Enable parallel sampling with `chunk_size` samples per chunk.
    pub fn with_parallel(mut self, chunk_size: usize) -> Self {
        self.parallel = true;
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_trial_limit(mut self, limit: u64) -> Self {
        self.trial_limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability(self.p).map_err(ConfigError::Probability)?;
        if self.display_limit == 0 {
            return Err(ConfigError::ZeroDisplayLimit);
        }
        if self.parallel && self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.trial_limit == Some(0) {
            return Err(ConfigError::ZeroTrialLimit);
        }
        Ok(())
    }
}
