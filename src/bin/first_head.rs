use clap::{Parser, ValueEnum};
use first_head::config::{DEFAULT_CHUNK_SIZE, DEFAULT_DISPLAY_LIMIT, DEFAULT_P, DEFAULT_TRIALS};
use first_head::{render_report, Analyzer, ExperimentConfig, SamplingMethod};
use log::{debug, LevelFilter};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    /// Toss until the first head.
    Direct,
    /// Invert the geometric CDF.
    InverseCdf,
}

impl From<Method> for SamplingMethod {
    fn from(m: Method) -> Self {
        match m {
            Method::Direct => SamplingMethod::Direct,
            Method::InverseCdf => SamplingMethod::InverseCdf,
        }
    }
}

/// Toss a coin until the first head, many times, and compare with the geometric distribution.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Number of experiments.
    #[arg(short = 'n', long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,

    /// Head probability, in (0, 1].
    #[arg(short, long = "prob", default_value_t = DEFAULT_P)]
    p: f64,

    /// Seed for a reproducible run.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of smallest outcome values shown.
    #[arg(long, default_value_t = DEFAULT_DISPLAY_LIMIT)]
    top: usize,

    #[arg(long, value_enum, default_value_t = Method::Direct)]
    method: Method,

    /// Sample on all cores.
    #[arg(long)]
    parallel: bool,

    /// Samples per parallel chunk.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Give up on a sample after this many tosses.
    #[arg(long)]
    max_tosses: Option<u64>,

    /// Print JSON instead of tables.
    #[arg(long)]
    json: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> ExperimentConfig {
        ExperimentConfig {
            trials: self.trials,
            p: self.p,
            seed: self.seed,
            display_limit: self.top,
            method: self.method.into(),
            parallel: self.parallel,
            chunk_size: self.chunk_size,
            trial_limit: self.max_tosses,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    debug!("{args:?}");

    let analyzer = Analyzer::new(args.config())?;
    let analysis = analyzer.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render_report(&analysis));
    }

    Ok(())
}
