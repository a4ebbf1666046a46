//! Command-line period search for a single light curve.
//!
//! # Usage
//!
//! ```bash
//! # Analyze one file, append the record to periods/<file name>
//! lc-period CRTS_J123456.dat --data-dir ./lightcurves --out-dir periods
//!
//! # Flag outliers with an absolute cutoff, no night averaging
//! lc-period star.dat --policy flag --max-residual 0.25 --no-night-average --no-log
//! ```

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use lc_period::cleaning::{OutlierPolicy, ResidualThreshold};
use lc_period::core::ResultLog;
use lc_period::periodogram::SampleCount;
use lc_period::{analyze_path, AnalysisConfig, Result};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Keep outliers in place but exclude them downstream
    Flag,
    /// Remove outliers from the observation set
    Prune,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SampleCountArg {
    Total,
    Unique,
}

/// Light-curve period search with outlier cleaning and fused periodograms
#[derive(Parser, Debug)]
#[command(name = "lc-period")]
#[command(about = "Find the best period of a light curve (time, magnitude, error columns)")]
#[command(version)]
#[command(group(ArgGroup::new("threshold").args(["sigma", "max_residual"])))]
#[command(group(ArgGroup::new("log").args(["output", "out_dir", "no_log"])))]
struct Args {
    /// Light-curve file
    input: PathBuf,

    /// Directory the input path is relative to
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for the per-object result log, named after the input file
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Explicit result log path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only print the record, do not append it to a log
    #[arg(long)]
    no_log: bool,

    /// What to do with outliers
    #[arg(long, value_enum, default_value = "prune")]
    policy: PolicyArg,

    /// Outlier cutoff in residual standard deviations
    #[arg(long)]
    sigma: Option<f64>,

    /// Outlier cutoff as an absolute residual in magnitudes
    #[arg(long)]
    max_residual: Option<f64>,

    /// LOWESS smoothing fraction
    #[arg(long)]
    fraction: Option<f64>,

    /// Keep individual observations instead of nightly means
    #[arg(long)]
    no_night_average: bool,

    /// Lomb-Scargle frequency oversampling
    #[arg(long)]
    oversampling: Option<f64>,

    /// Phase bins of the variance periodogram
    #[arg(long)]
    bins: Option<usize>,

    /// Sample count used for the variance degrees of freedom
    #[arg(long, value_enum, default_value = "total")]
    sample_count: SampleCountArg,
}

impl Args {
    fn config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::default()
            .with_outlier_policy(match self.policy {
                PolicyArg::Flag => OutlierPolicy::Flag,
                PolicyArg::Prune => OutlierPolicy::Prune,
            })
            .with_night_averaging(!self.no_night_average)
            .with_sample_count(match self.sample_count {
                SampleCountArg::Total => SampleCount::Total,
                SampleCountArg::Unique => SampleCount::Unique,
            });

        if let Some(k) = self.sigma {
            config = config.with_residual_threshold(ResidualThreshold::Sigma(k));
        }
        if let Some(mag) = self.max_residual {
            config = config.with_residual_threshold(ResidualThreshold::Absolute(mag));
        }
        if let Some(fraction) = self.fraction {
            config = config.with_smoothing_fraction(fraction);
        }
        if let Some(oversampling) = self.oversampling {
            config = config.with_oversampling(oversampling);
        }
        if let Some(bins) = self.bins {
            config = config.with_bins(bins);
        }
        config
    }

    fn input_path(&self) -> PathBuf {
        let input = self.input.strip_prefix("./").unwrap_or(&self.input);
        match &self.data_dir {
            Some(dir) => dir.join(input),
            None => input.to_path_buf(),
        }
    }

    fn log_path(&self, input: &Path) -> Option<PathBuf> {
        if self.no_log {
            return None;
        }
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        let dir = self.out_dir.as_ref()?;
        input.file_name().map(|name| dir.join(name))
    }
}

fn run(args: &Args) -> Result<()> {
    let input = args.input_path();
    let result = analyze_path(&input, &args.config())?;

    println!("{}", result.to_record());
    if let Some(log) = args.log_path(&input) {
        ResultLog::append(&log, &result)?;
        tracing::info!(log = %log.display(), "result appended");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
