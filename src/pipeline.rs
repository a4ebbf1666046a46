//! The period-search pipeline.
//!
//! Fixed order: outlier cleaning, optional night averaging, Lomb-Scargle,
//! phase variance on the Lomb-Scargle grid, alignment, fusion.

use crate::cleaning::{average_nights, OutlierCleaner, OutlierPolicy, ResidualThreshold};
use crate::core::{AnalysisResult, ObservationSet};
use crate::error::{PeriodError, Result};
use crate::periodogram::{align, FrequencyGrid, LombScargle, PhaseVariance, SampleCount};
use std::path::Path;
use tracing::{debug, info};

/// Configuration of a full analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Outlier cleaning against the LOWESS trend.
    pub cleaner: OutlierCleaner,
    /// Collapse same-night observations before the periodograms.
    pub night_averaging: bool,
    /// Lomb-Scargle grid settings.
    pub lomb_scargle: LombScargle,
    /// Phase-variance settings.
    pub phase_variance: PhaseVariance,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cleaner: OutlierCleaner::default(),
            night_averaging: true,
            lomb_scargle: LombScargle::default(),
            phase_variance: PhaseVariance::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cleaner(mut self, cleaner: OutlierCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn with_outlier_policy(mut self, policy: OutlierPolicy) -> Self {
        self.cleaner = self.cleaner.with_policy(policy);
        self
    }

    pub fn with_residual_threshold(mut self, threshold: ResidualThreshold) -> Self {
        self.cleaner = self.cleaner.with_threshold(threshold);
        self
    }

    pub fn with_smoothing_fraction(mut self, fraction: f64) -> Self {
        self.cleaner = self.cleaner.with_fraction(fraction);
        self
    }

    pub fn with_night_averaging(mut self, enabled: bool) -> Self {
        self.night_averaging = enabled;
        self
    }

    pub fn with_oversampling(mut self, oversampling: f64) -> Self {
        self.lomb_scargle = self.lomb_scargle.with_oversampling(oversampling);
        self
    }

    pub fn with_nyquist_factor(mut self, factor: f64) -> Self {
        self.lomb_scargle = self.lomb_scargle.with_nyquist_factor(factor);
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.phase_variance = self.phase_variance.with_bins(bins);
        self
    }

    pub fn with_sample_count(mut self, sample_count: SampleCount) -> Self {
        self.phase_variance = self.phase_variance.with_sample_count(sample_count);
        self
    }
}

/// Analyze one light curve.
///
/// `source` identifies the light curve in the result. The observation set is
/// consumed: cleaning and averaging rewrite it along the way.
///
/// # Errors
/// Any stage error is returned unchanged; there is no partial result.
pub fn analyze(
    source: impl Into<String>,
    mut observations: ObservationSet,
    config: &AnalysisConfig,
) -> Result<AnalysisResult> {
    let source = source.into();
    let total_count = observations.len();

    let report = config.cleaner.clean(&mut observations)?;
    let retained_count = observations.retained_count();
    debug!(
        source = %source,
        total_count,
        retained_count,
        outliers = report.outlier_count(),
        span = observations.time_span(),
        "cleaned"
    );

    if config.night_averaging {
        average_nights(&mut observations)?;
    }

    let (times, magnitudes, errors) = observations.retained();
    let periodogram_count = times.len();

    let lomb_scargle = config.lomb_scargle.periodogram(&times, &magnitudes, &errors)?;
    let grid = FrequencyGrid::from_periods(&lomb_scargle.periods(), periodogram_count)?;
    debug!(
        fr0 = grid.fr0,
        fstep = grid.fstep,
        fstop = grid.fstop,
        even = periodogram_count.is_multiple_of(2),
        "phase variance grid"
    );
    let aov = config
        .phase_variance
        .periodogram(&times, &magnitudes, &errors, &grid)?;

    let aligned = align(&lomb_scargle, &aov.periodogram)?;
    let selection = aligned.fuse()?;

    let result = AnalysisResult {
        source,
        total_count,
        retained_count,
        periodogram_count,
        best_period: selection.best_period,
        best_frequency: selection.best_frequency,
        significance: selection.significance,
        aov_peak: aov.peak,
        grid_len: aligned.len(),
    };

    info!(
        source = %result.source,
        best_period = result.best_period,
        significance = result.significance,
        "period found"
    );
    Ok(result)
}

/// Load a light curve file and analyze it; the file name is the source id.
pub fn analyze_path(path: impl AsRef<Path>, config: &AnalysisConfig) -> Result<AnalysisResult> {
    let path = path.as_ref();
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            PeriodError::InvalidParameter(format!("not a file path: {}", path.display()))
        })?;
    let observations = ObservationSet::from_path(path)?;
    analyze(source, observations, config)
}
