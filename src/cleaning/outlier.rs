//! Outlier rejection against a LOWESS trend.
//!
//! Magnitudes are compared with a locally smoothed trend of the light curve;
//! points whose residual exceeds the threshold are either flagged or pruned.

use super::lowess::Lowess;
use crate::core::ObservationSet;
use crate::error::{PeriodError, Result};
use crate::utils::stats::population_std;
use tracing::debug;

/// Residual cutoff used to call a point an outlier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResidualThreshold {
    /// Fixed cutoff in magnitudes.
    Absolute(f64),
    /// Multiple of the population standard deviation of the residuals.
    Sigma(f64),
}

impl ResidualThreshold {
    /// Absolute cutoff in magnitudes for residuals with spread `residual_std`.
    pub fn cutoff(&self, residual_std: f64) -> f64 {
        match *self {
            Self::Absolute(mag) => mag,
            Self::Sigma(k) => k * residual_std,
        }
    }
}

impl Default for ResidualThreshold {
    fn default() -> Self {
        Self::Sigma(5.0)
    }
}

/// What happens to detected outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutlierPolicy {
    /// Keep every observation and set its outlier flag.
    Flag,
    /// Physically remove outliers from all columns.
    #[default]
    Prune,
}

/// Summary of one cleaning pass.
#[derive(Debug, Clone)]
pub struct CleaningReport {
    /// `fitted - observed` for each observation that entered the fit.
    pub residuals: Vec<f64>,
    /// Population standard deviation of the residuals.
    pub residual_std: f64,
    /// Absolute residual cutoff that was applied.
    pub cutoff: f64,
    /// Indices (into the set before cleaning) of the rejected observations.
    pub outliers: Vec<usize>,
    /// Policy that was applied.
    pub policy: OutlierPolicy,
}

impl CleaningReport {
    /// Get the number of outliers detected.
    pub fn outlier_count(&self) -> usize {
        self.outliers.len()
    }

    /// Check if a specific index is an outlier.
    pub fn is_outlier(&self, index: usize) -> bool {
        self.outliers.contains(&index)
    }
}

/// LOWESS-based outlier cleaner.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierCleaner {
    smoother: Lowess,
    threshold: ResidualThreshold,
    policy: OutlierPolicy,
}

impl Default for OutlierCleaner {
    fn default() -> Self {
        Self {
            smoother: Lowess::default(),
            threshold: ResidualThreshold::default(),
            policy: OutlierPolicy::default(),
        }
    }
}

impl OutlierCleaner {
    /// Sigma-clipping cleaner: reject `|residual| > k·σ`.
    pub fn sigma(k: f64) -> Self {
        Self::default().with_threshold(ResidualThreshold::Sigma(k))
    }

    /// Fixed-cutoff cleaner: reject `|residual| > mag`.
    pub fn absolute(mag: f64) -> Self {
        Self::default().with_threshold(ResidualThreshold::Absolute(mag))
    }

    /// Set the LOWESS neighbourhood fraction.
    pub fn with_fraction(mut self, fraction: f64) -> Self {
        self.smoother = self.smoother.with_fraction(fraction);
        self
    }

    /// Replace the smoother entirely.
    pub fn with_smoother(mut self, smoother: Lowess) -> Self {
        self.smoother = smoother;
        self
    }

    pub fn with_threshold(mut self, threshold: ResidualThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_policy(mut self, policy: OutlierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn threshold(&self) -> ResidualThreshold {
        self.threshold
    }

    pub fn policy(&self) -> OutlierPolicy {
        self.policy
    }

    pub fn smoother(&self) -> &Lowess {
        &self.smoother
    }

    /// Detect outliers in `obs` and apply the configured policy in place.
    ///
    /// Observations already flagged are left out of the fit and stay flagged,
    /// so flag-mode cleaning can be repeated.
    ///
    /// # Errors
    /// [`PeriodError::InsufficientData`] when the local regression cannot be
    /// fitted; the set is unchanged then.
    pub fn clean(&self, obs: &mut ObservationSet) -> Result<CleaningReport> {
        let (ResidualThreshold::Absolute(limit) | ResidualThreshold::Sigma(limit)) = self.threshold;
        if !(limit > 0.0) {
            return Err(PeriodError::InvalidParameter(format!(
                "outlier threshold must be positive, got {}",
                limit
            )));
        }

        let indices: Vec<usize> = obs.retained_indices().collect();
        let x: Vec<f64> = indices.iter().map(|&i| obs.times()[i]).collect();
        let y: Vec<f64> = indices.iter().map(|&i| obs.magnitudes()[i]).collect();

        let residuals = self.smoother.residuals(&x, &y)?;
        let residual_std = population_std(&residuals);
        let cutoff = self.threshold.cutoff(residual_std);

        let outliers: Vec<usize> = indices
            .iter()
            .zip(&residuals)
            .filter(|(_, r)| r.abs() > cutoff)
            .map(|(&i, _)| i)
            .collect();

        debug!(
            fitted = indices.len(),
            outliers = outliers.len(),
            residual_std,
            cutoff,
            policy = ?self.policy,
            "outlier cleaning"
        );

        let mut flags = obs.outlier_flags().to_vec();
        for &i in &outliers {
            flags[i] = true;
        }

        match self.policy {
            OutlierPolicy::Flag => obs.set_outlier_flags(flags)?,
            OutlierPolicy::Prune => {
                let keep: Vec<usize> = (0..obs.len()).filter(|&i| !flags[i]).collect();
                let times = keep.iter().map(|&i| obs.times()[i]).collect();
                let magnitudes = keep.iter().map(|&i| obs.magnitudes()[i]).collect();
                let errors = keep.iter().map(|&i| obs.errors()[i]).collect();
                obs.replace(times, magnitudes, errors, vec![false; keep.len()])?;
            }
        }

        Ok(CleaningReport {
            residuals,
            residual_std,
            cutoff,
            outliers,
            policy: self.policy,
        })
    }
}
