//! Multiplicative fusion of two periodograms and best-period selection.
//!
//! The combined statistic is the sample-by-sample product of Lomb-Scargle
//! power and the phase-variance statistic, so a frequency only scores high
//! when both methods see signal there. The significance of the peak is its
//! distance above the median of the combined array in units of the array's
//! population standard deviation; the peak itself is included in both.

use super::grid::AlignedPeriodograms;
use crate::error::{PeriodError, Result};
use crate::utils::stats::{argmax, median, population_std};

/// Best period picked from a combined periodogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub best_index: usize,
    pub best_frequency: f64,
    pub best_period: f64,
    pub significance: f64,
    /// Combined statistic at the peak.
    pub peak_value: f64,
    pub median: f64,
    pub std: f64,
    /// The full combined periodogram.
    pub combined: Vec<f64>,
}

/// Fuse two aligned periodograms and select the best period.
///
/// # Errors
/// - [`PeriodError::GridMismatch`] if the three slices differ in length.
/// - [`PeriodError::DegenerateSignal`] if the combined periodogram is flat or
///   not finite.
pub fn fuse(frequencies: &[f64], power: &[f64], statistic: &[f64]) -> Result<Selection> {
    if power.len() != frequencies.len() {
        return Err(PeriodError::GridMismatch {
            expected: frequencies.len(),
            got: power.len(),
        });
    }
    if statistic.len() != power.len() {
        return Err(PeriodError::GridMismatch {
            expected: power.len(),
            got: statistic.len(),
        });
    }

    let combined: Vec<f64> = power.iter().zip(statistic).map(|(p, s)| p * s).collect();
    select(frequencies, &combined)
}

/// Select the best period from an already combined periodogram.
pub fn select(frequencies: &[f64], combined: &[f64]) -> Result<Selection> {
    if combined.len() != frequencies.len() {
        return Err(PeriodError::GridMismatch {
            expected: frequencies.len(),
            got: combined.len(),
        });
    }
    if combined.is_empty() {
        return Err(PeriodError::InsufficientData { needed: 1, got: 0 });
    }
    if combined.iter().any(|v| !v.is_finite()) {
        return Err(PeriodError::DegenerateSignal(
            "combined periodogram has non-finite values".to_string(),
        ));
    }

    let std = population_std(combined);
    if !(std > 0.0) {
        return Err(PeriodError::DegenerateSignal(
            "combined periodogram has zero standard deviation".to_string(),
        ));
    }

    let best_index = argmax(combined).ok_or_else(|| {
        PeriodError::DegenerateSignal("combined periodogram has no maximum".to_string())
    })?;
    let best_frequency = frequencies[best_index];
    if !(best_frequency > 0.0) {
        return Err(PeriodError::InvalidParameter(format!(
            "best frequency must be positive, got {}",
            best_frequency
        )));
    }

    let median = median(combined);
    let peak_value = combined[best_index];

    Ok(Selection {
        best_index,
        best_frequency,
        best_period: 1.0 / best_frequency,
        significance: (peak_value - median) / std,
        peak_value,
        median,
        std,
        combined: combined.to_vec(),
    })
}

impl AlignedPeriodograms {
    /// Fuse the aligned arrays; see [`fuse`].
    pub fn fuse(&self) -> Result<Selection> {
        fuse(&self.frequencies, &self.power, &self.statistic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FREQS: [f64; 6] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];

    #[test]
    fn single_peak_scenario() {
        let selection = select(&FREQS, &[1.0, 1.0, 1.0, 9.0, 1.0, 1.0]).unwrap();

        assert_eq!(selection.best_index, 3);
        assert_relative_eq!(selection.best_period, 2.5, epsilon = 1e-12);
        assert_relative_eq!(selection.median, 1.0, epsilon = 1e-12);
        // Population std of the array is sqrt(80/9).
        assert_relative_eq!(selection.std, (80.0_f64 / 9.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            selection.significance,
            8.0 / (80.0_f64 / 9.0).sqrt(),
            epsilon = 1e-12
        );
        assert!((selection.significance - 2.64).abs() < 0.05);
    }

    #[test]
    fn flat_combined_is_degenerate() {
        let err = select(&[0.1, 0.2, 0.3, 0.4], &[5.0, 5.0, 5.0, 5.0]).unwrap_err();
        assert!(matches!(err, PeriodError::DegenerateSignal(_)));
    }

    #[test]
    fn non_finite_combined_is_degenerate() {
        let err = select(&[0.1, 0.2], &[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, PeriodError::DegenerateSignal(_)));
    }

    #[test]
    fn fuse_multiplies_elementwise() {
        let power = [0.1, 0.2, 0.9, 0.2, 0.1, 0.1];
        let statistic = [1.0, 2.0, 10.0, 1.0, 30.0, 1.0];
        let selection = fuse(&FREQS, &power, &statistic).unwrap();

        assert_eq!(selection.combined, vec![0.1, 0.4, 9.0, 0.2, 3.0, 0.1]);
        assert_eq!(selection.best_index, 2);
        assert_relative_eq!(selection.best_period, 1.0 / 0.3, epsilon = 1e-12);
    }

    #[test]
    fn fuse_rejects_mismatched_lengths() {
        let err = fuse(&FREQS, &[1.0; 6], &[1.0; 5]).unwrap_err();
        assert_eq!(err, PeriodError::GridMismatch { expected: 6, got: 5 });

        let err = fuse(&FREQS, &[1.0; 7], &[1.0; 7]).unwrap_err();
        assert_eq!(err, PeriodError::GridMismatch { expected: 6, got: 7 });
    }

    #[test]
    fn fusion_is_idempotent() {
        let power = [0.3, 0.2, 0.8, 0.4, 0.1, 0.5];
        let statistic = [2.0, 1.0, 7.0, 3.0, 1.0, 2.0];
        let first = fuse(&FREQS, &power, &statistic).unwrap();
        let second = fuse(&FREQS, &power, &statistic).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn ties_pick_first_maximum() {
        let selection = select(&FREQS, &[1.0, 4.0, 1.0, 4.0, 1.0, 1.0]).unwrap();
        assert_eq!(selection.best_index, 1);
    }

    #[test]
    fn aligned_periodograms_fuse() {
        let aligned = AlignedPeriodograms {
            frequencies: FREQS.to_vec(),
            power: vec![0.5; 6],
            statistic: vec![1.0, 1.0, 1.0, 9.0, 1.0, 1.0],
        };
        let selection = aligned.fuse().unwrap();
        assert_eq!(selection.best_index, 3);
        // Scaling the combined array leaves the z-score unchanged.
        assert_relative_eq!(
            selection.significance,
            8.0 / (80.0_f64 / 9.0).sqrt(),
            epsilon = 1e-12
        );
    }
}
