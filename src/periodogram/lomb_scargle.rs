//! Generalized Lomb-Scargle periodogram.
//!
//! Error-weighted, floating-mean formulation of Zechmeister & Kürster (2009):
//! at each trial frequency a sinusoid plus offset is fitted by weighted least
//! squares and the power is the fraction of the weighted variance it explains,
//! so `0 <= power <= 1`.

use super::Periodogram;
use crate::error::{PeriodError, Result};
use crate::utils::stats::inverse_variance_weights;
use std::f64::consts::TAU;
use tracing::debug;

/// Generalized Lomb-Scargle periodogram with an automatic frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LombScargle {
    /// Grid oversampling relative to the natural resolution `1 / T`.
    oversampling: f64,
    /// Highest frequency as a multiple of the pseudo-Nyquist `n / (2T)`.
    nyquist_factor: f64,
}

impl Default for LombScargle {
    fn default() -> Self {
        Self {
            oversampling: 200.0,
            nyquist_factor: 1.0,
        }
    }
}

impl LombScargle {
    pub fn new(oversampling: f64, nyquist_factor: f64) -> Self {
        Self {
            oversampling,
            nyquist_factor,
        }
    }

    pub fn with_oversampling(mut self, oversampling: f64) -> Self {
        self.oversampling = oversampling;
        self
    }

    pub fn with_nyquist_factor(mut self, nyquist_factor: f64) -> Self {
        self.nyquist_factor = nyquist_factor;
        self
    }

    pub fn oversampling(&self) -> f64 {
        self.oversampling
    }

    pub fn nyquist_factor(&self) -> f64 {
        self.nyquist_factor
    }

    /// Automatic frequency grid for the given sampling times.
    ///
    /// With span `T` and `n` samples: `fstep = 1 / (oversampling · T)` and the
    /// grid is `j · fstep` for `j = 1..=floor(oversampling · nyquist_factor · n / 2)`.
    pub fn frequency_grid(&self, times: &[f64]) -> Result<Vec<f64>> {
        if !(self.oversampling >= 1.0) || !(self.nyquist_factor > 0.0) {
            return Err(PeriodError::InvalidParameter(format!(
                "oversampling must be >= 1 and nyquist factor > 0, got {} and {}",
                self.oversampling, self.nyquist_factor
            )));
        }

        let n = times.len();
        let span = time_span(times);
        if !(span > 0.0) {
            return Err(PeriodError::InsufficientData { needed: 2, got: 1 });
        }

        let fstep = 1.0 / (self.oversampling * span);
        let count = (0.5 * self.oversampling * self.nyquist_factor * n as f64).floor() as usize;
        if count < 2 {
            return Err(PeriodError::InsufficientData {
                needed: 2,
                got: count,
            });
        }

        Ok((1..=count).map(|j| j as f64 * fstep).collect())
    }

    /// Periodogram on the automatic grid.
    ///
    /// # Errors
    /// [`PeriodError::InsufficientData`] with fewer than three points or when
    /// all times coincide.
    pub fn periodogram(&self, times: &[f64], values: &[f64], errors: &[f64]) -> Result<Periodogram> {
        check_inputs(times, values, errors)?;
        let frequencies = self.frequency_grid(times)?;
        debug!(
            samples = times.len(),
            frequencies = frequencies.len(),
            fmax = frequencies.last().copied().unwrap_or(0.0),
            "lomb-scargle grid"
        );
        power_on_grid(times, values, errors, frequencies)
    }

    /// Periodogram on caller-supplied frequencies.
    pub fn periodogram_at(
        &self,
        times: &[f64],
        values: &[f64],
        errors: &[f64],
        frequencies: &[f64],
    ) -> Result<Periodogram> {
        check_inputs(times, values, errors)?;
        power_on_grid(times, values, errors, frequencies.to_vec())
    }
}

fn check_inputs(times: &[f64], values: &[f64], errors: &[f64]) -> Result<()> {
    if times.len() != values.len() || times.len() != errors.len() {
        return Err(PeriodError::InvalidParameter(format!(
            "times, values and errors differ in length ({}, {}, {})",
            times.len(),
            values.len(),
            errors.len()
        )));
    }
    if times.len() < 3 {
        return Err(PeriodError::InsufficientData {
            needed: 3,
            got: times.len(),
        });
    }
    Ok(())
}

fn time_span(times: &[f64]) -> f64 {
    let (lo, hi) = times
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
            (lo.min(t), hi.max(t))
        });
    hi - lo
}

fn power_on_grid(
    times: &[f64],
    values: &[f64],
    errors: &[f64],
    frequencies: Vec<f64>,
) -> Result<Periodogram> {
    let raw = inverse_variance_weights(errors);
    let total: f64 = raw.iter().sum();
    let weights: Vec<f64> = raw.iter().map(|w| w / total).collect();

    let t0 = times.iter().copied().fold(f64::INFINITY, f64::min);
    let t: Vec<f64> = times.iter().map(|&ti| ti - t0).collect();

    let y_mean: f64 = weights.iter().zip(values).map(|(w, y)| w * y).sum();
    let y: Vec<f64> = values.iter().map(|v| v - y_mean).collect();
    let mut yy: f64 = weights.iter().zip(&y).map(|(w, y)| w * y * y).sum();
    // Rounding residue of a constant series.
    if yy <= 1e-24 * (1.0 + y_mean * y_mean) {
        yy = 0.0;
    }

    let power = frequencies
        .iter()
        .map(|&f| single_frequency_power(&t, &y, &weights, yy, TAU * f))
        .collect();

    Periodogram::new(frequencies, power)
}

/// Normalized power at angular frequency `omega` for centered `y`.
fn single_frequency_power(t: &[f64], y: &[f64], w: &[f64], yy: f64, omega: f64) -> f64 {
    if !(yy > 0.0) {
        return 0.0;
    }

    let mut c = 0.0;
    let mut s = 0.0;
    let mut yc = 0.0;
    let mut ys = 0.0;
    let mut cc = 0.0;
    let mut cs = 0.0;
    for i in 0..t.len() {
        let (sin, cos) = (omega * t[i]).sin_cos();
        let wi = w[i];
        c += wi * cos;
        s += wi * sin;
        yc += wi * y[i] * cos;
        ys += wi * y[i] * sin;
        cc += wi * cos * cos;
        cs += wi * cos * sin;
    }
    // y is already centered on its weighted mean, so YC = yc, YS = ys.
    let ss = (1.0 - cc) - s * s;
    let cc = cc - c * c;
    let cs = cs - c * s;

    let d = cc * ss - cs * cs;
    if !(d > 1e-15) {
        return 0.0;
    }

    let p = (ss * yc * yc + cc * ys * ys - 2.0 * cs * yc * ys) / (yy * d);
    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Irregular sampling: two or three points a night, gaps of a few days.
    fn irregular_times(nights: usize) -> Vec<f64> {
        let mut times = Vec::new();
        for k in 0..nights {
            let night = 53000.0 + k as f64 * 3.7 + (k as f64 * 0.61).sin();
            times.push(night + 0.1);
            if k % 2 == 0 {
                times.push(night + 0.3);
            }
        }
        times
    }

    #[test]
    fn recovers_sinusoid_period() {
        let period = 5.3;
        let times = irregular_times(60);
        let values: Vec<f64> = times
            .iter()
            .map(|t| 17.0 + 0.4 * (TAU * t / period).sin())
            .collect();
        let errors = vec![0.05; times.len()];

        let pg = LombScargle::default()
            .with_oversampling(20.0)
            .periodogram(&times, &values, &errors)
            .unwrap();
        let peak = pg.peak().unwrap();

        assert!(
            (peak.period - period).abs() < 0.05,
            "expected period near {}, got {}",
            period,
            peak.period
        );
        assert!(peak.power > 0.99);
    }

    #[test]
    fn grid_follows_span_and_count() {
        let times: Vec<f64> = (0..10).map(|i| i as f64 * 2.0).collect();
        let grid = LombScargle::new(4.0, 1.0).frequency_grid(&times).unwrap();

        // T = 18, fstep = 1/72, 0.5 * 4 * 10 = 20 frequencies.
        assert_eq!(grid.len(), 20);
        assert_relative_eq!(grid[0], 1.0 / 72.0, epsilon = 1e-15);
        assert_relative_eq!(grid[19], 20.0 / 72.0, epsilon = 1e-12);
    }

    #[test]
    fn power_is_bounded() {
        let times = irregular_times(30);
        let values: Vec<f64> = times.iter().map(|t| (t * 1.7).sin() + (t * 0.3).cos()).collect();
        let errors: Vec<f64> = (0..times.len()).map(|i| 0.05 + 0.01 * (i % 3) as f64).collect();

        let pg = LombScargle::new(5.0, 1.0)
            .periodogram(&times, &values, &errors)
            .unwrap();
        assert!(pg.power().iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn constant_signal_has_zero_power() {
        let times = irregular_times(10);
        let values = vec![17.0; times.len()];
        let errors = vec![0.1; times.len()];
        let pg = LombScargle::new(2.0, 1.0)
            .periodogram(&times, &values, &errors)
            .unwrap();
        assert!(pg.power().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn weights_favor_precise_points() {
        let times: Vec<f64> = (0..40).map(|i| i as f64 * 0.77).collect();
        let period = 4.0;
        let mut values: Vec<f64> = times.iter().map(|t| (TAU * t / period).sin()).collect();
        let mut errors = vec![0.01; times.len()];
        // Corrupt a few points but give them huge errors.
        for i in [3, 11, 25] {
            values[i] += 3.0;
            errors[i] = 100.0;
        }
        let freqs = [1.0 / period, 1.0 / 7.0];
        let pg = LombScargle::default()
            .periodogram_at(&times, &values, &errors, &freqs)
            .unwrap();
        assert!(pg.power()[0] > 0.99);
        assert!(pg.power()[1] < 0.5);
    }

    #[test]
    fn rejects_degenerate_input() {
        let ls = LombScargle::default();
        assert!(matches!(
            ls.periodogram(&[1.0, 2.0], &[1.0, 2.0], &[0.1, 0.1]),
            Err(PeriodError::InsufficientData { .. })
        ));
        assert!(matches!(
            ls.periodogram(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], &[0.1; 3]),
            Err(PeriodError::InsufficientData { needed: 2, got: 1 })
        ));
        assert!(matches!(
            LombScargle::new(0.5, 1.0).periodogram(&[1.0, 2.0, 3.0], &[1.0, 2.0, 1.0], &[0.1; 3]),
            Err(PeriodError::InvalidParameter(_))
        ));
    }
}
