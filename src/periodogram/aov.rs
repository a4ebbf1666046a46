//! Analysis-of-variance (AOV) phase-folding periodogram.
//!
//! Schwarzenberg-Czerny (1989): at each trial frequency the light curve is
//! folded, the phases are split into equal bins, and the statistic compares
//! the weighted between-bin variance with the weighted within-bin variance:
//!
//! ```text
//! θ = [s₁ / (r − 1)] / [s₂ / (N − r)]
//! ```
//!
//! where `r` is the number of occupied bins and `N` the effective sample
//! count. Under the null hypothesis θ follows an F distribution with
//! `(r − 1, N − r)` degrees of freedom.

use super::{FrequencyGrid, Periodogram};
use crate::core::night_of;
use crate::error::{PeriodError, Result};
use crate::utils::stats::{argmax, inverse_variance_weights, weighted_mean};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use std::collections::BTreeSet;
use tracing::debug;

/// Which count stands for `N` in the AOV degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleCount {
    /// Every point fed to the periodogram.
    #[default]
    Total,
    /// Distinct observing nights among those points.
    Unique,
}

/// Peak of the phase-variance periodogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AovPeak {
    pub frequency: f64,
    pub statistic: f64,
    /// Probability of a peak this high from noise anywhere on the grid.
    pub false_alarm_probability: f64,
}

/// Phase-variance periodogram together with its peak.
#[derive(Debug, Clone, PartialEq)]
pub struct AovPeriodogram {
    pub periodogram: Periodogram,
    pub peak: AovPeak,
}

/// AOV periodogram configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseVariance {
    bins: usize,
    sample_count: SampleCount,
}

impl Default for PhaseVariance {
    fn default() -> Self {
        Self {
            bins: 8,
            sample_count: SampleCount::Total,
        }
    }
}

/// Per-bin weighted sums for one fold.
#[derive(Debug, Clone, Copy, Default)]
struct BinSums {
    w: f64,
    wy: f64,
    wyy: f64,
}

impl PhaseVariance {
    pub fn new(bins: usize) -> Self {
        Self {
            bins,
            ..Self::default()
        }
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn with_sample_count(mut self, sample_count: SampleCount) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn sample_count(&self) -> SampleCount {
        self.sample_count
    }

    /// Evaluate θ on every frequency of `grid`.
    ///
    /// # Errors
    /// - [`PeriodError::InvalidParameter`] for fewer than two bins or
    ///   mismatched inputs.
    /// - [`PeriodError::InsufficientData`] when there are no more points than
    ///   bins.
    pub fn periodogram(
        &self,
        times: &[f64],
        values: &[f64],
        errors: &[f64],
        grid: &FrequencyGrid,
    ) -> Result<AovPeriodogram> {
        if self.bins < 2 {
            return Err(PeriodError::InvalidParameter(format!(
                "phase variance needs at least 2 bins, got {}",
                self.bins
            )));
        }
        if times.len() != values.len() || times.len() != errors.len() {
            return Err(PeriodError::InvalidParameter(format!(
                "times, values and errors differ in length ({}, {}, {})",
                times.len(),
                values.len(),
                errors.len()
            )));
        }
        if times.len() <= self.bins {
            return Err(PeriodError::InsufficientData {
                needed: self.bins + 1,
                got: times.len(),
            });
        }

        let effective_n = match self.sample_count {
            SampleCount::Total => times.len(),
            SampleCount::Unique => times
                .iter()
                .map(|&t| night_of(t))
                .collect::<BTreeSet<_>>()
                .len(),
        };

        let weights = inverse_variance_weights(errors);
        let y_mean = weighted_mean(values, &weights);
        let y: Vec<f64> = values.iter().map(|v| v - y_mean).collect();
        let t0 = times.iter().copied().fold(f64::INFINITY, f64::min);
        let t: Vec<f64> = times.iter().map(|&ti| ti - t0).collect();

        let frequencies = grid.frequencies();
        let mut bins = vec![BinSums::default(); self.bins];
        let mut statistic = Vec::with_capacity(frequencies.len());
        let mut occupied_at = Vec::with_capacity(frequencies.len());

        for &f in &frequencies {
            let (theta, occupied) = self.theta(&t, &y, &weights, f, effective_n, &mut bins);
            statistic.push(theta);
            occupied_at.push(occupied);
        }

        let peak = match argmax(&statistic) {
            Some(i) => {
                let fap = false_alarm_probability(
                    statistic[i],
                    occupied_at[i],
                    effective_n,
                    independent_frequencies(&t, &frequencies),
                );
                AovPeak {
                    frequency: frequencies[i],
                    statistic: statistic[i],
                    false_alarm_probability: fap,
                }
            }
            None => AovPeak {
                frequency: grid.fr0,
                statistic: 0.0,
                false_alarm_probability: 1.0,
            },
        };

        debug!(
            frequencies = frequencies.len(),
            effective_n,
            peak_frequency = peak.frequency,
            peak_statistic = peak.statistic,
            fap = peak.false_alarm_probability,
            "phase variance periodogram"
        );

        Ok(AovPeriodogram {
            periodogram: Periodogram::new(frequencies, statistic)?,
            peak,
        })
    }

    /// θ at one frequency and the number of occupied bins.
    fn theta(
        &self,
        t: &[f64],
        y: &[f64],
        w: &[f64],
        frequency: f64,
        effective_n: usize,
        bins: &mut [BinSums],
    ) -> (f64, usize) {
        bins.fill(BinSums::default());
        let r = bins.len();
        for i in 0..t.len() {
            let phase = (t[i] * frequency).fract();
            let b = ((phase * r as f64) as usize).min(r - 1);
            let wy = w[i] * y[i];
            bins[b].w += w[i];
            bins[b].wy += wy;
            bins[b].wyy += wy * y[i];
        }

        let mut occupied = 0;
        let mut between = 0.0;
        let mut within = 0.0;
        for bin in bins.iter().filter(|b| b.w > 0.0) {
            occupied += 1;
            let bin_mean = bin.wy / bin.w;
            // y is centered, so the overall weighted mean is zero.
            between += bin.w * bin_mean * bin_mean;
            within += bin.wyy - bin.w * bin_mean * bin_mean;
        }

        if occupied < 2 || effective_n <= occupied || !(within > 1e-12 * (within + between)) {
            return (0.0, occupied);
        }

        let theta = (between / (occupied - 1) as f64) / (within / (effective_n - occupied) as f64);
        (theta, occupied)
    }
}

/// Number of independent trial frequencies, `T · (fmax − fmin)`, at least one.
fn independent_frequencies(t: &[f64], frequencies: &[f64]) -> f64 {
    let span = t.iter().copied().fold(0.0, f64::max);
    match (frequencies.first(), frequencies.last()) {
        (Some(lo), Some(hi)) => (span * (hi - lo)).max(1.0),
        _ => 1.0,
    }
}

/// Grid-wide false-alarm probability `1 − (1 − p)^M` for a single-trial
/// F-test tail probability `p`.
fn false_alarm_probability(theta: f64, occupied: usize, effective_n: usize, trials: f64) -> f64 {
    if !(theta > 0.0) || occupied < 2 || effective_n <= occupied {
        return 1.0;
    }
    let dist = match FisherSnedecor::new((occupied - 1) as f64, (effective_n - occupied) as f64) {
        Ok(d) => d,
        Err(_) => return 1.0,
    };
    let p = dist.sf(theta).clamp(0.0, 1.0);
    (-(trials * (-p).ln_1p()).exp_m1()).clamp(0.0, 1.0)
}
