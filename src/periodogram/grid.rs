//! Shared frequency grid and the alignment rules between the two periodograms.
//!
//! The Lomb-Scargle stage picks its own grid; the phase-variance stage is
//! evaluated on a [`FrequencyGrid`] rebuilt from the Lomb-Scargle periods.
//! Two rules tie the grids together:
//!
//! 1. When the number of samples is even, `fstop` is raised by one `fstep`
//!    before the phase-variance grid is enumerated.
//! 2. Before fusion the first sample of both periodograms is discarded; the
//!    phase-variance statistic is degenerate at the starting edge, where the
//!    fold covers only a fraction of a cycle.
//!
//! After rule 2 the extra trailing sample produced by rule 1 lies one step
//! beyond the Lomb-Scargle grid and is removed by [`align`]. Any other
//! disagreement in length or frequency is a [`PeriodError::GridMismatch`].
//! The bump therefore never reaches the fused output; it is kept only so the
//! phase-variance grid matches the historical one sample for sample.

use super::Periodogram;
use crate::error::{PeriodError, Result};

/// Frequency grid `fr0, fr0 + fstep, …` up to and including `fstop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyGrid {
    /// First frequency.
    pub fr0: f64,
    /// Frequency step.
    pub fstep: f64,
    /// Last frequency.
    pub fstop: f64,
}

impl FrequencyGrid {
    /// Build a grid from explicit bounds.
    pub fn new(fr0: f64, fstep: f64, fstop: f64) -> Result<Self> {
        if !(fr0 > 0.0 && fstep > 0.0 && fstop >= fr0) || !fstop.is_finite() {
            return Err(PeriodError::InvalidParameter(format!(
                "invalid frequency grid: fr0={}, fstep={}, fstop={}",
                fr0, fstep, fstop
            )));
        }
        Ok(Self { fr0, fstep, fstop })
    }

    /// Grid bounds from the periods of a uniform frequency grid.
    ///
    /// `fr0` is the smallest inverse period, `fstop` the largest and `fstep`
    /// their spacing. For an even `sample_count` `fstop` is raised by one
    /// step.
    pub fn from_periods(periods: &[f64], sample_count: usize) -> Result<Self> {
        if periods.len() < 2 {
            return Err(PeriodError::InsufficientData {
                needed: 2,
                got: periods.len(),
            });
        }

        let (fmin, fmax) = periods
            .iter()
            .map(|p| 1.0 / p)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
                (lo.min(f), hi.max(f))
            });
        let fstep = (fmax - fmin) / (periods.len() - 1) as f64;

        let mut fstop = fmax;
        if sample_count.is_multiple_of(2) {
            fstop += fstep;
        }

        Self::new(fmin, fstep, fstop)
    }

    /// Number of grid frequencies.
    pub fn len(&self) -> usize {
        ((self.fstop - self.fr0) / self.fstep).round() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate the grid frequencies.
    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.len())
            .map(|k| self.fr0 + k as f64 * self.fstep)
            .collect()
    }
}

/// Frequency-aligned samples of both periodograms, ready to be fused.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPeriodograms {
    pub frequencies: Vec<f64>,
    /// Lomb-Scargle power.
    pub power: Vec<f64>,
    /// Phase-variance statistic.
    pub statistic: Vec<f64>,
}

impl AlignedPeriodograms {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Align a Lomb-Scargle periodogram with a phase-variance periodogram.
///
/// Drops index 0 of both, removes the trailing even-count sample of the
/// phase-variance grid if present, then checks that every remaining pair of
/// frequencies agrees within half a grid step.
///
/// # Errors
/// [`PeriodError::GridMismatch`] when the lengths differ after alignment, or
/// when frequencies disagree (`got` is then the number of pairs that matched
/// before the first disagreement).
pub fn align(lomb_scargle: &Periodogram, phase_variance: &Periodogram) -> Result<AlignedPeriodograms> {
    if lomb_scargle.len() < 2 || phase_variance.len() < 2 {
        return Err(PeriodError::InsufficientData {
            needed: 2,
            got: lomb_scargle.len().min(phase_variance.len()),
        });
    }

    let ls_freq = &lomb_scargle.frequencies()[1..];
    let ls_power = &lomb_scargle.power()[1..];
    let mut pv_freq = &phase_variance.frequencies()[1..];
    let mut pv_stat = &phase_variance.power()[1..];

    let full = lomb_scargle.frequencies();
    let step = (full[full.len() - 1] - full[0]) / (full.len() - 1) as f64;
    let tolerance = 0.5 * step;

    if pv_freq.len() == ls_freq.len() + 1 {
        let ls_last = ls_freq.last().copied().unwrap_or(full[0]);
        let pv_last = pv_freq[pv_freq.len() - 1];
        if (pv_last - (ls_last + step)).abs() <= tolerance {
            pv_freq = &pv_freq[..pv_freq.len() - 1];
            pv_stat = &pv_stat[..pv_stat.len() - 1];
        }
    }

    if pv_freq.len() != ls_freq.len() {
        return Err(PeriodError::GridMismatch {
            expected: ls_freq.len(),
            got: pv_freq.len(),
        });
    }

    if let Some(matched) = ls_freq
        .iter()
        .zip(pv_freq)
        .position(|(a, b)| (a - b).abs() > tolerance)
    {
        return Err(PeriodError::GridMismatch {
            expected: ls_freq.len(),
            got: matched,
        });
    }

    Ok(AlignedPeriodograms {
        frequencies: ls_freq.to_vec(),
        power: ls_power.to_vec(),
        statistic: pv_stat.to_vec(),
    })
}
