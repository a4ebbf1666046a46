//! Periodograms for unevenly sampled light curves.
//!
//! This module provides:
//! - [`LombScargle`]: error-weighted generalized Lomb-Scargle power on an
//!   automatically chosen grid
//! - [`PhaseVariance`]: analysis-of-variance (AOV) phase-folding statistic on
//!   an explicit [`FrequencyGrid`]
//! - [`align`] and [`fuse`]: grid alignment and multiplicative fusion with a
//!   robust significance score

mod aov;
mod fusion;
mod grid;
mod lomb_scargle;

pub use aov::{AovPeak, AovPeriodogram, PhaseVariance, SampleCount};
pub use fusion::{fuse, select, Selection};
pub use grid::{align, AlignedPeriodograms, FrequencyGrid};
pub use lomb_scargle::LombScargle;

use crate::error::{PeriodError, Result};
use crate::utils::stats::argmax;

/// Strongest sample of a periodogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodogramPeak {
    pub index: usize,
    pub frequency: f64,
    pub period: f64,
    pub power: f64,
}

/// A detection statistic sampled on an ascending frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Periodogram {
    frequencies: Vec<f64>,
    power: Vec<f64>,
}

impl Periodogram {
    /// Pair frequencies with their statistic.
    ///
    /// # Errors
    /// [`PeriodError::GridMismatch`] when the lengths differ.
    pub fn new(frequencies: Vec<f64>, power: Vec<f64>) -> Result<Self> {
        if frequencies.len() != power.len() {
            return Err(PeriodError::GridMismatch {
                expected: frequencies.len(),
                got: power.len(),
            });
        }
        Ok(Self { frequencies, power })
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Periods `1 / f`, one per frequency (so in decreasing order).
    pub fn periods(&self) -> Vec<f64> {
        self.frequencies.iter().map(|f| 1.0 / f).collect()
    }

    /// The first maximum of the statistic.
    pub fn peak(&self) -> Option<PeriodogramPeak> {
        argmax(&self.power).map(|index| PeriodogramPeak {
            index,
            frequency: self.frequencies[index],
            period: 1.0 / self.frequencies[index],
            power: self.power[index],
        })
    }
}
