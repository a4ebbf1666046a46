//! Analysis result and the append-only result log.

use crate::error::{PeriodError, Result};
use crate::periodogram::AovPeak;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Outcome of analyzing one light curve.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Identifier of the analyzed light curve (usually its file name).
    pub source: String,
    /// Observations read from the input.
    pub total_count: usize,
    /// Observations left after outlier cleaning.
    pub retained_count: usize,
    /// Points fed to the periodograms (after optional night averaging).
    pub periodogram_count: usize,
    /// Period at the peak of the combined periodogram.
    pub best_period: f64,
    /// Frequency at the peak of the combined periodogram.
    pub best_frequency: f64,
    /// Robust z-score of the combined peak.
    pub significance: f64,
    /// Peak of the phase-variance periodogram on its own.
    pub aov_peak: AovPeak,
    /// Length of the fused frequency grid.
    pub grid_len: usize,
}

impl AnalysisResult {
    /// One result-log line: `<source> <total> <retained> <period> <significance>`.
    pub fn to_record(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.source, self.total_count, self.retained_count, self.best_period, self.significance
        )
    }
}

/// Append-only log with one line per analyzed light curve.
#[derive(Debug, Clone, Copy)]
pub struct ResultLog;

impl ResultLog {
    /// Append `result` as a single newline-terminated record.
    ///
    /// The file is created if missing and closed before returning.
    pub fn append(path: impl AsRef<Path>, result: &AnalysisResult) -> Result<()> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| PeriodError::Io(format!("{}: {}", path.display(), e)))?;
        writeln!(file, "{}", result.to_record())?;
        Ok(())
    }
}
