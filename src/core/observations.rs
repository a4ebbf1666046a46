//! Observation set: the raw (time, magnitude, error) columns of a light curve.
//!
//! Light curves are stored column-wise together with a per-observation
//! outlier flag. All four columns always have the same length; the cleaning
//! and averaging stages replace them together through [`ObservationSet::replace`].

use crate::error::{PeriodError, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Number of numeric columns per row: time, magnitude, magnitude error.
const COLUMNS: usize = 3;

/// Calendar night of an observation: the integer part of its MJD.
pub fn night_of(time: f64) -> i64 {
    time.trunc() as i64
}

/// A light curve as three equal-length columns plus outlier flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet {
    times: Vec<f64>,
    magnitudes: Vec<f64>,
    errors: Vec<f64>,
    outlier_flags: Vec<bool>,
}

impl ObservationSet {
    /// Build an observation set from three columns.
    ///
    /// # Errors
    /// [`PeriodError::Format`] when the columns differ in length, contain a
    /// non-finite value, or carry a non-positive magnitude error.
    pub fn new(times: Vec<f64>, magnitudes: Vec<f64>, errors: Vec<f64>) -> Result<Self> {
        if times.len() != magnitudes.len() || times.len() != errors.len() {
            return Err(PeriodError::format(
                0,
                format!(
                    "column lengths differ: {} times, {} magnitudes, {} errors",
                    times.len(),
                    magnitudes.len(),
                    errors.len()
                ),
            ));
        }

        for (i, ((&t, &m), &e)) in times.iter().zip(&magnitudes).zip(&errors).enumerate() {
            validate_row(i + 1, t, m, e)?;
        }

        let outlier_flags = vec![false; times.len()];
        Ok(Self {
            times,
            magnitudes,
            errors,
            outlier_flags,
        })
    }

    /// Parse whitespace-delimited `time magnitude error` rows.
    ///
    /// Blank lines and `#` comment lines are skipped. There is no header.
    ///
    /// # Errors
    /// [`PeriodError::Format`] on a row with a missing or extra column, a
    /// non-numeric field, or when no rows are present at all.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut times = Vec::new();
        let mut magnitudes = Vec::new();
        let mut errors = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line_no = line_num + 1;
            let line = line_result?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != COLUMNS {
                return Err(PeriodError::format(
                    line_no,
                    format!("expected {} columns, found {}", COLUMNS, fields.len()),
                ));
            }

            let mut row = [0.0; COLUMNS];
            for (slot, field) in row.iter_mut().zip(&fields) {
                *slot = field.parse::<f64>().map_err(|_| {
                    PeriodError::format(line_no, format!("non-numeric field '{}'", field))
                })?;
            }
            validate_row(line_no, row[0], row[1], row[2])?;

            times.push(row[0]);
            magnitudes.push(row[1]);
            errors.push(row[2]);
        }

        if times.is_empty() {
            return Err(PeriodError::format(0, "no observations found"));
        }

        let outlier_flags = vec![false; times.len()];
        Ok(Self {
            times,
            magnitudes,
            errors,
            outlier_flags,
        })
    }

    /// Load a light curve file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PeriodError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub fn outlier_flags(&self) -> &[bool] {
        &self.outlier_flags
    }

    /// Number of observations not flagged as outliers.
    pub fn retained_count(&self) -> usize {
        self.outlier_flags.iter().filter(|&&f| !f).count()
    }

    /// Columns of the observations not flagged as outliers.
    pub fn retained(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut times = Vec::with_capacity(self.len());
        let mut magnitudes = Vec::with_capacity(self.len());
        let mut errors = Vec::with_capacity(self.len());
        for i in self.retained_indices() {
            times.push(self.times[i]);
            magnitudes.push(self.magnitudes[i]);
            errors.push(self.errors[i]);
        }
        (times, magnitudes, errors)
    }

    pub(crate) fn retained_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.outlier_flags
            .iter()
            .enumerate()
            .filter(|(_, &flag)| !flag)
            .map(|(i, _)| i)
    }

    /// Number of distinct nights among retained observations.
    pub fn distinct_nights(&self) -> usize {
        self.retained_indices()
            .map(|i| night_of(self.times[i]))
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// `max(t) - min(t)` over retained observations (0 when empty).
    pub fn time_span(&self) -> f64 {
        let (lo, hi) = self
            .retained_indices()
            .map(|i| self.times[i])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
                (lo.min(t), hi.max(t))
            });
        if lo.is_finite() {
            hi - lo
        } else {
            0.0
        }
    }

    /// Replace all four columns at once.
    ///
    /// The replacement is rejected as a whole if the lengths disagree, so the
    /// set is never left partially updated.
    pub(crate) fn replace(
        &mut self,
        times: Vec<f64>,
        magnitudes: Vec<f64>,
        errors: Vec<f64>,
        outlier_flags: Vec<bool>,
    ) -> Result<()> {
        let n = times.len();
        if magnitudes.len() != n || errors.len() != n || outlier_flags.len() != n {
            return Err(PeriodError::InvalidParameter(format!(
                "column replacement with unequal lengths ({}, {}, {}, {})",
                n,
                magnitudes.len(),
                errors.len(),
                outlier_flags.len()
            )));
        }
        self.times = times;
        self.magnitudes = magnitudes;
        self.errors = errors;
        self.outlier_flags = outlier_flags;
        Ok(())
    }

    pub(crate) fn set_outlier_flags(&mut self, flags: Vec<bool>) -> Result<()> {
        if flags.len() != self.len() {
            return Err(PeriodError::InvalidParameter(format!(
                "expected {} outlier flags, got {}",
                self.len(),
                flags.len()
            )));
        }
        self.outlier_flags = flags;
        Ok(())
    }
}

impl FromStr for ObservationSet {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }
}

fn validate_row(line: usize, time: f64, magnitude: f64, error: f64) -> Result<()> {
    if !(time.is_finite() && magnitude.is_finite() && error.is_finite()) {
        return Err(PeriodError::format(line, "non-finite value"));
    }
    if error <= 0.0 {
        return Err(PeriodError::format(
            line,
            format!("magnitude error must be positive, got {}", error),
        ));
    }
    Ok(())
}
