//! Error types for the lc-period library.

use thiserror::Error;

/// Result type alias for period-search operations.
pub type Result<T> = std::result::Result<T, PeriodError>;

/// Errors that can occur while analyzing a light curve.
///
/// Every variant is terminal for the light curve being analyzed; nothing is
/// retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PeriodError {
    /// Malformed input: missing or extra columns, non-numeric fields.
    #[error("format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// Insufficient data points for the operation. A zero time span counts as
    /// a single distinct time.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Periodogram arrays do not line up for fusion.
    #[error("periodogram grid mismatch: expected {expected} samples, got {got}")]
    GridMismatch { expected: usize, got: usize },

    /// The combined periodogram has zero spread or non-finite values.
    #[error("degenerate combined periodogram: {0}")]
    DegenerateSignal(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Reading the light curve or writing the result log failed.
    #[error("io error: {0}")]
    Io(String),
}

impl PeriodError {
    /// Shorthand for a [`PeriodError::Format`] at a 1-indexed line.
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for PeriodError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
