//! # lc-period
//!
//! Period search for irregularly sampled astronomical light curves.
//!
//! A light curve of (time, magnitude, error) triples is cleaned of outliers
//! against a LOWESS trend, optionally averaged per night, and searched with
//! two independent periodograms, a generalized Lomb-Scargle and an AOV
//! phase-variance statistic, on a shared frequency grid. Their product gives
//! the best period and a robust significance score.
//!
//! ```no_run
//! use lc_period::prelude::*;
//!
//! let config = AnalysisConfig::default();
//! let result = analyze_path("CRTS_J123456.dat", &config)?;
//! ResultLog::append("periods.txt", &result)?;
//! # Ok::<(), PeriodError>(())
//! ```

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod cleaning;
pub mod core;
pub mod error;
pub mod periodogram;
pub mod pipeline;
pub mod utils;

pub use error::{PeriodError, Result};
pub use pipeline::{analyze, analyze_path, AnalysisConfig};

pub mod prelude {
    pub use crate::cleaning::{OutlierCleaner, OutlierPolicy, ResidualThreshold};
    pub use crate::core::{AnalysisResult, ObservationSet, ResultLog};
    pub use crate::error::{PeriodError, Result};
    pub use crate::periodogram::{LombScargle, Periodogram, PhaseVariance, SampleCount};
    pub use crate::pipeline::{analyze, analyze_path, AnalysisConfig};
}
