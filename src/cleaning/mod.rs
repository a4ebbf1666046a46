//! Light-curve cleaning ahead of the period search.
//!
//! This module provides:
//! - [`Lowess`]: robust locally weighted regression
//! - [`OutlierCleaner`]: residual-based outlier flagging or pruning
//! - [`average_nights`]: collapse repeated same-night observations

mod lowess;
mod night;
mod outlier;

pub use lowess::Lowess;
pub use night::average_nights;
pub use outlier::{CleaningReport, OutlierCleaner, OutlierPolicy, ResidualThreshold};
