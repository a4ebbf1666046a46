//! Utility functions shared across the pipeline stages.

pub mod stats;

pub use stats::{argmax, mean, median, population_std, weighted_mean};
