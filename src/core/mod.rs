//! Core data structures for light-curve analysis.

mod observations;
mod result;

pub use observations::{night_of, ObservationSet};
pub use result::{AnalysisResult, ResultLog};
