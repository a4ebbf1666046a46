//! Night averaging: one representative point per observing night.

use crate::core::{night_of, ObservationSet};
use crate::error::{PeriodError, Result};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
struct NightAccumulator {
    count: usize,
    magnitude_sum: f64,
    error_sq_sum: f64,
}

/// Collapse same-night observations in place.
///
/// Retained observations are grouped by the integer part of their time and
/// each night becomes one point: time = the night, magnitude = mean of the
/// group, error = `sqrt(mean(err²))`. Nights are emitted in ascending order.
/// Flagged observations are dropped before grouping and the flags are reset.
///
/// Returns the number of nights.
///
/// # Errors
/// [`PeriodError::InsufficientData`] if no observation is retained.
pub fn average_nights(obs: &mut ObservationSet) -> Result<usize> {
    let mut nights: BTreeMap<i64, NightAccumulator> = BTreeMap::new();
    for i in obs.retained_indices() {
        let acc = nights.entry(night_of(obs.times()[i])).or_default();
        acc.count += 1;
        acc.magnitude_sum += obs.magnitudes()[i];
        acc.error_sq_sum += obs.errors()[i].powi(2);
    }

    if nights.is_empty() {
        return Err(PeriodError::InsufficientData { needed: 1, got: 0 });
    }

    let n = nights.len();
    let mut times = Vec::with_capacity(n);
    let mut magnitudes = Vec::with_capacity(n);
    let mut errors = Vec::with_capacity(n);
    for (night, acc) in nights {
        let count = acc.count as f64;
        times.push(night as f64);
        magnitudes.push(acc.magnitude_sum / count);
        errors.push((acc.error_sq_sum / count).sqrt());
    }

    debug!(before = obs.len(), nights = n, "night averaging");
    obs.replace(times, magnitudes, errors, vec![false; n])?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn groups_by_integer_day() {
        let mut obs = ObservationSet::new(
            vec![53001.9, 53000.1, 53000.4, 53001.2, 53003.5],
            vec![17.0, 16.0, 18.0, 17.4, 15.0],
            vec![0.1, 0.1, 0.1, 0.1, 0.2],
        )
        .unwrap();

        let nights = average_nights(&mut obs).unwrap();

        assert_eq!(nights, 3);
        assert_eq!(obs.times(), &[53000.0, 53001.0, 53003.0]);
        assert_relative_eq!(obs.magnitudes()[0], 17.0, epsilon = 1e-12);
        assert_relative_eq!(obs.magnitudes()[1], 17.2, epsilon = 1e-12);
        assert_relative_eq!(obs.magnitudes()[2], 15.0, epsilon = 1e-12);
        assert_relative_eq!(obs.errors()[2], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn equal_magnitudes_stay_unchanged() {
        let mut obs =
            ObservationSet::new(vec![10.2, 10.7], vec![16.5, 16.5], vec![0.1, 0.3]).unwrap();
        average_nights(&mut obs).unwrap();
        assert_eq!(obs.len(), 1);
        assert_relative_eq!(obs.magnitudes()[0], 16.5, epsilon = 1e-12);
    }

    #[test]
    fn error_is_root_mean_square() {
        let (e1, e2) = (0.1_f64, 0.3_f64);
        let mut obs = ObservationSet::new(vec![10.2, 10.7], vec![16.0, 17.0], vec![e1, e2]).unwrap();
        average_nights(&mut obs).unwrap();
        assert_relative_eq!(
            obs.errors()[0],
            ((e1 * e1 + e2 * e2) / 2.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn flagged_points_are_consumed() {
        let mut obs = ObservationSet::new(
            vec![1.1, 1.2, 2.5, 3.5],
            vec![10.0, 50.0, 11.0, 12.0],
            vec![0.1; 4],
        )
        .unwrap();
        obs.set_outlier_flags(vec![false, true, false, true]).unwrap();

        let nights = average_nights(&mut obs).unwrap();

        assert_eq!(nights, 2);
        assert_eq!(obs.times(), &[1.0, 2.0]);
        assert_relative_eq!(obs.magnitudes()[0], 10.0, epsilon = 1e-12);
        assert!(obs.outlier_flags().iter().all(|&f| !f));
    }

    #[test]
    fn single_point_nights_pass_through() {
        let mut obs =
            ObservationSet::new(vec![1.5, 2.5, 3.5], vec![1.0, 2.0, 3.0], vec![0.1, 0.2, 0.3])
                .unwrap();
        average_nights(&mut obs).unwrap();
        assert_eq!(obs.magnitudes(), &[1.0, 2.0, 3.0]);
        assert_relative_eq!(obs.errors()[1], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn all_flagged_fails() {
        let mut obs = ObservationSet::new(vec![1.5], vec![1.0], vec![0.1]).unwrap();
        obs.set_outlier_flags(vec![true]).unwrap();
        assert!(average_nights(&mut obs).is_err());
    }
}
