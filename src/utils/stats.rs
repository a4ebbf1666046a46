//! Statistical helpers shared by the cleaning and periodogram stages.
//!
//! Standard deviations here are population (divide-by-n) values, matching
//! how residual scatter and periodogram spread are quoted for light curves.

use std::cmp::Ordering;

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (n denominator).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn population_std(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Calculate the median of a slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    median_of_sorted(&sorted)
}

/// Median of an already ascending slice.
pub(crate) fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n.is_multiple_of(2) {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Weighted mean `Σ wᵢxᵢ / Σ wᵢ`. NaN when the weights sum to zero.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let (num, den) = values
        .iter()
        .zip(weights)
        .fold((0.0, 0.0), |(num, den), (&x, &w)| (num + w * x, den + w));
    if den > 0.0 {
        num / den
    } else {
        f64::NAN
    }
}

/// Index of the first maximum, ignoring NaN. `None` for empty input or an
/// all-NaN slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Inverse-variance weights `1 / err²`.
pub fn inverse_variance_weights(errors: &[f64]) -> Vec<f64> {
    errors.iter().map(|e| 1.0 / (e * e)).collect()
}
