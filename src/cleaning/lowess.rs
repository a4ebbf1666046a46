//! LOWESS: locally weighted linear regression with robustness iterations.
//!
//! Follows Cleveland (1979): every point gets a weighted linear fit over its
//! `fraction · n` nearest neighbours in time (tricube kernel), and each
//! robustness pass down-weights points with large residuals using bisquare
//! weights scaled by six times the median absolute residual.

use crate::error::{PeriodError, Result};
use crate::utils::stats::median_of_sorted;
use std::cmp::Ordering;

/// Minimum number of distinct abscissae a local linear fit needs.
const MIN_DISTINCT: usize = 3;

/// LOWESS smoother configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Lowess {
    /// Fraction of the points used in each local fit.
    fraction: f64,
    /// Number of robustifying passes after the initial fit.
    iterations: usize,
}

impl Default for Lowess {
    fn default() -> Self {
        Self {
            fraction: 0.35,
            iterations: 3,
        }
    }
}

impl Lowess {
    /// Create a smoother with the given neighbourhood fraction.
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction,
            ..Self::default()
        }
    }

    /// Set the neighbourhood fraction.
    pub fn with_fraction(mut self, fraction: f64) -> Self {
        self.fraction = fraction;
        self
    }

    /// Set the number of robustness passes (0 for a plain local fit).
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Smoothed value at every `x`, returned in input order.
    ///
    /// # Errors
    /// - [`PeriodError::InvalidParameter`] for a fraction outside `(0, 1]` or
    ///   mismatched slices.
    /// - [`PeriodError::InsufficientData`] with fewer than three distinct `x`,
    ///   including a zero time span.
    pub fn fit(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
        if !(self.fraction > 0.0 && self.fraction <= 1.0) {
            return Err(PeriodError::InvalidParameter(format!(
                "lowess fraction must be in (0, 1], got {}",
                self.fraction
            )));
        }
        if x.len() != y.len() {
            return Err(PeriodError::InvalidParameter(format!(
                "lowess needs equal-length inputs, got {} and {}",
                x.len(),
                y.len()
            )));
        }

        let n = x.len();
        if n < MIN_DISTINCT {
            return Err(PeriodError::InsufficientData {
                needed: MIN_DISTINCT,
                got: n,
            });
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(Ordering::Equal));

        // Work relative to the first time stamp; MJDs are large numbers.
        let x0 = x[order[0]];
        let xs: Vec<f64> = order.iter().map(|&i| x[i] - x0).collect();
        let ys: Vec<f64> = order.iter().map(|&i| y[i]).collect();

        let distinct = 1 + xs.windows(2).filter(|w| w[1] > w[0]).count();
        if distinct < MIN_DISTINCT {
            return Err(PeriodError::InsufficientData {
                needed: MIN_DISTINCT,
                got: distinct,
            });
        }

        let span = ((self.fraction * n as f64).ceil() as usize).clamp(2, n);
        let mut robustness = vec![1.0; n];
        let mut fitted = local_fits(&xs, &ys, span, &robustness);

        for _ in 0..self.iterations {
            let residuals: Vec<f64> = ys.iter().zip(&fitted).map(|(y, f)| y - f).collect();
            match bisquare_weights(&residuals) {
                Some(w) => robustness = w,
                None => break,
            }
            fitted = local_fits(&xs, &ys, span, &robustness);
        }

        let mut result = vec![0.0; n];
        for (sorted_idx, &orig_idx) in order.iter().enumerate() {
            result[orig_idx] = fitted[sorted_idx];
        }
        Ok(result)
    }

    /// Residuals `fitted - observed` at every point, in input order.
    pub fn residuals(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
        let fitted = self.fit(x, y)?;
        Ok(fitted.iter().zip(y).map(|(f, obs)| f - obs).collect())
    }
}

/// One pass of local linear fits over sorted `xs`.
fn local_fits(xs: &[f64], ys: &[f64], span: usize, robustness: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut fitted = vec![0.0; n];
    let mut left = 0;
    let mut right = span; // exclusive

    for i in 0..n {
        // Slide the window while the next point is closer than the leftmost.
        while right < n && xs[i] - xs[left] > xs[right] - xs[i] {
            left += 1;
            right += 1;
        }

        let h = (xs[i] - xs[left]).max(xs[right - 1] - xs[i]);
        fitted[i] = local_linear(xs, ys, left, right, i, h, robustness);
    }

    fitted
}

/// Weighted linear fit over `left..right` evaluated at `xs[i]`.
fn local_linear(
    xs: &[f64],
    ys: &[f64],
    left: usize,
    right: usize,
    i: usize,
    h: f64,
    robustness: &[f64],
) -> f64 {
    let xi = xs[i];
    let h_hi = 0.999 * h;
    let h_lo = 0.001 * h;

    let mut weights = Vec::with_capacity(right - left);
    for j in left..right {
        let d = (xs[j] - xi).abs();
        let kernel = if h <= 0.0 || d <= h_lo {
            1.0
        } else if d <= h_hi {
            let u = d / h;
            (1.0 - u.powi(3)).powi(3)
        } else {
            0.0
        };
        weights.push(kernel * robustness[j]);
    }

    let sum_w: f64 = weights.iter().sum();
    if sum_w <= 0.0 {
        return ys[i];
    }

    let window = left..right;
    let x_mean = window
        .clone()
        .zip(&weights)
        .map(|(j, w)| w * xs[j])
        .sum::<f64>()
        / sum_w;
    let y_mean = window
        .clone()
        .zip(&weights)
        .map(|(j, w)| w * ys[j])
        .sum::<f64>()
        / sum_w;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (j, w) in window.zip(&weights) {
        let dx = xs[j] - x_mean;
        sxx += w * dx * dx;
        sxy += w * dx * (ys[j] - y_mean);
    }

    // Fall back to the weighted mean when the window has no x leverage.
    let range = xs[right - 1] - xs[left];
    if range > 0.0 && (sxx / sum_w).sqrt() > 0.001 * range {
        y_mean + sxy / sxx * (xi - x_mean)
    } else {
        y_mean
    }
}

/// Bisquare robustness weights, or `None` once the residuals vanish.
fn bisquare_weights(residuals: &[f64]) -> Option<Vec<f64>> {
    let mut abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    abs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let h = 6.0 * median_of_sorted(&abs);
    if !(h > 1e-12) {
        return None;
    }

    Some(
        residuals
            .iter()
            .map(|r| {
                let u = r.abs() / h;
                if u < 1.0 {
                    (1.0 - u * u).powi(2)
                } else {
                    0.0
                }
            })
            .collect(),
    )
}
