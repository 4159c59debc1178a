//! Least squares solver and straight-line fits.
//!
//! Every fit in this project is a straight line through `(t, ln OD)` points:
//!
//! ```text
//! minimize Σ (y_i - (β0 + β1 t_i))^2
//! ```
//!
//! Implementation choices:
//! - The design matrix is `[1, t_i]`, solved with SVD so near-singular inputs
//!   (clustered timestamps) degrade gracefully instead of panicking.
//! - Goodness of fit is reported as R² = 1 - SSE/SST, with R² = 0 for a
//!   constant response (no variance to explain).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Ordinary least squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub sse: f64,
    pub r_squared: f64,
    pub rmse: f64,
}

/// Fit a straight line through `(x_i, y_i)`.
///
/// Returns `None` when fewer than two points are given, the lengths differ,
/// any value is non-finite, or all `x` are identical.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let x_min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if x_max - x_min <= 0.0 {
        return None;
    }

    // Centre x so the two design columns stay well conditioned even for
    // late timestamps (e.g. hours since inoculation in the hundreds).
    let x_mean = x.iter().sum::<f64>() / n as f64;
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { x[i] - x_mean });
    let rhs = DVector::from_column_slice(y);
    let beta = solve_least_squares(&design, &rhs)?;

    let slope = beta[1];
    let intercept = beta[0] - slope * x_mean;

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let mut sse = 0.0;
    let mut sst = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let r = yi - (intercept + slope * xi);
        sse += r * r;
        sst += (yi - y_mean) * (yi - y_mean);
    }

    let r_squared = if sst > 0.0 { (1.0 - sse / sst).clamp(0.0, 1.0) } else { 0.0 };

    Some(LineFit {
        slope,
        intercept,
        sse,
        r_squared,
        rmse: (sse / n as f64).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_exact_line() {
        let x = [10.0, 11.0, 12.0, 13.0, 14.0];
        let y: Vec<f64> = x.iter().map(|t| -1.5 + 0.25 * t).collect();
        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope - 0.25).abs() < 1e-12);
        assert!((fit.intercept + 1.5).abs() < 1e-10);
        assert!(fit.sse < 1e-20);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fit_line_noisy_r_squared_below_one() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.2, 1.8, 3.1];
        let fit = fit_line(&x, &y).unwrap();
        assert!(fit.r_squared > 0.9 && fit.r_squared < 1.0);
        assert!(fit.rmse > 0.0);
    }

    #[test]
    fn fit_line_rejects_degenerate_inputs() {
        assert!(fit_line(&[1.0], &[1.0]).is_none());
        assert!(fit_line(&[1.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_none());
        assert!(fit_line(&[0.0, 1.0], &[f64::NAN, 1.0]).is_none());
        assert!(fit_line(&[0.0, 1.0], &[1.0]).is_none());
    }

    #[test]
    fn constant_response_has_zero_r_squared() {
        let fit = fit_line(&[0.0, 1.0, 2.0], &[0.5, 0.5, 0.5]).unwrap();
        assert!(fit.slope.abs() < 1e-12);
        assert_eq!(fit.r_squared, 0.0);
    }
}
