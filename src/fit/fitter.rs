//! Exponential fit of a single sub-range.
//!
//! Given samples `(t_i, OD_i)` we regress `ln OD_i` on `t_i`:
//!
//! ```text
//! ln OD(t) = ln OD0 + r t
//! ```
//!
//! The slope `r` is the specific growth rate and `ln 2 / r` the doubling time.
//! There is no fallback: a sub-range that does not grow is an error.

use crate::domain::{FitResult, MIN_FIT_POINTS, Sample};
use crate::error::GrowthError;
use crate::math::fit_line;
use crate::models::doubling_time;

/// Total ln(OD) change across a sub-range at or below which we call it "no growth".
///
/// A constant series can produce a slope of a few ulps either side of zero.
pub const MIN_LOG_GROWTH: f64 = 1e-9;

/// Whether a log-linear slope over a time span amounts to real growth.
///
/// Shared by phase selection and the final fit so both accept the same runs.
pub fn shows_growth(slope: f64, span: f64) -> bool {
    slope * span > MIN_LOG_GROWTH
}

/// Fit `ln OD = intercept + r t` over `subrange` by ordinary least squares.
pub fn fit_growth_rate(subrange: &[Sample]) -> Result<FitResult, GrowthError> {
    if subrange.len() < MIN_FIT_POINTS {
        return Err(GrowthError::InsufficientData {
            found: subrange.len(),
            required: MIN_FIT_POINTS,
        });
    }

    let (t, ln_od) = log_transform(subrange)?;

    let line = fit_line(&t, &ln_od).ok_or_else(|| {
        GrowthError::DegenerateFit("time points are identical; slope is undefined".to_string())
    })?;

    let span = t.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        - t.iter().copied().fold(f64::INFINITY, f64::min);
    if !shows_growth(line.slope, span) {
        return Err(GrowthError::DegenerateFit(format!(
            "no exponential growth (slope {:.4e} per time unit is not positive)",
            line.slope
        )));
    }

    Ok(FitResult {
        subrange: subrange.to_vec(),
        growth_rate: line.slope,
        intercept: line.intercept,
        doubling_time: doubling_time(line.slope),
        r_squared: line.r_squared,
        rmse: line.rmse,
    })
}

/// Split samples into `(t, ln OD)` columns, rejecting values the log cannot take.
pub fn log_transform(samples: &[Sample]) -> Result<(Vec<f64>, Vec<f64>), GrowthError> {
    let mut t = Vec::with_capacity(samples.len());
    let mut ln_od = Vec::with_capacity(samples.len());
    for s in samples {
        if !s.time.is_finite() {
            return Err(GrowthError::DegenerateFit(format!("non-finite time value {}", s.time)));
        }
        if !(s.od.is_finite() && s.od > 0.0) {
            return Err(GrowthError::DegenerateFit(format!(
                "OD must be positive to take logs (OD={} at t={})",
                s.od, s.time
            )));
        }
        t.push(s.time);
        ln_od.push(s.od.ln());
    }
    Ok((t, ln_od))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::LN_2;

    fn exponential(od0: f64, r: f64, times: &[f64]) -> Vec<Sample> {
        times.iter().map(|&t| Sample::new(t, od0 * (r * t).exp())).collect()
    }

    #[test]
    fn doubling_series_gives_unit_doubling_time() {
        let samples = vec![
            Sample::new(0.0, 0.1),
            Sample::new(1.0, 0.2),
            Sample::new(2.0, 0.4),
            Sample::new(3.0, 0.8),
        ];
        let fit = fit_growth_rate(&samples).unwrap();
        assert!((fit.growth_rate - LN_2).abs() < 1e-12);
        assert!((fit.doubling_time - 1.0).abs() < 1e-12);
        assert!((fit.od0() - 0.1).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.n(), 4);
    }

    #[test]
    fn noise_free_exponential_recovers_parameters() {
        for &(od0, r) in &[(0.05, 0.35), (0.002, 1.7), (0.3, 0.01)] {
            let times: Vec<f64> = (0..9).map(|i| 2.0 + 0.75 * i as f64).collect();
            let fit = fit_growth_rate(&exponential(od0, r, &times)).unwrap();
            assert!((fit.growth_rate - r).abs() < 1e-10, "r={r} got {}", fit.growth_rate);
            assert!((fit.od0() - od0).abs() / od0 < 1e-9, "od0={od0} got {}", fit.od0());
            assert!(fit.rmse < 1e-10);
        }
    }

    #[test]
    fn doubling_time_is_ln2_over_rate() {
        let samples = vec![
            Sample::new(0.0, 0.11),
            Sample::new(1.5, 0.19),
            Sample::new(3.0, 0.42),
            Sample::new(4.5, 0.77),
        ];
        let fit = fit_growth_rate(&samples).unwrap();
        assert_eq!(fit.doubling_time, LN_2 / fit.growth_rate);
    }

    #[test]
    fn constant_od_is_degenerate() {
        let samples: Vec<Sample> = (0..5).map(|i| Sample::new(i as f64, 0.37)).collect();
        let err = fit_growth_rate(&samples).unwrap_err();
        assert!(matches!(err, GrowthError::DegenerateFit(_)));
    }

    #[test]
    fn decreasing_od_is_degenerate() {
        let samples = exponential(1.0, -0.4, &[0.0, 1.0, 2.0, 3.0]);
        let err = fit_growth_rate(&samples).unwrap_err();
        assert!(matches!(err, GrowthError::DegenerateFit(_)));
    }

    #[test]
    fn non_positive_od_is_degenerate() {
        let samples = vec![Sample::new(0.0, 0.0), Sample::new(1.0, 0.2), Sample::new(2.0, 0.4)];
        let err = fit_growth_rate(&samples).unwrap_err();
        assert!(matches!(err, GrowthError::DegenerateFit(_)));

        let samples = vec![Sample::new(0.0, -0.1), Sample::new(1.0, 0.2)];
        assert!(matches!(fit_growth_rate(&samples), Err(GrowthError::DegenerateFit(_))));
    }

    #[test]
    fn identical_times_are_degenerate() {
        let samples = vec![Sample::new(2.0, 0.1), Sample::new(2.0, 0.3), Sample::new(2.0, 0.2)];
        assert!(matches!(fit_growth_rate(&samples), Err(GrowthError::DegenerateFit(_))));
    }

    #[test]
    fn single_sample_is_insufficient() {
        let err = fit_growth_rate(&[Sample::new(0.0, 0.1)]).unwrap_err();
        assert_eq!(err, GrowthError::InsufficientData { found: 1, required: 2 });
    }
}
