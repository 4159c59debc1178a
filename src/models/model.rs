//! Exponential growth model evaluation.
//!
//! The fit lives in log space, `ln OD(t) = intercept + r t`, so the primitives
//! come in two flavours: log-space (what the regression and the charts use) and
//! linear OD (what a reader of the report thinks in).

use crate::domain::FitResult;

/// Predict `ln OD(t)`.
pub fn predict_ln_od(t: f64, intercept: f64, growth_rate: f64) -> f64 {
    intercept + growth_rate * t
}

/// Predict `OD(t) = OD0 · e^(r t)`.
pub fn predict_od(t: f64, intercept: f64, growth_rate: f64) -> f64 {
    predict_ln_od(t, intercept, growth_rate).exp()
}

/// Doubling time for a growth rate, `ln 2 / r`.
pub fn doubling_time(growth_rate: f64) -> f64 {
    std::f64::consts::LN_2 / growth_rate
}

/// Evenly spaced `(t, ln OD)` points of the fitted line across the fitted sub-range.
pub fn fitted_line(fit: &FitResult, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let (t0, t1) = (fit.t_start(), fit.t_end());
    if !(t0.is_finite() && t1.is_finite()) {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let t = t0 + u * (t1 - t0);
            (t, predict_ln_od(t, fit.intercept, fit.growth_rate))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;

    #[test]
    fn predict_od_doubles_after_doubling_time() {
        let r = 0.3;
        let b = 0.1_f64.ln();
        let td = doubling_time(r);
        let ratio = predict_od(5.0 + td, b, r) / predict_od(5.0, b, r);
        assert!((ratio - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fitted_line_spans_subrange() {
        let fit = FitResult {
            subrange: vec![Sample::new(1.0, 0.2), Sample::new(3.0, 0.8)],
            growth_rate: std::f64::consts::LN_2,
            intercept: 0.1_f64.ln(),
            doubling_time: 1.0,
            r_squared: 1.0,
            rmse: 0.0,
        };
        let line = fitted_line(&fit, 5);
        assert_eq!(line.len(), 5);
        assert_eq!(line[0].0, 1.0);
        assert_eq!(line[4].0, 3.0);
        assert!((line[4].1 - 0.8_f64.ln()).abs() < 1e-12);
    }
}
