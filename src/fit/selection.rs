//! Exponential-phase selection.
//!
//! Within the user's time window, every run of `min_points..=max_points`
//! consecutive samples is fitted in log space. A run is eligible when:
//!
//! 1. all its OD values are positive (log defined)
//! 2. its log-OD rise across the run exceeds `MIN_LOG_GROWTH` (the culture is growing)
//! 3. its R² exceeds the configured threshold
//!
//! Among eligible runs the winner depends on `Criterion`:
//! - `BestFit`: highest R²; ties prefer more points, then the earlier start
//! - `Steepest`: highest slope; ties prefer higher R², more points, earlier start

use std::cmp::Ordering;

use crate::domain::{Criterion, Sample, SelectionConfig, Subrange, Window};
use crate::error::GrowthError;
use crate::fit::candidates::{Candidate, candidate_ranges, evaluate_candidate, window_indices};
use crate::fit::fitter::shows_growth;

/// R² values closer than this are treated as equal.
const R2_TIE_EPS: f64 = 1e-12;

/// Relative tolerance for treating two slopes as equal.
const SLOPE_TIE_REL: f64 = 1e-12;

/// Choose the run of consecutive samples that best represents exponential growth.
pub fn select_exponential_phase(
    samples: &[Sample],
    window: &Window,
    config: &SelectionConfig,
) -> Result<Subrange, GrowthError> {
    config.validate()?;
    window.validate()?;

    if let Some(pair) = samples.windows(2).find(|w| !(w[0].time <= w[1].time)) {
        return Err(GrowthError::InvalidConfig(format!(
            "samples must be in ascending time order (t={} is followed by t={})",
            pair[0].time, pair[1].time
        )));
    }

    let indices = window_indices(samples, window);
    if indices.len() < config.min_points {
        return Err(GrowthError::InsufficientData {
            found: indices.len(),
            required: config.min_points,
        });
    }

    let ranges = candidate_ranges(indices.len(), config.min_points, config.max_points);
    let evaluated: Vec<Candidate> = ranges
        .iter()
        .filter_map(|&(offset, len)| evaluate_candidate(samples, &indices[offset..offset + len]))
        .collect();

    let eligible: Vec<&Candidate> = evaluated
        .iter()
        .filter(|c| shows_growth(c.slope, c.span) && c.r_squared > config.r_squared_threshold)
        .collect();

    log::debug!(
        "phase search in {}: {} in-window samples, {} runs, {} fitted, {} eligible",
        window.label(),
        indices.len(),
        ranges.len(),
        evaluated.len(),
        eligible.len()
    );

    let Some(best) = pick_best(&eligible, config.criterion) else {
        return Err(GrowthError::DegenerateFit(format!(
            "no run of {}..={} consecutive points in {} shows positive growth with R² > {}",
            config.min_points,
            config.max_points,
            window.label(),
            config.r_squared_threshold
        )));
    };

    log::debug!(
        "selected samples {}..{} (slope={:.6}, R²={:.6})",
        best.start,
        best.end,
        best.slope,
        best.r_squared
    );

    Ok(Subrange {
        start: best.start,
        end: best.end,
        samples: samples[best.start..best.end].to_vec(),
    })
}

fn pick_best<'a>(eligible: &[&'a Candidate], criterion: Criterion) -> Option<&'a Candidate> {
    let mut best: Option<&Candidate> = None;
    for &c in eligible {
        best = match best {
            Some(b) if compare(c, b, criterion) != Ordering::Greater => Some(b),
            _ => Some(c),
        };
    }
    best
}

/// Rank two candidates; `Greater` means `a` is preferred.
fn compare(a: &Candidate, b: &Candidate, criterion: Criterion) -> Ordering {
    let by_r2 = cmp_with_eps(a.r_squared, b.r_squared, R2_TIE_EPS);
    let by_len = a.len().cmp(&b.len());
    let by_start = b.start.cmp(&a.start);

    match criterion {
        Criterion::BestFit => by_r2.then(by_len).then(by_start),
        Criterion::Steepest => {
            let eps = SLOPE_TIE_REL * a.slope.abs().max(b.slope.abs());
            cmp_with_eps(a.slope, b.slope, eps)
                .then(by_r2)
                .then(by_len)
                .then(by_start)
        }
    }
}

fn cmp_with_eps(a: f64, b: f64, eps: f64) -> Ordering {
    if (a - b).abs() <= eps {
        Ordering::Equal
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::fit_growth_rate;
    use std::f64::consts::LN_2;

    /// Lag at 0.05 until t=3, doubling every time unit until t=8, then flat.
    fn lag_exp_stationary() -> Vec<Sample> {
        (0..14)
            .map(|i| {
                let t = i as f64;
                let od = 0.05 * 2f64.powf(t.clamp(3.0, 8.0) - 3.0);
                Sample::new(t, od)
            })
            .collect()
    }

    /// ln OD rises at 0.5 for five points, then roughly at 1.0 with small noise.
    fn slow_then_fast() -> Vec<Sample> {
        let ln_od = [0.0, 0.5, 1.0, 1.5, 2.0, 3.05, 3.95, 5.05];
        ln_od
            .iter()
            .enumerate()
            .map(|(i, y)| Sample::new(i as f64, (y - 3.0_f64).exp()))
            .collect()
    }

    #[test]
    fn empty_window_is_insufficient() {
        let samples = lag_exp_stationary();
        let err = select_exponential_phase(&samples, &Window::new(100.0, 200.0), &SelectionConfig::new(3, 7))
            .unwrap_err();
        assert_eq!(err, GrowthError::InsufficientData { found: 0, required: 3 });
    }

    #[test]
    fn window_smaller_than_min_points_is_insufficient() {
        let samples = lag_exp_stationary();
        let err = select_exponential_phase(&samples, &Window::new(4.0, 5.0), &SelectionConfig::new(3, 7))
            .unwrap_err();
        assert_eq!(err, GrowthError::InsufficientData { found: 2, required: 3 });
    }

    #[test]
    fn best_fit_finds_exponential_phase() {
        let samples = lag_exp_stationary();
        let sub = select_exponential_phase(&samples, &Window::unbounded(), &SelectionConfig::new(3, 7)).unwrap();
        assert_eq!((sub.start, sub.end), (3, 9));
        assert_eq!(sub.samples.first().unwrap().time, 3.0);
        assert_eq!(sub.samples.last().unwrap().time, 8.0);

        let fit = fit_growth_rate(&sub.samples).unwrap();
        assert!((fit.growth_rate - LN_2).abs() < 1e-10);
        assert!((fit.doubling_time - 1.0).abs() < 1e-10);
    }

    #[test]
    fn subrange_never_leaves_window() {
        let samples = lag_exp_stationary();
        let window = Window::new(5.0, 12.0);
        let sub = select_exponential_phase(&samples, &window, &SelectionConfig::new(3, 7)).unwrap();
        assert!(sub.samples.iter().all(|s| window.contains(s.time)));
        assert_eq!((sub.start, sub.end), (5, 9));
    }

    #[test]
    fn fixed_point_count_is_honoured() {
        let samples = lag_exp_stationary();
        let sub = select_exponential_phase(&samples, &Window::unbounded(), &SelectionConfig::fixed(4)).unwrap();
        assert_eq!(sub.samples.len(), 4);
        // Equal R² everywhere inside the phase: earliest start wins.
        assert_eq!(sub.start, 3);
    }

    #[test]
    fn criterion_changes_the_winner() {
        let samples = slow_then_fast();

        let best_fit = SelectionConfig::fixed(3);
        let sub = select_exponential_phase(&samples, &Window::unbounded(), &best_fit).unwrap();
        assert_eq!((sub.start, sub.end), (0, 3));

        let steepest = SelectionConfig::fixed(3).with_criterion(Criterion::Steepest);
        let sub = select_exponential_phase(&samples, &Window::unbounded(), &steepest).unwrap();
        assert_eq!((sub.start, sub.end), (5, 8));
    }

    #[test]
    fn no_growth_anywhere_is_degenerate() {
        let samples: Vec<Sample> = (0..10).map(|i| Sample::new(i as f64, 1.0 - 0.05 * i as f64)).collect();
        let err = select_exponential_phase(&samples, &Window::unbounded(), &SelectionConfig::new(3, 5))
            .unwrap_err();
        assert!(matches!(err, GrowthError::DegenerateFit(_)));
    }

    #[test]
    fn non_positive_od_runs_are_skipped() {
        let mut samples = lag_exp_stationary();
        samples[0].od = 0.0;
        samples[1].od = -0.01;
        let sub = select_exponential_phase(&samples, &Window::unbounded(), &SelectionConfig::new(3, 7)).unwrap();
        assert!(sub.samples.iter().all(|s| s.od > 0.0));
    }

    #[test]
    fn unordered_samples_are_rejected() {
        let samples = vec![
            Sample::new(0.0, 0.1),
            Sample::new(50.0, 9.0),
            Sample::new(1.0, 0.2),
            Sample::new(2.0, 0.4),
        ];
        let err = select_exponential_phase(&samples, &Window::new(0.0, 3.0), &SelectionConfig::fixed(3))
            .unwrap_err();
        assert!(matches!(err, GrowthError::InvalidConfig(_)));
    }

    #[test]
    fn near_flat_run_does_not_shadow_real_growth() {
        // OD creeps by 1e-11 per step (R² ~ 1, but no real growth), then doubles.
        let mut samples: Vec<Sample> = (0..4).map(|i| Sample::new(i as f64, 0.1 + i as f64 * 1e-11)).collect();
        samples.extend((4..9).map(|i| Sample::new(i as f64, 0.1 * 2f64.powi(i - 3))));

        let sub = select_exponential_phase(&samples, &Window::unbounded(), &SelectionConfig::new(3, 4)).unwrap();
        assert!(sub.start >= 2, "picked the flat run {}..{}", sub.start, sub.end);

        let fit = fit_growth_rate(&sub.samples).unwrap();
        assert!((fit.growth_rate - LN_2).abs() < 1e-6);
    }

    #[test]
    fn invalid_config_is_rejected_before_search() {
        let samples = lag_exp_stationary();
        let err = select_exponential_phase(&samples, &Window::unbounded(), &SelectionConfig::new(5, 3))
            .unwrap_err();
        assert!(matches!(err, GrowthError::InvalidConfig(_)));
    }
}
