//! Candidate sub-range generation.
//!
//! The exponential phase is searched for by brute force: every run of
//! consecutive in-window samples whose length lies in `min_points..=max_points`
//! is fitted and scored. With tens of samples per replicate this is a few
//! hundred two-parameter regressions, so no pruning is attempted.

use crate::domain::{Sample, Window};
use crate::math::fit_line;

/// A scored run of consecutive in-window samples.
///
/// `start..end` indexes into the original sample slice (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Time between the first and last sample of the run.
    pub span: f64,
}

impl Candidate {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Indices of the samples that fall inside `window`.
///
/// Samples must be in ascending time order (checked by the selector), so the
/// result is contiguous.
pub fn window_indices(samples: &[Sample], window: &Window) -> Vec<usize> {
    samples
        .iter()
        .enumerate()
        .filter(|(_, s)| window.contains(s.time))
        .map(|(i, _)| i)
        .collect()
}

/// All `(offset, len)` pairs over `n` positions with `len` in `min_len..=max_len`.
///
/// Ordered by increasing length, then increasing offset.
pub fn candidate_ranges(n: usize, min_len: usize, max_len: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for len in min_len..=max_len.min(n) {
        if len == 0 {
            continue;
        }
        for offset in 0..=(n - len) {
            out.push((offset, len));
        }
    }
    out
}

/// Fit `ln OD` vs `t` on one run of in-window samples.
///
/// Returns `None` when the run contains a non-positive OD (log undefined), a
/// non-finite value, or only identical timestamps.
pub fn evaluate_candidate(samples: &[Sample], indices: &[usize]) -> Option<Candidate> {
    let first = *indices.first()?;
    let last = *indices.last()?;

    let mut t = Vec::with_capacity(indices.len());
    let mut ln_od = Vec::with_capacity(indices.len());
    for &i in indices {
        let s = samples[i];
        if !(s.od.is_finite() && s.od > 0.0) {
            return None;
        }
        t.push(s.time);
        ln_od.push(s.od.ln());
    }

    let line = fit_line(&t, &ln_od)?;
    Some(Candidate {
        start: first,
        end: last + 1,
        slope: line.slope,
        intercept: line.intercept,
        r_squared: line.r_squared,
        span: samples[last].time - samples[first].time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_ranges_enumerates_all_runs() {
        let ranges = candidate_ranges(5, 3, 4);
        assert_eq!(ranges, vec![(0, 3), (1, 3), (2, 3), (0, 4), (1, 4)]);
    }

    #[test]
    fn candidate_ranges_caps_at_available_points() {
        assert_eq!(candidate_ranges(3, 3, 7), vec![(0, 3)]);
        assert!(candidate_ranges(2, 3, 7).is_empty());
    }

    #[test]
    fn window_indices_respects_bounds() {
        let samples: Vec<Sample> = (0..10).map(|i| Sample::new(i as f64, 0.1)).collect();
        assert_eq!(window_indices(&samples, &Window::new(2.0, 4.0)), vec![2, 3, 4]);
        assert!(window_indices(&samples, &Window::new(20.0, 30.0)).is_empty());
    }

    #[test]
    fn evaluate_candidate_skips_non_positive_od() {
        let samples = vec![Sample::new(0.0, 0.1), Sample::new(1.0, 0.0), Sample::new(2.0, 0.4)];
        assert!(evaluate_candidate(&samples, &[0, 1, 2]).is_none());
        let c = evaluate_candidate(&samples, &[0, 2]).unwrap();
        assert_eq!((c.start, c.end), (0, 3));
        assert!(c.slope > 0.0);
        assert_eq!(c.span, 2.0);
    }
}
