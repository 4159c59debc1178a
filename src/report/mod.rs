//! Reporting utilities: cross-replicate summary and formatted terminal output.

use serde::{Deserialize, Serialize};

use crate::domain::ReplicateAnalysis;
use crate::math::{mean, sample_sd};

pub mod format;

pub use format::*;

/// Mean and sample standard deviation of one metric across replicates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    /// `None` with fewer than two replicates.
    pub sd: Option<f64>,
}

impl MetricSummary {
    fn of(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            sd: sample_sd(values),
        })
    }
}

/// Overall results across all fitted replicates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub n: usize,
    pub growth_rate: MetricSummary,
    pub doubling_time: MetricSummary,
    pub r_squared: MetricSummary,
}

/// Summarize fitted replicates (`None` when there are none).
pub fn summarize(analyses: &[ReplicateAnalysis]) -> Option<RunSummary> {
    let rates: Vec<f64> = analyses.iter().map(|a| a.fit.growth_rate).collect();
    let doubling: Vec<f64> = analyses.iter().map(|a| a.fit.doubling_time).collect();
    let r2: Vec<f64> = analyses.iter().map(|a| a.fit.r_squared).collect();

    Some(RunSummary {
        n: analyses.len(),
        growth_rate: MetricSummary::of(&rates)?,
        doubling_time: MetricSummary::of(&doubling)?,
        r_squared: MetricSummary::of(&r2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitResult, Sample};

    pub(crate) fn analysis(name: &str, rate: f64, r2: f64) -> ReplicateAnalysis {
        let samples = vec![Sample::new(0.0, 0.1), Sample::new(1.0, 0.1 * rate.exp())];
        ReplicateAnalysis {
            name: name.to_string(),
            samples: samples.clone(),
            phase_start: 0,
            phase_end: 2,
            fit: FitResult {
                subrange: samples,
                growth_rate: rate,
                intercept: 0.1_f64.ln(),
                doubling_time: std::f64::consts::LN_2 / rate,
                r_squared: r2,
                rmse: 0.0,
            },
        }
    }

    #[test]
    fn summary_uses_sample_sd() {
        let analyses = vec![analysis("A", 0.5, 0.9), analysis("B", 0.7, 1.0)];
        let s = summarize(&analyses).unwrap();
        assert_eq!(s.n, 2);
        assert!((s.growth_rate.mean - 0.6).abs() < 1e-12);
        // Two values 0.2 apart: sample SD = 0.2 / sqrt(2).
        assert!((s.growth_rate.sd.unwrap() - 0.2 / 2f64.sqrt()).abs() < 1e-12);
        assert!((s.r_squared.mean - 0.95).abs() < 1e-12);
    }

    #[test]
    fn single_replicate_has_no_sd() {
        let s = summarize(&[analysis("A", 0.5, 0.9)]).unwrap();
        assert_eq!(s.growth_rate.sd, None);
        assert!(summarize(&[]).is_none());
    }
}
