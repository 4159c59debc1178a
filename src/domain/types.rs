//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during selection and fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

/// Consecutive-point counts tried by default (matches the lab notebook workflow).
pub const DEFAULT_MIN_POINTS: usize = 3;
pub const DEFAULT_MAX_POINTS: usize = 7;

/// Candidates must explain at least this share of ln(OD) variance by default.
pub const DEFAULT_R2_THRESHOLD: f64 = 0.8;

/// A regression line needs two distinct time points.
pub const MIN_FIT_POINTS: usize = 2;

/// One OD reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub od: f64,
}

impl Sample {
    pub fn new(time: f64, od: f64) -> Self {
        Self { time, od }
    }
}

/// Inclusive time bounds restricting which samples may be part of the exponential phase.
///
/// `None` on either side means "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Window {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl Window {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// The window that admits every sample.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start.is_none_or(|s| t >= s) && self.end.is_none_or(|e| t <= e)
    }

    pub fn validate(&self) -> Result<(), GrowthError> {
        for bound in [self.start, self.end].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(GrowthError::InvalidConfig(format!(
                    "window bound must be finite (got {bound})"
                )));
            }
        }
        if let (Some(s), Some(e)) = (self.start, self.end) {
            if s > e {
                return Err(GrowthError::InvalidConfig(format!(
                    "window start ({s}) is after window end ({e})"
                )));
            }
        }
        Ok(())
    }

    /// Human-readable form, e.g. `[2, 10]` or `[-inf, 10]`.
    pub fn label(&self) -> String {
        let fmt = |v: Option<f64>, open: &str| v.map(|x| format!("{x}")).unwrap_or_else(|| open.to_string());
        format!("[{}, {}]", fmt(self.start, "-inf"), fmt(self.end, "+inf"))
    }
}

/// How the winning candidate is chosen among eligible sub-ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Criterion {
    /// Highest R² wins; ties prefer more points, then the earlier start.
    BestFit,
    /// Highest slope wins among candidates above the R² threshold.
    Steepest,
}

/// Parameters of the exponential-phase search.
///
/// The point counts depend on the measurement cadence of the experiment, so
/// they are always supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub min_points: usize,
    pub max_points: usize,
    pub r_squared_threshold: f64,
    pub criterion: Criterion,
}

impl SelectionConfig {
    pub fn new(min_points: usize, max_points: usize) -> Self {
        Self {
            min_points,
            max_points,
            r_squared_threshold: DEFAULT_R2_THRESHOLD,
            criterion: Criterion::BestFit,
        }
    }

    /// Use exactly `points` consecutive samples.
    pub fn fixed(points: usize) -> Self {
        Self::new(points, points)
    }

    pub fn with_threshold(mut self, r_squared_threshold: f64) -> Self {
        self.r_squared_threshold = r_squared_threshold;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn validate(&self) -> Result<(), GrowthError> {
        if self.min_points < MIN_FIT_POINTS {
            return Err(GrowthError::InvalidConfig(format!(
                "min_points must be >= {MIN_FIT_POINTS} (got {})",
                self.min_points
            )));
        }
        if self.max_points < self.min_points {
            return Err(GrowthError::InvalidConfig(format!(
                "max_points ({}) must be >= min_points ({})",
                self.max_points, self.min_points
            )));
        }
        if !(self.r_squared_threshold.is_finite() && (0.0..1.0).contains(&self.r_squared_threshold)) {
            return Err(GrowthError::InvalidConfig(format!(
                "r_squared_threshold must be in [0, 1) (got {})",
                self.r_squared_threshold
            )));
        }
        Ok(())
    }
}

/// A contiguous run of samples chosen as the exponential phase.
///
/// `start..end` indexes into the sample slice passed to the selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Subrange {
    pub start: usize,
    pub end: usize,
    pub samples: Vec<Sample>,
}

/// Exponential fit of one sub-range: `ln(OD) = intercept + growth_rate * t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub subrange: Vec<Sample>,
    pub growth_rate: f64,
    pub intercept: f64,
    pub doubling_time: f64,
    pub r_squared: f64,
    /// Root-mean-square residual in ln(OD) units.
    pub rmse: f64,
}

impl FitResult {
    /// Extrapolated OD at `t = 0`.
    pub fn od0(&self) -> f64 {
        self.intercept.exp()
    }

    pub fn n(&self) -> usize {
        self.subrange.len()
    }

    pub fn t_start(&self) -> f64 {
        self.subrange.first().map(|s| s.time).unwrap_or(f64::NAN)
    }

    pub fn t_end(&self) -> f64 {
        self.subrange.last().map(|s| s.time).unwrap_or(f64::NAN)
    }
}

/// One OD column of the input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replicate {
    pub name: String,
    pub samples: Vec<Sample>,
}

/// Analysis outcome for a single replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateAnalysis {
    pub name: String,
    pub samples: Vec<Sample>,
    /// Index range of the selected phase within `samples` (end exclusive).
    pub phase_start: usize,
    pub phase_end: usize,
    pub fit: FitResult,
}

/// A replicate that could not be fitted (only recorded with `keep_going`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedReplicate {
    pub name: String,
    pub reason: String,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub csv_path: PathBuf,
    pub window: Window,
    pub selection: SelectionConfig,
    /// Replicate names to analyse (empty = all).
    pub replicates: Vec<String>,
    /// Continue past replicates that fail to fit.
    pub keep_going: bool,
    pub time_unit: String,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    /// Directory for SVG charts (`None` disables SVG output).
    pub svg_dir: Option<PathBuf>,
    pub export_results: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}
