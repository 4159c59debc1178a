//! SVG chart files.
//!
//! Two chart kinds, both in log space:
//! - overview: `ln OD` vs time for every replicate
//! - fit: one replicate's samples, the fitted line over the selected phase, a
//!   legend with R² and a growth-rate annotation

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::ReplicateAnalysis;
use crate::error::AppError;
use crate::models::fitted_line;
use crate::report::format::plural;

pub const CHART_WIDTH: u32 = 1000;
pub const CHART_HEIGHT: u32 = 600;

/// Axis labelling shared by all charts of a run.
#[derive(Debug, Clone)]
pub struct ChartLabels {
    /// Time unit, singular (e.g. `day`).
    pub time_unit: String,
}

impl ChartLabels {
    fn x_desc(&self) -> String {
        format!("Time ({})", plural(&self.time_unit))
    }
}

/// Write `overview.svg` plus one `<name>_fit.svg` per replicate into `dir`.
pub fn write_svg_charts(
    dir: &Path,
    analyses: &[ReplicateAnalysis],
    labels: &ChartLabels,
) -> Result<Vec<PathBuf>, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create chart dir '{}': {e}", dir.display())))?;

    let mut written = Vec::with_capacity(analyses.len() + 1);

    let path = dir.join("overview.svg");
    {
        let root = SVGBackend::new(&path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        draw_overview(&root, analyses, labels)?;
    }
    written.push(path);

    for a in analyses {
        let path = dir.join(format!("{}_fit.svg", file_stem(&a.name)));
        {
            let root = SVGBackend::new(&path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
            draw_fit(&root, a, labels)?;
        }
        written.push(path);
    }

    for p in &written {
        log::info!("wrote {}", p.display());
    }
    Ok(written)
}

/// Draw every replicate's `ln OD` trace.
pub fn draw_overview(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    analyses: &[ReplicateAnalysis],
    labels: &ChartLabels,
) -> Result<(), AppError> {
    root.fill(&WHITE).map_err(chart_err)?;

    let traces: Vec<Vec<(f64, f64)>> = analyses.iter().map(log_points).collect();
    let (x_range, y_range) = bounds(traces.iter().flatten().copied());

    let mut chart = ChartBuilder::on(root)
        .caption("Bacterial Growth Data (Logarithmic Scale)", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc(labels.x_desc())
        .y_desc("ln(OD)")
        .draw()
        .map_err(chart_err)?;

    for (idx, (a, trace)) in analyses.iter().zip(&traces).enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(trace.iter().copied(), color.stroke_width(2)))
            .map_err(chart_err)?
            .label(a.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)
}

/// Draw one replicate's samples with its exponential fit.
pub fn draw_fit(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    analysis: &ReplicateAnalysis,
    labels: &ChartLabels,
) -> Result<(), AppError> {
    root.fill(&WHITE).map_err(chart_err)?;

    let points = log_points(analysis);
    let line = fitted_line(&analysis.fit, 50);
    let (x_range, y_range) = bounds(points.iter().chain(line.iter()).copied());

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("Exponential Growth Fit for {} (Logarithmic Scale)", analysis.name),
            ("sans-serif", 22),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc(labels.x_desc())
        .y_desc("ln(OD)")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
        .map_err(chart_err)?
        .label(format!("Original ln(OD) - {}", analysis.name))
        .legend(|(x, y)| Circle::new((x + 10, y), 4, BLUE.filled()));

    chart
        .draw_series(LineSeries::new(line, RED.stroke_width(2)))
        .map_err(chart_err)?
        .label(format!("Exponential Fit (R² = {:.2})", analysis.fit.r_squared))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    let annotation = format!(
        "Growth rate: {:.4} per {}  |  Doubling time: {:.2}",
        analysis.fit.growth_rate, labels.time_unit, analysis.fit.doubling_time
    );
    root.draw(&Text::new(annotation, (90, 50), ("sans-serif", 16).into_font()))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)
}

fn log_points(analysis: &ReplicateAnalysis) -> Vec<(f64, f64)> {
    analysis
        .samples
        .iter()
        .filter(|s| s.od > 0.0 && s.od.is_finite() && s.time.is_finite())
        .map(|s| (s.time, s.od.ln()))
        .collect()
}

/// Padded axis ranges; falls back to the unit square when there is nothing to span.
fn bounds(points: impl Iterator<Item = (f64, f64)>) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let (mut x0, mut x1, mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in points {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }
    (padded(x0, x1), padded(y0, y1))
}

fn padded(min: f64, max: f64) -> std::ops::Range<f64> {
    if !(min.is_finite() && max.is_finite()) {
        return 0.0..1.0;
    }
    let span = max - min;
    let pad = if span < 1e-9 { 0.5 } else { span * 0.05 };
    (min - pad)..(max + pad)
}

/// Replicate name -> safe file stem (`Strain A/1` -> `Strain_A_1`).
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "replicate".to_string() } else { stem }
}

fn chart_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::new(4, format!("Chart rendering failed: {e}"))
}
