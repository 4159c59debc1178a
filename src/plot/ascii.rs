//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Everything is drawn in log space (`ln OD` vs time), where the exponential
//! phase is a straight line.
//!
//! Plot elements:
//! - samples outside the selected phase: `o`
//! - samples inside the selected phase: `*`
//! - fitted line: `-`

use crate::domain::ReplicateAnalysis;
use crate::models::fitted_line;

/// Render one replicate's samples and fit.
pub fn render_ascii_plot(analysis: &ReplicateAnalysis, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let points = log_points(analysis);
    let line = fitted_line(&analysis.fit, width);

    let (t_min, t_max) = range(points.iter().map(|p| p.0).chain(line.iter().map(|p| p.0)))
        .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(points.iter().map(|p| p.1).chain(line.iter().map(|p| p.1)))
        .unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the line first so samples overlay it.
    draw_curve(&mut grid, &line, t_min, t_max, y_min, y_max);

    for &(t, y, in_phase) in &points {
        let x = map_x(t, t_min, t_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][x] = if in_phase { '*' } else { 'o' };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | t=[{t_min:.3}, {t_max:.3}] | ln(OD)=[{y_min:.2}, {y_max:.2}] | r={:.4} R²={:.2}\n",
        analysis.name, analysis.fit.growth_rate, analysis.fit.r_squared
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// `(t, ln OD, in_phase)` for every sample whose log is defined.
fn log_points(analysis: &ReplicateAnalysis) -> Vec<(f64, f64, bool)> {
    analysis
        .samples
        .iter()
        .enumerate()
        .filter(|(_, s)| s.od > 0.0 && s.od.is_finite() && s.time.is_finite())
        .map(|(i, s)| {
            let in_phase = (analysis.phase_start..analysis.phase_end).contains(&i);
            (s.time, s.od.ln(), in_phase)
        })
        .collect()
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitResult, Sample};

    fn analysis() -> ReplicateAnalysis {
        // ln OD = 0, 1, 2, 2 at t = 0..3; the phase is the first three samples.
        let samples: Vec<Sample> = [0.0, 1.0, 2.0, 2.0]
            .iter()
            .enumerate()
            .map(|(i, y)| Sample::new(i as f64, f64::exp(*y)))
            .collect();
        ReplicateAnalysis {
            name: "R1".to_string(),
            samples: samples.clone(),
            phase_start: 0,
            phase_end: 3,
            fit: FitResult {
                subrange: samples[0..3].to_vec(),
                growth_rate: 1.0,
                intercept: 0.0,
                doubling_time: std::f64::consts::LN_2,
                r_squared: 1.0,
                rmse: 0.0,
            },
        }
    }

    #[test]
    fn plot_marks_phase_and_other_samples() {
        let txt = render_ascii_plot(&analysis(), 10, 5);
        let lines: Vec<&str> = txt.lines().collect();

        assert_eq!(
            lines[0],
            "Plot: R1 | t=[0.000, 3.000] | ln(OD)=[-0.10, 2.10] | r=1.0000 R²=1.00"
        );
        assert_eq!(lines.len(), 6);

        let grid: Vec<Vec<char>> = lines[1..].iter().map(|l| l.chars().collect()).collect();
        assert_eq!(grid[4][0], '*');
        assert_eq!(grid[2][3], '*');
        assert_eq!(grid[0][6], '*');
        assert_eq!(grid[0][9], 'o');
        // The fitted line stops at the end of the phase.
        assert!(grid.iter().all(|row| row[7..].iter().all(|&c| c != '-')));
    }

    #[test]
    fn non_positive_samples_are_not_drawn() {
        let mut a = analysis();
        a.samples[3].od = 0.0;
        let txt = render_ascii_plot(&a, 10, 5);
        assert!(txt.lines().skip(1).all(|row| !row.contains('o')));
    }
}
