//! Ratatui-based replicate viewer (`growth view`).
//!
//! Shows one replicate at a time: its `ln OD` samples, the selected exponential
//! phase and the fitted line, plus the fit numbers in the header.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, ReplicateAnalysis};
use crate::error::AppError;
use crate::models::fitted_line;
use crate::report::format::plural;

mod plotters_chart;

use plotters_chart::GrowthChart;

/// Start the viewer on a finished run.
pub fn run(run: RunOutput, config: &AnalysisConfig) -> Result<(), AppError> {
    if run.analyses.is_empty() {
        return Err(AppError::new(3, "Nothing to view: no replicate was fitted."));
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(run, config);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    run: RunOutput,
    source: String,
    time_unit: String,
    selected: usize,
    status: String,
}

impl App {
    fn new(run: RunOutput, config: &AnalysisConfig) -> Self {
        let status = if run.skipped.is_empty() {
            format!("{} replicate(s) fitted", run.analyses.len())
        } else {
            format!(
                "{} replicate(s) fitted, {} skipped",
                run.analyses.len(),
                run.skipped.len()
            )
        };
        Self {
            run,
            source: config.csv_path.display().to_string(),
            time_unit: config.time_unit.clone(),
            selected: 0,
            status,
        }
    }

    fn current(&self) -> &ReplicateAnalysis {
        &self.run.analyses[self.selected]
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the viewer should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let n = self.run.analyses.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Right | KeyCode::Down | KeyCode::Char('l') => {
                self.selected = (self.selected + 1) % n;
            }
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') => {
                self.selected = (self.selected + n - 1) % n;
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = n - 1,
            _ => return false,
        }
        self.status = format!("replicate {}/{}: {}", self.selected + 1, n, self.current().name);
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let a = self.current();
        let f = &a.fit;
        let unit = &self.time_unit;

        let lines = vec![
            Line::from(vec![
                Span::styled("growth", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" - {}", self.source)),
            ]),
            Line::from(Span::styled(
                format!(
                    "{} ({}/{}) | phase t=[{}, {}] | n={}",
                    a.name,
                    self.selected + 1,
                    self.run.analyses.len(),
                    f.t_start(),
                    f.t_end(),
                    f.n()
                ),
                Style::default().fg(Color::Gray),
            )),
            Line::from(Span::styled(
                format!(
                    "Growth rate: {:.4} per {unit} | Doubling time: {:.2} {} | R²: {:.4}",
                    f.growth_rate,
                    f.doubling_time,
                    plural(unit),
                    f.r_squared
                ),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(28)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_replicates(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("ln(OD) vs time").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = chart_series(self.current());
        let x_label = format!("time ({})", plural(&self.time_unit));

        let (chart_rect, insets) = chart_layout(inner);
        let widget = GrowthChart {
            fit_line: &series.fit_line,
            points: &series.points,
            phase: &series.phase,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: x_label.clone(),
            y_label: "ln(OD)",
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, &series, &x_label);
        }
    }

    fn draw_replicates(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut items: Vec<ListItem> = self
            .run
            .analyses
            .iter()
            .map(|a| ListItem::new(format!("{} r={:.3}", a.name, a.fit.growth_rate)))
            .collect();
        items.extend(self.run.skipped.iter().map(|s| {
            ListItem::new(format!("{} (skipped)", s.name)).style(Style::default().fg(Color::DarkGray))
        }));

        let list = List::new(items)
            .block(Block::default().title("Replicates").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ replicate  Home/End first/last  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Data for one chart frame.
#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    fit_line: Vec<(f64, f64)>,
    points: Vec<(f64, f64)>,
    phase: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Split a replicate's samples into in-phase / other points in log space and
/// compute padded bounds covering both plus the fitted line.
fn chart_series(a: &ReplicateAnalysis) -> ChartSeries {
    let mut points = Vec::new();
    let mut phase = Vec::new();
    for (i, s) in a.samples.iter().enumerate() {
        if !(s.od > 0.0 && s.od.is_finite() && s.time.is_finite()) {
            continue;
        }
        let p = (s.time, s.od.ln());
        if (a.phase_start..a.phase_end).contains(&i) {
            phase.push(p);
        } else {
            points.push(p);
        }
    }

    let fit_line = fitted_line(&a.fit, 100);

    let all = || points.iter().chain(phase.iter()).chain(fit_line.iter());
    let x_bounds = padded_bounds(all().map(|p| p.0));
    let y_bounds = padded_bounds(all().map(|p| p.1));

    ChartSeries {
        fit_line,
        points,
        phase,
        x_bounds,
        y_bounds,
    }
}

fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(1e-12);
    [lo - pad, hi + pad]
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    series: &ChartSeries,
    x_label: &str,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let [x0, x1] = series.x_bounds;
    let [y0, y1] = series.y_bounds;

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = format!("{:.1}", x0 + u * (x1 - x0));
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = format!("{:.2}", y0 + u * (y1 - y0));
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let start = (inner.x + insets.left.saturating_sub(1)).saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let width = label.len() as u16;
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width,
                height: 1,
            },
        );
    }

    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(
            Paragraph::new(x_label.to_string()).alignment(Alignment::Center).style(style),
            x_rect,
        );
    }

    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(
        Paragraph::new("ln(OD)").style(style.add_modifier(Modifier::BOLD)),
        y_rect,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitResult, Sample};

    fn analysis() -> ReplicateAnalysis {
        let samples: Vec<Sample> = (0..5).map(|i| Sample::new(i as f64, 0.1 * 2f64.powi(i))).collect();
        ReplicateAnalysis {
            name: "R1".to_string(),
            samples: samples.clone(),
            phase_start: 1,
            phase_end: 4,
            fit: FitResult {
                subrange: samples[1..4].to_vec(),
                growth_rate: std::f64::consts::LN_2,
                intercept: 0.1_f64.ln(),
                doubling_time: 1.0,
                r_squared: 1.0,
                rmse: 0.0,
            },
        }
    }

    #[test]
    fn series_split_phase_from_other_points() {
        let s = chart_series(&analysis());
        assert_eq!(s.phase.len(), 3);
        assert_eq!(s.points.len(), 2);
        assert_eq!(s.points[0].0, 0.0);
        assert_eq!(s.points[1].0, 4.0);
        assert_eq!(s.fit_line.first().map(|p| p.0), Some(1.0));
        assert_eq!(s.fit_line.last().map(|p| p.0), Some(3.0));
    }

    #[test]
    fn bounds_cover_all_points_with_padding() {
        let s = chart_series(&analysis());
        assert!(s.x_bounds[0] < 0.0 && s.x_bounds[1] > 4.0);
        let y_max = (0.1 * 16.0_f64).ln();
        assert!(s.y_bounds[0] < 0.1_f64.ln() && s.y_bounds[1] > y_max);
    }

    #[test]
    fn degenerate_bounds_fall_back_to_unit_range() {
        assert_eq!(padded_bounds(std::iter::empty()), [0.0, 1.0]);
        assert_eq!(padded_bounds([2.0, 2.0].into_iter()), [0.0, 1.0]);
    }

    #[test]
    fn layout_reserves_axis_space_only_when_large_enough() {
        let (rect, insets) = chart_layout(Rect::new(0, 0, 80, 30));
        assert!(insets.is_some());
        assert_eq!(rect, Rect::new(8, 1, 70, 27));

        let (rect, insets) = chart_layout(Rect::new(0, 0, 15, 6));
        assert!(insets.is_none());
        assert_eq!(rect, Rect::new(0, 0, 15, 6));
    }
}
