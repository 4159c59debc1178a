//! Plotters-powered growth chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description; series and bounds are computed by the caller.
pub struct GrowthChart<'a> {
    /// Fitted line over the selected phase (`t`, `ln OD`).
    pub fit_line: &'a [(f64, f64)],
    /// Samples outside the selected phase.
    pub points: &'a [(f64, f64)],
    /// Samples inside the selected phase.
    pub phase: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: String,
    pub y_label: &'a str,
}

impl Widget for GrowthChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters fails to lay out tiny areas; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label.as_str())
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(255, 0, 0);
            let phase_color = RGBColor(0, 255, 255);

            chart.draw_series(LineSeries::new(self.fit_line.iter().copied(), &line_color))?;

            // `Circle` radii are mis-scaled by the ratatui backend; pixels render as dots.
            chart.draw_series(self.points.iter().map(|&p| Pixel::new(p, WHITE)))?;
            chart.draw_series(self.phase.iter().map(|&p| Pixel::new(p, phase_color)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
