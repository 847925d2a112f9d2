//! Plotters-powered daily chart widget for Ratatui.
//!
//! Tests per day sit on the primary (left) axis and the positivity rate on a
//! secondary (right) axis fixed to 0–100 %. Plotters output is rendered into
//! the Ratatui buffer using `plotters-ratatui-backend`.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description; all series are prepared by the caller.
pub struct DailyChart<'a> {
    /// Day zero of the x axis (x values are day offsets from it).
    pub first: NaiveDate,
    /// `(day offset, tests)`
    pub tests: &'a [(f64, f64)],
    /// `(day offset, positive %)`
    pub positivity: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> DailyChart<'a> {
    fn format_day(&self, offset: f64) -> String {
        let date = self.first + Duration::days(offset.round() as i64);
        date.format("%d/%m").to_string()
    }
}

impl<'a> Widget for DailyChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area; show a hint instead.
        if area.width < 30 || area.height < 8 {
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
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Right, 5)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?
                .set_secondary_coord(x0..x1, 0.0..100.0);

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("Data")
                .y_desc("Tests")
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| self.format_day(*v))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            chart
                .configure_secondary_axes()
                .y_desc("Positius (%)")
                .y_labels(5)
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            let tests_color = RGBColor(0, 255, 255); // cyan
            let positive_color = RGBColor(255, 215, 0); // gold

            // Colored pixels rather than circles: the backend scales circle
            // radii into canvas units and they come out huge.
            chart.draw_series(self.tests.iter().map(|&(x, y)| Pixel::new((x, y), tests_color)))?;
            chart.draw_secondary_series(
                self.positivity
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), positive_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
