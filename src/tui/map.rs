//! Region map drawn on a Ratatui canvas.
//!
//! Each ABS outline is stroked in a green shade proportional to its total
//! tests; regions without data are drawn dark gray.

use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        Widget,
        canvas::{Canvas, Line},
    },
};

use crate::domain::RegionalSummary;
use crate::geo::{GeoReference, code_key};

pub struct RegionMap<'a> {
    pub geo: &'a GeoReference,
    /// `geo::code_key` → total tests.
    pub totals: &'a HashMap<String, i64>,
}

impl<'a> Widget for RegionMap<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some((lon, lat)) = self.geo.bounds() else {
            return;
        };
        let max_total = self.totals.values().copied().max().unwrap_or(0);

        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(lon)
            .y_bounds(lat)
            .paint(|ctx| {
                for region in self.geo.regions() {
                    let color = match self.totals.get(&region.code) {
                        Some(&total) => green_shade(total, max_total),
                        None => Color::DarkGray,
                    };
                    for ring in &region.rings {
                        for pair in ring.windows(2) {
                            let (x1, y1) = pair[0];
                            let (x2, y2) = pair[1];
                            ctx.draw(&Line::new(x1, y1, x2, y2, color));
                        }
                    }
                }
            });

        canvas.render(area, buf);
    }
}

/// Sum regional totals by `geo::code_key` (names are display-only).
pub fn totals_by_code(regional: &RegionalSummary) -> HashMap<String, i64> {
    let mut out = HashMap::new();
    for (region, total) in regional {
        let entry = out.entry(code_key(&region.code)).or_insert(0i64);
        *entry = entry.saturating_add(*total);
    }
    out
}

/// Light-to-dark green ramp.
pub fn green_shade(value: i64, max: i64) -> Color {
    const LIGHT: (f64, f64, f64) = (199.0, 233.0, 192.0);
    const DARK: (f64, f64, f64) = (0.0, 109.0, 44.0);

    let u = if max > 0 {
        (value as f64 / max as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mix = |a: f64, b: f64| (a + (b - a) * u).round() as u8;
    Color::Rgb(mix(LIGHT.0, DARK.0), mix(LIGHT.1, DARK.1), mix(LIGHT.2, DARK.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegionKey;

    #[test]
    fn shade_spans_the_ramp() {
        assert_eq!(green_shade(0, 100), Color::Rgb(199, 233, 192));
        assert_eq!(green_shade(100, 100), Color::Rgb(0, 109, 44));
        assert_eq!(green_shade(5, 0), Color::Rgb(199, 233, 192));
    }

    #[test]
    fn totals_merge_by_code() {
        let regional = RegionalSummary::from([
            (RegionKey::new("001", "Alpha"), 10),
            (RegionKey::new("001", "Alpha (old name)"), 5),
            (RegionKey::new("002", "Beta"), 7),
        ]);
        let totals = totals_by_code(&regional);
        assert_eq!(totals["1"], 15);
        assert_eq!(totals["2"], 7);
    }
}
