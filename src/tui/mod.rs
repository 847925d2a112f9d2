//! Ratatui-based terminal dashboard.
//!
//! Layout: title + last-update line, the ABS map next to a ranked region
//! table, the daily dual-axis chart, and a footer with keys and status. The
//! whole pipeline reruns every `REFRESH_INTERVAL`; a failed reload keeps the
//! previous snapshot on screen.

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

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
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
};
use tracing::info;

use crate::app::pipeline;
use crate::config::{REFRESH_INTERVAL, Settings};
use crate::error::{AppError, ErrorKind};
use crate::geo::GeoReference;
use crate::snapshot::{RefreshOutcome, Snapshot, SnapshotStore};

mod daily_chart;
mod map;

use daily_chart::DailyChart;
use map::RegionMap;

const TITLE: &str = "COVID-19 tests realitzats a Catalunya";

/// Start the dashboard.
pub fn run(settings: Settings) -> Result<(), AppError> {
    // Boundaries are static: load once, before touching the terminal.
    let geo = match &settings.geojson {
        Some(path) => Some(GeoReference::load(path, &settings.geo_property)?),
        None => None,
    };

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).map_err(|e| terminal_err("Failed to initialize terminal", e))?;

    let mut app = App::new(settings, geo);
    app.refresh();
    app.event_loop(&mut terminal)
}

fn terminal_err(context: &str, e: impl std::fmt::Display) -> AppError {
    AppError::new(ErrorKind::Terminal, format!("{context}: {e}"))
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| terminal_err("Failed to enable raw mode", e))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(terminal_err("Failed to enter alternate screen", e));
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
    settings: Settings,
    store: SnapshotStore,
    geo: Option<GeoReference>,
    /// ABS code → total, rebuilt whenever the snapshot changes.
    totals_by_code: HashMap<String, i64>,
    last_attempt: Instant,
    region_offset: usize,
    status: String,
}

impl App {
    fn new(settings: Settings, geo: Option<GeoReference>) -> Self {
        Self {
            settings,
            store: SnapshotStore::new(),
            geo,
            totals_by_code: HashMap::new(),
            last_attempt: Instant::now(),
            region_offset: 0,
            status: "Loading data...".to_string(),
        }
    }

    fn refresh(&mut self) {
        let source = self.settings.source.clone();
        match self.store.refresh_with(|| pipeline::build_snapshot(&source)) {
            RefreshOutcome::Updated(snapshot) => {
                self.totals_by_code = map::totals_by_code(&snapshot.regional);
                self.region_offset = 0;
                self.status = format!("Loaded {} records from {source}", snapshot.rows_used);
            }
            RefreshOutcome::Failed(err) => {
                self.status = if self.store.current().is_some() {
                    format!("Refresh failed, showing previous data: {err}")
                } else {
                    format!("Load failed: {err}")
                };
            }
            RefreshOutcome::Skipped => {}
        }
        self.last_attempt = Instant::now();
    }

    fn refresh_due(&self) -> bool {
        self.last_attempt.elapsed() >= REFRESH_INTERVAL
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        let mut last_draw = Instant::now();
        loop {
            if self.refresh_due() {
                info!("refresh timer fired");
                self.refresh();
                needs_redraw = true;
            }

            // The countdown in the footer ticks once a second.
            if needs_redraw || last_draw.elapsed() >= Duration::from_secs(1) {
                let snapshot = self.store.current();
                terminal
                    .draw(|f| self.draw(f, snapshot.as_deref()))
                    .map_err(|e| terminal_err("Terminal draw error", e))?;
                needs_redraw = false;
                last_draw = Instant::now();
            }

            if !event::poll(Duration::from_millis(100)).map_err(|e| terminal_err("Event poll error", e))? {
                continue;
            }

            match event::read().map_err(|e| terminal_err("Event read error", e))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.region_offset = self.region_offset.saturating_sub(1),
            KeyCode::Down => {
                // The table lists (code, name) pairs, so one code can span several rows.
                let rows = self.store.current().map(|s| s.regional.len()).unwrap_or(0);
                let max = rows.saturating_sub(1);
                self.region_offset = (self.region_offset + 1).min(max);
            }
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>, snapshot: Option<&Snapshot>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Percentage(60),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0], snapshot);
        self.draw_regions(frame, chunks[1], snapshot);
        self.draw_daily(frame, chunks[2], snapshot);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: Option<&Snapshot>) {
        let updated = snapshot
            .map(|s| crate::report::last_update_text(s.loaded_at))
            .unwrap_or_else(|| "Darrera actualització: -".to_string());

        let lines = vec![
            Line::from(Span::styled(
                TITLE,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(updated, Style::default().fg(Color::Gray))),
        ];
        let p = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_regions(&self, frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: Option<&Snapshot>) {
        let Some(snapshot) = snapshot else {
            draw_waiting(frame, area, "Tests per ABS");
            return;
        };

        match &self.geo {
            Some(geo) if !geo.is_empty() => {
                let chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                    .split(area);

                let block = Block::default().title("Tests per ABS").borders(Borders::ALL);
                let inner = block.inner(chunks[0]);
                frame.render_widget(block, chunks[0]);
                frame.render_widget(
                    RegionMap {
                        geo,
                        totals: &self.totals_by_code,
                    },
                    inner,
                );
                self.draw_region_table(frame, chunks[1], snapshot);
            }
            _ => self.draw_region_table(frame, area, snapshot),
        }
    }

    fn draw_region_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &Snapshot) {
        let ranked = snapshot.ranked_regions();
        let rows = ranked
            .iter()
            .enumerate()
            .skip(self.region_offset)
            .map(|(i, (region, total))| {
                let color = map::green_shade(*total, ranked.first().map(|r| r.1).unwrap_or(0));
                Row::new(vec![
                    format!("{}", i + 1),
                    region.code.clone(),
                    region.name.clone(),
                    total.to_string(),
                ])
                .style(Style::default().fg(color))
            });

        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Length(6),
                Constraint::Min(10),
                Constraint::Length(9),
            ],
        )
        .header(
            Row::new(vec!["#", "ABS", "Descripció", "Tests"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .title(format!("Rànquing ABS ({})", ranked.len()))
                .borders(Borders::ALL),
        );
        frame.render_widget(table, area);
    }

    fn draw_daily(&self, frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: Option<&Snapshot>) {
        let block = Block::default().title("Dades diàries").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(series) = snapshot.and_then(DailySeries::from_snapshot) else {
            let msg = Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        frame.render_widget(
            DailyChart {
                first: series.first,
                tests: &series.tests,
                positivity: &series.positivity,
                x_bounds: series.x_bounds,
                y_bounds: series.y_bounds,
            },
            inner,
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let remaining = REFRESH_INTERVAL.saturating_sub(self.last_attempt.elapsed());
        let help = "↑/↓ scroll ABS  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(
                format!("next refresh in {}", fmt_countdown(remaining)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_waiting(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow)),
        inner,
    );
}

/// Chart-ready daily series: x is the day offset from the first date.
struct DailySeries {
    first: chrono::NaiveDate,
    tests: Vec<(f64, f64)>,
    positivity: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl DailySeries {
    fn from_snapshot(snapshot: &Snapshot) -> Option<Self> {
        let (first, last) = snapshot.date_span()?;
        let offset = |d: chrono::NaiveDate| (d - first).num_days() as f64;

        let tests: Vec<(f64, f64)> = snapshot
            .daily_tests
            .iter()
            .map(|(d, v)| (offset(*d), *v as f64))
            .collect();
        let positivity = snapshot
            .daily_positivity
            .iter()
            .map(|(d, v)| (offset(*d), *v))
            .collect();

        let span = offset(last);
        let x_bounds = if span > 0.0 { [-0.5, span + 0.5] } else { [-1.0, 1.0] };

        let y_max = tests.iter().map(|&(_, y)| y).fold(0.0, f64::max);
        let y_min = tests.iter().map(|&(_, y)| y).fold(0.0, f64::min);
        let pad = ((y_max - y_min) * 0.05).max(1.0);
        let y_bounds = [y_min, y_max + pad];

        Some(Self {
            first,
            tests,
            positivity,
            x_bounds,
            y_bounds,
        })
    }
}

fn fmt_countdown(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
