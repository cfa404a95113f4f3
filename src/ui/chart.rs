//! Histogram comparison view

use anyhow::{bail, Result};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph};
use ratatui::Frame;
use std::str::FromStr;

use super::CRAWL_YELLOW;
use crate::analysis::{Comparison, Series};

const CURVE_POINTS: usize = 100;
const PALETTE: &[Color] = &[
    Color::Cyan,
    Color::LightMagenta,
    Color::LightGreen,
    Color::LightRed,
    Color::LightBlue,
    Color::White,
];

/// How the series are arranged
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ChartLayout {
    /// One panel per series, two panels per row
    #[default]
    Cols,
    /// Every series overlaid on one panel with a legend
    Single,
}

impl FromStr for ChartLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cols" => Ok(ChartLayout::Cols),
            "single" => Ok(ChartLayout::Single),
            other => bail!("Unknown layout: {}", other),
        }
    }
}

pub struct ComparisonChart<'a> {
    comparison: &'a Comparison,
    title: String,
    layout: ChartLayout,
}

/// Plot data for one series: step outline and fitted curve
struct SeriesPoints {
    label: String,
    color: Color,
    bars: Vec<(f64, f64)>,
    curve: Vec<(f64, f64)>,
}

impl<'a> ComparisonChart<'a> {
    pub fn new(comparison: &'a Comparison, title: impl Into<String>, layout: ChartLayout) -> Self {
        Self {
            comparison,
            title: title.into(),
            layout,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(5)])
            .split(area);

        let title = Paragraph::new(Span::styled(
            self.title.clone(),
            Style::default().fg(CRAWL_YELLOW).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(title, chunks[0]);

        let points: Vec<SeriesPoints> = self
            .comparison
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| self.series_points(s, PALETTE[i % PALETTE.len()]))
            .collect();

        match self.layout {
            ChartLayout::Single => self.render_panel(frame, chunks[1], "", &points, true),
            ChartLayout::Cols => {
                let rows = points.len().div_ceil(2).max(1) as u32;
                let row_areas = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints((0..rows).map(|_| Constraint::Ratio(1, rows)))
                    .split(chunks[1]);

                for (r, pair) in points.chunks(2).enumerate() {
                    let cells = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
                        .split(row_areas[r]);
                    for (c, series) in pair.iter().enumerate() {
                        self.render_panel(frame, cells[c], &series.label, std::slice::from_ref(series), false);
                    }
                }
            }
        }
    }

    fn series_points(&self, series: &Series, color: Color) -> SeriesPoints {
        let c = self.comparison;
        SeriesPoints {
            label: series.label.clone(),
            color,
            bars: series
                .histogram
                .as_ref()
                .map(|h| h.step_points())
                .unwrap_or_default(),
            curve: series
                .fit
                .map(|f| f.curve(c.min, c.max, CURVE_POINTS))
                .unwrap_or_default(),
        }
    }

    fn render_panel(&self, frame: &mut Frame, area: Rect, title: &str, series: &[SeriesPoints], legend: bool) {
        let (x_lo, x_hi) = series
            .iter()
            .flat_map(|s| s.bars.iter().chain(s.curve.iter()))
            .fold((self.comparison.min, self.comparison.max), |(lo, hi), (x, _)| {
                (lo.min(*x), hi.max(*x))
            });
        let y_hi = self.comparison.peak_density(CURVE_POINTS).max(f64::EPSILON) * 1.1;

        let mut datasets = Vec::with_capacity(series.len() * 2);
        for s in series {
            let style = Style::default().fg(s.color);
            let mut bars = Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(style)
                .data(&s.bars);
            if legend {
                bars = bars.name(s.label.clone());
            }
            datasets.push(bars);
            datasets.push(
                Dataset::default()
                    .marker(Marker::Dot)
                    .graph_type(GraphType::Line)
                    .style(style.add_modifier(Modifier::BOLD))
                    .data(&s.curve),
            );
        }

        let axis_style = Style::default().fg(Color::White);
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::LEFT | Borders::BOTTOM)
                    .border_style(axis_style)
                    .title(Span::styled(title.to_string(), Style::default().fg(Color::White))),
            )
            .x_axis(
                Axis::default()
                    .title(self.comparison.measure_column.clone())
                    .style(axis_style)
                    .bounds([x_lo, x_hi])
                    .labels(axis_labels(x_lo, x_hi)),
            )
            .y_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds([0.0, y_hi])
                    .labels(axis_labels(0.0, y_hi)),
            )
            .legend_position(legend.then_some(LegendPosition::TopRight));

        frame.render_widget(chart, area);
    }
}

fn axis_labels(lo: f64, hi: f64) -> Vec<String> {
    let mid = (lo + hi) / 2.0;
    [lo, mid, hi].iter().map(|v| format_tick(*v)).collect()
}

fn format_tick(v: f64) -> String {
    if v.abs() >= 10.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.3}", v)
    }
}
