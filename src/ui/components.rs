//! Panels for the terminal interface

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;
use std::collections::VecDeque;

use super::{Phase, Progress, CRAWL_YELLOW};

/// Current phase as a breadcrumb of the pipeline, plus a detail line
pub struct StatusPanel {
    phase: Phase,
    info: String,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::FetchingPeople,
            info: String::new(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let current = Phase::PIPELINE.iter().position(|p| *p == self.phase);

        let mut steps = vec![Span::raw(" ")];
        for (i, phase) in Phase::PIPELINE.iter().enumerate() {
            let style = match current {
                Some(c) if i < c => Style::default().fg(Color::Green),
                Some(c) if i == c => Style::default()
                    .fg(CRAWL_YELLOW)
                    .add_modifier(Modifier::BOLD),
                None => Style::default().fg(Color::Green),
                _ => Style::default().fg(Color::DarkGray),
            };
            if i > 0 {
                steps.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
            }
            steps.push(Span::styled(phase.short_name(), style));
        }

        let lines = vec![
            Line::from(steps),
            Line::from(""),
            Line::from(vec![
                Span::styled(format!(" {} ", self.phase), Style::default().fg(Color::Cyan)),
                Span::styled(&self.info, Style::default().fg(Color::Gray)),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                " SWAPI Frame ",
                Style::default().fg(CRAWL_YELLOW).add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(Color::Blue));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Records fetched against the listing's advertised count
pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Blue));

        let Some(progress) = &self.progress else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let label = format!(
            "{} · {}/{} records",
            progress.label, progress.current, progress.total
        );
        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(CRAWL_YELLOW).bg(Color::DarkGray))
            .ratio(progress.ratio().min(1.0))
            .label(label);

        frame.render_widget(gauge, area);
    }
}

/// Most recent activity messages, newest at the bottom
pub struct LogPanel {
    entries: VecDeque<String>,
    capacity: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: 200,
        }
    }

    pub fn add(&mut self, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message.into());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Activity ")
            .border_style(Style::default().fg(Color::Blue));

        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.entries.len().saturating_sub(visible);
        let last = self.entries.len().saturating_sub(1);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, entry)| {
                let style = if entry.contains("failed") || entry.contains("incomplete") {
                    Style::default().fg(Color::Red)
                } else if i == last {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(Span::styled(format!(" {}", entry), style))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}
