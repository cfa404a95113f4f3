//! Terminal UI module using ratatui
//!
//! Provides a simple API for displaying pipeline state:
//! - Current phase (Fetching, Resolving, Normalizing, Exporting)
//! - Progress (records fetched against the listing count)
//! - Activity log (scrollable history)
//!
//! Library code reports through the [`Ui`] trait; [`SilentUi`] and
//! [`ConsoleUi`] cover tests and non-interactive runs.

pub mod chart;
mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use indicatif::{ProgressBar, ProgressStyle};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Color;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;

use chart::ComparisonChart;
use components::{LogPanel, ProgressPanel, StatusPanel};

/// Opening-crawl yellow
pub const CRAWL_YELLOW: Color = Color::Rgb(0xFF, 0xE8, 0x1F);

/// Pipeline phases shown in the status panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    FetchingPeople,
    ResolvingReferences,
    Normalizing,
    Exporting,
    Complete,
}

impl Phase {
    pub const PIPELINE: &'static [Phase] = &[
        Phase::FetchingPeople,
        Phase::ResolvingReferences,
        Phase::Normalizing,
        Phase::Exporting,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            Phase::FetchingPeople => "fetch",
            Phase::ResolvingReferences => "resolve",
            Phase::Normalizing => "normalize",
            Phase::Exporting => "export",
            Phase::Complete => "done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::FetchingPeople => write!(f, "Fetching people"),
            Phase::ResolvingReferences => write!(f, "Resolving references"),
            Phase::Normalizing => write!(f, "Normalizing table"),
            Phase::Exporting => write!(f, "Exporting table"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress information for the current operation
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Trait for UI implementations - allows both real TUI and silent/test modes
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
}

/// Main UI application state - full TUI implementation
pub struct UiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    status: StatusPanel,
    progress: ProgressPanel,
    log: LogPanel,
}

impl UiApp {
    /// Create a new UI application and enter the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            status: StatusPanel::new(),
            progress: ProgressPanel::new(),
            log: LogPanel::new(),
        })
    }

    fn draw(&mut self) -> Result<()> {
        let status = &self.status;
        let progress = &self.progress;
        let log = &self.log;

        self.terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(5), // Status panel
                    Constraint::Length(3), // Progress bar
                    Constraint::Min(5),    // Log panel
                ])
                .split(frame.area());

            status.render(frame, chunks[0]);
            progress.render(frame, chunks[1]);
            log.render(frame, chunks[2]);
        })?;

        Ok(())
    }

    /// Draw a histogram comparison full screen until a key is pressed
    pub fn show_chart(&mut self, chart: &ComparisonChart) -> Result<()> {
        self.terminal
            .draw(|frame| chart.render(frame, frame.area()))?;
        wait_for_key()
    }

    /// Finish the UI and restore the terminal
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.set_phase(Phase::Complete);
        self.clear_progress();
        self.log(summary);
        self.log("Press any key to exit...");
        self.draw()?;
        wait_for_key()?;
        self.restore()
    }

    /// Restore terminal without waiting
    pub fn restore(mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

fn wait_for_key() -> Result<()> {
    loop {
        if event::poll(Duration::from_millis(100))? {
            if let CrosstermEvent::Key(KeyEvent { code, .. }) = event::read()? {
                if code != KeyCode::Null {
                    return Ok(());
                }
            }
        }
    }
}

impl Ui for UiApp {
    fn set_phase(&mut self, phase: Phase) {
        self.status.set_phase(phase);
        self.draw().ok();
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.status.set_info(info);
        self.draw().ok();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.progress
            .set_progress(Progress::new(current, total, label));
        self.draw().ok();
    }

    fn clear_progress(&mut self) {
        self.progress.clear();
        self.draw().ok();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.log.add(message);
        self.draw().ok();
    }
}

impl Drop for UiApp {
    fn drop(&mut self) {
        // Best effort cleanup
        terminal::disable_raw_mode().ok();
        self.terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .ok();
        self.terminal.show_cursor().ok();
    }
}

/// Phase headings and log lines on stdout, with an indicatif bar for progress
#[derive(Default)]
pub struct ConsoleUi {
    verbose: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleUi {
    pub fn new(verbose: bool) -> Self {
        Self { verbose, bar: None }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("  {msg:24} [{bar:40.yellow/blue}] {pos}/{len} {elapsed}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    /// Position and length of the active bar
    pub fn progress(&self) -> Option<(u64, u64)> {
        self.bar
            .as_ref()
            .map(|pb| (pb.position(), pb.length().unwrap_or(0)))
    }
}

impl Ui for ConsoleUi {
    fn set_phase(&mut self, phase: Phase) {
        self.clear_progress();
        println!("\n{}...", phase);
    }

    fn set_info(&mut self, info: impl Into<String>) {
        let info = info.into();
        match &self.bar {
            Some(pb) => pb.set_message(info),
            None if self.verbose => println!("  {}", info),
            None => {}
        }
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        let pb = self.bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(total);
            pb.set_style(Self::bar_style());
            pb
        });
        pb.set_length(total);
        pb.set_position(current);
        pb.set_message(label.into());
    }

    fn clear_progress(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish();
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = format!("  {}", message.into());
        match &self.bar {
            Some(pb) => pb.println(message),
            None => println!("{}", message),
        }
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_bar_follows_progress() {
        let mut ui = ConsoleUi::new(false);
        assert_eq!(ui.progress(), None);

        ui.set_progress(10, 82, "people");
        ui.set_progress(20, 82, "people");
        assert_eq!(ui.progress(), Some((20, 82)));

        ui.log("page fetched");
        ui.clear_progress();
        assert_eq!(ui.progress(), None);
    }

    #[test]
    fn test_phase_change_finishes_bar() {
        let mut ui = ConsoleUi::new(true);
        ui.set_progress(1, 6, "planets");
        ui.set_phase(Phase::Normalizing);
        assert_eq!(ui.progress(), None);
    }
}
