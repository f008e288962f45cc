//! Main application logic and TUI event loop.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use crate::cli::AppConfig;
use crate::controller::{ExportJob, FetchTicket, ReportController, ReportState};
use crate::data::{
    pivot, ChartSeries, DirectoryTarget, ExportFormat, HttpReportSource, PivotOptions, RecordSet,
    ReportError, ReportKind, ReportSource, SavedFile, Table,
};
use crate::ui::{
    chart::ReportChart,
    table::ReportTable,
    widgets::{ControlBar, DownloadBar, StatusBar},
    HelpOverlay, Theme,
};

/// How long to wait for input before checking on background work
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of work done off the UI thread
enum JobOutcome {
    Fetched {
        ticket: FetchTicket,
        result: Result<RecordSet, ReportError>,
    },
    Exported {
        job: ExportJob,
        result: Result<SavedFile, ReportError>,
    },
}

/// Chart and table derived from the controller at one revision
#[derive(Default)]
struct DerivedView {
    revision: Option<u64>,
    chart: Option<ChartSeries>,
    table: Option<Table>,
}

/// Application state
pub struct App {
    // Configuration
    config: AppConfig,
    theme: Theme,
    pivot_options: PivotOptions,

    // Collaborators, shared with worker threads
    source: Arc<dyn ReportSource>,
    target: Arc<DirectoryTarget>,

    // Report state
    controller: ReportController,
    view: DerivedView,
    format: ExportFormat,

    // Background work
    outcomes_tx: Sender<JobOutcome>,
    outcomes_rx: Receiver<JobOutcome>,

    // UI State
    selected_row: usize,
    show_help: bool,

    // Exit flag
    should_quit: bool,
}

impl App {
    /// Create a new App instance
    pub fn new(config: AppConfig) -> Self {
        let source: Arc<dyn ReportSource> =
            Arc::new(HttpReportSource::new(&config.api_url, config.timeout));
        Self::with_source(config, source)
    }

    fn with_source(config: AppConfig, source: Arc<dyn ReportSource>) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::channel();
        App {
            theme: Theme::default(),
            pivot_options: PivotOptions {
                duplicates: config.duplicates,
            },
            target: Arc::new(DirectoryTarget::new(config.out_dir.clone())),
            controller: ReportController::new(config.report),
            view: DerivedView::default(),
            format: config.format,
            source,
            outcomes_tx,
            outcomes_rx,
            selected_row: 0,
            show_help: false,
            should_quit: false,
            config,
        }
    }

    /// Rebuild chart and table if the controller changed since the last build
    fn refresh_view(&mut self) {
        let revision = self.controller.revision();
        if self.view.revision == Some(revision) {
            return;
        }
        let mut rng = rand::thread_rng();
        self.view = DerivedView {
            revision: Some(revision),
            chart: self.controller.chart(&self.pivot_options, &mut rng),
            table: self.controller.table(),
        };
        let rows = self.view.table.as_ref().map(|t| t.rows.len()).unwrap_or(0);
        if self.selected_row >= rows {
            self.selected_row = rows.saturating_sub(1);
        }
    }

    /// Select a report kind; re-selecting the current kind keeps its data
    fn select_kind(&mut self, kind: ReportKind) {
        if kind != self.controller.kind() {
            self.controller.select_kind(kind);
            self.selected_row = 0;
        }
    }

    /// Fetch the current report on a worker thread
    fn start_fetch(&mut self) {
        let ticket = self.controller.begin_fetch();
        let source = Arc::clone(&self.source);
        let tx = self.outcomes_tx.clone();
        thread::spawn(move || {
            let result = source.fetch_records(ticket.kind);
            // The receiver is gone only if the app is shutting down
            let _ = tx.send(JobOutcome::Fetched { ticket, result });
        });
    }

    /// Download the held report in the selected format
    fn start_download(&mut self) {
        let Some(job) = self.controller.begin_export(self.format, self.config.csv_mode) else {
            return;
        };

        if !job.needs_fetch() {
            let result = job.run(self.source.as_ref(), self.target.as_ref());
            self.controller.complete_export(&job, result);
            return;
        }

        let source = Arc::clone(&self.source);
        let target = Arc::clone(&self.target);
        let tx = self.outcomes_tx.clone();
        thread::spawn(move || {
            let result = job.run(source.as_ref(), target.as_ref());
            let _ = tx.send(JobOutcome::Exported { job, result });
        });
    }

    /// Apply every finished background job
    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            match outcome {
                JobOutcome::Fetched { ticket, result } => {
                    self.controller.complete_fetch(ticket, result);
                }
                JobOutcome::Exported { job, result } => {
                    self.controller.complete_export(&job, result);
                }
            }
        }
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode) {
        // Global shortcuts
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return;
            }
            _ => {}
        }

        // If help is shown, don't process other keys
        if self.show_help {
            return;
        }

        // Report selection with number keys
        if let KeyCode::Char(c) = key {
            if let Some(n) = c.to_digit(10) {
                if let Some(kind) = (n as usize)
                    .checked_sub(1)
                    .and_then(|idx| ReportKind::ALL.get(idx))
                {
                    self.select_kind(*kind);
                    return;
                }
            }
        }

        let rows = self.view.table.as_ref().map(|t| t.rows.len()).unwrap_or(0);
        match key {
            KeyCode::Left => self.select_kind(self.controller.kind().prev()),
            KeyCode::Right => self.select_kind(self.controller.kind().next()),
            KeyCode::Enter | KeyCode::Char('v') => self.start_fetch(),
            KeyCode::Char('f') => self.format = self.format.toggle(),
            KeyCode::Char('d') => self.start_download(),
            KeyCode::Down | KeyCode::Char('j') => {
                if rows > 0 {
                    self.selected_row = (self.selected_row + 1).min(rows - 1);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_row = self.selected_row.saturating_sub(1);
            }
            KeyCode::Char('g') | KeyCode::Home => self.selected_row = 0,
            KeyCode::Char('G') | KeyCode::End => self.selected_row = rows.saturating_sub(1),
            _ => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        let size = frame.area();
        let has_data = self.controller.records().is_some();

        // Main layout: controls, body, download bar, status bar
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                          // Controls
                Constraint::Min(5),                             // Body
                Constraint::Length(if has_data { 1 } else { 0 }), // Download bar
                Constraint::Length(2),                          // Status bar
            ])
            .split(size);

        ControlBar::new(
            self.controller.kind(),
            self.controller.is_loading(),
            &self.theme,
        )
        .render(frame, main_chunks[0]);

        match self.controller.state() {
            ReportState::Idle => self.render_placeholder(
                frame,
                main_chunks[1],
                "Select a report and press Enter to visualize it.",
            ),
            ReportState::Loading => self.render_placeholder(frame, main_chunks[1], "Loading..."),
            ReportState::Failed { records: None, .. } => self.render_placeholder(
                frame,
                main_chunks[1],
                "The report could not be loaded. Press Enter to try again.",
            ),
            ReportState::Ready(_) | ReportState::Failed { .. } => {
                self.render_visuals(frame, main_chunks[1])
            }
        }

        if has_data {
            DownloadBar::new(self.format, self.controller.is_exporting(), &self.theme)
                .render(frame, main_chunks[2]);
        }

        StatusBar::new(
            self.controller.kind(),
            self.controller.error(),
            self.controller.last_saved(),
            &self.theme,
        )
        .render(frame, main_chunks[3]);

        // Render help overlay if active
        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
    }

    /// Chart (when the report kind has one) above the table
    fn render_visuals(&self, frame: &mut ratatui::Frame, area: Rect) {
        let table = ReportTable::new(self.view.table.as_ref(), self.selected_row, &self.theme);

        match &self.view.chart {
            Some(chart) => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(area);
                ReportChart::new(chart, &self.theme).render(frame, chunks[0], false);
                table.render(frame, chunks[1], true);
            }
            None => table.render(frame, area, true),
        }
    }

    fn render_placeholder(&self, frame: &mut ratatui::Frame, area: Rect, message: &str) {
        let mut text = vec![message.to_string()];
        if !pivot::has_chart(self.controller.kind()) {
            text.push(format!(
                "{} has no chart; records are shown as a table.",
                self.controller.kind().label()
            ));
        }
        let paragraph = Paragraph::new(text.join("\n"))
            .style(self.theme.muted_style())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style()),
            );
        frame.render_widget(paragraph, area);
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Run the TUI application
pub fn run(config: AppConfig) -> Result<()> {
    log::info!(
        "Starting dashboard against {} (downloads to {:?})",
        config.api_url,
        config.out_dir
    );

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let mut app = App::new(config);

    // Main loop - wrap in a closure to ensure cleanup
    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.drain_outcomes();
        app.refresh_view();

        // Render - if this fails, we should exit
        terminal.draw(|f| app.render(f))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_input(key.code);
                }
            }
        }

        if app.should_quit {
            log::info!("Quit");
            return Ok(());
        }
    }
}

/// Fetch one report and save it without the dashboard
pub fn run_export(config: AppConfig) -> Result<SavedFile> {
    let source = HttpReportSource::new(&config.api_url, config.timeout);
    let target = DirectoryTarget::new(config.out_dir.clone());
    let mut controller = ReportController::new(config.report);

    controller.fetch(&source);
    if let Some(message) = controller.error() {
        anyhow::bail!("Failed to fetch {} report: {message}", config.report);
    }

    let saved = controller.export(config.format, config.csv_mode, &source, &target);
    match (saved, controller.error()) {
        (Some(saved), _) => Ok(saved),
        (None, Some(message)) => {
            anyhow::bail!("Failed to download {} report: {message}", config.report)
        }
        (None, None) => anyhow::bail!("Nothing to download for {} report", config.report),
    }
}
