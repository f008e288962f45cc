//! UI widgets for the report dashboard.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::data::{ExportFormat, ReportKind, SavedFile};
use super::theme::Theme;

/// Report kind selector with the visualize trigger
pub struct ControlBar<'a> {
    selected: ReportKind,
    loading: bool,
    theme: &'a Theme,
}

impl<'a> ControlBar<'a> {
    pub fn new(selected: ReportKind, loading: bool, theme: &'a Theme) -> Self {
        ControlBar {
            selected,
            loading,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans: Vec<Span> = Vec::new();
        for (i, kind) in ReportKind::ALL.iter().enumerate() {
            let style = if *kind == self.selected {
                self.theme.highlight_style()
            } else {
                self.theme.normal_style()
            };
            spans.push(Span::styled(format!("[{}] ", i + 1), self.theme.muted_style()));
            spans.push(Span::styled(format!(" {} ", kind.label()), style));
            spans.push(Span::raw("  "));
        }

        let trigger = if self.loading {
            Span::styled("Loading...", self.theme.title_style())
        } else {
            Span::styled("[Enter] Visualize Report", self.theme.title_style())
        };
        spans.push(trigger);

        let paragraph = Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .title(" Gym Report Exporter ")
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style()),
            )
            .style(self.theme.normal_style());

        frame.render_widget(paragraph, area);
    }
}

/// Download format selector, shown only while report data is held
pub struct DownloadBar<'a> {
    format: ExportFormat,
    downloading: bool,
    theme: &'a Theme,
}

impl<'a> DownloadBar<'a> {
    pub fn new(format: ExportFormat, downloading: bool, theme: &'a Theme) -> Self {
        DownloadBar {
            format,
            downloading,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let option = |format: ExportFormat| {
            let style = if format == self.format {
                self.theme.highlight_style()
            } else {
                self.theme.normal_style()
            };
            Span::styled(format!(" as {} ", format.extension().to_uppercase()), style)
        };

        let hint = if self.downloading {
            "   Downloading..."
        } else {
            "   [f] Format  [d] Download"
        };
        let line = Line::from(vec![
            Span::styled("Download Visualized Report: ", self.theme.title_style()),
            option(ExportFormat::Json),
            Span::raw(" "),
            option(ExportFormat::Csv),
            Span::styled(hint, self.theme.muted_style()),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Status bar doubling as the error banner
pub struct StatusBar<'a> {
    kind: ReportKind,
    error: Option<&'a str>,
    saved: Option<&'a SavedFile>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(
        kind: ReportKind,
        error: Option<&'a str>,
        saved: Option<&'a SavedFile>,
        theme: &'a Theme,
    ) -> Self {
        StatusBar {
            kind,
            error,
            saved,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = if let Some(e) = self.error {
            (format!("Error: {e}"), self.theme.error_style())
        } else if let Some(saved) = self.saved {
            (
                format!(
                    "Saved {} ({} bytes) to {}",
                    saved.filename,
                    saved.bytes,
                    saved.path.display()
                ),
                self.theme.success_style(),
            )
        } else {
            (
                format!("gym-report-tui: {} | [h] Help [q] Quit", self.kind.label()),
                Style::default(),
            )
        };

        let paragraph = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::TOP));

        frame.render_widget(paragraph, area);
    }
}
