//! Grouped bar chart widget for pivoted report series.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::data::ChartSeries;
use super::theme::Theme;

/// Gap between neighbouring category groups
const GROUP_GAP: u16 = 2;
/// Widest a single bar is drawn
const MAX_BAR_WIDTH: u16 = 7;

/// Chart widget: one bar group per category, one colored bar per series
pub struct ReportChart<'a> {
    chart: &'a ChartSeries,
    theme: &'a Theme,
}

impl<'a> ReportChart<'a> {
    pub fn new(chart: &'a ChartSeries, theme: &'a Theme) -> Self {
        ReportChart { chart, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let (border_style, title_style) = self.theme.panel_styles(focused);
        let block = Block::default()
            .title(format!(" {} ", self.chart.title))
            .borders(Borders::ALL)
            .border_style(border_style)
            .title_style(title_style);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Legend
                Constraint::Min(3),    // Bars
            ])
            .split(inner);

        frame.render_widget(Paragraph::new(self.legend()), chunks[0]);

        let bar_width = bar_width(
            chunks[1].width,
            self.chart.categories.len(),
            self.chart.series.len(),
        );

        let mut bars = BarChart::default()
            .bar_width(bar_width)
            .bar_gap(0)
            .group_gap(GROUP_GAP)
            .label_style(self.theme.normal_style());

        for (idx, category) in self.chart.categories.iter().enumerate() {
            let group_bars: Vec<Bar> = self
                .chart
                .series
                .iter()
                .map(|series| {
                    let value = series.values.get(idx).copied().unwrap_or(0.0);
                    let color = self.theme.series_color(&series.color);
                    Bar::default()
                        .value(bar_value(value))
                        .text_value(if value > 0.0 {
                            format_value(value)
                        } else {
                            String::new()
                        })
                        .style(Style::default().fg(color))
                        .value_style(Style::default().fg(self.theme.bg).bg(color))
                })
                .collect();

            bars = bars.data(
                BarGroup::default()
                    .label(Line::from(category.clone()))
                    .bars(&group_bars),
            );
        }

        frame.render_widget(bars, chunks[1]);
    }

    /// Legend line: a colored swatch and key per series
    fn legend(&self) -> Line<'a> {
        let spans: Vec<Span> = self
            .chart
            .series
            .iter()
            .flat_map(|series| {
                let color = self.theme.series_color(&series.color);
                vec![
                    Span::styled("■ ", Style::default().fg(color)),
                    Span::styled(format!("{}  ", series.key), self.theme.normal_style()),
                ]
            })
            .collect();
        Line::from(spans)
    }
}

/// Fit every bar of every group into `width`, within [1, MAX_BAR_WIDTH]
fn bar_width(width: u16, groups: usize, series: usize) -> u16 {
    if groups == 0 || series == 0 {
        return 1;
    }
    let gaps = GROUP_GAP as usize * (groups - 1);
    let per_bar = (width as usize).saturating_sub(gaps) / (groups * series);
    per_bar.clamp(1, MAX_BAR_WIDTH as usize) as u16
}

/// Bars are drawn from whole non-negative counts
fn bar_value(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Format a value for display on top of a bar
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width_fits_area() {
        // 3 groups of 2 bars with two 2-column gaps in 40 columns
        assert_eq!(bar_width(40, 3, 2), 6);
        assert_eq!(bar_width(400, 3, 2), MAX_BAR_WIDTH);
        assert_eq!(bar_width(5, 10, 4), 1);
        assert_eq!(bar_width(40, 0, 0), 1);
    }

    #[test]
    fn test_bar_value_rounds_and_clamps() {
        assert_eq!(bar_value(4.6), 5);
        assert_eq!(bar_value(0.0), 0);
        assert_eq!(bar_value(-3.0), 0);
        assert_eq!(bar_value(f64::NAN), 0);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(2.34), "2.3");
    }
}
