//! Data table widget for projected report rows.

use ratatui::{
    layout::{Constraint, Rect},
    style::Modifier,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table as TableWidget, TableState},
    Frame,
};

use crate::data::Table;
use super::theme::Theme;

/// Scrollable table of every record, one column per field of the first record
pub struct ReportTable<'a> {
    table: Option<&'a Table>,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> ReportTable<'a> {
    pub fn new(table: Option<&'a Table>, selected: usize, theme: &'a Theme) -> Self {
        ReportTable {
            table,
            selected,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let (border_style, title_style) = self.theme.panel_styles(focused);
        let block = Block::default()
            .title(title(self.table))
            .borders(Borders::ALL)
            .border_style(border_style)
            .title_style(title_style);

        let Some(table) = self.table else {
            let message = Paragraph::new("No data to display.")
                .style(self.theme.muted_style())
                .block(block);
            frame.render_widget(message, area);
            return;
        };

        let header = Row::new(
            table
                .headers()
                .map(|h| Cell::from(h.to_string()))
                .collect::<Vec<_>>(),
        )
        .style(self.theme.title_style().add_modifier(Modifier::UNDERLINED));

        let rows: Vec<Row> = table
            .rows
            .iter()
            .map(|cells| Row::new(cells.iter().map(|c| Cell::from(c.as_str()))))
            .collect();

        let widths = vec![Constraint::Fill(1); table.columns.len()];

        let widget = TableWidget::new(rows, widths)
            .header(header)
            .block(block)
            .style(self.theme.normal_style())
            .row_highlight_style(self.theme.highlight_style())
            .highlight_symbol("> ");

        let mut state = TableState::default();
        state.select(Some(self.selected.min(table.rows.len().saturating_sub(1))));
        frame.render_stateful_widget(widget, area, &mut state);
    }
}

/// Panel title with the row count, noting rows that do not fit the columns
fn title(table: Option<&Table>) -> String {
    match table {
        Some(table) if !table.irregular_rows.is_empty() => format!(
            " Records ({}, {} with missing or extra fields) ",
            table.rows.len(),
            table.irregular_rows.len()
        ),
        Some(table) => format!(" Records ({}) ", table.rows.len()),
        None => " Records ".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::project;
    use crate::data::RecordSet;
    use serde_json::json;

    fn table(value: serde_json::Value) -> Table {
        let records: RecordSet = serde_json::from_value(value).unwrap();
        project(&records).unwrap()
    }

    #[test]
    fn test_title_counts_rows() {
        let regular = table(json!([{"name": "Squat"}, {"name": "Row"}]));
        assert_eq!(title(Some(&regular)), " Records (2) ");
        assert_eq!(title(None), " Records ");
    }

    #[test]
    fn test_title_notes_irregular_rows() {
        let mixed = table(json!([{"name": "Squat", "usage_count": 3}, {"name": "Row"}]));
        assert_eq!(
            title(Some(&mixed)),
            " Records (2, 1 with missing or extra fields) "
        );
    }
}
