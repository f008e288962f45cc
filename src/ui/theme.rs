//! Theme configuration for the TUI.

use ratatui::style::{Color, Modifier, Style};

use crate::data::SeriesColor;

/// Color theme for the application
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub border: Color,
    pub title: Color,
    pub error: Color,
    pub success: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            bg: Color::Reset,
            fg: Color::White,
            highlight_bg: Color::Rgb(60, 60, 80),
            highlight_fg: Color::White,
            border: Color::Rgb(100, 100, 120),
            title: Color::Cyan,
            error: Color::Red,
            success: Color::Green,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    /// Base surface style used to paint widget backgrounds
    pub fn surface_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Convenience helper returning (border_style, title_style) for focus state
    pub fn panel_styles(&self, focused: bool) -> (Style, Style) {
        if focused {
            (self.focused_border_style(), self.focused_border_style())
        } else {
            (self.border_style(), self.title_style())
        }
    }

    /// Get style for normal text
    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Get style for highlighted/selected items
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for borders
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Get style for focused panel borders (distinct from normal borders)
    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for titles
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for hints and placeholders
    pub fn muted_style(&self) -> Style {
        Style::default()
            .fg(self.muted)
            .add_modifier(Modifier::DIM)
    }

    /// Get style for the error banner
    pub fn error_style(&self) -> Style {
        Style::default()
            .fg(self.error)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for confirmations
    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    /// Terminal color for a chart series
    pub fn series_color(&self, color: &SeriesColor) -> Color {
        let (r, g, b) = color.to_rgb();
        Color::Rgb(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_color_maps_to_rgb() {
        let theme = Theme::default();
        assert_eq!(
            theme.series_color(&SeriesColor::from_hue(0)),
            Color::Rgb(224, 82, 82)
        );
    }

    #[test]
    fn test_distinct_hues_give_distinct_colors() {
        let theme = Theme::default();
        let c0 = theme.series_color(&SeriesColor::from_hue(10));
        let c1 = theme.series_color(&SeriesColor::from_hue(130));
        let c2 = theme.series_color(&SeriesColor::from_hue(250));
        assert_ne!(c0, c1);
        assert_ne!(c1, c2);
        assert_ne!(c0, c2);
    }

    #[test]
    fn test_error_style_is_not_gray() {
        let theme = Theme::default();
        let gray_colors = [Color::Gray, Color::DarkGray, Color::White, Color::Black];
        assert!(!gray_colors.contains(&theme.error));
    }
}
