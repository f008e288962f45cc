//! Terminal User Interface components for gym-report-tui.

pub mod chart;
mod help;
pub mod table;
mod theme;
pub mod widgets;

pub use help::HelpOverlay;
pub use theme::Theme;
