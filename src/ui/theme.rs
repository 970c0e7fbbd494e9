//! Colours and shared styles for the dashboard.

use ratatui::style::{Color, Modifier, Style};

pub(crate) const HEADER_BG: Color = Color::Rgb(36, 31, 49);
pub(crate) const HEADER_FG: Color = Color::Rgb(224, 222, 244);
pub(crate) const ACCENT: Color = Color::Rgb(196, 167, 231);
pub(crate) const GREEN: Color = Color::Rgb(156, 207, 216);
pub(crate) const RED: Color = Color::Rgb(235, 111, 146);
pub(crate) const YELLOW: Color = Color::Rgb(246, 193, 119);
pub(crate) const SURFACE: Color = Color::Rgb(42, 39, 63);
pub(crate) const TEXT: Color = Color::Rgb(224, 222, 244);
pub(crate) const TEXT_DIM: Color = Color::Rgb(144, 140, 170);
pub(crate) const OVERLAY: Color = Color::Rgb(82, 79, 103);
pub(crate) const COMMAND_BG: Color = Color::Rgb(25, 23, 36);

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(HEADER_FG)
        .bg(HEADER_BG)
        .add_modifier(Modifier::BOLD)
}

/// Row under the cursor.
pub(crate) fn selected_style() -> Style {
    Style::default().fg(HEADER_BG).bg(ACCENT)
}

pub(crate) fn normal_style() -> Style {
    Style::default().fg(TEXT)
}

pub(crate) fn dim_style() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub(crate) fn amount_style() -> Style {
    Style::default().fg(YELLOW)
}

/// Zebra striping for odd rows.
pub(crate) fn alt_row_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub(crate) fn command_bar_style() -> Style {
    Style::default().fg(TEXT).bg(COMMAND_BG)
}

pub(crate) fn status_bar_style() -> Style {
    Style::default().fg(TEXT_DIM).bg(SURFACE)
}
