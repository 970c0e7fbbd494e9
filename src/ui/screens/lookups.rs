use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::Lookup;
use crate::ui::theme;

/// Render a categories or payment methods table.
pub(crate) fn render<T: Lookup>(f: &mut Frame, area: Rect, title: &str, items: &[T], index: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" {title} ({}) ", items.len()),
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        ));

    if items.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("No {} yet", title.to_lowercase()),
                theme::dim_style(),
            )),
        ];
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["ID", "Name"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    // Keep the cursor on screen without tracking a separate scroll offset
    let visible = area.height.saturating_sub(3).max(1) as usize;
    let offset = index.saturating_sub(visible - 1);

    let rows: Vec<Row> = items
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, item)| {
            let style = if i == index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let id = item.id().map(|id| id.to_string()).unwrap_or_default();
            Row::new(vec![Cell::from(id), Cell::from(item.name().to_string())]).style(style)
        })
        .collect();

    let widths = [Constraint::Length(8), Constraint::Min(20)];
    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}
