use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.expenses.is_empty() {
        let msg = if !app.search_input.is_empty() {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("No expenses matching '{}'", app.search_input),
                    theme::dim_style(),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press Esc to clear the search",
                    theme::dim_style(),
                )),
            ]
        } else {
            let scope = match &app.month_filter {
                Some(month) => format!("No expenses for {month}"),
                None => "No expenses yet".to_string(),
            };
            vec![
                Line::from(""),
                Line::from(Span::styled(scope, theme::dim_style())),
                Line::from(""),
                Line::from(Span::styled(
                    "Add one with :add <amount> | <category> | <method> | [description] | [date]",
                    theme::dim_style(),
                )),
            ]
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                " Expenses (0) ",
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            ));
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["Date", "Description", "Category", "Method", "Amount"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .expenses
        .iter()
        .enumerate()
        .skip(app.expense_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, detail)| {
            let style = if i == app.expense_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            let date = match detail.expense.date {
                Some(_) => detail.expense.date_display(),
                None => "(no date)".to_string(),
            };

            Row::new(vec![
                Cell::from(date),
                Cell::from(truncate(&detail.expense.description, 40)),
                Cell::from(truncate(&detail.category, 18)),
                Cell::from(truncate(&detail.payment_method, 18)),
                Cell::from(Span::styled(
                    format_amount(detail.expense.amount),
                    theme::amount_style(),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(20),
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(18),
        Constraint::Length(14),
    ];

    let search = if app.search_input.is_empty() {
        String::new()
    } else {
        format!("search: '{}' ", app.search_input)
    };

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(
                format!(" Expenses ({}) {search}", app.expenses.len()),
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            )),
    );

    f.render_widget(table, area);
}
