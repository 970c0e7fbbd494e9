use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::report::Summary;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::format_amount;

const CHART_MONTHS: usize = 12;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(summary) = &app.summary else {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No report loaded",
            theme::dim_style(),
        )))
        .centered()
        .block(titled_block(" Reports "));
        f.render_widget(msg, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary cards
            Constraint::Min(8),    // Monthly chart
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_summary_cards(f, chunks[0], summary);
    render_monthly_chart(f, chunks[1], summary);
    render_footer(f, chunks[2], summary, app.phrase.as_deref());
}

fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        ))
}

fn render_summary_cards(f: &mut Frame, area: Rect, summary: &Summary) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    render_card(
        f,
        cards[0],
        &format!("Spent {}", summary.current_month),
        format_amount(summary.current_month_total),
        theme::ACCENT,
        format!("{} overall", format_amount(summary.total)),
    );

    match (&summary.limit, summary.limit_remaining()) {
        (Some(limit), Some(remaining)) => {
            let exceeded = limit.is_exceeded_by(summary.current_month_total);
            render_card(
                f,
                cards[1],
                "Limit",
                format_amount(limit.amount),
                theme::YELLOW,
                String::from("monthly"),
            );
            render_card(
                f,
                cards[2],
                "Remaining",
                format_amount(remaining),
                if exceeded { theme::RED } else { theme::GREEN },
                if exceeded {
                    String::from("limit exceeded")
                } else {
                    String::new()
                },
            );
        }
        _ => {
            render_card(
                f,
                cards[1],
                "Limit",
                String::from("not set"),
                theme::TEXT_DIM,
                String::from(":limit <amount>"),
            );
            render_card(
                f,
                cards[2],
                "Remaining",
                String::from("-"),
                theme::TEXT_DIM,
                String::new(),
            );
        }
    }

    match &summary.min_day {
        Some(min) => render_card(
            f,
            cards[3],
            "Lowest day",
            format_amount(min.total),
            theme::GREEN,
            min.day.clone(),
        ),
        None => render_card(
            f,
            cards[3],
            "Lowest day",
            String::from("-"),
            theme::TEXT_DIM,
            String::new(),
        ),
    }
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    value: String,
    color: Color,
    subtitle: String,
) {
    let title = format!(" {title} ");
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(titled_block(&title));

    f.render_widget(text, area);
}

fn render_monthly_chart(f: &mut Frame, area: Rect, summary: &Summary) {
    let block = titled_block(" Spending per Month ");

    if summary.monthly.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No dated expenses yet",
            theme::dim_style(),
        )))
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let skip = summary.monthly.len().saturating_sub(CHART_MONTHS);
    let bars: Vec<Bar> = summary
        .monthly
        .iter()
        .skip(skip)
        .map(|(month, total)| {
            let style = if *month == summary.current_month {
                Style::default().fg(theme::YELLOW)
            } else {
                Style::default().fg(theme::ACCENT)
            };
            Bar::default()
                .value((*total).max(Decimal::ZERO).round().to_u64().unwrap_or(0))
                .text_value(format_amount(*total))
                .label(Line::from(month.clone()))
                .style(style)
                .value_style(
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(Style::default().fg(theme::TEXT));

    f.render_widget(chart, area);
}

fn render_footer(f: &mut Frame, area: Rect, summary: &Summary, phrase: Option<&str>) {
    let mut spans = Vec::new();
    if summary.undated > 0 {
        spans.push(Span::styled(
            format!("{} undated expenses left out  ", summary.undated),
            Style::default().fg(theme::YELLOW),
        ));
    }
    if let Some(text) = phrase {
        spans.push(Span::styled(format!("\u{201c}{text}\u{201d}"), theme::dim_style()));
    }

    let footer = Paragraph::new(Line::from(spans))
        .centered()
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme::OVERLAY)));
    f.render_widget(footer, area);
}
