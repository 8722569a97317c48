use crate::models::stats::FinanceStats;
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::canvas::{Canvas, Points},
    widgets::{Block, Borders, Paragraph},
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const NO_INCOME_MESSAGE: &str = "No income recorded yet.";

const EXPENSES_COLOR: Color = Color::Red;
const SAVINGS_COLOR: Color = Color::Green;

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: &'static str,
    pub value: Decimal,
    pub color: Color,
}

/// Expenses against what is left of income. `None` until some income exists.
pub fn allocation_slices(stats: &FinanceStats) -> Option<Vec<Slice>> {
    if stats.total_income.is_zero() {
        return None;
    }

    Some(vec![
        Slice {
            label: "Expenses",
            value: stats.total_expenses,
            color: EXPENSES_COLOR,
        },
        Slice {
            label: "Savings",
            value: stats.savings.max(Decimal::ZERO),
            color: SAVINGS_COLOR,
        },
    ])
}

/// `$1,234.56`, with a leading minus for negative values.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", sign, grouped, cents)
}

pub fn format_rate(rate: Decimal) -> String {
    format!(
        "{:.1}%",
        rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Plain-text summary for the command line.
pub fn summary_lines(stats: &FinanceStats) -> Vec<String> {
    let mut lines = vec![
        format!("Total Income:   {:>14}", format_currency(stats.total_income)),
        format!("Total Expenses: {:>14}", format_currency(stats.total_expenses)),
        format!("Net Savings:    {:>14}", format_currency(stats.savings)),
        format!("Savings Rate:   {:>14}", format_rate(stats.savings_rate)),
        String::new(),
    ];

    match allocation_slices(stats) {
        None => lines.push(NO_INCOME_MESSAGE.to_string()),
        Some(slices) => {
            let total: Decimal = slices.iter().map(|s| s.value).sum();
            for slice in slices {
                let share = if total.is_zero() {
                    Decimal::ZERO
                } else {
                    slice.value / total * Decimal::ONE_HUNDRED
                };
                lines.push(format!(
                    "{:<9} {:>14}  {:>6}",
                    slice.label,
                    format_currency(slice.value),
                    format_rate(share)
                ));
            }
        }
    }
    lines
}

pub fn render_summary_cards(frame: &mut ratatui::Frame, area: Rect, stats: &FinanceStats) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let savings_color = if stats.savings >= Decimal::ZERO {
        Color::Cyan
    } else {
        Color::Red
    };

    let values = [
        ("Total Income", format_currency(stats.total_income), Color::Green),
        ("Total Expenses", format_currency(stats.total_expenses), Color::Red),
        ("Net Savings", format_currency(stats.savings), savings_color),
        ("Savings Rate", format_rate(stats.savings_rate), Color::Yellow),
    ];

    for (card, (title, value, color)) in cards.iter().zip(values) {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(paragraph, *card);
    }
}

pub fn render_allocation_chart(frame: &mut ratatui::Frame, area: Rect, stats: &FinanceStats) {
    let block = Block::default().title("Allocation Analysis").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let slices = match allocation_slices(stats) {
        Some(slices) => slices,
        None => {
            let empty = Paragraph::new(NO_INCOME_MESSAGE)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, inner);
            return;
        }
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let total = slices
        .iter()
        .map(|s| s.value.to_f64().unwrap_or(0.0))
        .sum::<f64>();
    let mut arcs = Vec::new();
    let mut start_angle = 0.0_f64;
    if total > 0.0 {
        for slice in &slices {
            let sweep = slice.value.to_f64().unwrap_or(0.0) / total * std::f64::consts::TAU;
            arcs.push((start_angle, start_angle + sweep, slice.color));
            start_angle += sweep;
        }
    }

    let canvas = Canvas::default()
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (start, end, color) in &arcs {
                let mut points = Vec::new();
                // Inner radius leaves a hole in the middle.
                let mut r = 0.45;
                while r <= 1.0 {
                    let mut angle = *start;
                    while angle <= *end {
                        points.push((r * angle.cos(), r * angle.sin()));
                        angle += 0.05;
                    }
                    r += 0.04;
                }
                if !points.is_empty() {
                    ctx.draw(&Points {
                        coords: &points,
                        color: *color,
                    });
                }
            }
        });
    frame.render_widget(canvas, layout[0]);

    let mut legend = Vec::new();
    for slice in &slices {
        legend.push(Span::styled("■ ", Style::default().fg(slice.color)));
        legend.push(Span::raw(format!("{} {}   ", slice.label, format_currency(slice.value))));
    }
    frame.render_widget(
        Paragraph::new(Line::from(legend)).alignment(Alignment::Center),
        layout[1],
    );
}
