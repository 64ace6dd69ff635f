use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Bar, BarChart, BarGroup, Cell, Row, Table, Widget};

use crate::domain::signal::{Sentiment, Signal};
use crate::signals::comparison::ComparisonSource;
use crate::signals::stats::SummaryStats;
use crate::signals::viewer::ViewState;

pub const LOADING_MESSAGE: &str = "Loading sentiment data...";
pub const EMPTY_MESSAGE: &str = "No Twitter signals found matching your criteria.";

const HEADERS: [&str; 6] = [
    "Date",
    "Symbol",
    "Analyzed Tweets",
    "Sentiment Score",
    "Sentiment",
    "Entry Price",
];

// Columns 2, 3 and 5 are numeric and right-aligned.
const RIGHT_ALIGNED: [bool; 6] = [false, false, true, true, false, true];

const BADGE_COLUMN: usize = 4;
const COLUMN_SPACING: u16 = 2;

const SOURCES_PER_POINT: usize = 3;
const CHART_WIDTH: u16 = 64;
const AXIS_STEPS: u64 = 100;

pub fn render_stats(stats: &SummaryStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total Signals:    {}\n", stats.total));
    out.push_str(&format!(
        "Analyzed Tweets:  {}\n",
        group_thousands(stats.total_tweets)
    ));
    out.push_str(&format!("Positive Signals: {}\n", stats.positive));
    out.push_str(&format!("Negative Signals: {}\n", stats.negative));
    out.push_str(&format!("Neutral Signals:  {}\n", stats.neutral));
    out.push_str(&format!("Last updated: {}\n", stats.last_update));
    out
}

/// Renders whichever of loading, error, empty or table the state selects.
pub fn render_view(state: &ViewState) -> String {
    match state {
        ViewState::Loading => format!("{LOADING_MESSAGE}\n"),
        ViewState::Error(message) => format!("{message}\n"),
        ViewState::Empty => format!("{EMPTY_MESSAGE}\n"),
        ViewState::Populated(rows) => render_table(rows),
    }
}

fn render_table(rows: &[Signal]) -> String {
    let cells: Vec<[String; 6]> = rows.iter().map(row_cells).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let header = Row::new(
        HEADERS
            .iter()
            .zip(RIGHT_ALIGNED)
            .map(|(h, right)| aligned_cell(h.to_string(), right, Style::default())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rule = Row::new(widths.iter().map(|w| Cell::from("-".repeat(*w))));
    let body = cells.into_iter().zip(rows).map(|(row, signal)| {
        let badge_style = badge_style(signal);
        Row::new(
            row.into_iter()
                .zip(RIGHT_ALIGNED)
                .enumerate()
                .map(|(col, (cell, right))| {
                    let style = if col == BADGE_COLUMN {
                        badge_style
                    } else {
                        Style::default()
                    };
                    aligned_cell(cell, right, style)
                }),
        )
    });

    let constraints = widths.map(|w| Constraint::Length(to_u16(w)));
    let table = Table::new(std::iter::once(rule).chain(body), constraints)
        .header(header)
        .column_spacing(COLUMN_SPACING);

    let width = widths.iter().sum::<usize>() + usize::from(COLUMN_SPACING) * (HEADERS.len() - 1);
    let area = Rect::new(0, 0, to_u16(width), to_u16(rows.len() + 2));
    let mut buf = Buffer::empty(area);
    Widget::render(table, area, &mut buf);
    buffer_text(&buf)
}

fn aligned_cell(text: String, right: bool, style: Style) -> Cell<'static> {
    let alignment = if right {
        Alignment::Right
    } else {
        Alignment::Left
    };
    Cell::from(Line::from(text).alignment(alignment)).style(style)
}

fn row_cells(signal: &Signal) -> [String; 6] {
    [
        signal.date.clone(),
        signal.comp_symbol.to_uppercase(),
        signal.analyzed_tweets.to_string(),
        format!("{:.2}", signal.sentiment_score),
        sentiment_badge(signal),
        format!("${:.2}", signal.entry_price),
    ]
}

// Anything that is not positive or negative gets the neutral badge.
fn sentiment_badge(signal: &Signal) -> String {
    let marker = match signal.category() {
        Some(Sentiment::Positive) => '+',
        Some(Sentiment::Negative) => '-',
        _ => '~',
    };
    format!("{marker} {}", signal.sentiment)
}

fn badge_style(signal: &Signal) -> Style {
    match signal.category() {
        Some(Sentiment::Positive) => Style::default().fg(Color::Green),
        Some(Sentiment::Negative) => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Gray),
    }
}

/// Horizontal bar chart of each source's score. Bar length is the score's position on
/// the [-1, 1] axis; the printed value is the score itself.
pub fn render_comparison(source: &dyn ComparisonSource) -> String {
    let mut out = String::from("Signal Source Comparison");
    if source.is_mock() {
        out.push_str(" (illustrative data)");
    }
    out.push('\n');

    let points = source.points();
    let groups: Vec<BarGroup<'static>> = points
        .iter()
        .map(|point| {
            let bars: Vec<Bar<'static>> = [
                ("Google Trends", point.google_trends, Color::Blue),
                ("Twitter", point.twitter, Color::Cyan),
                ("News", point.news, Color::Magenta),
            ]
            .into_iter()
            .map(|(label, value, color)| {
                Bar::default()
                    .label(Line::from(label))
                    .value(axis_position(value))
                    .text_value(format!("{value:.2}"))
                    .style(Style::default().fg(color))
            })
            .collect();
            BarGroup::default()
                .label(Line::from(point.symbol.clone()))
                .bars(&bars)
        })
        .collect();

    let mut chart = BarChart::default()
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1)
        .max(AXIS_STEPS);
    for group in groups {
        chart = chart.data(group);
    }

    // One row per bar plus one label row per group.
    let height = points.len() * (SOURCES_PER_POINT + 1);
    let area = Rect::new(0, 0, CHART_WIDTH, to_u16(height));
    let mut buf = Buffer::empty(area);
    Widget::render(chart, area, &mut buf);
    out.push_str(&buffer_text(&buf));
    out
}

/// Maps a score on [-1, 1] to a bar length in `0..=AXIS_STEPS`.
fn axis_position(value: f64) -> u64 {
    let clamped = if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    ((clamped + 1.0) / 2.0 * AXIS_STEPS as f64).round() as u64
}

/// The buffer's symbols, one line per row, trailing blanks trimmed.
fn buffer_text(buf: &Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buf[(x, y)].symbol())
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
