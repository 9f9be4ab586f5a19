//! Table view of the probe history.
//!
//! [`render`] is pure: it turns a history snapshot and a terminal size into
//! a [`Dashboard`]. [`draw_dashboard`] paints that model with ratatui and
//! never touches monitor state.

use chrono::{DateTime, Local};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;
use std::time::Duration;

use crate::history::Snapshot;
use crate::models::{ProbeResult, Status, TerminalDimensions};

/// Rows used by the title, column header, header spacing and the two-line footer.
pub const FIXED_OVERHEAD: u16 = 5;

const UP_GLYPH: &str = "●";
const DOWN_GLYPH: &str = "✖";

pub fn visible_count(rows: u16) -> usize {
    usize::from(rows.saturating_sub(FIXED_OVERHEAD).max(1))
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndpointRow {
    Pending {
        endpoint: String,
    },
    Probed {
        endpoint: String,
        status: Status,
        status_code: Option<u16>,
        latency: String,
        strip: Vec<Status>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub title: String,
    pub rows: Vec<EndpointRow>,
    pub shown: usize,
    pub total: usize,
    pub history_size: usize,
    pub check_interval: Duration,
}

impl Dashboard {
    pub fn footer(&self) -> String {
        format!(
            "Showing {} of {} | every {}s | q to quit",
            self.shown,
            self.total,
            self.check_interval.as_secs()
        )
    }
}

/// Values shown around the table that do not come from the history itself.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub last_check: Option<DateTime<Local>>,
    pub check_interval: Duration,
    pub history_size: usize,
}

pub fn format_latency(result: &ProbeResult) -> String {
    result
        .latency_ms()
        .map_or_else(|| "N/A".to_string(), |ms| format!("{ms:.2} ms"))
}

pub fn status_label(status: Status, status_code: Option<u16>) -> String {
    let word = match status {
        Status::Up => "UP",
        Status::Down => "DOWN",
    };
    match status_code {
        Some(code) => format!("{word} {code}"),
        None => format!("{word} ---"),
    }
}

pub fn render(snapshot: &Snapshot, dimensions: TerminalDimensions, header: &Header) -> Dashboard {
    let total = snapshot.len();
    let shown = visible_count(dimensions.rows).min(total);

    let rows = snapshot
        .iter()
        .take(shown)
        .map(|(endpoint, history)| match history.last() {
            None => EndpointRow::Pending { endpoint: endpoint.clone() },
            Some(latest) => EndpointRow::Probed {
                endpoint: endpoint.clone(),
                status: latest.status(),
                status_code: latest.status_code(),
                latency: format_latency(latest),
                strip: history.iter().map(ProbeResult::status).collect(),
            },
        })
        .collect();

    let checked = header
        .last_check
        .map_or_else(|| "waiting for first check".to_string(), |t| {
            format!("last check {}", t.format("%Y-%m-%d %H:%M:%S"))
        });
    let up = snapshot
        .iter()
        .filter(|(_, h)| h.last().is_some_and(ProbeResult::is_up))
        .count();

    Dashboard {
        title: format!("Uptime Monitor | {up}/{total} up | {checked}"),
        rows,
        shown,
        total,
        history_size: header.history_size,
        check_interval: header.check_interval,
    }
}

fn status_style(status: Status) -> Style {
    match status {
        Status::Up => Style::default().fg(Color::Green),
        Status::Down => Style::default().fg(Color::Red),
    }
}

fn strip_line(strip: &[Status]) -> Line<'static> {
    let spans = strip
        .iter()
        .flat_map(|status| {
            let glyph = match status {
                Status::Up => UP_GLYPH,
                Status::Down => DOWN_GLYPH,
            };
            [Span::styled(glyph, status_style(*status)), Span::raw(" ")]
        })
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn table_row(row: &EndpointRow) -> Row<'static> {
    match row {
        EndpointRow::Pending { endpoint } => Row::new(vec![
            Cell::from(endpoint.clone()),
            Cell::from("no data yet").style(Style::default().fg(Color::DarkGray)),
            Cell::from(""),
            Cell::from(""),
        ]),
        EndpointRow::Probed { endpoint, status, status_code, latency, strip } => Row::new(vec![
            Cell::from(endpoint.clone()),
            Cell::from(status_label(*status, *status_code))
                .style(status_style(*status).add_modifier(Modifier::BOLD)),
            Cell::from(latency.clone()),
            Cell::from(strip_line(strip)),
        ]),
    }
}

pub fn draw_dashboard(frame: &mut Frame, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(2)])
        .split(frame.area());

    let title = Paragraph::new(Line::from(Span::styled(
        dashboard.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(title, chunks[0]);

    let header_row = Row::new(vec!["Endpoint", "Status", "Latency", "History"])
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
        .bottom_margin(1);
    let strip_width = u16::try_from(dashboard.history_size.saturating_mul(2)).unwrap_or(u16::MAX);
    let table = Table::new(
        dashboard.rows.iter().map(table_row),
        [
            Constraint::Fill(1),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(strip_width.max(7)),
        ],
    )
    .header(header_row)
    .column_spacing(2);
    frame.render_widget(table, chunks[1]);

    let footer = Paragraph::new(dashboard.footer())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);
}
