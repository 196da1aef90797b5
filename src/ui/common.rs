//! Common UI components shared across views.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered;
use crate::app::App;
use crate::data::duration::{format_age, format_interval};
use crate::settings::TransportMode;
use crate::transport::TransportState;

/// Split the screen into header, body and status bar.
pub fn main_layout(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Min(3),    // Number and chart
        Constraint::Length(1), // Status bar
    ])
    .areas(area)
}

/// Render the header bar.
///
/// Displays: transport state indicator, source, alarm thresholds, sample count.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let config = app.config();

    let (icon, icon_style) = match app.transport_state() {
        TransportState::Connected | TransportState::Polling => {
            ("●", Style::default().fg(app.theme.healthy))
        }
        TransportState::Connecting => ("●", Style::default().fg(app.theme.warning)),
        TransportState::Failed | TransportState::Disconnected => {
            ("●", Style::default().fg(app.theme.critical))
        }
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", icon), icon_style),
        Span::styled("HEART RATE ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.source_description()),
    ];
    if config.mode == TransportMode::Poll || app.transport_state() == TransportState::Polling {
        spans.push(Span::raw(format!(" every {}", format_interval(config.poll_interval()))));
    }
    spans.push(Span::raw(" │ "));
    if config.enable_alarm {
        spans.push(Span::raw(format!(
            "alarm ≤{} ≥{}",
            config.alarm_low, config.alarm_high
        )));
    } else {
        spans.push(Span::styled("alarm off", Style::default().add_modifier(Modifier::DIM)));
    }
    spans.push(Span::raw(format!(
        " │ {} samples │ smoothing {}",
        app.buffer().len(),
        config.smoothing_window
    )));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the status bar at the bottom.
///
/// Shows: transport status, alarm classification, age of the last sample,
/// available controls. Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.accent));
        frame.render_widget(paragraph, area);
        return;
    }

    let alarm = app.alarm_indicator();
    let age = app
        .last_sample_age()
        .map(|d| format!("last sample {}", format_age(d)))
        .unwrap_or_else(|| "no samples yet".to_string());

    let line = Line::from(vec![
        Span::raw(format!(" {} │ ", app.transport_status())),
        Span::styled(alarm.label(), app.theme.status_style(alarm)),
        Span::styled(
            format!(" │ {} │ s:settings ?:help q:quit", age),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Display"),
        Line::from("  c         Show/hide chart"),
        Line::from("  n         Show/hide number"),
        Line::from("  f         Floating mode"),
        Line::from("  t         Cycle accent colour"),
        Line::from("  > <       Font size ±4"),
        Line::from(""),
        section(" Signal"),
        Line::from("  m         Switch push/poll"),
        Line::from("  [ ]       Poll interval ±250ms"),
        Line::from("  + -       Smoothing window ±1"),
        Line::from(""),
        section(" Alarm"),
        Line::from("  a         Enable/disable alarm"),
        Line::from("  H h       High threshold ±5"),
        Line::from("  L l       Low threshold ±5"),
        Line::from(""),
        section(" General"),
        Line::from("  s         Settings panel"),
        Line::from("  ↑↓ Enter  Pick and edit a setting"),
        Line::from("  e         Export to CSV"),
        Line::from("  R         Reset configuration"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.accent));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_area = centered(
        area,
        42u16.min(area.width.saturating_sub(4)),
        29u16.min(area.height.saturating_sub(2)),
    );

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
