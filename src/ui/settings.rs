//! Settings overlay rendering.
//!
//! Lists every configuration field with its current value and the key that
//! changes it. Rows with a typed value can be selected with the arrow keys
//! and edited in place.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Clear, Row, Table},
    Frame,
};

use super::centered;
use crate::app::App;
use crate::data::duration::format_interval;
use crate::settings::Configuration;

/// Minimum width required for the settings overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the settings overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 12;

/// One row per field: label, value, key hint.
pub fn rows(config: &Configuration) -> Vec<[String; 3]> {
    let on_off = |b: bool| (if b { "on" } else { "off" }).to_string();
    let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(palette)".to_string());

    vec![
        ["Transport".into(), config.mode.label().into(), "m".into()],
        ["Push URL".into(), config.push_url.clone(), "↵".into()],
        ["Poll URL".into(), config.poll_url.clone(), "↵".into()],
        [
            "Poll interval".into(),
            format_interval(config.poll_interval()),
            "[ ]".into(),
        ],
        [
            "Smoothing window".into(),
            config.smoothing_window.to_string(),
            "+ -".into(),
        ],
        ["Show chart".into(), on_off(config.show_chart), "c".into()],
        ["Show number".into(), on_off(config.show_number), "n".into()],
        ["Alarm".into(), on_off(config.enable_alarm), "a".into()],
        ["Alarm high".into(), config.alarm_high.to_string(), "H h".into()],
        ["Alarm low".into(), config.alarm_low.to_string(), "L l".into()],
        ["Background".into(), or_unset(&config.theme.bg), "".into()],
        ["Text colour".into(), or_unset(&config.theme.text), "".into()],
        ["Accent colour".into(), or_unset(&config.theme.accent), "t".into()],
        [
            "Font size".into(),
            config
                .theme
                .font_size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(palette)".to_string()),
            "> <".into(),
        ],
        ["Floating mode".into(), on_off(config.floating_mode), "f".into()],
    ]
}

/// Render the settings panel as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let rows = rows(app.config());
    let selected = app.selected_field().label();
    let overlay_area = centered(
        area,
        (area.width * 90 / 100).min(80),
        rows.len() as u16 + 4,
    );

    let table_rows: Vec<Row> = rows
        .into_iter()
        .map(|[label, value, key]| {
            let is_selected = label == selected;
            let value = match &app.edit_input {
                Some(input) if is_selected => format!("{}▏", input),
                _ => value,
            };
            let row = Row::new(vec![
                Cell::from(label),
                Cell::from(value).style(Style::default().fg(app.theme.accent)),
                Cell::from(key).style(Style::default().add_modifier(Modifier::DIM)),
            ]);
            if is_selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let header = Row::new(vec!["Setting", "Value", "Key"]).style(app.theme.header);

    let block = Block::default()
        .title(Span::styled(" Settings ", app.theme.header))
        .title_bottom(Span::styled(
            " ↑↓:select  Enter:edit  R:reset  s/Esc:close ",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.accent));

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(18),
            Constraint::Min(20),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(block);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);
    frame.render_widget(table, overlay_area);
}
