//! Heart-rate number and chart.
//!
//! The number is the rounded latest smoothed value, drawn with block digits
//! when the configured font size is large. The chart plots the smoothed
//! series against local wall-clock labels, with the alarm thresholds as flat
//! reference lines.

use chrono::{Local, TimeZone};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph},
    Frame,
};

use super::centered;
use crate::app::App;
use crate::data::Sample;

/// Y range shown even when the data is flatter than this.
const SUGGESTED_Y_RANGE: (f64, f64) = (30.0, 200.0);

/// Height of a block digit.
const GLYPH_HEIGHT: usize = 5;

/// Render the number and the chart into the body area.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let config = app.config();
    let number_height = number_height(app);

    let constraints = match (config.show_number, config.show_chart) {
        (true, true) => vec![Constraint::Length(number_height), Constraint::Min(5)],
        (true, false) => vec![Constraint::Min(number_height)],
        (false, true) => vec![Constraint::Min(5)],
        (false, false) => vec![Constraint::Min(1)],
    };
    let chunks = Layout::vertical(constraints).split(area);

    match (config.show_number, config.show_chart) {
        (true, true) => {
            render_number(frame, app, chunks[0]);
            render_chart(frame, app, chunks[1]);
        }
        (true, false) => render_number(frame, app, chunks[0]),
        (false, true) => render_chart(frame, app, chunks[0]),
        (false, false) => {
            let hint = Paragraph::new("Number and chart hidden (n / c to show)")
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::DIM));
            frame.render_widget(hint, chunks[0]);
        }
    }
}

/// Render the compact floating card: number and status only.
pub fn render_floating(frame: &mut Frame, app: &App, area: Rect) {
    let value = headline(app);
    let mut lines: Vec<Line> = Vec::new();

    if app.config().show_number {
        let style = Style::default().fg(app.theme.accent).add_modifier(Modifier::BOLD);
        if app.theme.big_digits() {
            lines.extend(big_text(&value).into_iter().map(|l| Line::styled(l, style)));
        } else {
            lines.push(Line::styled(format!("{} bpm", value), style));
        }
    }

    let alarm = app.alarm_indicator();
    lines.push(Line::from(Span::styled(alarm.label(), app.theme.status_style(alarm))));
    lines.push(Line::from(Span::styled(
        app.transport_status().to_string(),
        Style::default().add_modifier(Modifier::DIM),
    )));

    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 4;
    let card = centered(area, width.max(24), lines.len() as u16 + 2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.accent))
        .title(" ♥ ");

    frame.render_widget(Clear, card);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(app.theme.panel())
            .block(block),
        card,
    );
}

fn number_height(app: &App) -> u16 {
    if app.theme.big_digits() {
        GLYPH_HEIGHT as u16 + 2
    } else {
        3
    }
}

/// Rounded latest smoothed value, or `--` without data.
fn headline(app: &App) -> String {
    app.evaluation()
        .display_value()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "--".to_string())
}

fn render_number(frame: &mut Frame, app: &App, area: Rect) {
    let value = headline(app);
    let style = Style::default().fg(app.theme.accent).add_modifier(Modifier::BOLD);

    let lines: Vec<Line> = if app.theme.big_digits() {
        let mut lines: Vec<Line> =
            big_text(&value).into_iter().map(|l| Line::styled(l, style)).collect();
        if let Some(last) = lines.last_mut() {
            last.push_span(Span::styled(" bpm", Style::default().fg(app.theme.text)));
        }
        lines
    } else {
        vec![Line::from(vec![
            Span::styled(value, style),
            Span::styled(" bpm", Style::default().fg(app.theme.text)),
        ])]
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
        .title(Span::styled(" Heart rate (live) ", app.theme.header));

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(app.theme.panel())
            .block(block),
        area,
    );
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let smoothed = &app.evaluation().smoothed;
    let samples: Vec<&Sample> = app.buffer().snapshot().iter().collect();
    let config = app.config();

    let points: Vec<(f64, f64)> =
        smoothed.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect();
    let x_max = (points.len().max(2) - 1) as f64;
    let [y_min, y_max] = y_bounds(smoothed);

    let high_line = [(0.0, config.alarm_high), (x_max, config.alarm_high)];
    let low_line = [(0.0, config.alarm_low), (x_max, config.alarm_low)];

    let mut datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.accent))
        .data(&points)];
    if config.enable_alarm {
        datasets.push(
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.theme.critical).add_modifier(Modifier::DIM))
                .data(&high_line),
        );
        datasets.push(
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.theme.warning).add_modifier(Modifier::DIM))
                .data(&low_line),
        );
    }

    let x_labels: Vec<Span> = time_labels(&samples).into_iter().map(Span::raw).collect();
    let y_labels: Vec<Span> = [y_min, (y_min + y_max) / 2.0, y_max]
        .iter()
        .map(|v| Span::raw(format!("{:.0}", v)))
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
        .title(Span::styled(
            format!(" Smoothed (window {}) ", config.smoothing_window),
            app.theme.header,
        ));

    let chart = Chart::new(datasets)
        .block(block)
        .style(app.theme.panel())
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(x_labels)
                .style(Style::default().fg(app.theme.border)),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(y_labels)
                .style(Style::default().fg(app.theme.border)),
        );

    frame.render_widget(chart, area);
}

/// Y axis bounds: the suggested range, widened to fit every value.
pub fn y_bounds(values: &[f64]) -> [f64; 2] {
    let (mut low, mut high) = SUGGESTED_Y_RANGE;
    for v in values.iter().filter(|v| v.is_finite()) {
        low = low.min(*v);
        high = high.max(*v);
    }
    [low.floor(), high.ceil()]
}

/// First, middle and last sample times as local `HH:MM:SS`.
pub fn time_labels(samples: &[&Sample]) -> Vec<String> {
    let picks: Vec<&Sample> = match samples.len() {
        0 => return Vec::new(),
        1 | 2 => samples.to_vec(),
        n => vec![samples[0], samples[n / 2], samples[n - 1]],
    };
    picks.into_iter().map(|s| local_time(s.timestamp)).collect()
}

fn local_time(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Render `text` with 3x5 block glyphs. Unknown characters become blanks.
pub fn big_text(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); GLYPH_HEIGHT];
    for (i, ch) in text.chars().enumerate() {
        let glyph = glyph(ch);
        for (row, bits) in rows.iter_mut().zip(glyph) {
            if i > 0 {
                row.push(' ');
            }
            for col in 0..3 {
                row.push(if bits & (0b100 >> col) != 0 { '█' } else { ' ' });
            }
        }
    }
    rows
}

fn glyph(ch: char) -> [u8; GLYPH_HEIGHT] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => [0; GLYPH_HEIGHT],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Silent;
    use crate::settings::{ConfigStore, MemoryStorage};
    use crate::transport::testing::ScriptedConnector;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_y_bounds_widen_to_fit() {
        assert_eq!(y_bounds(&[]), [30.0, 200.0]);
        assert_eq!(y_bounds(&[60.0, 90.0]), [30.0, 200.0]);
        assert_eq!(y_bounds(&[25.5, 210.2]), [25.0, 211.0]);
    }

    #[test]
    fn test_big_text_shapes() {
        let rows = big_text("1-");
        assert_eq!(rows.len(), GLYPH_HEIGHT);
        assert_eq!(rows[0], " █     ");
        assert_eq!(rows[2], " █  ███");
        assert!(rows.iter().all(|r| r.chars().count() == 7));
    }

    #[test]
    fn test_time_labels_pick_ends_and_middle() {
        let samples: Vec<Sample> = (0..5).map(|i| Sample::new(i * 1000, 70.0)).collect();
        let refs: Vec<&Sample> = samples.iter().collect();
        assert_eq!(time_labels(&refs).len(), 3);
        assert!(time_labels(&[]).is_empty());
        assert_eq!(time_labels(&refs[..1]).len(), 1);
    }

    #[test]
    fn test_render_without_data_shows_placeholder() {
        let app = crate::app::App::new(
            ConfigStore::new(Box::new(MemoryStorage::new())),
            Box::new(ScriptedConnector::default()),
        )
        .with_notifier(Box::new(Silent));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| crate::ui::draw(frame, &app)).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("HEART RATE"));
        assert!(screen.contains("waiting for data"));
        assert!(screen.contains("███"));
    }
}
