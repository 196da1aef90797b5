use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If a setting is being edited, handle text input
    if app.is_editing() {
        handle_edit_input(app, key);
        return;
    }

    // Settings panel stays open while values are adjusted
    if app.show_settings {
        match key.code {
            KeyCode::Esc => {
                app.show_settings = false;
                return;
            }
            KeyCode::Down | KeyCode::Tab => {
                app.select_next_field();
                return;
            }
            KeyCode::Up | KeyCode::BackTab => {
                app.select_previous_field();
                return;
            }
            KeyCode::Enter => {
                app.start_edit();
                return;
            }
            _ => {}
        }
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // Display
        KeyCode::Char('c') => app.toggle_chart(),
        KeyCode::Char('n') => app.toggle_number(),
        KeyCode::Char('f') => app.toggle_floating(),
        KeyCode::Char('t') => app.cycle_accent(),
        KeyCode::Char('>') => app.adjust_font_size(4),
        KeyCode::Char('<') => app.adjust_font_size(-4),

        // Signal
        KeyCode::Char('m') => app.toggle_mode(),
        KeyCode::Char(']') => app.adjust_poll_interval(1),
        KeyCode::Char('[') => app.adjust_poll_interval(-1),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_smoothing(1),
        KeyCode::Char('-') => app.adjust_smoothing(-1),

        // Alarm
        KeyCode::Char('a') => app.toggle_alarm(),
        KeyCode::Char('H') => app.adjust_alarm_high(1),
        KeyCode::Char('h') => app.adjust_alarm_high(-1),
        KeyCode::Char('L') => app.adjust_alarm_low(1),
        KeyCode::Char('l') => app.adjust_alarm_low(-1),

        // Panels
        KeyCode::Char('s') => app.toggle_settings(),
        KeyCode::Char('?') => app.toggle_help(),

        // Reset
        KeyCode::Char('R') => app.reset(),

        // Export
        KeyCode::Char('e') => match app.export_csv() {
            Ok(rows) => {
                let msg = format!("Exported {} samples to {}", rows, app.export_path().display());
                app.set_status_message(msg);
            }
            Err(e) => {
                app.set_status_message(format!("Export failed: {}", e));
            }
        },

        _ => {}
    }
}

/// Handle key input while a setting is being edited
fn handle_edit_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Apply the typed value
        KeyCode::Enter => app.commit_edit(),

        // Leave without applying
        KeyCode::Esc => app.cancel_edit(),

        // Clear the whole value
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_clear();
        }

        KeyCode::Backspace => app.edit_pop(),

        // Type characters
        KeyCode::Char(c) => app.edit_push(c),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Silent;
    use crate::settings::{ConfigStore, MemoryStorage, TransportMode};
    use crate::transport::testing::ScriptedConnector;

    fn app() -> App {
        App::new(
            ConfigStore::new(Box::new(MemoryStorage::new())),
            Box::new(ScriptedConnector::default()),
        )
        .with_notifier(Box::new(Silent))
    }

    fn press(app: &mut App, c: char) {
        handle_key_event(app, KeyEvent::from(KeyCode::Char(c)));
    }

    #[test]
    fn test_keys_patch_configuration() {
        let mut app = app();
        press(&mut app, 'c');
        press(&mut app, 'm');
        press(&mut app, '+');
        press(&mut app, 'H');
        press(&mut app, 'l');
        press(&mut app, ']');

        let config = app.config();
        assert!(!config.show_chart);
        assert_eq!(config.mode, TransportMode::Poll);
        assert_eq!(config.smoothing_window, 6);
        assert_eq!(config.alarm_high, 185.0);
        assert_eq!(config.alarm_low, 35.0);
        assert_eq!(config.poll_interval, 1250);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        press(&mut app, '?');
        assert!(app.show_help);

        press(&mut app, 'q');
        assert!(!app.show_help);
        assert!(app.running);

        press(&mut app, 'q');
        assert!(!app.running);
    }

    #[test]
    fn test_settings_panel_closes_on_escape() {
        let mut app = app();
        press(&mut app, 's');
        assert!(app.show_settings);

        // Adjusting keeps the panel open.
        press(&mut app, '>');
        assert!(app.show_settings);
        assert_eq!(app.config().theme.font_size, Some(76));

        handle_key_event(&mut app, KeyEvent::from(KeyCode::Esc));
        assert!(!app.show_settings);
    }

    #[test]
    fn test_settings_editor_types_a_poll_url() {
        let mut app = app();
        press(&mut app, 's');
        handle_key_event(&mut app, KeyEvent::from(KeyCode::Down));
        handle_key_event(&mut app, KeyEvent::from(KeyCode::Enter));
        assert!(app.is_editing());

        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
        );
        // Letters that are shortcuts elsewhere are typed, not dispatched.
        for c in "http://hr.lan/latestq".chars() {
            press(&mut app, c);
        }
        handle_key_event(&mut app, KeyEvent::from(KeyCode::Backspace));
        handle_key_event(&mut app, KeyEvent::from(KeyCode::Enter));

        assert!(app.running);
        assert!(!app.is_editing());
        assert!(app.show_settings);
        assert_eq!(app.config().poll_url, "http://hr.lan/latest");
        assert_eq!(app.config().mode, TransportMode::Push);
    }

    #[test]
    fn test_escape_cancels_edit_before_closing_panel() {
        let mut app = app();
        press(&mut app, 's');
        handle_key_event(&mut app, KeyEvent::from(KeyCode::Up));
        handle_key_event(&mut app, KeyEvent::from(KeyCode::Enter));
        press(&mut app, '0');

        handle_key_event(&mut app, KeyEvent::from(KeyCode::Esc));
        assert!(!app.is_editing());
        assert!(app.show_settings);
        assert_eq!(app.config().theme.font_size, Some(72));

        handle_key_event(&mut app, KeyEvent::from(KeyCode::Esc));
        assert!(!app.show_settings);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(!app.running);
        assert!(app.config().show_chart);
    }
}
