//! Application state and user actions.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use reqwest::Url;
use tracing::{info, warn};

use crate::data::duration::parse_duration;
use crate::data::{write_csv, AlarmStatus, Evaluation, SampleBuffer};
use crate::notify::{Notifier, TerminalBell};
use crate::settings::{ConfigPatch, ConfigStore, Configuration, ThemeConfig};
use crate::transport::{Connector, DrainReport, TransportManager, TransportState};
use crate::ui::Theme;

/// Smoothing window range reachable from the keyboard.
pub const SMOOTHING_RANGE: (u32, u32) = (1, 20);
/// Font size range reachable from the keyboard.
pub const FONT_SIZE_RANGE: (u16, u16) = (28, 140);
/// Font size assumed when the theme does not set one.
pub const DEFAULT_FONT_SIZE: u16 = 72;
/// Step for threshold adjustments, in beats per minute.
pub const THRESHOLD_STEP: f64 = 5.0;
/// Step for poll interval adjustments, in milliseconds.
pub const POLL_INTERVAL_STEP: u64 = 250;
/// Accent colours cycled by the `t` key.
pub const ACCENT_COLORS: &[&str] = &["#ff4d4f", "#40a9ff", "#73d13d", "#faad14", "#9254de"];

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Settings that accept a typed value in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    PushUrl,
    PollUrl,
    PollInterval,
    SmoothingWindow,
    AlarmHigh,
    AlarmLow,
    FontSize,
}

impl EditableField {
    /// Panel order.
    pub const ALL: [EditableField; 7] = [
        EditableField::PushUrl,
        EditableField::PollUrl,
        EditableField::PollInterval,
        EditableField::SmoothingWindow,
        EditableField::AlarmHigh,
        EditableField::AlarmLow,
        EditableField::FontSize,
    ];

    /// Row label in the settings panel.
    pub fn label(&self) -> &'static str {
        match self {
            EditableField::PushUrl => "Push URL",
            EditableField::PollUrl => "Poll URL",
            EditableField::PollInterval => "Poll interval",
            EditableField::SmoothingWindow => "Smoothing window",
            EditableField::AlarmHigh => "Alarm high",
            EditableField::AlarmLow => "Alarm low",
            EditableField::FontSize => "Font size",
        }
    }

    /// Current value as the editor starts with it.
    pub fn current(&self, config: &Configuration) -> String {
        match self {
            EditableField::PushUrl => config.push_url.clone(),
            EditableField::PollUrl => config.poll_url.clone(),
            EditableField::PollInterval => config.poll_interval.to_string(),
            EditableField::SmoothingWindow => config.smoothing_window.to_string(),
            EditableField::AlarmHigh => config.alarm_high.to_string(),
            EditableField::AlarmLow => config.alarm_low.to_string(),
            EditableField::FontSize => config
                .theme
                .font_size
                .unwrap_or(DEFAULT_FONT_SIZE)
                .to_string(),
        }
    }

    /// Turn typed text into a patch for this field.
    pub fn parse(&self, input: &str, config: &Configuration) -> Result<ConfigPatch> {
        let input = input.trim();
        let patch = match self {
            EditableField::PushUrl => ConfigPatch::new().push_url(parse_url(input)?),
            EditableField::PollUrl => ConfigPatch::new().poll_url(parse_url(input)?),
            EditableField::PollInterval => {
                let millis = parse_duration(input)?.as_millis() as u64;
                if millis == 0 {
                    bail!("interval must be positive");
                }
                ConfigPatch::new().poll_interval(millis)
            }
            EditableField::SmoothingWindow => {
                let (min, max) = SMOOTHING_RANGE;
                let window: u32 = input.parse().context("not a whole number")?;
                if !(min..=max).contains(&window) {
                    bail!("must be between {} and {}", min, max);
                }
                ConfigPatch::new().smoothing_window(window)
            }
            EditableField::AlarmHigh => ConfigPatch::new().alarm_high(parse_threshold(input)?),
            EditableField::AlarmLow => ConfigPatch::new().alarm_low(parse_threshold(input)?),
            EditableField::FontSize => {
                let (min, max) = FONT_SIZE_RANGE;
                let size: u16 = input.parse().context("not a whole number")?;
                if !(min..=max).contains(&size) {
                    bail!("must be between {} and {}", min, max);
                }
                ConfigPatch::new().theme(ThemeConfig {
                    font_size: Some(size),
                    ..config.theme.clone()
                })
            }
        };
        Ok(patch)
    }
}

fn parse_url(input: &str) -> Result<String> {
    let url = Url::parse(input).context("not a valid URL")?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("only http and https are supported");
    }
    Ok(input.to_string())
}

fn parse_threshold(input: &str) -> Result<f64> {
    let value: f64 = input.parse().context("not a number")?;
    if !value.is_finite() || value < 0.0 {
        bail!("must be a non-negative number");
    }
    Ok(value)
}

/// Main application state.
///
/// Owns the configuration, the transport and the sample window. Everything
/// runs on the UI thread: [`tick`](Self::tick) drains transport events into
/// the buffer and re-evaluates once per burst.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_settings: bool,

    // Settings editor
    pub settings_cursor: usize,
    pub edit_input: Option<String>,

    store: ConfigStore,
    config: Configuration,
    transport: TransportManager,
    buffer: SampleBuffer,
    evaluation: Evaluation,
    notifier: Box<dyn Notifier>,

    // UI
    palette: Theme,
    pub theme: Theme,
    export_path: PathBuf,
    last_sample_at: Option<Instant>,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Load the configuration from `store` and open its transport.
    pub fn new(store: ConfigStore, connector: Box<dyn Connector>) -> Self {
        let config = store.load();
        info!(mode = config.mode.label(), "Starting with loaded configuration");
        let transport = TransportManager::new(connector, config.transport_settings());
        let palette = Theme::dark();
        let theme = palette.with_config(&config.theme);

        Self {
            running: true,
            show_help: false,
            show_settings: false,
            settings_cursor: 0,
            edit_input: None,
            store,
            config,
            transport,
            buffer: SampleBuffer::new(),
            evaluation: Evaluation::default(),
            notifier: Box::new(TerminalBell),
            palette,
            theme,
            export_path: PathBuf::from("hr.csv"),
            last_sample_at: None,
            status_message: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Use `palette` for everything the configured theme leaves unset.
    pub fn with_palette(mut self, palette: Theme) -> Self {
        self.palette = palette;
        self.refresh_theme();
        self
    }

    pub fn with_export_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.export_path = path.as_ref().to_path_buf();
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn alarm_status(&self) -> AlarmStatus {
        self.evaluation.status
    }

    /// Alarm status as displayed, `Disabled` while alarms are switched off.
    pub fn alarm_indicator(&self) -> AlarmStatus {
        self.evaluation.indicator(self.config.enable_alarm)
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    /// Transport status line ("push connected", "polling…", ...).
    pub fn transport_status(&self) -> &str {
        self.transport.status()
    }

    /// Returns a description of where samples come from.
    pub fn source_description(&self) -> String {
        self.transport.description()
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    /// Time since the last sample arrived.
    pub fn last_sample_age(&self) -> Option<Duration> {
        self.last_sample_at.map(|t| t.elapsed())
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Apply queued transport events, then evaluate if anything was appended.
    pub fn tick(&mut self) -> DrainReport {
        let report = self.transport.drain(&mut self.buffer);
        if report.appended > 0 {
            self.last_sample_at = Some(Instant::now());
            self.evaluate();
        }
        report
    }

    /// Smooth, classify, and notify while in the alarm zone.
    fn evaluate(&mut self) {
        self.evaluation = Evaluation::compute(&self.buffer, &self.config);
        if self.evaluation.status.is_alarm() {
            self.notifier.notify(self.evaluation.status);
        }
    }

    /// Merge `patch` into the configuration, persist it, and apply it.
    ///
    /// Transport-identifying changes rebuild the channel; smoothing and
    /// threshold changes only re-evaluate.
    pub fn apply_patch(&mut self, patch: ConfigPatch) {
        if patch.is_empty() {
            return;
        }

        let next = self.store.patch(&self.config, &patch);
        let previous = std::mem::replace(&mut self.config, next);

        if previous.transport_settings() != self.config.transport_settings() {
            self.transport.reconfigure(self.config.transport_settings());
        }
        if previous.evaluation_differs(&self.config) {
            self.evaluate();
        }
        if previous.theme != self.config.theme {
            self.refresh_theme();
        }
    }

    fn refresh_theme(&mut self) {
        self.theme = self.palette.with_config(&self.config.theme);
    }

    pub fn toggle_chart(&mut self) {
        self.apply_patch(ConfigPatch::new().show_chart(!self.config.show_chart));
    }

    pub fn toggle_number(&mut self) {
        self.apply_patch(ConfigPatch::new().show_number(!self.config.show_number));
    }

    /// Switch between push and poll.
    pub fn toggle_mode(&mut self) {
        let mode = self.config.mode.toggled();
        self.apply_patch(ConfigPatch::new().mode(mode));
        self.set_status_message(format!("Transport: {}", mode.label()));
    }

    pub fn toggle_alarm(&mut self) {
        self.apply_patch(ConfigPatch::new().enable_alarm(!self.config.enable_alarm));
    }

    pub fn toggle_floating(&mut self) {
        self.apply_patch(ConfigPatch::new().floating_mode(!self.config.floating_mode));
    }

    pub fn adjust_smoothing(&mut self, delta: i32) {
        let (min, max) = SMOOTHING_RANGE;
        let window = (self.config.smoothing_window as i64 + delta as i64)
            .clamp(min as i64, max as i64) as u32;
        self.apply_patch(ConfigPatch::new().smoothing_window(window));
    }

    /// Move the high threshold by `steps` of [`THRESHOLD_STEP`].
    pub fn adjust_alarm_high(&mut self, steps: i32) {
        let high = (self.config.alarm_high + THRESHOLD_STEP * steps as f64).max(0.0);
        self.apply_patch(ConfigPatch::new().alarm_high(high));
    }

    /// Move the low threshold by `steps` of [`THRESHOLD_STEP`].
    pub fn adjust_alarm_low(&mut self, steps: i32) {
        let low = (self.config.alarm_low + THRESHOLD_STEP * steps as f64).max(0.0);
        self.apply_patch(ConfigPatch::new().alarm_low(low));
    }

    /// Move the poll interval by `steps` of [`POLL_INTERVAL_STEP`], never below one step.
    pub fn adjust_poll_interval(&mut self, steps: i32) {
        let current = self.config.poll_interval as i64;
        let interval = (current + POLL_INTERVAL_STEP as i64 * steps as i64)
            .max(POLL_INTERVAL_STEP as i64) as u64;
        self.apply_patch(ConfigPatch::new().poll_interval(interval));
    }

    /// Switch to the next accent colour, keeping the rest of the theme.
    pub fn cycle_accent(&mut self) {
        let next = match self.config.theme.accent.as_deref() {
            Some(current) => ACCENT_COLORS
                .iter()
                .position(|c| c.eq_ignore_ascii_case(current))
                .map(|i| ACCENT_COLORS[(i + 1) % ACCENT_COLORS.len()])
                .unwrap_or(ACCENT_COLORS[0]),
            None => ACCENT_COLORS[0],
        };
        let theme = ThemeConfig {
            accent: Some(next.to_string()),
            ..self.config.theme.clone()
        };
        self.apply_patch(ConfigPatch::new().theme(theme));
    }

    pub fn adjust_font_size(&mut self, delta: i32) {
        let (min, max) = FONT_SIZE_RANGE;
        let current = self.config.theme.font_size.unwrap_or(DEFAULT_FONT_SIZE) as i32;
        let size = (current + delta).clamp(min as i32, max as i32) as u16;
        let theme = ThemeConfig {
            font_size: Some(size),
            ..self.config.theme.clone()
        };
        self.apply_patch(ConfigPatch::new().theme(theme));
    }

    /// Forget the persisted configuration and start over from the defaults.
    ///
    /// Behaves like a fresh start: the sample window is cleared and the
    /// transport is rebuilt.
    pub fn reset(&mut self) {
        if let Err(e) = self.store.reset() {
            warn!("Failed to clear persisted configuration: {}", e);
        }
        self.config = self.store.load();
        self.buffer.clear();
        self.evaluation = Evaluation::default();
        self.last_sample_at = None;
        self.transport.reconfigure(self.config.transport_settings());
        self.refresh_theme();
        self.set_status_message("Configuration reset".to_string());
    }

    /// Write the current window to the export path as CSV.
    ///
    /// Returns the number of rows written.
    pub fn export_csv(&self) -> Result<usize> {
        write_csv(&self.export_path, self.buffer.snapshot())?;
        Ok(self.buffer.len())
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Toggle the settings panel.
    pub fn toggle_settings(&mut self) {
        self.show_settings = !self.show_settings;
        self.edit_input = None;
    }

    /// The field under the settings cursor.
    pub fn selected_field(&self) -> EditableField {
        EditableField::ALL[self.settings_cursor % EditableField::ALL.len()]
    }

    pub fn select_next_field(&mut self) {
        self.settings_cursor = (self.settings_cursor + 1) % EditableField::ALL.len();
    }

    pub fn select_previous_field(&mut self) {
        let len = EditableField::ALL.len();
        self.settings_cursor = (self.settings_cursor + len - 1) % len;
    }

    /// Whether the settings editor is capturing keystrokes.
    pub fn is_editing(&self) -> bool {
        self.edit_input.is_some()
    }

    /// Start editing the selected field, beginning with its current value.
    pub fn start_edit(&mut self) {
        self.edit_input = Some(self.selected_field().current(&self.config));
    }

    /// Leave the editor without applying anything.
    pub fn cancel_edit(&mut self) {
        self.edit_input = None;
    }

    /// Append a character to the edited value.
    pub fn edit_push(&mut self, c: char) {
        if let Some(input) = self.edit_input.as_mut() {
            input.push(c);
        }
    }

    /// Remove the last character from the edited value.
    pub fn edit_pop(&mut self) {
        if let Some(input) = self.edit_input.as_mut() {
            input.pop();
        }
    }

    /// Clear the edited value.
    pub fn edit_clear(&mut self) {
        if let Some(input) = self.edit_input.as_mut() {
            input.clear();
        }
    }

    /// Parse the edited value and apply it as a patch.
    ///
    /// Invalid input leaves the configuration untouched and is reported
    /// through the status message.
    pub fn commit_edit(&mut self) {
        let Some(input) = self.edit_input.take() else {
            return;
        };
        let field = self.selected_field();
        match field.parse(&input, &self.config) {
            Ok(patch) => {
                self.apply_patch(patch);
                self.set_status_message(format!("{} updated", field.label()));
            }
            Err(e) => {
                self.set_status_message(format!("{}: {:#}", field.label(), e));
            }
        }
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
        self.transport.teardown();
    }
}
