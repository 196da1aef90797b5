//! Persisted user configuration.
//!
//! The configuration is one flat record. It is built by shallow-merging a
//! persisted override over the defaults: every top-level key in the override
//! replaces the default wholesale, including the nested `theme` record, which
//! is never merged field by field.
//!
//! ```text
//! defaults ──┐
//!            ├──▶ merge_shallow ──▶ Configuration ──▶ patch ──▶ persist
//! persisted ─┘
//! ```
//!
//! - [`Configuration`]: the typed record and its defaults
//! - [`ConfigPatch`]: a partial update applied with [`Configuration::patched`]
//! - [`store`]: loading, persisting and resetting through a [`Storage`] backend

pub mod store;

pub use store::{ConfigStore, FileStorage, MemoryStorage, Storage, StoreError, STORAGE_KEY};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default push (server-sent events) endpoint.
pub const DEFAULT_PUSH_URL: &str = "http://127.0.0.1:3030/events";
/// Default poll endpoint.
pub const DEFAULT_POLL_URL: &str = "http://127.0.0.1:3030/latest";
/// Poll interval used when none (or zero) is configured, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Which transport feeds the sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Long-lived server-push stream, falling back to polling on error.
    #[default]
    Push,
    /// Fixed-interval request/response polling.
    Poll,
}

impl TransportMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            TransportMode::Push => TransportMode::Poll,
            TransportMode::Poll => TransportMode::Push,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransportMode::Push => "push",
            TransportMode::Poll => "poll",
        }
    }
}

/// Display theme.
///
/// Every field is optional: a persisted theme replaces the default theme as a
/// whole, so fields it leaves out stay unset and the renderer falls back to
/// its own palette for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u16>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            bg: Some("rgba(0,0,0,0.4)".to_string()),
            text: Some("#ffffff".to_string()),
            accent: Some("#ff4d4f".to_string()),
            font_size: Some(72),
        }
    }
}

/// The full configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub mode: TransportMode,
    pub push_url: String,
    pub poll_url: String,
    /// Milliseconds between poll requests.
    pub poll_interval: u64,
    /// Number of trailing samples averaged per smoothed point.
    pub smoothing_window: u32,
    pub show_chart: bool,
    pub show_number: bool,
    pub enable_alarm: bool,
    pub alarm_high: f64,
    pub alarm_low: f64,
    pub theme: ThemeConfig,
    pub floating_mode: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            mode: TransportMode::Push,
            push_url: DEFAULT_PUSH_URL.to_string(),
            poll_url: DEFAULT_POLL_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL_MS,
            smoothing_window: 5,
            show_chart: true,
            show_number: true,
            enable_alarm: true,
            alarm_high: 180.0,
            alarm_low: 40.0,
            theme: ThemeConfig::default(),
            floating_mode: false,
        }
    }
}

/// The slice of configuration that identifies a transport.
///
/// Any difference here means the active channel has to be torn down and
/// rebuilt; everything else is applied without touching the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub mode: TransportMode,
    pub push_url: String,
    pub poll_url: String,
    pub poll_interval: Duration,
}

impl Configuration {
    /// Build a configuration from `defaults` overlaid with a persisted record.
    ///
    /// Returns `None` if the override is not an object or the merged record
    /// does not describe a valid configuration.
    pub fn from_override(defaults: &Configuration, persisted: Value) -> Option<Self> {
        let Value::Object(overlay) = persisted else {
            return None;
        };
        let Value::Object(mut merged) = serde_json::to_value(defaults).ok()? else {
            return None;
        };
        merge_shallow(&mut merged, overlay);

        serde_json::from_value::<Configuration>(Value::Object(merged))
            .ok()
            .map(Configuration::normalized)
    }

    /// Replace out-of-range values with usable ones.
    pub fn normalized(mut self) -> Self {
        if self.poll_interval == 0 {
            self.poll_interval = DEFAULT_POLL_INTERVAL_MS;
        }
        if self.smoothing_window == 0 {
            self.smoothing_window = 1;
        }
        self
    }

    /// Apply a partial update: `{...self, ...partial}`.
    ///
    /// A `theme` in the patch replaces the current theme wholesale.
    pub fn patched(&self, partial: &ConfigPatch) -> Self {
        let mut next = self.clone();
        if let Some(mode) = partial.mode {
            next.mode = mode;
        }
        if let Some(ref url) = partial.push_url {
            next.push_url = url.clone();
        }
        if let Some(ref url) = partial.poll_url {
            next.poll_url = url.clone();
        }
        if let Some(interval) = partial.poll_interval {
            next.poll_interval = interval;
        }
        if let Some(window) = partial.smoothing_window {
            next.smoothing_window = window;
        }
        if let Some(show) = partial.show_chart {
            next.show_chart = show;
        }
        if let Some(show) = partial.show_number {
            next.show_number = show;
        }
        if let Some(enabled) = partial.enable_alarm {
            next.enable_alarm = enabled;
        }
        if let Some(high) = partial.alarm_high {
            next.alarm_high = high;
        }
        if let Some(low) = partial.alarm_low {
            next.alarm_low = low;
        }
        if let Some(ref theme) = partial.theme {
            next.theme = theme.clone();
        }
        if let Some(floating) = partial.floating_mode {
            next.floating_mode = floating;
        }
        next.normalized()
    }

    /// The transport-identifying part of this configuration.
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            mode: self.mode,
            push_url: self.push_url.clone(),
            poll_url: self.poll_url.clone(),
            poll_interval: self.poll_interval(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval.max(1))
    }

    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window as usize
    }

    /// Whether smoothing or alarm inputs differ between two configurations.
    pub fn evaluation_differs(&self, other: &Configuration) -> bool {
        self.smoothing_window != other.smoothing_window
            || self.enable_alarm != other.enable_alarm
            || self.alarm_high != other.alarm_high
            || self.alarm_low != other.alarm_low
    }
}

/// A partial configuration update.
///
/// Unset fields leave the current value alone. Built fluently:
///
/// ```
/// use pulsewatch::settings::{ConfigPatch, Configuration, TransportMode};
///
/// let patch = ConfigPatch::new().mode(TransportMode::Poll).poll_interval(500);
/// let next = Configuration::default().patched(&patch);
/// assert_eq!(next.mode, TransportMode::Poll);
/// assert_eq!(next.poll_interval, 500);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TransportMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothing_window: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_chart: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_number: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_alarm: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floating_mode: Option<bool>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: TransportMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn push_url(mut self, url: impl Into<String>) -> Self {
        self.push_url = Some(url.into());
        self
    }

    pub fn poll_url(mut self, url: impl Into<String>) -> Self {
        self.poll_url = Some(url.into());
        self
    }

    pub fn poll_interval(mut self, millis: u64) -> Self {
        self.poll_interval = Some(millis);
        self
    }

    pub fn smoothing_window(mut self, window: u32) -> Self {
        self.smoothing_window = Some(window);
        self
    }

    pub fn show_chart(mut self, show: bool) -> Self {
        self.show_chart = Some(show);
        self
    }

    pub fn show_number(mut self, show: bool) -> Self {
        self.show_number = Some(show);
        self
    }

    pub fn enable_alarm(mut self, enabled: bool) -> Self {
        self.enable_alarm = Some(enabled);
        self
    }

    pub fn alarm_high(mut self, high: f64) -> Self {
        self.alarm_high = Some(high);
        self
    }

    pub fn alarm_low(mut self, low: f64) -> Self {
        self.alarm_low = Some(low);
        self
    }

    /// Replace the whole theme.
    pub fn theme(mut self, theme: ThemeConfig) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn floating_mode(mut self, floating: bool) -> Self {
        self.floating_mode = Some(floating);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Overlay `overlay` onto `base`, replacing top-level keys wholesale.
///
/// Nested objects are not merged: an object in `overlay` replaces the one in
/// `base` entirely.
pub fn merge_shallow(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}
