//! # pulsewatch
//!
//! A terminal heart-rate monitor and the library behind it.
//!
//! Samples arrive from a remote source over one of two interchangeable
//! transports, a server-push event stream or fixed-interval polling. They
//! are kept in a bounded window, smoothed, and classified against alarm
//! thresholds.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          Application                          │
//! │  ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌───────────┐  │
//! │  │ settings │──▶│ transport │──▶│   data   │──▶│    ui     │  │
//! │  │ (config) │   │ (push/poll)   │ (window) │   │(rendering)│  │
//! │  └──────────┘   └───────────┘   └────┬─────┘   └───────────┘  │
//! │                                      ▼                        │
//! │                                  ┌────────┐                   │
//! │                                  │ notify │                   │
//! │                                  └────────┘                   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`settings`]**: The persisted [`Configuration`], shallow-merged over
//!   defaults and updated through patches
//! - **[`transport`]**: [`TransportManager`] and the [`Connector`] seam, with
//!   the reqwest-backed [`HttpConnector`]
//! - **[`data`]**: Payload parsing, the [`SampleBuffer`] window, smoothing,
//!   alarm classification, CSV export
//! - **[`notify`]**: Audible alarm notification
//! - **[`app`]** / **[`events`]** / **[`ui`]**: The terminal front end
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Push stream with polling fallback, configuration in the current directory
//! pulsewatch
//!
//! # Keep configuration elsewhere and refresh faster
//! pulsewatch --config-dir ~/.config/pulsewatch --tick 50ms
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use pulsewatch::{App, ConfigStore, FileStorage, HttpConnector};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let connector = HttpConnector::new(rt.handle().clone()).unwrap();
//! let store = ConfigStore::new(Box::new(FileStorage::new(".")));
//!
//! let mut app = App::new(store, Box::new(connector));
//! app.tick();
//! ```
//!
//! ### Just the signal pipeline
//!
//! ```
//! use pulsewatch::data::{Evaluation, Sample, SampleBuffer};
//! use pulsewatch::{AlarmStatus, Configuration};
//!
//! let mut buffer = SampleBuffer::new();
//! for raw in [r#"{"hr":178}"#, r#"{"hr":185,"ts":1700000000000}"#] {
//!     if let Ok(sample) = Sample::parse(raw, 1) {
//!         buffer.append(sample);
//!     }
//! }
//!
//! let eval = Evaluation::compute(&buffer, &Configuration::default());
//! assert_eq!(eval.status, AlarmStatus::High);
//! ```

pub mod app;
pub mod data;
pub mod events;
pub mod notify;
pub mod settings;
pub mod transport;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use data::{AlarmStatus, Evaluation, Sample, SampleBuffer};
pub use notify::{Notifier, Silent, TerminalBell};
pub use settings::{ConfigPatch, ConfigStore, Configuration, FileStorage, TransportMode};
pub use transport::{Connector, HttpConnector, TransportManager, TransportState};
