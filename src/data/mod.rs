//! Sample handling: parsing, buffering, smoothing, alarm evaluation, export.
//!
//! ## Submodules
//!
//! - [`sample`]: [`Sample`] and the payload parser that validates inbound JSON
//! - [`buffer`]: [`SampleBuffer`], the bounded recent-history window
//! - [`smoothing`]: trailing moving average ([`smooth`])
//! - [`alarm`]: threshold classification ([`evaluate`], [`AlarmStatus`])
//! - [`evaluation`]: one smoothing + classification pass over the buffer
//! - [`export`]: CSV serialization of a buffer snapshot
//! - [`duration`]: parsing and formatting of interval strings (e.g. "100ms", "1s")
//!
//! ## Data Flow
//!
//! ```text
//! payload (JSON text)
//!        │
//!        ▼
//! Sample::parse() ──✗──▶ discarded
//!        │
//!        ▼
//! SampleBuffer::append()
//!        │
//!        ▼
//! Evaluation::compute() ──▶ smooth() ──▶ evaluate() ──▶ AlarmStatus
//! ```

pub mod alarm;
pub mod buffer;
pub mod duration;
pub mod evaluation;
pub mod export;
pub mod sample;
pub mod smoothing;

pub use alarm::{evaluate, AlarmStatus};
pub use buffer::{SampleBuffer, BUFFER_CAPACITY};
pub use evaluation::Evaluation;
pub use export::{to_csv, write_csv, ExportError};
pub use sample::{now_millis, PayloadError, Sample};
pub use smoothing::smooth;
