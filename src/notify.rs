//! Audible alarm notification.

use std::fmt::Debug;
use std::io::{self, Write};

use tracing::debug;

use crate::data::AlarmStatus;

/// Something that can make noise when the alarm fires.
///
/// Called on every evaluation whose status is an alarm, not only on the
/// transition into one. Implementations swallow their own failures.
pub trait Notifier: Send + Debug {
    fn notify(&mut self, status: AlarmStatus);
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn notify(&mut self, status: AlarmStatus) {
        let mut stdout = io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            debug!(status = status.symbol(), "Failed to ring bell: {}", e);
        }
    }
}

/// Makes no noise.
#[derive(Debug, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&mut self, _status: AlarmStatus) {}
}
