//! Smoothing and alarm evaluation over the current buffer snapshot.

use super::alarm::{evaluate, AlarmStatus};
use super::buffer::SampleBuffer;
use super::smoothing::smooth;
use crate::settings::Configuration;

/// Result of one evaluation pass: the smoothed series and its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Smoothed heart rate, one point per buffered sample.
    pub smoothed: Vec<f64>,
    pub status: AlarmStatus,
}

impl Default for Evaluation {
    fn default() -> Self {
        Self {
            smoothed: Vec::new(),
            status: AlarmStatus::NoData,
        }
    }
}

impl Evaluation {
    /// Smooth the buffer's values and classify the latest smoothed point.
    pub fn compute(buffer: &SampleBuffer, config: &Configuration) -> Self {
        let smoothed = smooth(&buffer.values(), config.smoothing_window());
        let status = evaluate(
            smoothed.last().copied(),
            config.enable_alarm,
            config.alarm_high,
            config.alarm_low,
        );
        Self { smoothed, status }
    }

    pub fn latest(&self) -> Option<f64> {
        self.smoothed.last().copied()
    }

    /// Status to show: like `status`, but `Disabled` when alarms are off
    /// and there is data to classify.
    pub fn indicator(&self, alarm_enabled: bool) -> AlarmStatus {
        match self.status {
            AlarmStatus::Normal if !alarm_enabled => AlarmStatus::Disabled,
            status => status,
        }
    }

    /// Latest smoothed value rounded to whole beats per minute.
    pub fn display_value(&self) -> Option<i64> {
        self.latest().map(|v| v.round() as i64)
    }
}
