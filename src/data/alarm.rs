//! Threshold-based alarm classification.

/// Classification of the latest smoothed heart rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmStatus {
    /// No smoothed value exists yet.
    NoData,
    /// At or above the high threshold.
    High,
    /// At or below the low threshold.
    Low,
    /// Within range, or alarms are switched off.
    Normal,
    /// Alarm indicator muted. Not produced by [`evaluate`], which reports
    /// `Normal` while alarms are disabled; see [`Evaluation::indicator`].
    ///
    /// [`Evaluation::indicator`]: super::Evaluation::indicator
    Disabled,
}

impl AlarmStatus {
    /// Whether this status asks for an audible notification.
    pub fn is_alarm(&self) -> bool {
        matches!(self, AlarmStatus::High | AlarmStatus::Low)
    }

    /// Human-readable status line.
    pub fn label(&self) -> &'static str {
        match self {
            AlarmStatus::NoData => "waiting for data…",
            AlarmStatus::High => "heart rate too high",
            AlarmStatus::Low => "heart rate too low",
            AlarmStatus::Normal => "normal",
            AlarmStatus::Disabled => "alarm off",
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            AlarmStatus::NoData => "--",
            AlarmStatus::High => "HIGH",
            AlarmStatus::Low => "LOW",
            AlarmStatus::Normal => "OK",
            AlarmStatus::Disabled => "OFF",
        }
    }
}

/// Classify the latest smoothed value against the alarm thresholds.
///
/// `enabled` is checked before either threshold, so a disabled alarm never
/// reports a breach. The high threshold wins when both would match.
pub fn evaluate(latest: Option<f64>, enabled: bool, high: f64, low: f64) -> AlarmStatus {
    let Some(value) = latest else {
        return AlarmStatus::NoData;
    };

    if !enabled {
        AlarmStatus::Normal
    } else if value >= high {
        AlarmStatus::High
    } else if value <= low {
        AlarmStatus::Low
    } else {
        AlarmStatus::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        assert_eq!(evaluate(Some(180.0), true, 180.0, 40.0), AlarmStatus::High);
        assert_eq!(evaluate(Some(40.0), true, 180.0, 40.0), AlarmStatus::Low);
        assert_eq!(evaluate(Some(100.0), true, 180.0, 40.0), AlarmStatus::Normal);
    }

    #[test]
    fn test_disabled_overrides_breach() {
        assert_eq!(evaluate(Some(200.0), false, 180.0, 40.0), AlarmStatus::Normal);
        assert_eq!(evaluate(Some(10.0), false, 180.0, 40.0), AlarmStatus::Normal);
    }

    #[test]
    fn test_no_data() {
        assert_eq!(evaluate(None, true, 180.0, 40.0), AlarmStatus::NoData);
        assert_eq!(evaluate(None, false, 180.0, 40.0), AlarmStatus::NoData);
    }

    #[test]
    fn test_inverted_thresholds_prefer_high() {
        // high <= low is not rejected; the high check simply runs first.
        assert_eq!(evaluate(Some(50.0), true, 40.0, 60.0), AlarmStatus::High);
    }

    #[test]
    fn test_is_alarm() {
        assert!(AlarmStatus::High.is_alarm());
        assert!(AlarmStatus::Low.is_alarm());
        assert!(!AlarmStatus::Normal.is_alarm());
        assert!(!AlarmStatus::NoData.is_alarm());
        assert!(!AlarmStatus::Disabled.is_alarm());
    }
}
