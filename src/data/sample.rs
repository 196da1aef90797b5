//! Heart-rate samples and the payload parser that produces them.
//!
//! Both transports deliver the same JSON shape, `{"hr": <number>, "ts": <epoch ms>?}`.
//! Parsing is an explicit validation step: a payload either becomes a
//! well-typed [`Sample`] or is rejected with a [`PayloadError`] that the caller
//! is free to drop.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single timestamped heart-rate reading.
///
/// Samples are immutable once they reach the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Epoch milliseconds, either supplied by the source or the time of receipt.
    pub timestamp: i64,
    /// Beats per minute.
    pub value: f64,
}

/// Reasons an inbound payload is not turned into a sample.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload text is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    NotJson(String),

    /// The payload is JSON but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// The object has no numeric `hr` field.
    #[error("payload has no numeric `hr` field")]
    MissingValue,
}

impl Sample {
    /// Create a sample from its parts.
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Parse a raw text payload (one push event or one poll response body).
    ///
    /// `received_at` is used when the payload carries no usable `ts`.
    pub fn parse(raw: &str, received_at: i64) -> Result<Self, PayloadError> {
        let payload: Value =
            serde_json::from_str(raw).map_err(|e| PayloadError::NotJson(e.to_string()))?;
        Self::from_value(&payload, received_at)
    }

    /// Validate an already-decoded payload.
    ///
    /// A `ts` of zero, or one that is not an integer, counts as absent.
    pub fn from_value(payload: &Value, received_at: i64) -> Result<Self, PayloadError> {
        let fields = payload.as_object().ok_or(PayloadError::NotAnObject)?;

        let value = fields
            .get("hr")
            .and_then(Value::as_f64)
            .ok_or(PayloadError::MissingValue)?;

        let timestamp = fields
            .get("ts")
            .and_then(Value::as_i64)
            .filter(|ts| *ts != 0)
            .unwrap_or(received_at);

        Ok(Self { timestamp, value })
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_with_timestamp() {
        let sample = Sample::parse(r#"{"hr": 72, "ts": 1000}"#, 5).unwrap();
        assert_eq!(sample, Sample::new(1000, 72.0));
    }

    #[test]
    fn test_parse_defaults_timestamp_to_receipt() {
        let sample = Sample::parse(r#"{"hr": 88.5}"#, 42).unwrap();
        assert_eq!(sample.timestamp, 42);
        assert_eq!(sample.value, 88.5);
    }

    #[test]
    fn test_zero_timestamp_counts_as_absent() {
        let sample = Sample::from_value(&json!({"hr": 60, "ts": 0}), 7).unwrap();
        assert_eq!(sample.timestamp, 7);
    }

    #[test]
    fn test_non_integer_timestamp_counts_as_absent() {
        let sample = Sample::from_value(&json!({"hr": 60, "ts": "yesterday"}), 9).unwrap();
        assert_eq!(sample.timestamp, 9);
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = Sample::parse("not json", 0).unwrap_err();
        assert!(matches!(err, PayloadError::NotJson(_)));
    }

    #[test]
    fn test_rejects_non_object() {
        assert_eq!(Sample::parse("[1,2,3]", 0), Err(PayloadError::NotAnObject));
        assert_eq!(Sample::parse("null", 0), Err(PayloadError::NotAnObject));
    }

    #[test]
    fn test_rejects_missing_or_non_numeric_hr() {
        assert_eq!(Sample::parse(r#"{"ts": 5}"#, 0), Err(PayloadError::MissingValue));
        assert_eq!(Sample::parse(r#"{"hr": "72"}"#, 0), Err(PayloadError::MissingValue));
        assert_eq!(Sample::parse(r#"{"hr": null}"#, 0), Err(PayloadError::MissingValue));
    }
}
