//! CSV export of the buffer snapshot.
//!
//! The format is fixed: a `time,hr` header, one row per sample with an
//! ISO-8601 UTC timestamp at millisecond precision, rows separated by `\n`
//! and no trailing newline.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, SecondsFormat};
use thiserror::Error;

use super::sample::Sample;

/// Errors from exporting samples.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("timestamp {0} is outside the representable date range")]
    Timestamp(i64),

    #[error("export I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Format epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn iso_timestamp(millis: i64) -> Result<String, ExportError> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or(ExportError::Timestamp(millis))
}

/// Serialize samples as CSV text.
pub fn to_csv<'a, I>(samples: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(["time", "hr"])?;

    let mut rows = 0usize;
    for sample in samples {
        let time = iso_timestamp(sample.timestamp)?;
        writer.write_record([time, sample.value.to_string()])?;
        rows += 1;
    }

    let bytes = writer.into_inner().map_err(|e| io::Error::other(e.to_string()))?;
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if rows > 0 {
        // Rows are newline-separated, not newline-terminated.
        text.pop();
    }
    Ok(text)
}

/// Write samples as CSV to `path`.
pub fn write_csv<'a, I>(path: &Path, samples: I) -> Result<(), ExportError>
where
    I: IntoIterator<Item = &'a Sample>,
{
    let text = to_csv(samples)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SampleBuffer;
    use tempfile::TempDir;

    #[test]
    fn test_single_sample_format() {
        let samples = [Sample::new(1000, 72.0)];
        assert_eq!(to_csv(&samples).unwrap(), "time,hr\n1970-01-01T00:00:01.000Z,72");
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let samples: [Sample; 0] = [];
        assert_eq!(to_csv(&samples).unwrap(), "time,hr\n");
    }

    #[test]
    fn test_fractional_values_and_order() {
        let mut buffer = SampleBuffer::new();
        buffer.append(Sample::new(1_700_000_000_123, 71.5));
        buffer.append(Sample::new(1_700_000_001_000, 80.0));

        let csv = to_csv(buffer.snapshot()).unwrap();
        assert_eq!(
            csv,
            "time,hr\n2023-11-14T22:13:20.123Z,71.5\n2023-11-14T22:13:21.000Z,80"
        );
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let samples = [Sample::new(i64::MAX, 72.0)];
        assert!(matches!(to_csv(&samples), Err(ExportError::Timestamp(_))));
    }

    #[test]
    fn test_write_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hr.csv");
        write_csv(&path, &[Sample::new(0, 60.0)]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "time,hr\n1970-01-01T00:00:00.000Z,60"
        );
    }
}
