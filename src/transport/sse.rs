//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; the decoder buffers partial lines and
//! yields the data of each complete `message` event. Only the subset of the
//! event-stream format the heart-rate feed needs is interpreted: `data`
//! and `event` fields, comments, and blank-line dispatch. `id` and `retry`
//! are accepted and ignored.

/// Event type delivered when a stream does not name one.
const DEFAULT_EVENT: &str = "message";

#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line.
    pending: Vec<u8>,
    /// Accumulated `data` lines of the current event, each followed by `\n`.
    data: String,
    /// `event` field of the current event, empty for the default type.
    event_type: String,
    /// Whether the leading byte-order mark has been checked for.
    started: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the data of every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        let mut chunk = chunk;

        if !self.started && !chunk.is_empty() {
            self.started = true;
            if let Some(rest) = chunk.strip_prefix("\u{feff}".as_bytes()) {
                chunk = rest;
            }
        }

        for &byte in chunk {
            if byte == b'\n' {
                let mut line = std::mem::take(&mut self.pending);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                let line = String::from_utf8_lossy(&line).into_owned();
                if let Some(data) = self.process_line(&line) {
                    events.push(data);
                }
            } else {
                self.pending.push(byte);
            }
        }

        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event_type = value.to_string(),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        let event_type = std::mem::take(&mut self.event_type);
        let mut data = std::mem::take(&mut self.data);
        if data.is_empty() {
            return None;
        }
        data.pop();

        if event_type.is_empty() || event_type == DEFAULT_EVENT {
            Some(data)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"hr\":72}\n\n");
        assert_eq!(events, vec![r#"{"hr":72}"#.to_string()]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"hr\"").is_empty());
        assert!(decoder.feed(b":81}\r\n").is_empty());
        assert_eq!(decoder.feed(b"\r\n"), vec![r#"{"hr":81}"#.to_string()]);
    }

    #[test]
    fn test_multiline_data_joined_with_newline() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: first\ndata:second\n\n");
        assert_eq!(events, vec!["first\nsecond".to_string()]);
    }

    #[test]
    fn test_comments_and_unknown_fields_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\nid: 7\nretry: 1000\ndata: x\n\n");
        assert_eq!(events, vec!["x".to_string()]);
    }

    #[test]
    fn test_named_events_are_skipped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: ping\ndata: ignored\n\ndata: kept\n\n");
        assert_eq!(events, vec!["kept".to_string()]);
    }

    #[test]
    fn test_explicit_message_type_is_delivered() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: message\ndata: y\n\n");
        assert_eq!(events, vec!["y".to_string()]);
    }

    #[test]
    fn test_blank_lines_without_data_dispatch_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"\n\n\n").is_empty());
    }

    #[test]
    fn test_leading_bom_is_skipped() {
        let mut decoder = SseDecoder::new();
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(b"data: z\n\n");
        assert_eq!(decoder.feed(&bytes), vec!["z".to_string()]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: 1\n\ndata: 2\n\ndata: 3");
        assert_eq!(events, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(decoder.feed(b"\n\n"), vec!["3".to_string()]);
    }
}
