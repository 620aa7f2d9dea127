//! Incremental decoding of the backend's `data: <json>\n\n` status stream.

use drhp_logging::{drhp_debug, drhp_warn};
use serde::Deserialize;

use crate::StatusUpdate;

const DATA_PREFIX: &str = "data:";

/// A decoded status record, dispatched by its `status` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Progress(StatusUpdate),
    Completed { markdown: String },
    Failed { message: String },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Progress(_))
    }
}

#[derive(Debug, Deserialize)]
struct StatusRecord {
    #[serde(default, alias = "stage")]
    step: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    markdown: Option<String>,
}

/// Accumulates raw bytes and yields complete records.
///
/// Records are only decoded once their delimiter has arrived, so a multi-byte
/// character split across two chunks is never mangled. The trailing partial
/// record stays buffered for the next `push`.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = find_delimiter(&self.buffer) {
            let record: Vec<u8> = self.buffer.drain(..end + delimiter_len).collect();
            let text = String::from_utf8_lossy(&record[..end]);
            if let Some(event) = parse_record(&text) {
                events.push(event);
            }
        }
        events
    }

    /// Bytes of an incomplete record still waiting for its delimiter.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|at| (at, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|at| (at, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_record(text: &str) -> Option<StreamEvent> {
    let mut data_lines = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    let data = data_lines.join("\n");
    if data.trim().is_empty() {
        drhp_debug!("Skipping stream record without data: {:?}", text);
        return None;
    }

    match serde_json::from_str::<StatusRecord>(&data) {
        Ok(record) => Some(classify(record)),
        Err(err) => {
            drhp_warn!("Skipping malformed stream record ({}): {:?}", err, data);
            None
        }
    }
}

/// Parses one JSON payload (without the `data:` prefix) into a stream event.
pub fn classify_record(json: &str) -> Result<StreamEvent, serde_json::Error> {
    serde_json::from_str::<StatusRecord>(json).map(classify)
}

fn classify(record: StatusRecord) -> StreamEvent {
    let status = record.status.unwrap_or_default();
    if status.eq_ignore_ascii_case("COMPLETED") {
        return StreamEvent::Completed {
            markdown: record.markdown.unwrap_or_default(),
        };
    }
    if status.eq_ignore_ascii_case("FAILED") || status.eq_ignore_ascii_case("ERROR") {
        return StreamEvent::Failed {
            message: record.message.unwrap_or_default(),
        };
    }
    StreamEvent::Progress(StatusUpdate {
        step: record.step,
        message: record.message.unwrap_or_default(),
        status,
        progress: record
            .progress
            .filter(|value| value.is_finite())
            .map(|value| value.clamp(0.0, 100.0).round() as u8),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{classify_record, EventStreamDecoder, StreamEvent};
    use crate::StatusUpdate;

    fn progress(step: &str, message: &str, value: u8) -> StreamEvent {
        StreamEvent::Progress(StatusUpdate {
            step: Some(step.to_string()),
            message: message.to_string(),
            status: "PROCESSING".to_string(),
            progress: Some(value),
        })
    }

    #[test]
    fn record_split_across_chunks_is_dispatched_once() {
        let mut decoder = EventStreamDecoder::new();
        let first = decoder.push(b"data: {\"step\":\"parse\",\"message\":\"Par");
        assert!(first.is_empty());
        assert!(decoder.pending() > 0);

        let second = decoder.push(b"sing\",\"status\":\"PROCESSING\",\"progress\":40}\n\n");
        assert_eq!(second, vec![progress("parse", "Parsing", 40)]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn several_records_in_one_chunk_keep_order_and_tail() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(
            b"data: {\"step\":\"a\",\"message\":\"A\",\"status\":\"PROCESSING\",\"progress\":10}\n\n\
              data: {\"step\":\"b\",\"message\":\"B\",\"status\":\"PROCESSING\",\"progress\":20}\n\n\
              data: {\"status\":\"COMP",
        );
        assert_eq!(
            events,
            vec![progress("a", "A", 10), progress("b", "B", 20)]
        );

        let events = decoder.push(b"LETED\",\"markdown\":\"# Title\"}\n\n");
        assert_eq!(
            events,
            vec![StreamEvent::Completed {
                markdown: "# Title".to_string()
            }]
        );
    }

    #[test]
    fn delimiter_split_across_chunks() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder
            .push(b"data: {\"status\":\"FAILED\",\"message\":\"boom\"}\n")
            .is_empty());
        assert_eq!(
            decoder.push(b"\n"),
            vec![StreamEvent::Failed {
                message: "boom".to_string()
            }]
        );
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let payload = "data: {\"status\":\"COMPLETED\",\"markdown\":\"₹450\"}\n\n".as_bytes();
        let split = payload
            .iter()
            .position(|byte| *byte == 0xE2)
            .expect("rupee sign")
            + 1;
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(&payload[..split]).is_empty());
        assert_eq!(
            decoder.push(&payload[split..]),
            vec![StreamEvent::Completed {
                markdown: "₹450".to_string()
            }]
        );
    }

    #[test]
    fn malformed_record_is_skipped() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(
            b"data: {not json}\n\ndata: {\"step\":\"x\",\"message\":\"X\",\"status\":\"PROCESSING\",\"progress\":5}\n\n",
        );
        assert_eq!(events, vec![progress("x", "X", 5)]);
    }

    #[test]
    fn crlf_delimiters_and_comments_are_handled() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(
            b": keep-alive\r\n\r\ndata:{\"status\":\"completed\",\"markdown\":\"ok\"}\r\n\r\n",
        );
        assert_eq!(
            events,
            vec![StreamEvent::Completed {
                markdown: "ok".to_string()
            }]
        );
    }

    #[test]
    fn legacy_lowercase_statuses_are_classified() {
        assert_eq!(
            classify_record(r#"{"status":"error","message":"Company not found."}"#).unwrap(),
            StreamEvent::Failed {
                message: "Company not found.".to_string()
            }
        );
        assert_eq!(
            classify_record(
                r#"{"status":"processing","stage":"qdrant","progress":50,"message":"Creating vector embeddings..."}"#
            )
            .unwrap(),
            StreamEvent::Progress(StatusUpdate {
                step: Some("qdrant".to_string()),
                message: "Creating vector embeddings...".to_string(),
                status: "processing".to_string(),
                progress: Some(50),
            })
        );
    }

    #[test]
    fn progress_is_clamped() {
        let event = classify_record(r#"{"status":"PROCESSING","progress":140.2}"#).unwrap();
        let StreamEvent::Progress(update) = event else {
            panic!("expected progress");
        };
        assert_eq!(update.progress, Some(100));
        assert!(!StreamEvent::Progress(update).is_terminal());
    }
}
