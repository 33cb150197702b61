//! Server-Sent Events (SSE) decoding for the backend progress streams.
//!
//! Only `data:` fields matter to the portal. Event names, ids and retry
//! hints are ignored, and comment lines (the backend's keep-alives) are
//! dropped.

use std::collections::VecDeque;

use tdlight_common::{ProgressEvent, Result};
use tracing::{debug, warn};

/// Incremental SSE frame decoder. Feed it transport chunks of any size;
/// it yields the `data` payload of every completed event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(data) = self.process_line(&String::from_utf8_lossy(&line)) {
                out.push(data);
            }
        }
        out
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data_lines.is_empty() {
                return None;
            }
            let data = self.data_lines.join("\n");
            self.data_lines.clear();
            return Some(data);
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
        None
    }
}

/// An open progress stream.
///
/// Dropping the stream drops the underlying response, which closes the
/// connection.
#[derive(Debug)]
pub struct EventStream {
    response: Option<reqwest::Response>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
}

impl EventStream {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self {
            response: Some(response),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        }
    }

    /// Next decoded event. `None` once the server has ended the stream or a
    /// transport error was reported. Payloads that are not valid progress
    /// JSON are skipped.
    pub async fn next_event(&mut self) -> Option<Result<ProgressEvent>> {
        loop {
            while let Some(data) = self.pending.pop_front() {
                match serde_json::from_str::<ProgressEvent>(&data) {
                    Ok(event) => return Some(Ok(event)),
                    Err(e) => warn!(error = %e, payload = %data, "Skipping malformed progress event"),
                }
            }

            let resp = self.response.as_mut()?;
            match resp.chunk().await {
                Ok(Some(bytes)) => {
                    let events = self.decoder.push(&bytes);
                    self.pending.extend(events);
                }
                Ok(None) => {
                    debug!("Progress stream ended by server");
                    self.response = None;
                    return None;
                }
                Err(e) => {
                    self.response = None;
                    return Some(Err(e.into()));
                }
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.response.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_single_event() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b"data: {\"percent\":10}\n\n");
        assert_eq!(out, vec!["{\"percent\":10}".to_string()]);
    }

    #[test]
    fn reassembles_frames_split_across_chunks() {
        let whole = b"data: {\"percent\":42,\"message\":\"half\"}\n\ndata: {\"percent\":43}\n\n";
        let expected = SseDecoder::new().push(whole);

        for split in 1..whole.len() {
            let mut dec = SseDecoder::new();
            let mut got = dec.push(&whole[..split]);
            got.extend(dec.push(&whole[split..]));
            assert_eq!(got, expected, "split at {}", split);
        }
    }

    #[test]
    fn handles_crlf_and_comments() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b": ping\r\n\r\nevent: progress\r\ndata: {\"a\":1}\r\n\r\n");
        assert_eq!(out, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn joins_multiline_data() {
        let mut dec = SseDecoder::new();
        let out = dec.push(b"data: line one\ndata:line two\n\n");
        assert_eq!(out, vec!["line one\nline two".to_string()]);
    }

    #[test]
    fn incomplete_event_is_held_back() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: {\"percent\":5}\n").is_empty());
        assert_eq!(dec.push(b"\n").len(), 1);
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"\n\n: keep-alive\n\n").is_empty());
    }
}
