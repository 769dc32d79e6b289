//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; lines (and UTF-8 sequences) may be split
//! across them. The decoder buffers the partial line and emits an event each
//! time a blank line terminates one. Lines end at CRLF, LF, or a lone CR.
//! Comments and the `id`/`retry` fields are consumed and ignored.
//!
//! A line longer than the limit is discarded up to its terminator along with
//! the event it belongs to, so a misbehaving server cannot grow the buffers
//! without bound.

#[cfg(test)]
#[path = "sse_test.rs"]
mod sse_test;

use tracing::warn;

/// Longest line, and longest joined `data` of one event, the decoder buffers.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One dispatched server-sent event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if the server set one.
    pub event: Option<String>,
    /// Joined `data:` lines without the trailing newline.
    pub data: String,
}

impl SseEvent {
    /// True for default (`message`) events, the only kind a room feed uses.
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.event.as_deref().is_none_or(|name| name == "message")
    }
}

#[derive(Debug)]
pub struct SseDecoder {
    line: Vec<u8>,
    event: Option<String>,
    data: String,
    has_data: bool,
    max_line: usize,
    /// Dropping bytes until the current line ends.
    discarding: bool,
    /// The previous byte was a CR, so an immediate LF belongs to it.
    after_cr: bool,
    /// The current event overflowed; ignore it until the blank line.
    skip_event: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            line: Vec::new(),
            event: None,
            data: String::new(),
            has_data: false,
            max_line,
            discarding: false,
            after_cr: false,
            skip_event: false,
        }
    }

    /// Feed a chunk of the body; returns every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\r' | b'\n' => {
                    self.after_cr = byte == b'\r';
                    if let Some(event) = self.end_line() {
                        events.push(event);
                    }
                }
                _ if self.discarding => {}
                _ if self.line.len() >= self.max_line => {
                    warn!(limit = self.max_line, "event-stream line too long; dropping event");
                    self.line.clear();
                    self.drop_event();
                    self.discarding = true;
                }
                _ => self.line.push(byte),
            }
        }
        events
    }

    fn end_line(&mut self) -> Option<SseEvent> {
        let line = std::mem::take(&mut self.line);
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        let text = String::from_utf8_lossy(&line);
        self.process_line(&text)
    }

    fn drop_event(&mut self) {
        self.event = None;
        self.data.clear();
        self.has_data = false;
        self.skip_event = true;
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') || self.skip_event {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                if self.data.len() + usize::from(self.has_data) + value.len() > self.max_line {
                    warn!(limit = self.max_line, "event-stream event too large; dropping it");
                    self.drop_event();
                    return None;
                }
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_owned()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        self.skip_event = false;
        let event = self.event.take();
        if !std::mem::take(&mut self.has_data) {
            return None;
        }
        Some(SseEvent { event, data: std::mem::take(&mut self.data) })
    }
}
