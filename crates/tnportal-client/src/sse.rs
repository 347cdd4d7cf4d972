//! Incremental decoder for `text/event-stream` response bodies.
//!
//! Bytes arrive in arbitrary chunks; complete frames come out. Follows the
//! EventSource parsing rules: `\n`, `\r\n` and `\r` all end a line, comment
//! lines start with `:`, multiple `data` lines are joined with `\n`, and a
//! blank line dispatches the frame.

const DEFAULT_EVENT: &str = "message";

/// One dispatched event, data still as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Last chunk ended in `\r`; a leading `\n` in the next chunk belongs to it.
    pending_cr: bool,
    started: bool,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next body chunk and collect every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        let mut bytes = chunk;

        if self.pending_cr {
            self.pending_cr = false;
            if let Some(rest) = bytes.strip_prefix(b"\n") {
                bytes = rest;
            }
        }

        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    self.buf.extend_from_slice(&bytes[start..i]);
                    self.end_line(&mut frames);
                    i += 1;
                    start = i;
                }
                b'\r' => {
                    self.buf.extend_from_slice(&bytes[start..i]);
                    self.end_line(&mut frames);
                    i += 1;
                    if i == bytes.len() {
                        self.pending_cr = true;
                    } else if bytes[i] == b'\n' {
                        i += 1;
                    }
                    start = i;
                }
                _ => i += 1,
            }
        }
        self.buf.extend_from_slice(&bytes[start..]);
        frames
    }

    /// Close the stream. An unterminated trailing frame is discarded.
    pub fn finish(&mut self) {
        if !self.buf.is_empty() || !self.data.is_empty() {
            tracing::debug!(
                pending_lines = self.data.len(),
                "discarding unterminated SSE frame at end of stream"
            );
        }
        self.buf.clear();
        self.reset_frame();
    }

    fn end_line(&mut self, frames: &mut Vec<SseFrame>) {
        let raw = std::mem::take(&mut self.buf);
        let mut line = String::from_utf8_lossy(&raw).into_owned();
        if !self.started {
            self.started = true;
            if let Some(stripped) = line.strip_prefix('\u{feff}') {
                line = stripped.to_string();
            }
        }

        if line.is_empty() {
            if let Some(frame) = self.dispatch() {
                frames.push(frame);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() {
            self.reset_frame();
            return None;
        }
        let event = self
            .event
            .take()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_EVENT.to_string());
        let frame = SseFrame {
            event,
            data: self.data.join("\n"),
            id: self.id.clone(),
        };
        self.reset_frame();
        Some(frame)
    }

    fn reset_frame(&mut self) {
        self.event = None;
        self.data.clear();
    }
}
