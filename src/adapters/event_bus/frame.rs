//! Line framing and frame decoding for the bus event stream.
//!
//! The stream body is text in a server-sent-events style:
//!
//! ```text
//! retry: 400
//!
//! tag: salt/event/new
//! data: {"tag": "salt/event/new", "data": {"room": "ITB-1101", ...}}
//!
//! ```
//!
//! A frame is a `tag:` line followed by a `data:` line. `retry:` lines are
//! heartbeats; blank lines and other fields are ignored.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::bus::RawEvent;

/// A frame whose payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed event JSON: {0}")]
    Json(String),

    #[error("Event data is not a JSON object")]
    NotAnObject,

    #[error("Line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

/// Longest line the stream may send. Event payloads are a few KiB.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits a byte stream into lines, carrying partial lines across chunks.
///
/// A line longer than the limit is reported once as
/// [`DecodeError::LineTooLong`]; its bytes are dropped up to the next
/// newline.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    scanned: usize,
    discarding: bool,
    max_line: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            discarding: false,
            max_line,
        }
    }

    /// Appends a chunk and returns every line it completed, without the
    /// trailing `\n` or `\r\n`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<String, DecodeError>> {
        let mut lines = Vec::new();

        let mut chunk = chunk;
        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.discarding = false;
                    chunk = &chunk[end + 1..];
                }
                None => return lines,
            }
        }
        self.pending.extend_from_slice(chunk);

        // Bytes before `scanned` were searched by an earlier push.
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.pending[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            let raw = &self.pending[start..end];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            if raw.len() > self.max_line {
                lines.push(Err(self.too_long()));
            } else {
                lines.push(Ok(String::from_utf8_lossy(raw).into_owned()));
            }
            start = end + 1;
            from = start;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_line {
            self.pending.clear();
            self.scanned = 0;
            self.discarding = true;
            lines.push(Err(self.too_long()));
        }

        lines
    }

    /// True when bytes of an unterminated line are buffered.
    pub fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }

    fn too_long(&self) -> DecodeError {
        DecodeError::LineTooLong {
            limit: self.max_line,
        }
    }
}

/// Result of feeding one line to the [`FrameDecoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A complete frame decoded into an event.
    Event(RawEvent),
    /// A complete frame whose payload was malformed.
    Malformed { tag: String, error: DecodeError },
    /// A frame was abandoned: a tag line not followed by data, or a data
    /// line without a tag.
    Skipped,
}

/// Pairs `tag:` and `data:` lines into events.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending_tag: Option<String>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line; returns `Some` when the line completes or abandons a
    /// frame.
    pub fn push_line(&mut self, line: &str) -> Option<Decoded> {
        let (field, value) = split_field(line)?;

        match field {
            "tag" => {
                let abandoned = self.pending_tag.replace(value.to_string());
                abandoned.map(|_| Decoded::Skipped)
            }
            "data" => match self.pending_tag.take() {
                Some(tag) => Some(match decode_payload(&tag, value) {
                    Ok(event) => Decoded::Event(event),
                    Err(error) => Decoded::Malformed { tag, error },
                }),
                None => Some(Decoded::Skipped),
            },
            // "retry" heartbeats, "id", "event" and anything else carry no event.
            _ => None,
        }
    }

    /// Forgets a tag waiting for its data line; returns whether one was
    /// pending.
    pub fn reset(&mut self) -> bool {
        self.pending_tag.take().is_some()
    }

    /// True while a tag line is waiting for its data line.
    pub fn has_pending_frame(&self) -> bool {
        self.pending_tag.is_some()
    }
}

/// Splits `name: value` lines. Blank lines, comments and lines without a
/// colon yield `None`.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() || line.starts_with(':') {
        return None;
    }
    let (name, value) = line.split_once(':')?;
    let value = value.strip_prefix(' ').unwrap_or(value);
    Some((name.trim(), value))
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(default)]
    tag: Option<String>,

    #[serde(default)]
    data: Value,
}

/// Decodes a data payload; `frame_tag` fills in a missing or empty tag.
pub fn decode_payload(frame_tag: &str, payload: &str) -> Result<RawEvent, DecodeError> {
    let wire: WireEvent =
        serde_json::from_str(payload.trim()).map_err(|e| DecodeError::Json(e.to_string()))?;

    let data = match wire.data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => return Err(DecodeError::NotAnObject),
    };

    let tag = wire
        .tag
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| frame_tag.trim().to_string());

    Ok(RawEvent::new(tag, data))
}
