//! Incremental decoding of the `/ask` response body.
//!
//! Bytes arrive in arbitrary chunks. They are decoded to text with a stateful
//! UTF-8 decoder, split into lines, and each complete line is classified as a
//! protocol event. Only lines starting with `data: ` carry events.

use serde::Deserialize;

const DATA_PREFIX: &str = "data: ";

/// Stateful UTF-8 decoder. A multi-byte sequence split across two reads is
/// held back until the rest of it arrives.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk. Invalid sequences become U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // Already validated up to `valid_up_to`
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the input
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }
}

/// Accumulates decoded text and hands back complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every line completed by it, without the `\n`.
    /// The trailing fragment stays buffered.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let remainder = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, remainder);

        complete[..complete.len() - 1]
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    /// The unterminated fragment left when the stream ended.
    pub fn into_remainder(self) -> String {
        self.buffer
    }
}

/// Payload of a `data: ` line.
#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    chunk: Option<String>,
    #[serde(default)]
    done: bool,
}

/// What a single line of the response body means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Not a protocol line.
    Ignored,
    /// A `data: ` line whose payload is not a valid event.
    Malformed(String),
    /// A piece of answer text.
    Chunk(String),
    /// The end-of-answer marker. The stream itself still ends on close.
    Done,
    /// A valid event with nothing to render.
    Empty,
}

pub fn parse_line(line: &str) -> LineEvent {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return LineEvent::Ignored;
    };

    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(StreamEvent { chunk: Some(chunk), .. }) if !chunk.is_empty() => LineEvent::Chunk(chunk),
        Ok(StreamEvent { done: true, .. }) => LineEvent::Done,
        Ok(_) => LineEvent::Empty,
        Err(err) => LineEvent::Malformed(err.to_string()),
    }
}
