//! Chat stream framing.
//!
//! The chat endpoint answers with newline-delimited JSON frames. Network
//! chunks do not respect frame boundaries, so [`FrameDecoder`] keeps the
//! trailing partial line between chunks and only decodes complete lines.

use crate::error::GwenError;
use serde::{Deserialize, Serialize};

/// One decoded unit of the chat response stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    /// Intermediate output; the turn continues.
    Progress { message: String },
    /// Final output; the turn ends successfully.
    Complete { message: String },
    /// Backend-side failure; the turn ends with an error.
    Error { message: String },
}

impl StreamFrame {
    /// Parses a single line. Unknown `type` tags are rejected.
    pub fn parse_line(line: &str) -> Result<Self, GwenError> {
        serde_json::from_str(line)
            .map_err(|e| GwenError::protocol(format!("invalid frame {line:?}: {e}")))
    }
}

/// Longest line the decoder buffers before giving up on it.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental newline-delimited frame decoder.
///
/// Bytes are buffered rather than text so that a multi-byte character split
/// across two chunks is reassembled before decoding. A line longer than the
/// limit is reported once as a protocol error and skipped up to its newline.
#[derive(Debug)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
    max_line: usize,
    /// Set while the rest of an oversized line is being dropped.
    discarding: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            max_line: max_line.max(1),
            discarding: false,
        }
    }

    /// Feeds one chunk and returns every complete line decoded so far.
    ///
    /// Blank lines are dropped. Lines that fail to decode are returned as
    /// `Err(GwenError::Protocol)` so the caller can log and skip them.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<StreamFrame, GwenError>> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(offset) = self.pending[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            let newline_index = self.scanned + offset;
            let line: Vec<u8> = self.pending.drain(..=newline_index).collect();
            self.scanned = 0;
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if line.len() > self.max_line {
                frames.push(Err(oversized(line.len())));
                continue;
            }
            if let Some(decoded) = decode_line(&line) {
                frames.push(decoded);
            }
        }

        if self.pending.len() > self.max_line {
            if !self.discarding {
                frames.push(Err(oversized(self.pending.len())));
                self.discarding = true;
            }
            self.pending.clear();
        }
        self.scanned = self.pending.len();
        frames
    }

    /// Decodes whatever remains once the stream has ended.
    pub fn finish(&mut self) -> Option<Result<StreamFrame, GwenError>> {
        let rest = std::mem::take(&mut self.pending);
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        decode_line(&rest)
    }

    /// Number of buffered bytes not yet terminated by a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn oversized(len: usize) -> GwenError {
    GwenError::protocol(format!("line exceeds limit ({len} bytes buffered)"))
}

fn decode_line(raw: &[u8]) -> Option<Result<StreamFrame, GwenError>> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => return Some(Err(GwenError::protocol(format!("non UTF-8 line: {e}")))),
    };
    let line = text.trim();
    if line.is_empty() {
        return None;
    }
    Some(StreamFrame::parse_line(line))
}
