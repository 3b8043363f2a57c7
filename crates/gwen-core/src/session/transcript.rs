//! Chat transcript entries.
//!
//! Every chat request produces one user entry and one assistant entry. The
//! assistant entry is created in `Pending` state and mutated in place as
//! stream frames arrive.

use crate::stream::StreamFrame;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Rendering state of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Request sent, nothing received yet.
    Pending,
    /// At least one progress frame applied.
    Streaming,
    Complete,
    Error,
}

/// A single message in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTranscriptEntry {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    pub render_state: RenderState,
    /// Creation time (RFC 3339).
    pub timestamp: String,
}

impl ChatTranscriptEntry {
    fn new(role: ChatRole, text: String, render_state: RenderState) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text,
            render_state,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Applies one frame to an assistant entry.
    ///
    /// `progress` appends the message and a newline, `complete` appends the
    /// message alone, `error` replaces the accumulated text.
    pub fn apply_frame(&mut self, frame: &StreamFrame) {
        match frame {
            StreamFrame::Progress { message } => {
                self.text.push_str(message);
                self.text.push('\n');
                self.render_state = RenderState::Streaming;
            }
            StreamFrame::Complete { message } => {
                self.text.push_str(message);
                self.render_state = RenderState::Complete;
            }
            StreamFrame::Error { message } => {
                self.text = message.clone();
                self.render_state = RenderState::Error;
            }
        }
    }

    /// Marks the entry as failed with the given message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.text = message.into();
        self.render_state = RenderState::Error;
    }
}

/// Ordered list of transcript entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    entries: Vec<ChatTranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> ChatTranscriptEntry {
        let entry = ChatTranscriptEntry::new(ChatRole::User, text.into(), RenderState::Complete);
        self.entries.push(entry.clone());
        entry
    }

    /// Appends the pending assistant placeholder for a new request.
    pub fn push_assistant_placeholder(&mut self) -> ChatTranscriptEntry {
        let entry =
            ChatTranscriptEntry::new(ChatRole::Assistant, String::new(), RenderState::Pending);
        self.entries.push(entry.clone());
        entry
    }

    pub fn get(&self, id: &str) -> Option<&ChatTranscriptEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChatTranscriptEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[ChatTranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
