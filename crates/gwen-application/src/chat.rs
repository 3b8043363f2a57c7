//! StreamingChatClient - one chat turn at a time, rendered as it streams.
//!
//! A turn moves `Idle -> Sending -> Streaming -> Complete | Errored -> Idle`.
//! The session's processing flag is claimed before the first suspension point
//! and released by a guard, so every exit path (terminal frame, transport
//! failure, early end of body, stall, or the future being dropped) leaves the
//! session ready for the next request.

use futures::StreamExt;
use gwen_core::backend::{ChatRequest, ChunkStream, WorkspaceBackend};
use gwen_core::config::ClientConfig;
use gwen_core::error::{GwenError, Result};
use gwen_core::event::{EventBus, SessionEvent};
use gwen_core::session::{ChatTranscriptEntry, PREFERRED_MODEL, SessionState, Transcript};
use gwen_core::stream::{FrameDecoder, StreamFrame};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Fallback text for turns that fail without a server-provided message.
pub const SEND_FAILED: &str = "Failed to send message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    Idle,
    Sending,
    Streaming,
    Complete,
    Errored,
}

/// What a call to [`StreamingChatClient::send`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    /// Whitespace-only prompt; nothing happened.
    Ignored,
    /// A turn was already in flight; nothing happened.
    Skipped,
    /// The turn ended with a `complete` frame.
    Completed { entry_id: String },
    /// The turn ended with an `error` frame or a failure.
    Errored { entry_id: String, message: String },
}

/// Releases the session's processing flag on drop.
struct ProcessingGuard<'a>(&'a SessionState);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.set_processing(false);
    }
}

pub struct StreamingChatClient {
    state: Arc<SessionState>,
    backend: Arc<dyn WorkspaceBackend>,
    events: EventBus,
    transcript: Mutex<Transcript>,
    phase: Mutex<ChatPhase>,
    preferred_model: String,
    stall_timeout: Option<Duration>,
}

impl StreamingChatClient {
    pub fn new(
        state: Arc<SessionState>,
        backend: Arc<dyn WorkspaceBackend>,
        events: EventBus,
    ) -> Self {
        Self {
            state,
            backend,
            events,
            transcript: Mutex::new(Transcript::new()),
            phase: Mutex::new(ChatPhase::Idle),
            preferred_model: PREFERRED_MODEL.to_string(),
            stall_timeout: None,
        }
    }

    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.preferred_model = config.preferred_model.clone();
        self.stall_timeout = config.chat_stall_timeout();
        self
    }

    /// Abandons a turn when no chunk arrives within `timeout`.
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = Some(timeout);
        self
    }

    pub fn phase(&self) -> ChatPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: ChatPhase) {
        let mut current = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::trace!("[ChatClient] {:?} -> {:?}", *current, phase);
        *current = phase;
    }

    fn transcript_guard(&self) -> MutexGuard<'_, Transcript> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of every transcript entry, oldest first.
    pub fn transcript(&self) -> Vec<ChatTranscriptEntry> {
        self.transcript_guard().entries().to_vec()
    }

    pub fn entry(&self, id: &str) -> Option<ChatTranscriptEntry> {
        self.transcript_guard().get(id).cloned()
    }

    /// Sends `prompt` with the selected model and streams the answer into
    /// the transcript.
    pub async fn send(&self, prompt: &str) -> SendOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return SendOutcome::Ignored;
        }
        if self.state.set_processing(true) {
            tracing::info!("[ChatClient] Already processing a request");
            return SendOutcome::Skipped;
        }
        let _processing = ProcessingGuard(&self.state);
        self.set_phase(ChatPhase::Sending);

        let (user, placeholder) = {
            let mut transcript = self.transcript_guard();
            (
                transcript.push_user(prompt),
                transcript.push_assistant_placeholder(),
            )
        };
        let entry_id = placeholder.id.clone();
        self.events
            .emit(SessionEvent::TranscriptUpdated { entry: user });
        self.events
            .emit(SessionEvent::TranscriptUpdated { entry: placeholder });
        self.scroll_to(&entry_id);

        let request = ChatRequest {
            prompt: prompt.to_string(),
            model: self
                .state
                .selected_model()
                .unwrap_or_else(|| self.preferred_model.clone()),
        };
        tracing::info!("[ChatClient] Sending prompt (model: {})", request.model);

        let outcome = match self.backend.chat(&request).await {
            Ok(stream) => {
                self.set_phase(ChatPhase::Streaming);
                self.read_stream(stream, &entry_id).await
            }
            Err(e) => Err(e),
        };

        let outcome = outcome.unwrap_or_else(|e| self.fail(&entry_id, e));
        self.set_phase(ChatPhase::Idle);
        outcome
    }

    /// Applies frames in arrival order until a terminal frame. Undecodable
    /// lines are logged and skipped.
    async fn read_stream(&self, mut stream: ChunkStream, entry_id: &str) -> Result<SendOutcome> {
        let mut decoder = FrameDecoder::new();

        loop {
            let next = match self.stall_timeout {
                Some(limit) => tokio::time::timeout(limit, stream.next())
                    .await
                    .map_err(|_| {
                        GwenError::transport(format!(
                            "no data from chat stream for {}s",
                            limit.as_secs()
                        ))
                    })?,
                None => stream.next().await,
            };

            let ended = next.is_none();
            let decoded = match next {
                Some(chunk) => decoder.feed(&chunk?),
                None => decoder.finish().into_iter().collect(),
            };
            for frame in decoded {
                match frame {
                    Ok(frame) => {
                        if let Some(outcome) = self.apply_frame(entry_id, &frame) {
                            return Ok(outcome);
                        }
                    }
                    Err(e) => tracing::warn!("[ChatClient] Skipping line: {}", e),
                }
            }

            if ended {
                return Err(GwenError::protocol(
                    "chat stream ended without a complete or error frame",
                ));
            }
        }
    }

    /// Applies one frame to the assistant entry. Returns the turn's outcome
    /// when the frame is terminal.
    fn apply_frame(&self, entry_id: &str, frame: &StreamFrame) -> Option<SendOutcome> {
        let entry = {
            let mut transcript = self.transcript_guard();
            let entry = transcript.get_mut(entry_id)?;
            entry.apply_frame(frame);
            entry.clone()
        };
        self.events
            .emit(SessionEvent::TranscriptUpdated { entry: entry.clone() });
        self.scroll_to(entry_id);

        match frame {
            StreamFrame::Progress { .. } => None,
            StreamFrame::Complete { .. } => {
                self.set_phase(ChatPhase::Complete);
                tracing::info!("[ChatClient] Turn complete");
                Some(SendOutcome::Completed {
                    entry_id: entry.id,
                })
            }
            StreamFrame::Error { message } => {
                self.set_phase(ChatPhase::Errored);
                tracing::warn!("[ChatClient] Backend reported error: {}", message);
                Some(SendOutcome::Errored {
                    entry_id: entry.id,
                    message: message.clone(),
                })
            }
        }
    }

    /// Ends the turn on a failure that produced no error frame.
    fn fail(&self, entry_id: &str, error: GwenError) -> SendOutcome {
        tracing::error!("[ChatClient] Chat error: {}", error);
        let message = error.user_message_or(SEND_FAILED);

        let entry = {
            let mut transcript = self.transcript_guard();
            transcript.get_mut(entry_id).map(|entry| {
                entry.fail(message.clone());
                entry.clone()
            })
        };
        if let Some(entry) = entry {
            self.events.emit(SessionEvent::TranscriptUpdated { entry });
            self.scroll_to(entry_id);
        }
        self.events.notify_error(message.clone());
        self.set_phase(ChatPhase::Errored);

        SendOutcome::Errored {
            entry_id: entry_id.to_string(),
            message,
        }
    }

    fn scroll_to(&self, entry_id: &str) {
        self.events.emit(SessionEvent::TranscriptScrolled {
            entry_id: entry_id.to_string(),
        });
    }
}
