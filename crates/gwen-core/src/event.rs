//! Session events published to the presentation layer.
//!
//! Views (file browser, tab strip, terminal, status indicators, model
//! selector, transcript, toasts) subscribe to an [`EventBus`] instead of being
//! called back directly by the components.

use crate::session::{ChatTranscriptEntry, ModelCatalog};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the event channel before slow subscribers start lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Display duration of error toasts.
pub const ERROR_NOTIFICATION_MS: u64 = 5000;

/// Display duration of success toasts.
pub const SUCCESS_NOTIFICATION_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// How long the toast stays visible.
    pub duration_ms: u64,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            duration_ms: ERROR_NOTIFICATION_MS,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            duration_ms: SUCCESS_NOTIFICATION_MS,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// One tab of the tab strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabView {
    pub path: String,
    pub is_active: bool,
    pub is_modified: bool,
}

/// A status light with its tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusIndicator {
    pub healthy: bool,
    pub title: String,
}

impl StatusIndicator {
    pub fn server(healthy: bool) -> Self {
        Self {
            healthy,
            title: if healthy {
                "Server is healthy".to_string()
            } else {
                "Server is not responding".to_string()
            },
        }
    }

    pub fn runtime(healthy: bool) -> Self {
        Self {
            healthy,
            title: if healthy {
                "Ollama is healthy".to_string()
            } else {
                "Ollama is not responding".to_string()
            },
        }
    }
}

/// High-level events published by the session components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The file browser listing was refreshed.
    FileListLoaded { files: Vec<String> },
    /// The tab strip must be re-rendered.
    TabsChanged { tabs: Vec<TabView> },
    /// Terminal content replaced by a run result.
    TerminalReplaced {
        output: Option<String>,
        error: Option<String>,
    },
    /// Status indicators updated after a health probe.
    HealthChanged {
        server: StatusIndicator,
        runtime: StatusIndicator,
    },
    /// The model selector was repopulated.
    ModelsChanged { catalog: ModelCatalog, loaded: bool },
    /// A transcript entry was appended or changed.
    TranscriptUpdated { entry: ChatTranscriptEntry },
    /// The transcript view should scroll to its newest content.
    TranscriptScrolled { entry_id: String },
    /// A toast should be shown.
    Notification(Notification),
}

/// Display durations of toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub error_ms: u64,
    pub success_ms: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            error_ms: ERROR_NOTIFICATION_MS,
            success_ms: SUCCESS_NOTIFICATION_MS,
        }
    }
}

/// Broadcast channel carrying [`SessionEvent`]s.
///
/// Publishing never fails: events emitted while nobody is subscribed are
/// dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
    settings: NotificationSettings,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_settings(NotificationSettings::default())
    }

    pub fn with_settings(settings: NotificationSettings) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender, settings }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        tracing::trace!("[EventBus] emit {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn notify(&self, notification: Notification) {
        self.emit(SessionEvent::Notification(notification));
    }

    /// Shows an error toast for the configured duration.
    pub fn notify_error(&self, message: impl Into<String>) {
        self.notify(Notification::error(message).with_duration_ms(self.settings.error_ms));
    }

    /// Shows a success toast for the configured duration.
    pub fn notify_success(&self, message: impl Into<String>) {
        self.notify(Notification::success(message).with_duration_ms(self.settings.success_ms));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
