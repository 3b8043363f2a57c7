//! Subcommand implementations.

pub mod chat;
pub mod runtime;
pub mod workspace;

use crate::console::ConsoleEditor;
use anyhow::Result;
use gwen_application::{FileTabManager, ResilientBootstrapper, StreamingChatClient};
use gwen_core::backend::WorkspaceBackend;
use gwen_core::{ClientConfig, EventBus, SessionState};
use gwen_interaction::HttpWorkspaceBackend;
use std::sync::Arc;

/// One session wired against the HTTP backend and the console editor.
pub struct App {
    pub state: Arc<SessionState>,
    pub editor: Arc<ConsoleEditor>,
    pub events: EventBus,
    pub tabs: FileTabManager,
    pub bootstrapper: Arc<ResilientBootstrapper>,
    pub chat: StreamingChatClient,
}

impl App {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let backend: Arc<dyn WorkspaceBackend> = Arc::new(HttpWorkspaceBackend::from_config(config)?);
        let state = Arc::new(SessionState::new());
        let editor = Arc::new(ConsoleEditor::default());
        let events = EventBus::with_settings(config.notifications);

        Ok(Self {
            tabs: FileTabManager::new(
                state.clone(),
                backend.clone(),
                editor.clone(),
                events.clone(),
            ),
            bootstrapper: Arc::new(
                ResilientBootstrapper::new(state.clone(), backend.clone(), events.clone())
                    .with_config(config),
            ),
            chat: StreamingChatClient::new(state.clone(), backend, events.clone())
                .with_config(config),
            state,
            editor,
            events,
        })
    }
}
