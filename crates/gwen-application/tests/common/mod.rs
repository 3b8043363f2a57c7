//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use gwen_application::{FileTabManager, ResilientBootstrapper, StreamingChatClient};
use gwen_core::backend::{
    ChatRequest, ChunkStream, FileEntry, FileOperationStatus, HealthReport, RunResult,
    SaveReceipt, WorkspaceBackend,
};
use gwen_core::editor::{EditorInstance, EditorWidget};
use gwen_core::error::{GwenError, Result};
use gwen_core::event::{EventBus, Notification, SessionEvent};
use gwen_core::session::SessionState;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};

pub fn healthy() -> HealthReport {
    HealthReport {
        status: "ok".to_string(),
        ollama: "ok".to_string(),
        workspace: Some(true),
        generated_code: Some(true),
    }
}

pub fn report(status: &str, ollama: &str) -> HealthReport {
    HealthReport {
        status: status.to_string(),
        ollama: ollama.to_string(),
        workspace: None,
        generated_code: None,
    }
}

// ============================================================================
// Backend
// ============================================================================

/// How the mock answers one chat request.
pub enum ChatScript {
    /// Yields the chunks, then closes the body.
    Chunks(Vec<Vec<u8>>),
    /// Yields the chunks, then never produces anything again.
    Stall(Vec<Vec<u8>>),
    /// Chunks are pushed by the test through the paired sender.
    Channel(mpsc::UnboundedReceiver<Result<Vec<u8>>>),
    /// The request itself fails.
    Fail(GwenError),
}

impl ChatScript {
    pub fn lines(lines: &[&str]) -> Self {
        Self::Chunks(lines.iter().map(|l| format!("{l}\n").into_bytes()).collect())
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub files: Mutex<HashMap<String, String>>,
    pub list_error: Mutex<Option<GwenError>>,
    pub read_errors: Mutex<HashMap<String, GwenError>>,
    pub save_error: Mutex<Option<GwenError>>,
    pub run_result: Mutex<RunResult>,
    pub health_script: Mutex<VecDeque<Result<HealthReport>>>,
    pub models_script: Mutex<VecDeque<Result<Vec<String>>>>,
    pub chat_script: Mutex<VecDeque<ChatScript>>,

    pub reads: Mutex<Vec<String>>,
    pub saves: Mutex<Vec<(String, String)>>,
    pub runs: Mutex<Vec<String>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub health_calls: AtomicUsize,
    pub model_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn push_health(&self, result: Result<HealthReport>) {
        self.health_script.lock().unwrap().push_back(result);
    }

    pub fn push_models(&self, result: Result<Vec<String>>) {
        self.models_script.lock().unwrap().push_back(result);
    }

    pub fn push_chat(&self, script: ChatScript) {
        self.chat_script.lock().unwrap().push_back(script);
    }

    pub fn read_count(&self, path: &str) -> usize {
        self.reads.lock().unwrap().iter().filter(|p| *p == path).count()
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkspaceBackend for MockBackend {
    async fn list_files(&self) -> Result<Vec<FileEntry>> {
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        Ok(paths
            .into_iter()
            .map(|path| FileEntry {
                path,
                full_path: None,
                name: None,
            })
            .collect())
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        self.reads.lock().unwrap().push(path.to_string());
        if let Some(err) = self.read_errors.lock().unwrap().get(path) {
            return Err(err.clone());
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| GwenError::backend(404, Some("File not found".to_string())))
    }

    async fn save_file(&self, path: &str, content: &str) -> Result<SaveReceipt> {
        if let Some(err) = self.save_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.saves
            .lock()
            .unwrap()
            .push((path.to_string(), content.to_string()));
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(SaveReceipt {
            status: Some("success".to_string()),
            path: Some(path.to_string()),
            ..SaveReceipt::default()
        })
    }

    async fn run_file(&self, path: &str) -> Result<RunResult> {
        self.runs.lock().unwrap().push(path.to_string());
        Ok(self.run_result.lock().unwrap().clone())
    }

    async fn health(&self) -> Result<HealthReport> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.health_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(healthy()))
    }

    async fn models(&self) -> Result<Vec<String>> {
        self.model_calls.fetch_add(1, Ordering::SeqCst);
        self.models_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(vec![
                    "llama3:8b".to_string(),
                    "qwen2.5-coder:32b".to_string(),
                ])
            })
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChunkStream> {
        self.chat_requests.lock().unwrap().push(request.clone());
        let script = self
            .chat_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ChatScript::Chunks(Vec::new()));
        match script {
            ChatScript::Chunks(chunks) => Ok(futures::stream::iter(chunks.into_iter().map(Ok)).boxed()),
            ChatScript::Stall(chunks) => Ok(futures::stream::iter(chunks.into_iter().map(Ok))
                .chain(futures::stream::pending())
                .boxed()),
            ChatScript::Channel(rx) => Ok(futures::stream::unfold(rx, |mut rx| async move {
                let chunk = rx.recv().await?;
                Some((chunk, rx))
            })
            .boxed()),
            ChatScript::Fail(err) => Err(err),
        }
    }

    async fn file_status(&self) -> Result<Vec<FileOperationStatus>> {
        Ok(self
            .saves
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| FileOperationStatus {
                operation_type: "save".to_string(),
                path: path.clone(),
                status: "success".to_string(),
                timestamp: "2026-01-01T00:00:00".to_string(),
                error: None,
            })
            .collect())
    }
}

// ============================================================================
// Editor
// ============================================================================

struct MockInstance {
    path: String,
    disposed: Arc<Mutex<Vec<String>>>,
    session: Option<Arc<SessionState>>,
    open_at_dispose: Arc<Mutex<Vec<(String, bool)>>>,
}

impl EditorInstance for MockInstance {
    fn dispose(&mut self) {
        self.disposed.lock().unwrap().push(self.path.clone());
        if let Some(session) = &self.session {
            let open = session.is_open(&self.path);
            self.open_at_dispose
                .lock()
                .unwrap()
                .push((self.path.clone(), open));
        }
    }
}

#[derive(Default)]
pub struct MockEditor {
    pub content: Mutex<String>,
    pub language: Mutex<String>,
    pub set_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,
    pub created: Mutex<Vec<String>>,
    pub disposed: Arc<Mutex<Vec<String>>>,
    /// Session each instance inspects while being disposed.
    pub session: Option<Arc<SessionState>>,
    pub open_at_dispose: Arc<Mutex<Vec<(String, bool)>>>,
}

impl MockEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watching(session: Arc<SessionState>) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    /// For each disposed instance, whether its path was still open at the time.
    pub fn open_at_dispose(&self) -> Vec<(String, bool)> {
        self.open_at_dispose.lock().unwrap().clone()
    }

    pub fn text(&self) -> String {
        self.content.lock().unwrap().clone()
    }

    pub fn language(&self) -> String {
        self.language.lock().unwrap().clone()
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> Vec<String> {
        self.disposed.lock().unwrap().clone()
    }

    /// Simulates the user typing into the editor.
    pub fn type_text(&self, text: &str) {
        *self.content.lock().unwrap() = text.to_string();
    }
}

impl EditorWidget for MockEditor {
    fn set_content(&self, content: &str, language: &str) {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        *self.content.lock().unwrap() = content.to_string();
        *self.language.lock().unwrap() = language.to_string();
    }

    fn clear(&self) {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.content.lock().unwrap().clear();
    }

    fn content(&self) -> String {
        self.content.lock().unwrap().clone()
    }

    fn create_instance(&self, path: &str) -> Box<dyn EditorInstance> {
        self.created.lock().unwrap().push(path.to_string());
        Box::new(MockInstance {
            path: path.to_string(),
            disposed: self.disposed.clone(),
            session: self.session.clone(),
            open_at_dispose: self.open_at_dispose.clone(),
        })
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub struct Harness {
    pub state: Arc<SessionState>,
    pub backend: Arc<MockBackend>,
    pub editor: Arc<MockEditor>,
    pub events: EventBus,
    pub rx: broadcast::Receiver<SessionEvent>,
}

impl Harness {
    pub fn new(backend: MockBackend) -> Self {
        let events = EventBus::new();
        let rx = events.subscribe();
        let state = Arc::new(SessionState::new());
        Self {
            editor: Arc::new(MockEditor::watching(state.clone())),
            state,
            backend: Arc::new(backend),
            events,
            rx,
        }
    }

    pub fn tabs(&self) -> FileTabManager {
        FileTabManager::new(
            self.state.clone(),
            self.backend.clone(),
            self.editor.clone(),
            self.events.clone(),
        )
    }

    pub fn bootstrapper(&self) -> ResilientBootstrapper {
        ResilientBootstrapper::new(self.state.clone(), self.backend.clone(), self.events.clone())
    }

    pub fn chat(&self) -> StreamingChatClient {
        StreamingChatClient::new(self.state.clone(), self.backend.clone(), self.events.clone())
    }

    /// Every event published since the last call.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn notifications(&mut self) -> Vec<Notification> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Notification(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Asserts the current-file invariant.
    pub fn assert_invariant(&self) {
        if let Some(current) = self.state.current_file() {
            assert!(self.state.is_open(&current), "current file {current} is not open");
        }
    }
}
