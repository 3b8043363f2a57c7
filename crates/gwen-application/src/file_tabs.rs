//! FileTabManager - open files, tabs and the shared editor.
//!
//! Owns the policy for opening, switching, closing, saving and running files.
//! Buffers live in `SessionState`; this component is the only writer of the
//! file table besides the session itself.

use gwen_core::backend::{FileOperationStatus, RunResult, SaveReceipt, WorkspaceBackend};
use gwen_core::editor::EditorWidget;
use gwen_core::error::{GwenError, Result};
use gwen_core::event::{EventBus, SessionEvent, TabView};
use gwen_core::language::language_for_path;
use gwen_core::perf::PerfMonitor;
use gwen_core::session::{FileBuffer, SessionState, TabHandle};
use std::sync::{Arc, Mutex, PoisonError};

/// Shown when a file is run while no tab is active.
pub const NO_FILE_OPEN: &str = "No file is currently open";

pub struct FileTabManager {
    state: Arc<SessionState>,
    backend: Arc<dyn WorkspaceBackend>,
    editor: Arc<dyn EditorWidget>,
    events: EventBus,
    perf: Arc<PerfMonitor>,
    /// Last successful browser listing.
    listing: Mutex<Vec<String>>,
}

impl FileTabManager {
    pub fn new(
        state: Arc<SessionState>,
        backend: Arc<dyn WorkspaceBackend>,
        editor: Arc<dyn EditorWidget>,
        events: EventBus,
    ) -> Self {
        Self {
            state,
            backend,
            editor,
            events,
            perf: Arc::new(PerfMonitor::new()),
            listing: Mutex::new(Vec::new()),
        }
    }

    pub fn perf(&self) -> &PerfMonitor {
        &self.perf
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// The browser listing as of the last successful `list_files`.
    pub fn listing(&self) -> Vec<String> {
        self.listing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ============================================================================
    // Browser
    // ============================================================================

    /// Refreshes the file browser. On failure the previous listing is kept.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        let mark = self.perf.mark("loadFiles");
        let entries = match self.backend.list_files().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("[FileTabManager] Failed to load files: {}", e);
                self.events.notify_error("Failed to load files");
                return Err(e);
            }
        };

        let files: Vec<String> = entries.into_iter().map(|entry| entry.path).collect();
        *self.listing.lock().unwrap_or_else(PoisonError::into_inner) = files.clone();
        self.events.emit(SessionEvent::FileListLoaded {
            files: files.clone(),
        });
        mark.finish();
        tracing::debug!("[FileTabManager] Listed {} files", files.len());
        Ok(files)
    }

    // ============================================================================
    // Tabs
    // ============================================================================

    /// Opens `path` and makes it the active tab.
    ///
    /// An already open path is switched to from its cached buffer without a
    /// network read. A failed fetch is reported and leaves the session as it
    /// was.
    pub async fn open_file(&self, path: &str) -> Result<()> {
        let mark = self.perf.mark("openFile");

        if !self.state.is_open(path) {
            let content = match self.backend.read_file(path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::error!("[FileTabManager] Failed to open {}: {}", path, e);
                    self.events
                        .notify_error(e.user_message_or("Failed to open file"));
                    return Err(e);
                }
            };
            self.insert_with_tab(FileBuffer::new(path, content));
        }

        self.switch_to_file(path)?;
        mark.finish();
        Ok(())
    }

    /// Inserts a buffer backed by a fresh widget instance. If the path was
    /// opened while the caller was suspended, the existing buffer wins and the
    /// new instance is released straight away.
    fn insert_with_tab(&self, buffer: FileBuffer) {
        let instance = self.editor.create_instance(&buffer.path);
        let buffer = buffer.with_tab(TabHandle::new(instance));
        if let Err(mut duplicate) = self.state.insert_buffer(buffer) {
            tracing::debug!(
                "[FileTabManager] {} already open, keeping existing buffer",
                duplicate.path
            );
            duplicate.release_tab();
        }
    }

    /// Activates an open file and loads it into the editor.
    pub fn switch_to_file(&self, path: &str) -> Result<()> {
        let buffer = self
            .state
            .buffer(path)
            .ok_or_else(|| GwenError::not_found("open file", path))?;
        self.state.set_current_file(Some(path))?;
        self.editor
            .set_content(&buffer.content, language_for_path(path));
        self.emit_tabs();
        Ok(())
    }

    /// Closes a tab, releasing its widget instance before the buffer goes.
    ///
    /// Closing the active tab activates the first remaining tab in opening
    /// order, or clears the editor when none is left. Closing any other tab
    /// leaves the editor untouched.
    pub fn close_file(&self, path: &str) -> Result<()> {
        // Dispose runs without the session lock held; the buffer is still
        // in the table until the instance is gone.
        if let Some(mut tab) = self.state.update_buffer(path, FileBuffer::take_tab)? {
            tab.release();
        }

        let was_current = self.state.current_file().as_deref() == Some(path);
        self.state.remove_buffer(path);
        tracing::debug!("[FileTabManager] Closed {}", path);

        if was_current {
            match self.state.first_open_path() {
                Some(next) => return self.switch_to_file(&next),
                None => {
                    self.state.set_current_file(None)?;
                    self.editor.clear();
                }
            }
        }
        self.emit_tabs();
        Ok(())
    }

    /// Records an edit made in the editor against the active buffer.
    pub fn on_editor_changed(&self, content: &str) {
        let Some(current) = self.state.current_file() else {
            return;
        };
        let became_dirty = self
            .state
            .update_buffer(&current, |buffer| {
                let was_modified = buffer.is_modified;
                if buffer.content != content {
                    buffer.content = content.to_string();
                    buffer.is_modified = true;
                }
                !was_modified && buffer.is_modified
            })
            .unwrap_or(false);
        if became_dirty {
            self.emit_tabs();
        }
    }

    /// The tab strip as it should currently be rendered.
    pub fn tabs(&self) -> Vec<TabView> {
        let current = self.state.current_file();
        self.state
            .open_paths()
            .into_iter()
            .filter_map(|path| self.state.buffer(&path))
            .map(|buffer| TabView {
                is_active: current.as_deref() == Some(buffer.path.as_str()),
                is_modified: buffer.is_modified,
                path: buffer.path,
            })
            .collect()
    }

    fn emit_tabs(&self) {
        self.events.emit(SessionEvent::TabsChanged { tabs: self.tabs() });
    }

    // ============================================================================
    // Save / run
    // ============================================================================

    /// Writes `content` to the backend. Only a successful write updates the
    /// cached buffer and clears its modified flag.
    pub async fn save(&self, path: &str, content: &str) -> Result<SaveReceipt> {
        let mark = self.perf.mark("saveFile");
        let receipt = match self.backend.save_file(path, content).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!("[FileTabManager] Failed to save {}: {}", path, e);
                self.events
                    .notify_error(e.user_message_or("Failed to save file"));
                return Err(e);
            }
        };

        let updated = self.state.update_buffer(path, |buffer| {
            buffer.content = content.to_string();
            buffer.is_modified = false;
        });
        if updated.is_ok() {
            self.emit_tabs();
        }
        self.events.notify_success("File saved successfully");
        mark.finish();
        Ok(receipt)
    }

    /// Saves `path` and executes it, replacing the terminal with the result.
    ///
    /// The saved content is the editor's when `path` is active, otherwise the
    /// cached buffer's.
    pub async fn run(&self, path: &str) -> Result<RunResult> {
        let mark = self.perf.mark("runFile");
        let content = if self.state.current_file().as_deref() == Some(path) {
            self.editor.content()
        } else {
            match self.state.buffer(path) {
                Some(buffer) => buffer.content,
                None => {
                    self.events.notify_error("Failed to run file");
                    return Err(GwenError::not_found("open file", path));
                }
            }
        };

        self.save(path, &content).await?;

        let result = match self.backend.run_file(path).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("[FileTabManager] Failed to run {}: {}", path, e);
                self.events
                    .notify_error(e.user_message_or("Failed to run file"));
                return Err(e);
            }
        };

        self.events.emit(SessionEvent::TerminalReplaced {
            output: result.output.clone(),
            error: result.error.clone(),
        });
        mark.finish();
        Ok(result)
    }

    /// Runs the active file.
    pub async fn run_current(&self) -> Result<RunResult> {
        let Some(current) = self.state.current_file() else {
            self.events.notify_error(NO_FILE_OPEN);
            return Err(GwenError::application(NO_FILE_OPEN));
        };
        self.run(&current).await
    }

    /// Recent file operations recorded by the backend.
    pub async fn file_status(&self) -> Result<Vec<FileOperationStatus>> {
        self.backend.file_status().await
    }
}
