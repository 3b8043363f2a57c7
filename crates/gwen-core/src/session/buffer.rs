//! In-memory file buffers and their tab handles.

use crate::editor::EditorInstance;
use serde::Serialize;
use std::fmt;

/// Owns the editor-widget instance of one open tab.
///
/// `release` disposes the instance exactly once; later calls are no-ops.
pub struct TabHandle {
    instance: Option<Box<dyn EditorInstance>>,
}

impl TabHandle {
    pub fn new(instance: Box<dyn EditorInstance>) -> Self {
        Self {
            instance: Some(instance),
        }
    }

    /// Disposes the widget instance. Returns `true` if this call released it.
    pub fn release(&mut self) -> bool {
        match self.instance.take() {
            Some(mut instance) => {
                instance.dispose();
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.instance.is_none()
    }
}

impl fmt::Debug for TabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Text and dirty flag for one open file.
#[derive(Debug)]
pub struct FileBuffer {
    pub path: String,
    pub content: String,
    pub is_modified: bool,
    pub tab_handle: Option<TabHandle>,
}

impl FileBuffer {
    /// Creates a clean buffer holding freshly fetched content.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            is_modified: false,
            tab_handle: None,
        }
    }

    pub fn with_tab(mut self, tab_handle: TabHandle) -> Self {
        self.tab_handle = Some(tab_handle);
        self
    }

    /// Detaches the tab handle so it can be released outside the session lock.
    pub fn take_tab(&mut self) -> Option<TabHandle> {
        self.tab_handle.take()
    }

    /// Releases the tab's widget instance, if any.
    pub fn release_tab(&mut self) -> bool {
        self.tab_handle
            .as_mut()
            .map(TabHandle::release)
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            path: self.path.clone(),
            content: self.content.clone(),
            is_modified: self.is_modified,
        }
    }
}

/// Read-only copy of a buffer handed out by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferSnapshot {
    pub path: String,
    pub content: String,
    pub is_modified: bool,
}
