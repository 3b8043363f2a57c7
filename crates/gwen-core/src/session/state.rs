//! The session record shared by all client components.

use super::buffer::{BufferSnapshot, FileBuffer};
use super::catalog::ModelCatalog;
use crate::error::{GwenError, Result};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct FileTable {
    current_file: Option<String>,
    /// Insertion order decides which tab becomes active after a close.
    open_files: IndexMap<String, FileBuffer>,
}

/// Single source of truth for one client session.
///
/// Components receive an `Arc<SessionState>` at construction. The file table,
/// the model catalog and the processing flag are independent slices, so no
/// caller ever needs to lock the whole record. Locks are never held across an
/// `.await`.
///
/// Invariant: `current_file` is either `None` or a key of `open_files`.
#[derive(Debug, Default)]
pub struct SessionState {
    files: Mutex<FileTable>,
    catalog: Mutex<ModelCatalog>,
    models_loaded: AtomicBool,
    is_processing: AtomicBool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, FileTable> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn catalog_guard(&self) -> MutexGuard<'_, ModelCatalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================================
    // Processing flag
    // ============================================================================

    /// Sets the processing flag and returns its previous value.
    ///
    /// The read and the write are one atomic swap, so two callers racing to
    /// set `true` cannot both observe `false`.
    pub fn set_processing(&self, processing: bool) -> bool {
        self.is_processing.swap(processing, Ordering::AcqRel)
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::Acquire)
    }

    // ============================================================================
    // Current file
    // ============================================================================

    pub fn current_file(&self) -> Option<String> {
        self.files().current_file.clone()
    }

    /// Sets the active file. A path that is not open is rejected.
    pub fn set_current_file(&self, path: Option<&str>) -> Result<()> {
        let mut files = self.files();
        match path {
            Some(path) if !files.open_files.contains_key(path) => {
                Err(GwenError::not_found("open file", path))
            }
            Some(path) => {
                files.current_file = Some(path.to_string());
                Ok(())
            }
            None => {
                files.current_file = None;
                Ok(())
            }
        }
    }

    // ============================================================================
    // Open files
    // ============================================================================

    pub fn is_open(&self, path: &str) -> bool {
        self.files().open_files.contains_key(path)
    }

    /// Open paths in insertion order.
    pub fn open_paths(&self) -> Vec<String> {
        self.files().open_files.keys().cloned().collect()
    }

    pub fn open_count(&self) -> usize {
        self.files().open_files.len()
    }

    pub fn buffer(&self, path: &str) -> Option<BufferSnapshot> {
        self.files().open_files.get(path).map(FileBuffer::snapshot)
    }

    /// Inserts a new buffer. An already open path keeps its existing buffer
    /// and the new one is handed back so the caller can release it.
    pub fn insert_buffer(&self, buffer: FileBuffer) -> std::result::Result<(), FileBuffer> {
        let mut files = self.files();
        if files.open_files.contains_key(&buffer.path) {
            return Err(buffer);
        }
        files.open_files.insert(buffer.path.clone(), buffer);
        Ok(())
    }

    /// Runs `f` against an open buffer.
    pub fn update_buffer<R>(&self, path: &str, f: impl FnOnce(&mut FileBuffer) -> R) -> Result<R> {
        let mut files = self.files();
        let buffer = files
            .open_files
            .get_mut(path)
            .ok_or_else(|| GwenError::not_found("open file", path))?;
        Ok(f(buffer))
    }

    /// Removes a buffer, preserving the order of the remaining ones.
    ///
    /// If the removed path was current, `current_file` is cleared in the same
    /// step so the invariant holds even before the caller picks a successor.
    pub fn remove_buffer(&self, path: &str) -> Option<FileBuffer> {
        let mut files = self.files();
        let removed = files.open_files.shift_remove(path);
        if removed.is_some() && files.current_file.as_deref() == Some(path) {
            files.current_file = None;
        }
        removed
    }

    /// First open path in insertion order.
    pub fn first_open_path(&self) -> Option<String> {
        self.files().open_files.keys().next().cloned()
    }

    // ============================================================================
    // Model catalog
    // ============================================================================

    pub fn models_loaded(&self) -> bool {
        self.models_loaded.load(Ordering::Acquire)
    }

    pub fn catalog(&self) -> ModelCatalog {
        self.catalog_guard().clone()
    }

    /// Replaces the catalog and records whether it came from the backend.
    pub fn set_catalog(&self, catalog: ModelCatalog, loaded: bool) {
        *self.catalog_guard() = catalog;
        self.models_loaded.store(loaded, Ordering::Release);
    }

    pub fn selected_model(&self) -> Option<String> {
        self.catalog_guard().selected.clone()
    }

    pub fn select_model(&self, model: &str) -> Result<()> {
        if self.catalog_guard().select(model) {
            Ok(())
        } else {
            Err(GwenError::not_found("model", model))
        }
    }
}
