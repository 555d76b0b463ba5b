//! Debounced auto-save for document persistence.
//!
//! Edits mark the manager dirty; a save runs once the debounce window after
//! the last edit has passed, and a fixed-interval safety save bounds the
//! maximum unsaved-edit window even under continuous editing. `flush` covers
//! visibility-change and unload hooks.

use super::{Storage, StorageResult};
use crate::canvas::CanvasDocument;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Debounce after the last edit before a save, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
/// Safety-save interval in seconds.
pub const DEFAULT_SAFETY_INTERVAL_SECS: u64 = 30;

/// Manages automatic document persistence.
pub struct AutoSaveManager<S: Storage> {
    /// Storage backend.
    storage: Arc<S>,
    /// Debounce window after the last edit.
    debounce: Duration,
    /// Safety-save interval.
    safety_interval: Duration,
    /// When the document was last edited.
    last_edit: Option<Instant>,
    /// When the document was last saved.
    last_save: Option<Instant>,
    /// Whether the document has unsaved changes.
    dirty: bool,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            safety_interval: Duration::from_secs(DEFAULT_SAFETY_INTERVAL_SECS),
            last_edit: None,
            last_save: None,
            dirty: false,
        }
    }

    /// Set the debounce window.
    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    /// Set the safety-save interval.
    pub fn set_safety_interval(&mut self, interval: Duration) {
        self.safety_interval = interval;
    }

    /// Record an edit: the document now has unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.last_edit = Some(Instant::now());
    }

    /// Check if the document has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a save should run now: dirty, and either the debounce window
    /// after the last edit has passed or the safety interval since the last
    /// save has elapsed.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        let debounced = self
            .last_edit
            .is_none_or(|edit| edit.elapsed() >= self.debounce);
        let overdue = self
            .last_save
            .is_none_or(|save| save.elapsed() >= self.safety_interval);
        debounced || overdue
    }

    /// Save the document if needed. Returns true if a save was performed.
    pub async fn maybe_save(&mut self, id: &str, document: &CanvasDocument) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.flush(id, document).await?;
        Ok(true)
    }

    /// Save immediately regardless of debounce (unload / visibility-change).
    pub async fn flush(&mut self, id: &str, document: &CanvasDocument) -> StorageResult<()> {
        self.storage.save(id, document).await?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(())
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage, block_on};

    #[test]
    fn test_clean_manager_never_saves() {
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
    }

    #[test]
    fn test_dirty_waits_for_debounce() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        // Pretend one save already happened so only the debounce applies
        manager.last_save = Some(Instant::now());
        manager.mark_dirty();
        assert!(manager.is_dirty());
        // Immediately after the edit the debounce window is still open
        assert!(!manager.should_save());

        manager.set_debounce(Duration::ZERO);
        assert!(manager.should_save());
    }

    #[test]
    fn test_never_saved_document_saves_at_once() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        manager.mark_dirty();
        // No previous save: the safety clause fires immediately
        assert!(manager.should_save());
    }

    #[test]
    fn test_flush_clears_dirty_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());
        let doc = CanvasDocument::new();

        manager.mark_dirty();
        block_on(manager.flush(&doc.id.clone(), &doc)).unwrap();
        assert!(!manager.is_dirty());
        assert!(block_on(storage.exists(&doc.id)).unwrap());
    }

    #[test]
    fn test_maybe_save_respects_debounce() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());
        manager.last_save = Some(Instant::now());
        let doc = CanvasDocument::new();

        manager.mark_dirty();
        let saved = block_on(manager.maybe_save(&doc.id.clone(), &doc)).unwrap();
        assert!(!saved);

        manager.set_debounce(Duration::ZERO);
        let saved = block_on(manager.maybe_save(&doc.id.clone(), &doc)).unwrap();
        assert!(saved);
    }
}
