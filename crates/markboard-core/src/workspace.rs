//! Multi-document workspace management.
//!
//! Exactly one document is active at a time; switching swaps the element
//! list, history and view transform. The document set is never empty.

use crate::camera::Camera;
use crate::canvas::CanvasDocument;
use crate::editor::Editor;
use crate::storage::{ACTIVE_DOCUMENT_KEY, AutoSaveManager, Storage, StorageResult};
use std::collections::HashMap;
use thiserror::Error;

/// Workspace errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("Document name cannot be blank")]
    BlankName,
    #[error("No such document: {0}")]
    NotFound(String),
}

/// The set of workspace documents plus the editor holding the active one.
pub struct Workspace {
    /// Editor for the active document.
    pub editor: Editor,
    /// Documents not currently active, in creation order.
    inactive: Vec<CanvasDocument>,
    /// Saved view transforms of inactive documents.
    cameras: HashMap<String, Camera>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Create a workspace with a single fresh document.
    pub fn new() -> Self {
        Self {
            editor: Editor::new(),
            inactive: Vec::new(),
            cameras: HashMap::new(),
        }
    }

    /// The active document id.
    pub fn active_id(&self) -> &str {
        &self.editor.document.id
    }

    /// All documents as (id, name), active first.
    pub fn documents(&self) -> Vec<(String, String)> {
        let mut out = vec![(
            self.editor.document.id.clone(),
            self.editor.document.name.clone(),
        )];
        out.extend(self.inactive.iter().map(|d| (d.id.clone(), d.name.clone())));
        out
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        1 + self.inactive.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the set is never empty
    }

    /// Park the active document in the inactive list.
    fn stash_active(&mut self) {
        self.cameras.insert(
            self.editor.document.id.clone(),
            self.editor.camera.clone(),
        );
        let document = self.editor.document.clone();
        self.inactive.push(document);
    }

    /// Create a new empty document and make it active.
    pub fn create(&mut self) -> String {
        self.stash_active();
        let fresh = CanvasDocument::new();
        let id = fresh.id.clone();
        self.editor.load_document(fresh, Camera::new());
        id
    }

    /// Switch to another document by id. History resets to a single snapshot
    /// of the loaded elements; the document's own view transform is restored.
    pub fn switch(&mut self, id: &str) -> Result<(), WorkspaceError> {
        if id == self.active_id() {
            return Ok(());
        }
        let pos = self
            .inactive
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| WorkspaceError::NotFound(id.to_string()))?;
        let target = self.inactive.remove(pos);
        self.stash_active();
        let camera = self.cameras.remove(&target.id).unwrap_or_default();
        self.editor.load_document(target, camera);
        Ok(())
    }

    /// Delete a document. Deleting the active document switches to the first
    /// remaining one; deleting the last document auto-creates a fresh empty
    /// one.
    pub fn delete(&mut self, id: &str) -> Result<(), WorkspaceError> {
        self.cameras.remove(id);
        if id == self.active_id() {
            if self.inactive.is_empty() {
                self.editor.load_document(CanvasDocument::new(), Camera::new());
            } else {
                let next = self.inactive.remove(0);
                let camera = self.cameras.remove(&next.id).unwrap_or_default();
                self.editor.load_document(next, camera);
            }
            return Ok(());
        }
        let pos = self
            .inactive
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| WorkspaceError::NotFound(id.to_string()))?;
        self.inactive.remove(pos);
        Ok(())
    }

    /// Rename a document. Blank names are rejected.
    pub fn rename(&mut self, id: &str, name: &str) -> Result<(), WorkspaceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkspaceError::BlankName);
        }
        if id == self.active_id() {
            self.editor.document.name = name.to_string();
            self.editor.document.touch();
            return Ok(());
        }
        let doc = self
            .inactive
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| WorkspaceError::NotFound(id.to_string()))?;
        doc.name = name.to_string();
        doc.touch();
        Ok(())
    }

    /// Persist every document, record the active pointer, and remove
    /// records of documents that no longer exist.
    pub async fn save_all<S: Storage>(&self, storage: &S) -> StorageResult<()> {
        let mut live = vec![self.editor.document.id.clone()];
        storage
            .save(&self.editor.document.id, &self.editor.document)
            .await?;
        for doc in &self.inactive {
            storage.save(&doc.id, doc).await?;
            live.push(doc.id.clone());
        }
        // The active-pointer record is the active document under a fixed key
        storage
            .save(ACTIVE_DOCUMENT_KEY, &self.editor.document)
            .await?;

        for id in storage.list().await? {
            if id != ACTIVE_DOCUMENT_KEY && !live.contains(&id) {
                storage.delete(&id).await?;
            }
        }
        Ok(())
    }

    /// Load a workspace from storage. Returns a fresh workspace when nothing
    /// is stored.
    pub async fn load_all<S: Storage>(storage: &S) -> StorageResult<Self> {
        let mut ids = storage.list().await?;
        ids.retain(|id| id != ACTIVE_DOCUMENT_KEY);
        ids.sort();
        if ids.is_empty() {
            return Ok(Self::new());
        }

        let active_id = match storage.load(ACTIVE_DOCUMENT_KEY).await {
            Ok(doc) if ids.contains(&doc.id) => doc.id,
            _ => ids[0].clone(),
        };

        let mut workspace = None;
        let mut inactive = Vec::new();
        for id in &ids {
            let doc = storage.load(id).await?;
            if doc.id == active_id {
                workspace = Some(Editor::with_document(doc));
            } else {
                inactive.push(doc);
            }
        }

        Ok(Self {
            editor: workspace.unwrap_or_default(),
            inactive,
            cameras: HashMap::new(),
        })
    }

    /// Autosave tick: fold the editor's dirty flag into the manager, then
    /// save if the debounce/safety windows say so. Storage failures are
    /// logged and the in-memory session continues.
    pub async fn autosave_tick<S: Storage>(&mut self, autosave: &mut AutoSaveManager<S>) -> bool {
        if self.editor.take_dirty() {
            autosave.mark_dirty();
        }
        let id = self.editor.document.id.clone();
        match autosave.maybe_save(&id, &self.editor.document).await {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("autosave failed for {id}: {e}");
                false
            }
        }
    }
}
