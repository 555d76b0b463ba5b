//! File-based storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::canvas::CanvasDocument;
use std::fs;
use std::path::PathBuf;

/// File-based storage: one JSON file per document in a base directory.
pub struct FileStorage {
    /// Base directory for document storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {e}"))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the platform data directory.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("markboard").join("documents"))
    }

    /// Get the file path for a document ID.
    fn document_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_id}.json"))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, document: &CanvasDocument) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);
        let json = match document.to_json() {
            Ok(j) => j,
            Err(e) => {
                return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) });
            }
        };

        Box::pin(async move {
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasDocument>> {
        let path = self.document_path(id);
        let id_owned = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id_owned));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
            CanvasDocument::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {e}", path.display()))
            })
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {e}", path.display()))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {e}")))?;

            let mut ids = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        ids.push(stem.to_string());
                    }
                }
            }
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.document_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;

    fn temp_storage() -> (tempfile::TempDir, FileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("docs")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_dir, storage) = temp_storage();
        let mut doc = CanvasDocument::new();
        doc.name = "Sketch".to_string();

        block_on(storage.save(&doc.id.clone(), &doc)).unwrap();
        let loaded = block_on(storage.load(&doc.id)).unwrap();
        assert_eq!(loaded.name, "Sketch");
        assert_eq!(loaded.id, doc.id);
    }

    #[test]
    fn test_missing_document() {
        let (_dir, storage) = temp_storage();
        assert!(matches!(
            block_on(storage.load("missing")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_and_delete() {
        let (_dir, storage) = temp_storage();
        let doc = CanvasDocument::new();
        block_on(storage.save("a", &doc)).unwrap();
        block_on(storage.save("b", &doc)).unwrap();

        let mut ids = block_on(storage.list()).unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);

        block_on(storage.delete("a")).unwrap();
        assert!(!block_on(storage.exists("a")).unwrap());
        assert!(block_on(storage.exists("b")).unwrap());
    }

    #[test]
    fn test_id_sanitization() {
        let (_dir, storage) = temp_storage();
        let doc = CanvasDocument::new();
        block_on(storage.save("../evil/../../id", &doc)).unwrap();
        // The file lands inside the base directory
        let ids = block_on(storage.list()).unwrap();
        assert_eq!(ids.len(), 1);
    }
}
