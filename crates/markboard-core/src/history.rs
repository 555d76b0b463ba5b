//! Linear undo/redo history of full document snapshots.

use crate::shapes::{Shape, ShapeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of snapshots to keep.
const MAX_HISTORY: usize = 100;

/// A full snapshot of the element list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// All shapes, keyed by ID.
    pub shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    pub z_order: Vec<ShapeId>,
}

/// Linear history: a snapshot list plus a cursor. The cursor always points at
/// the currently-displayed snapshot; committing a new state truncates
/// everything after the cursor before appending.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Snapshot>,
    cursor: usize,
}

impl History {
    /// Create a history seeded with the initial document state.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    /// Reset to a single snapshot (used when switching documents).
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.snapshots = vec![snapshot];
        self.cursor = 0;
    }

    /// Commit a new state: truncate after the cursor, append, advance.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        self.cursor = self.snapshots.len() - 1;

        if self.snapshots.len() > MAX_HISTORY {
            self.snapshots.remove(0);
            self.cursor -= 1;
        }
    }

    /// Step back and return the snapshot to restore.
    /// No-op (returns None) at the oldest snapshot.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward and return the snapshot to restore.
    /// No-op (returns None) at the newest snapshot.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
