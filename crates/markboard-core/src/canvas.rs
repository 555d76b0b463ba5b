//! Canvas document: the canonical element list.

use crate::history::Snapshot;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A canvas document containing all shapes of one workspace canvas.
///
/// The arena (`shapes`) plus `z_order` define both the render order
/// (back-to-front = vector order) and the persisted content. Creation always
/// appends to the end of `z_order`, so new shapes render on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasDocument {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    /// All shapes in the document, keyed by ID.
    pub shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    pub z_order: Vec<ShapeId>,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Last modification time, epoch milliseconds.
    #[serde(default)]
    pub updated_at: i64,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            shapes: HashMap::new(),
            z_order: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }

    /// Add a shape to the document (on top of the z-order).
    pub fn add_shape(&mut self, shape: Shape) {
        let id = shape.id();
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        self.touch();
    }

    /// Remove a shape from the document.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.z_order.retain(|&shape_id| shape_id != id);
        let removed = self.shapes.remove(&id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Clear all shapes from the document.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
        self.touch();
    }

    /// Get a shape by ID.
    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Get a mutable reference to a shape by ID.
    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Get shapes in z-order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Bring a shape to the front (topmost).
    pub fn bring_to_front(&mut self, id: ShapeId) {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.z_order.push(id);
        self.touch();
    }

    /// Send a shape to the back (bottommost).
    pub fn send_to_back(&mut self, id: ShapeId) {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.z_order.insert(0, id);
        self.touch();
    }

    /// Move a shape one layer forward. Returns false if already at the front.
    pub fn bring_forward(&mut self, id: ShapeId) -> bool {
        if let Some(pos) = self.z_order.iter().position(|&shape_id| shape_id == id) {
            if pos < self.z_order.len() - 1 {
                self.z_order.swap(pos, pos + 1);
                self.touch();
                return true;
            }
        }
        false
    }

    /// Move a shape one layer backward. Returns false if already at the back.
    pub fn send_backward(&mut self, id: ShapeId) -> bool {
        if let Some(pos) = self.z_order.iter().position(|&shape_id| shape_id == id) {
            if pos > 0 {
                self.z_order.swap(pos, pos - 1);
                self.touch();
                return true;
            }
        }
        false
    }

    /// Get the bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for shape in self.shapes.values() {
            let bounds = shape.bounds();
            result = Some(match result {
                Some(r) => r.union(bounds),
                None => bounds,
            });
        }
        result
    }

    /// The topmost shape at a point, if any. Scans in reverse z-order so the
    /// visually topmost shape wins ties.
    pub fn top_shape_at(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .find(|&&id| {
                self.shapes
                    .get(&id)
                    .is_some_and(|s| s.hit_test(point, tolerance))
            })
            .copied()
    }

    /// All shapes at a point, topmost first.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter(|&&id| {
                self.shapes
                    .get(&id)
                    .is_some_and(|s| s.hit_test(point, tolerance))
            })
            .copied()
            .collect()
    }

    /// Shapes intersecting a marquee rectangle, in z-order.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .filter(|&&id| {
                self.shapes
                    .get(&id)
                    .is_some_and(|s| s.intersects_rect(rect))
            })
            .copied()
            .collect()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Get the number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Take a full snapshot of the element list for history.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            shapes: self.shapes.clone(),
            z_order: self.z_order.clone(),
        }
    }

    /// Restore the element list from a history snapshot.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.shapes = snapshot.shapes.clone();
        self.z_order = snapshot.z_order.clone();
        self.touch();
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Connector, Rectangle};

    #[test]
    fn test_add_and_remove() {
        let mut doc = CanvasDocument::new();
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        let id = rect.id;

        doc.add_shape(Shape::Rectangle(rect));
        assert_eq!(doc.len(), 1);
        assert!(doc.get_shape(id).is_some());

        assert!(doc.remove_shape(id).is_some());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_z_order_reorder() {
        let mut doc = CanvasDocument::new();
        let r1 = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        let r2 = Rectangle::new(Point::new(50.0, 50.0), 100.0, 100.0);
        let (id1, id2) = (r1.id, r2.id);
        doc.add_shape(Shape::Rectangle(r1));
        doc.add_shape(Shape::Rectangle(r2));
        assert_eq!(doc.z_order, vec![id1, id2]);

        doc.bring_to_front(id1);
        assert_eq!(doc.z_order, vec![id2, id1]);

        doc.send_to_back(id1);
        assert_eq!(doc.z_order, vec![id1, id2]);

        assert!(doc.bring_forward(id1));
        assert_eq!(doc.z_order, vec![id2, id1]);
        assert!(!doc.bring_forward(id1));

        assert!(doc.send_backward(id1));
        assert!(!doc.send_backward(id1));
    }

    #[test]
    fn test_topmost_wins_ties() {
        let mut doc = CanvasDocument::new();
        let r1 = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        let r2 = Rectangle::new(Point::new(50.0, 50.0), 100.0, 100.0);
        let (id1, id2) = (r1.id, r2.id);
        doc.add_shape(Shape::Rectangle(r1));
        doc.add_shape(Shape::Rectangle(r2));

        // Point inside both: the later-added (topmost) shape wins
        assert_eq!(doc.top_shape_at(Point::new(75.0, 75.0), 0.0), Some(id2));
        // Point only inside the first
        assert_eq!(doc.top_shape_at(Point::new(25.0, 25.0), 0.0), Some(id1));
        assert_eq!(doc.top_shape_at(Point::new(500.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_shapes_in_rect_catches_diagonal_connector() {
        let mut doc = CanvasDocument::new();
        let line = Connector::new_line(Point::new(-10.0, -10.0), Point::new(60.0, 60.0));
        let id = line.id;
        doc.add_shape(Shape::Line(line));

        let hits = doc.shapes_in_rect(Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(hits, vec![id]);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut doc = CanvasDocument::new();
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        doc.add_shape(Shape::Rectangle(rect));

        let snap = doc.snapshot();
        doc.clear();
        assert!(doc.is_empty());

        doc.restore(&snap);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.z_order, snap.z_order);
    }

    #[test]
    fn test_json_round_trip() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(Shape::Rectangle(Rectangle::new(Point::ZERO, 10.0, 20.0)));
        let json = doc.to_json().unwrap();
        let loaded = CanvasDocument::from_json(&json).unwrap();
        assert_eq!(loaded.id, doc.id);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.z_order, doc.z_order);
    }
}
