//! Diamond shape (4-point rhombus).

use super::{ShapeId, ShapeLabel, ShapeStyle, ShapeTrait};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A diamond shape: a rhombus through the four edge midpoints of its
/// bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diamond {
    pub(crate) id: ShapeId,
    /// Top-left corner of the bounding box.
    pub position: Point,
    /// Width of the bounding box.
    pub width: f64,
    /// Height of the bounding box.
    pub height: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    /// Suppresses direct move/resize/rotate/delete interactions.
    #[serde(default)]
    pub locked: bool,
    /// Optional text attached inside the shape.
    #[serde(default)]
    pub label: Option<ShapeLabel>,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Diamond {
    /// Create a new diamond.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            rotation: 0.0,
            locked: false,
            label: None,
            style: ShapeStyle::default(),
        }
    }

    /// Create a diamond from two corner points of its bounding box.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::new(
            Point::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            (p2.x - p1.x).abs(),
            (p2.y - p1.y).abs(),
        )
    }

    /// Get the bounding box as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    /// The four rhombus vertices: top, right, bottom, left edge midpoints.
    pub fn vertices(&self) -> [Point; 4] {
        let rect = self.as_rect();
        let center = rect.center();
        [
            Point::new(center.x, rect.y0),
            Point::new(rect.x1, center.y),
            Point::new(center.x, rect.y1),
            Point::new(rect.x0, center.y),
        ]
    }
}

impl ShapeTrait for Diamond {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_rect().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        let [top, right, bottom, left] = self.vertices();
        let mut path = BezPath::new();
        path.move_to(top);
        path.line_to(right);
        path.line_to(bottom);
        path.line_to(left);
        path.close_path();
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}
