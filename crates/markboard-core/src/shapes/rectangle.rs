//! Rectangle shape.

use super::{ShapeId, ShapeLabel, ShapeStyle, ShapeTrait};
use kurbo::{BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rectangle shape with optional rounded corners and attached text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
    /// Corner radius (0 = sharp corners). Clamped to half the shorter side
    /// at path-build time so the corners never self-intersect.
    #[serde(default)]
    pub corner_radius: f64,
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

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            corner_radius: 0.0,
            rotation: 0.0,
            locked: false,
            label: None,
            style: ShapeStyle::default(),
        }
    }

    /// Create a rectangle from two corner points (normalized to a
    /// non-negative size).
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::new(
            Point::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            (p2.x - p1.x).abs(),
            (p2.y - p1.y).abs(),
        )
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    /// The corner radius clamped so it never exceeds half the shorter side.
    pub fn effective_radius(&self) -> f64 {
        self.corner_radius
            .clamp(0.0, self.width.min(self.height) / 2.0)
    }
}

impl ShapeTrait for Rectangle {
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
        let radius = self.effective_radius();
        if radius > 0.0 {
            RoundedRect::from_rect(self.as_rect(), radius).to_path(0.1)
        } else {
            self.as_rect().to_path(0.1)
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_from_corners_normalizes() {
        let rect = Rectangle::from_corners(Point::new(100.0, 100.0), Point::new(50.0, 50.0));
        assert!((rect.position.x - 50.0).abs() < f64::EPSILON);
        assert!((rect.position.y - 50.0).abs() < f64::EPSILON);
        assert!((rect.width - 50.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        assert!(rect.hit_test(Point::new(50.0, 50.0), 0.0));
        assert!(!rect.hit_test(Point::new(150.0, 50.0), 0.0));
        assert!(rect.hit_test(Point::new(105.0, 50.0), 10.0)); // within tolerance
    }

    #[test]
    fn test_effective_radius_clamped() {
        let mut rect = Rectangle::new(Point::ZERO, 100.0, 40.0);
        rect.corner_radius = 500.0;
        assert!((rect.effective_radius() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_translate() {
        let mut rect = Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0);
        rect.translate(Vec2::new(5.0, -5.0));
        assert!((rect.position.x - 15.0).abs() < f64::EPSILON);
        assert!((rect.position.y - 15.0).abs() < f64::EPSILON);
    }
}
