//! Ellipse shape.

use super::{ShapeId, ShapeLabel, ShapeStyle, ShapeTrait};
use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ellipse shape defined by its center and radii.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    /// Center point.
    pub center: Point,
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
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

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            center,
            radius_x,
            radius_y,
            rotation: 0.0,
            locked: false,
            label: None,
            style: ShapeStyle::default(),
        }
    }

    /// Create an ellipse inscribed in a bounding rect.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        KurboEllipse::new(self.center, Vec2::new(self.radius_x, self.radius_y), 0.0).to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rect() {
        let ellipse = Ellipse::from_rect(Rect::new(0.0, 0.0, 100.0, 60.0));
        assert!((ellipse.center.x - 50.0).abs() < f64::EPSILON);
        assert!((ellipse.center.y - 30.0).abs() < f64::EPSILON);
        assert!((ellipse.radius_x - 50.0).abs() < f64::EPSILON);
        assert!((ellipse.radius_y - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds() {
        let ellipse = Ellipse::new(Point::new(50.0, 50.0), 30.0, 20.0);
        let bounds = ellipse.bounds();
        assert!((bounds.x0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 30.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 80.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let ellipse = Ellipse::new(Point::new(50.0, 50.0), 30.0, 20.0);
        assert!(ellipse.hit_test(Point::new(50.0, 50.0), 0.0));
        assert!(!ellipse.hit_test(Point::new(100.0, 50.0), 0.0));
    }
}
